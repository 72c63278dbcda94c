//! Radio stack lifecycle manager.
//!
//! Drives the co-processor through boot → mode-select → version-check →
//! stack-start, owns the "known stack kind" state, and performs the
//! strictly-ordered full reinitialization sequence.
//!
//! # State machine
//!
//! ```text
//! Idle → BootRequested → WaitingForCoprocessor → ModeNegotiated
//!      → VersionChecked → StackRunning
//! ```
//!
//! `reinitialize()` collapses any state back to `Idle` before replaying the
//! forward path. `StackRunning` is the only state from which profile
//! activation is permitted.
//!
//! # Locking
//!
//! The [`CoreLock`] is a process-wide mutex guarding every sequence that
//! mutates shared co-processor boot/reset state. It is acquired for the full
//! duration of initialize/start/reinitialize and released on every exit path
//! by scope. It is never held across a wait for UI or test input.
//! Diagnostics that only read skip it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

use platform::copro::{CommandResult, CoproInfo, CoproLink, CoproMode, KeyStorageChangedCallback, StackType};
use platform::gap::{GapLayer, GapState};
use platform::hsem::{acquire_spinning, HardwareSemaphore, SemaphoreId};
use platform::identity::DeviceIdentity;
use platform::power::{BusDomain, PowerControl};
use platform::settings::BtSettings;

use crate::error::{FatalError, LifecycleError};
use crate::profile::ProfileRegistry;

/// Minimum supported radio stack major version.
pub const STACK_VERSION_MAJOR_MIN: u8 = 1;
/// Minimum supported radio stack minor version.
pub const STACK_VERSION_MINOR_MIN: u8 = 12;

/// Process-wide lock guarding co-processor boot/reset sequences.
///
/// Declared by the application as a `static` so guards borrow the lock, not
/// the controller:
///
/// ```ignore
/// static CORE_LOCK: CoreLock = CoreLock::new(());
/// ```
pub type CoreLock = Mutex<CriticalSectionRawMutex, ()>;

/// Channel carrying fatal conditions to the process supervisor.
///
/// The supervisor awaits this signal and halts the system; no other
/// component may terminate the process.
pub type FatalSignal = Signal<CriticalSectionRawMutex, FatalError>;

/// Kind of radio stack negotiated with the co-processor.
///
/// Set once per boot by the version/type check; never reset except by full
/// reinitialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioStackKind {
    /// No supported stack negotiated yet.
    Unknown,
    /// BLE light stack: GATT/GAP, no direct test mode.
    Light,
    /// Full BLE stack: GATT/GAP plus direct test mode.
    Full,
}

/// Lifecycle progress of the co-processor stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    /// Nothing running.
    Idle,
    /// Bus domains up, boot requested.
    BootRequested,
    /// Waiting for the co-processor readiness signal.
    WaitingForCoprocessor,
    /// Co-processor switched into stack mode.
    ModeNegotiated,
    /// Stack type/version accepted.
    VersionChecked,
    /// Radio stack running; profiles may be activated.
    StackRunning,
}

/// Timeouts and delays for the lifecycle sequences.
///
/// Defaults match the deployed hardware; tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Bound on the wait for the co-processor readiness signal.
    pub copro_start_timeout: Duration,
    /// Time to wait for an externally-triggered reset after a mode switch
    /// reports "restart pending" before declaring the system lost.
    pub mode_switch_timeout: Duration,
    /// Bound on the advertising/discoverability convergence polls.
    pub adv_converge_timeout: Duration,
    /// Settle delay between firmware reset and transport shutdown during
    /// reinitialization.
    pub settle_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            copro_start_timeout: Duration::from_secs(1),
            mode_switch_timeout: Duration::from_secs(10),
            adv_converge_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// The platform handles the controller is built from.
pub struct ControllerParts<L, G, H, P, S, I> {
    /// Command channel to the co-processor.
    pub link: L,
    /// GAP layer control surface.
    pub gap: G,
    /// Inter-core hardware semaphores.
    pub hsem: H,
    /// Bus domain and stay-awake control.
    pub power: P,
    /// Persisted Bluetooth settings.
    pub settings: S,
    /// Factory identity (MAC, base name).
    pub identity: I,
}

/// Host-side controller for the co-processor BLE stack.
pub struct BleController<L, G, H, P, S, I> {
    pub(crate) link: L,
    pub(crate) gap: G,
    pub(crate) hsem: H,
    pub(crate) power: P,
    pub(crate) settings: S,
    pub(crate) identity: I,
    pub(crate) config: ControllerConfig,
    pub(crate) fatal: &'static FatalSignal,
    core_lock: &'static CoreLock,
    pub(crate) state: LifecycleState,
    pub(crate) stack: RadioStackKind,
    pub(crate) registry: ProfileRegistry,
    initialized: bool,
}

impl<L, G, H, P, S, I> BleController<L, G, H, P, S, I>
where
    L: CoproLink,
    G: GapLayer,
    H: HardwareSemaphore,
    P: PowerControl,
    S: BtSettings,
    I: DeviceIdentity,
{
    /// Assemble a controller. Nothing is started until [`initialize`].
    ///
    /// [`initialize`]: BleController::initialize
    pub fn new(
        parts: ControllerParts<L, G, H, P, S, I>,
        registry: ProfileRegistry,
        config: ControllerConfig,
        fatal: &'static FatalSignal,
        core_lock: &'static CoreLock,
    ) -> Self {
        BleController {
            link: parts.link,
            gap: parts.gap,
            hsem: parts.hsem,
            power: parts.power,
            settings: parts.settings,
            identity: parts.identity,
            config,
            fatal,
            core_lock,
            state: LifecycleState::Idle,
            stack: RadioStackKind::Unknown,
            registry,
            initialized: false,
        }
    }

    /// Enable the bus domains the BLE subsystem needs, claim the CLK48
    /// configuration semaphore and request co-processor boot.
    ///
    /// Idempotent: safe to call again after a partial failure. The
    /// hard-fault watchdog is a separate task the application spawns with
    /// the same [`FatalSignal`]; see [`crate::watchdog`].
    pub async fn initialize(&mut self) -> Result<(), LifecycleError> {
        let _guard = self.core_lock.lock().await;
        self.initialize_inner()
    }

    fn initialize_inner(&mut self) -> Result<(), LifecycleError> {
        for domain in BusDomain::BLE_DOMAINS {
            self.power.enable(domain);
        }
        // Explicitly tell the other core that we are in charge of the CLK48
        // domain.
        if !self.hsem.try_take(SemaphoreId::Clk48Config) {
            return Err(LifecycleError::SemaphoreClaimFailed);
        }
        self.link.boot();
        self.state = LifecycleState::BootRequested;
        self.initialized = true;
        Ok(())
    }

    /// Bring the radio stack up: wait for co-processor readiness, switch it
    /// into stack mode, verify the stack type/version, start the stack.
    ///
    /// On an unsupported stack the co-processor link remains usable for
    /// other purposes; only profile activation stays refused.
    pub async fn start_radio_stack(&mut self) -> Result<(), LifecycleError> {
        let _guard = self.core_lock.lock().await;
        self.start_radio_stack_inner().await
    }

    async fn start_radio_stack_inner(&mut self) -> Result<(), LifecycleError> {
        // Re-claim CLK48: the boot sequence may have bounced the HSEM block.
        if !self.hsem.try_take(SemaphoreId::Clk48Config) {
            return Err(LifecycleError::SemaphoreClaimFailed);
        }

        self.state = LifecycleState::WaitingForCoprocessor;
        if !self.link.wait_ready(self.config.copro_start_timeout).await {
            error!("co-processor start failed");
            self.link.stop_transport_thread();
            return Err(LifecycleError::CoproStartTimeout);
        }

        self.ensure_mode_inner(CoproMode::Stack).await?;
        self.state = LifecycleState::ModeNegotiated;

        let info = self.link.info();
        if !self.accept_stack(&info) {
            // Keep the transport thread running: the link stays usable for
            // the crypto enclave even without a supported BLE stack.
            error!("unsupported radio stack");
            return Err(LifecycleError::UnsupportedStack);
        }
        self.state = LifecycleState::VersionChecked;

        if !self.link.start_stack() {
            error!("failed to start radio stack");
            self.link.stop_transport_thread();
            self.link.stop_stack_thread();
            return Err(LifecycleError::StackStartFailed);
        }
        self.state = LifecycleState::StackRunning;
        info!("radio stack running");
        Ok(())
    }

    /// Request a co-processor firmware mode transition.
    ///
    /// "Restart pending" means the co-processor will reset the whole system
    /// imminently: block for the full deadline, and if the reset never
    /// arrives raise [`FatalError::ModeSwitchTimeout`] — continuing with an
    /// inconsistent cross-core state is worse than halting.
    pub async fn ensure_mode(&mut self, mode: CoproMode) -> Result<(), LifecycleError> {
        let _guard = self.core_lock.lock().await;
        self.ensure_mode_inner(mode).await
    }

    async fn ensure_mode_inner(&mut self, mode: CoproMode) -> Result<(), LifecycleError> {
        match self.link.set_mode(mode).await {
            CommandResult::Ok => Ok(()),
            CommandResult::RestartPending => {
                Timer::after(self.config.mode_switch_timeout).await;
                self.fatal.signal(FatalError::ModeSwitchTimeout);
                Err(LifecycleError::Fatal(FatalError::ModeSwitchTimeout))
            }
            CommandResult::Failed(code) => {
                error!("failed to switch co-processor mode: {}", code);
                Err(LifecycleError::ModeSwitchFailed(code))
            }
        }
    }

    fn accept_stack(&mut self, info: &CoproInfo) -> bool {
        let version_ok = info.version_major >= STACK_VERSION_MAJOR_MIN
            && info.version_minor >= STACK_VERSION_MINOR_MIN;
        self.stack = match info.stack_type {
            StackType::BleLight if version_ok => RadioStackKind::Light,
            StackType::BleFull if version_ok => RadioStackKind::Full,
            StackType::BleLight | StackType::BleFull | StackType::Unknown => {
                RadioStackKind::Unknown
            }
        };
        self.stack != RadioStackKind::Unknown
    }

    /// Full teardown/rebuild of the co-processor stack.
    ///
    /// The sequence is strictly ordered; reordering risks leaving the
    /// co-processor unrecoverable. Stages before the final re-initialize are
    /// best-effort (logged, not fatal) except the firmware reset and the
    /// mode-switch wait inside the restart.
    pub async fn reinitialize(&mut self) -> Result<(), LifecycleError> {
        let _guard = self.core_lock.lock().await;
        self.reinitialize_inner().await
    }

    pub(crate) async fn reinitialize_inner(&mut self) -> Result<(), LifecycleError> {
        // Low-power sleep during the teardown would strand the co-processor
        // mid-reset.
        self.power.insomnia_enter();
        let result = self.teardown_and_restart().await;
        self.power.insomnia_exit();
        result
    }

    async fn teardown_and_restart(&mut self) -> Result<(), LifecycleError> {
        info!("disconnect and stop advertising");
        if self.stop_advertising().await.is_err() {
            warn!("advertising did not stop cleanly");
        }

        info!("stop current profile services");
        if let Some(id) = self.registry.active() {
            (self.registry.descriptor(id).stop)();
        }

        self.link.protocol_reset();

        info!("stop BLE background threads");
        self.link.stop_stack_thread();
        self.gap.thread_stop();

        info!("reset co-processor firmware");
        if self.link.reset_firmware().is_err() {
            self.fatal.signal(FatalError::FirmwareResetFailed);
            return Err(LifecycleError::Fatal(FatalError::FirmwareResetFailed));
        }

        Timer::after(self.config.settle_delay).await;
        self.link.stop_transport_thread();

        for domain in BusDomain::BLE_DOMAINS {
            self.power.disable(domain);
        }

        self.registry.clear_active();
        self.stack = RadioStackKind::Unknown;
        self.state = LifecycleState::Idle;

        info!("restart radio stack");
        self.initialize_inner()?;
        self.start_radio_stack_inner().await
    }

    // ── Feature gates and status ─────────────────────────────────────────

    /// The negotiated stack kind.
    #[must_use]
    pub fn radio_stack_kind(&self) -> RadioStackKind {
        self.stack
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state
    }

    /// `true` once [`initialize`] has completed at least once.
    ///
    /// [`initialize`]: BleController::initialize
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// `true` when the negotiated stack provides GATT/GAP.
    #[must_use]
    pub fn is_ble_gatt_gap_supported(&self) -> bool {
        matches!(self.stack, RadioStackKind::Light | RadioStackKind::Full)
    }

    /// `true` when the negotiated stack provides direct test mode.
    #[must_use]
    pub fn is_testing_supported(&self) -> bool {
        self.stack == RadioStackKind::Full
    }

    /// `true` while GAP is in any non-idle state.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gap.state() > GapState::Idle
    }

    /// `true` while a central is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.gap.state() == GapState::Connected
    }

    /// `true` while the co-processor link is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.link.is_alive()
    }

    /// Profile registry, read access.
    #[must_use]
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Profile registry, template mutation (advertised name, MAC, pairing).
    pub fn registry_mut(&mut self) -> &mut ProfileRegistry {
        &mut self.registry
    }

    /// Register the bonding-key storage change callback with the transport.
    pub fn set_key_storage_changed_callback(&mut self, callback: KeyStorageChangedCallback) {
        self.link.set_key_storage_changed_callback(callback);
    }

    // ── Shared NVM region ────────────────────────────────────────────────

    /// Acquire the bonding-key NVM semaphore, spinning with a yield — the
    /// owner is the other core and cannot wake us.
    pub async fn nvm_sram_acquire(&mut self) {
        acquire_spinning(&mut self.hsem, SemaphoreId::BleNvmSram).await;
    }

    /// Release the bonding-key NVM semaphore.
    pub fn nvm_sram_release(&mut self) {
        self.hsem.release(SemaphoreId::BleNvmSram);
    }

    /// Erase the bonded-device security database. Returns `true` on success.
    pub async fn clear_security_db(&mut self) -> bool {
        self.nvm_sram_acquire().await;
        let status = self.link.clear_security_db();
        if status != 0 {
            error!("clear security db failed with status {}", status);
        }
        self.nvm_sram_release();
        status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{ControllerConfig, LifecycleState, STACK_VERSION_MAJOR_MIN};
    use embassy_time::Duration;

    #[test]
    fn test_default_config_deadlines() {
        let config = ControllerConfig::default();
        assert_eq!(config.mode_switch_timeout, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_millis(100));
        assert!(config.copro_start_timeout < config.mode_switch_timeout);
    }

    #[test]
    fn test_lifecycle_states_order_forward() {
        assert!(LifecycleState::StackRunning > LifecycleState::VersionChecked);
        assert!(LifecycleState::VersionChecked > LifecycleState::ModeNegotiated);
        assert!(LifecycleState::ModeNegotiated > LifecycleState::WaitingForCoprocessor);
        assert!(LifecycleState::WaitingForCoprocessor > LifecycleState::BootRequested);
        assert!(LifecycleState::BootRequested > LifecycleState::Idle);
    }

    #[test]
    fn test_minimum_version_is_nonzero() {
        assert!(STACK_VERSION_MAJOR_MIN >= 1);
    }
}
