//! Connectivity profile registry.
//!
//! A profile is a named, mutually-exclusive connectivity role with its own
//! advertising/GAP configuration. The registry owns the fixed descriptor
//! table and the "currently active" handle; `no active profile` is a real
//! value ([`Option::None`]), not a null pointer convention.
//!
//! Profile service payloads (serial, HID, battery GATT tables) are external
//! collaborators: the descriptor only carries their start/stop hooks.

use platform::copro::CoproLink;
use platform::gap::{
    ConnectionParams, GapConfig, GapEventCallback, GapLayer, GapPairing, MacAddress, ADV_NAME_MAX,
};
use platform::hsem::HardwareSemaphore;
use platform::identity::DeviceIdentity;
use platform::power::PowerControl;
use platform::settings::BtSettings;

use crate::error::ProfileError;
use crate::lifecycle::{BleController, LifecycleState};

/// Prefix used when synthesizing an advertised name for the HID profile.
pub const HID_NAME_PREFIX: &str = "Control ";

/// GAP appearance code for a keyboard.
const APPEARANCE_KEYBOARD: u16 = 0x03C1;

/// Human Interface Device service UUID.
const HID_SERVICE_UUID: u16 = 0x1812;

/// Identifier of a connectivity profile. Exactly one table entry exists per
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileId {
    /// Serial transport profile.
    Serial,
    /// HID keyboard profile.
    HidKeyboard,
}

impl ProfileId {
    /// Number of profiles in the fixed table.
    pub const COUNT: usize = 2;

    /// All profile identifiers, in table order.
    pub const ALL: [ProfileId; ProfileId::COUNT] = [ProfileId::Serial, ProfileId::HidKeyboard];

    fn index(self) -> usize {
        match self {
            ProfileId::Serial => 0,
            ProfileId::HidKeyboard => 1,
        }
    }
}

/// Start/stop hook for a profile's GATT services.
pub type ProfileHook = fn();

/// Service start/stop hooks supplied by the application at registry
/// construction.
#[derive(Debug, Clone, Copy)]
pub struct ProfileHooks {
    /// Called after GAP init succeeds for this profile.
    pub start: ProfileHook,
    /// Called when the profile's services must be torn down.
    pub stop: ProfileHook,
}

impl ProfileHooks {
    fn noop() -> Self {
        fn nothing() {}
        ProfileHooks {
            start: nothing,
            stop: nothing,
        }
    }
}

/// Immutable-template-plus-mutable-identity descriptor for one profile.
#[derive(Debug, Clone)]
pub struct ProfileDescriptor {
    /// Service start hook.
    pub start: ProfileHook,
    /// Service stop hook.
    pub stop: ProfileHook,
    /// GAP configuration template; MAC and name are merged in at activation.
    pub config: GapConfig,
    /// GAP appearance code advertised by this profile.
    pub appearance: u16,
    /// Service UUID advertised by this profile.
    pub adv_service_uuid: u16,
}

impl ProfileDescriptor {
    fn serial(hooks: ProfileHooks) -> Self {
        let config = GapConfig {
            adv_service_uuid: 0x3080,
            appearance: 0x8600,
            bonding: true,
            pairing: GapPairing::PinCodeShow,
            mac_address: MacAddress::DEFAULT,
            adv_name: heapless::String::new(),
            conn_params: ConnectionParams {
                interval_min: 0x18, // 30 ms
                interval_max: 0x24, // 45 ms
                slave_latency: 0,
                supervision_timeout: 0,
            },
        };
        ProfileDescriptor {
            start: hooks.start,
            stop: hooks.stop,
            appearance: config.appearance,
            adv_service_uuid: config.adv_service_uuid,
            config,
        }
    }

    fn hid_keyboard(hooks: ProfileHooks) -> Self {
        let config = GapConfig {
            adv_service_uuid: HID_SERVICE_UUID,
            appearance: APPEARANCE_KEYBOARD,
            bonding: true,
            pairing: GapPairing::PinCodeVerifyYesNo,
            mac_address: MacAddress::DEFAULT,
            adv_name: heapless::String::new(),
            conn_params: ConnectionParams {
                interval_min: 0x18, // 30 ms
                interval_max: 0x24, // 45 ms
                slave_latency: 0,
                supervision_timeout: 0,
            },
        };
        ProfileDescriptor {
            start: hooks.start,
            stop: hooks.stop,
            appearance: config.appearance,
            adv_service_uuid: config.adv_service_uuid,
            config,
        }
    }
}

/// Fixed table of profile descriptors plus the active-profile handle.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    descriptors: [ProfileDescriptor; ProfileId::COUNT],
    active: Option<ProfileId>,
}

impl ProfileRegistry {
    /// Build the registry with the application's service hooks.
    #[must_use]
    pub fn new(serial: ProfileHooks, hid_keyboard: ProfileHooks) -> Self {
        ProfileRegistry {
            descriptors: [
                ProfileDescriptor::serial(serial),
                ProfileDescriptor::hid_keyboard(hid_keyboard),
            ],
            active: None,
        }
    }

    /// Registry with no-op service hooks; service payloads are wired later
    /// or absent (tests, diagnostics builds).
    #[must_use]
    pub fn without_hooks() -> Self {
        ProfileRegistry::new(ProfileHooks::noop(), ProfileHooks::noop())
    }

    /// Descriptor for `id`.
    #[must_use]
    pub fn descriptor(&self, id: ProfileId) -> &ProfileDescriptor {
        // Indexing is safe: index() is total over a 2-entry table.
        #[allow(clippy::indexing_slicing)]
        &self.descriptors[id.index()]
    }

    fn descriptor_mut(&mut self, id: ProfileId) -> &mut ProfileDescriptor {
        #[allow(clippy::indexing_slicing)]
        &mut self.descriptors[id.index()]
    }

    /// The currently active profile, if any.
    #[must_use]
    pub fn active(&self) -> Option<ProfileId> {
        self.active
    }

    /// Record `id` as active. Called only after a successful activation.
    pub(crate) fn set_active(&mut self, id: ProfileId) {
        self.active = Some(id);
    }

    /// Clear the active handle. Called only by reinitialization.
    pub(crate) fn clear_active(&mut self) {
        self.active = None;
    }

    /// Merge device identity into the profile's configuration template and
    /// return the ready-to-use GAP configuration.
    ///
    /// Serial: advertise with the primary MAC and the device base name.
    /// HID: derive a non-colliding MAC and synthesize a name when the stored
    /// one is too short to be meaningful.
    pub(crate) fn prepare(&mut self, id: ProfileId, primary: MacAddress, base_name: &str) {
        let config = &mut self.descriptor_mut(id).config;
        match id {
            ProfileId::Serial => {
                config.mac_address = primary;
                config.adv_name = truncate_name(base_name);
            }
            ProfileId::HidKeyboard => {
                config.mac_address = derive_hid_mac(config.mac_address, primary);
                if let Some(name) = derive_hid_name(&config.adv_name, base_name) {
                    config.adv_name = name;
                }
            }
        }
    }

    // ── Per-profile template mutation ────────────────────────────────────

    /// Set a profile's advertised name. An empty name clears it so the next
    /// activation re-derives the default.
    pub fn set_adv_name(&mut self, id: ProfileId, name: &str) {
        self.descriptor_mut(id).config.adv_name = truncate_name(name);
    }

    /// A profile's currently configured advertised name.
    #[must_use]
    pub fn adv_name(&self, id: ProfileId) -> &str {
        &self.descriptor(id).config.adv_name
    }

    /// Override a profile's MAC address template.
    pub fn set_mac_address(&mut self, id: ProfileId, mac: MacAddress) {
        self.descriptor_mut(id).config.mac_address = mac;
    }

    /// A profile's currently configured MAC address.
    #[must_use]
    pub fn mac_address(&self, id: ProfileId) -> MacAddress {
        self.descriptor(id).config.mac_address
    }

    /// Override a profile's pairing method.
    pub fn set_pairing_method(&mut self, id: ProfileId, pairing: GapPairing) {
        self.descriptor_mut(id).config.pairing = pairing;
    }

    /// A profile's pairing method.
    #[must_use]
    pub fn pairing_method(&self, id: ProfileId) -> GapPairing {
        self.descriptor(id).config.pairing
    }
}

/// MAC derivation policy for the HID profile.
///
/// The HID profile must not advertise with the device's primary MAC (both
/// profiles may be bonded on the same peer) nor with a placeholder. On
/// collision, copy the primary MAC and bump its third octet so the derived
/// address is unique but still recognizably ours.
#[must_use]
pub fn derive_hid_mac(configured: MacAddress, primary: MacAddress) -> MacAddress {
    if configured == primary || configured.is_zero() || configured == MacAddress::DEFAULT {
        let mut mac = primary;
        mac.0[2] = mac.0[2].wrapping_add(1);
        mac
    } else {
        configured
    }
}

/// Name derivation policy for the HID profile.
///
/// Returns `Some(new_name)` when the stored name has fewer than 2
/// meaningful characters: a fixed prefix plus the device base name,
/// truncated to [`ADV_NAME_MAX`]. Returns `None` to keep the stored name.
#[must_use]
pub fn derive_hid_name(
    current: &str,
    base_name: &str,
) -> Option<heapless::String<ADV_NAME_MAX>> {
    if current.chars().count() >= 2 {
        return None;
    }
    let mut name: heapless::String<ADV_NAME_MAX> = heapless::String::new();
    for ch in HID_NAME_PREFIX.chars().chain(base_name.chars()) {
        if name.push(ch).is_err() {
            break;
        }
    }
    Some(name)
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
    /// Activate a profile: merge device identity into its template,
    /// initialize GAP with the merged configuration, start its services.
    ///
    /// Fails closed when the stack is not running or does not support
    /// GATT/GAP. Exactly one profile may be active: switching requires
    /// [`change_app`], which reinitializes first — `start_app` refuses to
    /// stack a second activation on top of a live one.
    ///
    /// [`change_app`]: BleController::change_app
    pub fn start_app(
        &mut self,
        id: ProfileId,
        callback: GapEventCallback,
    ) -> Result<(), ProfileError> {
        if self.registry.active().is_some() {
            error!("can't start profile - another profile is active");
            return Err(ProfileError::AlreadyActive);
        }
        if self.state != LifecycleState::StackRunning || !self.link.is_stack_ready() {
            error!("can't start profile - radio stack did not start");
            return Err(ProfileError::StackNotRunning);
        }
        if !self.is_ble_gatt_gap_supported() {
            error!("can't start profile - unsupported radio stack");
            return Err(ProfileError::UnsupportedStack);
        }

        let primary = self.identity.ble_mac();
        let base_name = self.identity.device_name();
        self.registry.prepare(id, primary, base_name);

        let config = self.registry.descriptor(id).config.clone();
        if !self.gap.init(&config, callback) {
            error!("failed to init GAP");
            self.gap.thread_stop();
            return Err(ProfileError::GapInitFailed);
        }

        (self.registry.descriptor(id).start)();
        self.registry.set_active(id);
        Ok(())
    }

    /// Switch to another profile: full reinitialization, then activation.
    /// Succeeds only if the subsequent activation succeeds.
    pub async fn change_app(
        &mut self,
        id: ProfileId,
        callback: GapEventCallback,
    ) -> Result<(), ProfileError> {
        self.reinitialize().await?;
        self.start_app(id, callback)
    }
}

/// Copy `name` into a bounded string, truncating at [`ADV_NAME_MAX`].
#[must_use]
pub fn truncate_name(name: &str) -> heapless::String<ADV_NAME_MAX> {
    let mut out: heapless::String<ADV_NAME_MAX> = heapless::String::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
