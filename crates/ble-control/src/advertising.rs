//! Advertising and discoverability control.
//!
//! Starting advertising first pushes the persisted discoverability
//! preference to the co-processor and waits for it to report the flag back,
//! because the advertising payload is assembled on the other core from the
//! flag's value at start time.
//!
//! The convergence waits are bounded: the poll yields each iteration and
//! gives up with [`AdvertisingError::FailedToConverge`] after the configured
//! timeout, leaving retry-or-escalate to the call site. (The previous
//! unbounded wait had no escape if the co-processor never converged.)

use embassy_futures::yield_now;
use embassy_time::Instant;

use platform::copro::CoproLink;
use platform::gap::{GapLayer, GapState};
use platform::hsem::HardwareSemaphore;
use platform::identity::DeviceIdentity;
use platform::power::PowerControl;
use platform::settings::BtSettings;

use crate::lifecycle::BleController;

/// Advertising control failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingError {
    /// The co-processor did not converge on the requested state within the
    /// configured bound.
    #[error("co-processor failed to converge on requested advertising state")]
    FailedToConverge,
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
    /// Start advertising with the persisted discoverability preference.
    ///
    /// No-op unless the GAP state is exactly idle — a second call while
    /// advertising (or connected) returns `Ok` without touching anything,
    /// so redundant calls from independent callers are harmless.
    pub async fn start_advertising(&mut self) -> Result<(), AdvertisingError> {
        if self.gap.state() != GapState::Idle {
            return Ok(());
        }

        let discoverable = self.settings.is_discoverable();
        self.gap.set_discoverable(discoverable);
        self.converge(|gap| gap.discoverable() == discoverable).await?;
        self.gap.start_advertising();
        Ok(())
    }

    /// Stop advertising and wait for GAP to return to idle.
    ///
    /// No-op when nothing is active.
    pub async fn stop_advertising(&mut self) -> Result<(), AdvertisingError> {
        if !self.is_active() {
            return Ok(());
        }

        self.gap.stop_advertising();
        self.converge(|gap| gap.state() == GapState::Idle).await
    }

    /// Set the co-processor discoverability flag. No-op unless a stack is
    /// active.
    pub fn set_discoverable(&mut self, discoverable: bool) {
        if self.is_active() {
            debug!("setting discoverable to {}", discoverable);
            self.gap.set_discoverable(discoverable);
        }
    }

    /// Read the discoverability flag; reports not-discoverable unless a
    /// stack is active.
    #[must_use]
    pub fn discoverable(&self) -> bool {
        self.is_active() && self.gap.discoverable()
    }

    /// Poll until `reached` holds, yielding each iteration, bounded by the
    /// configured convergence timeout.
    async fn converge(&mut self, reached: impl Fn(&G) -> bool) -> Result<(), AdvertisingError> {
        let deadline = Instant::now() + self.config.adv_converge_timeout;
        while !reached(&self.gap) {
            if Instant::now() >= deadline {
                warn!("advertising state failed to converge");
                return Err(AdvertisingError::FailedToConverge);
            }
            yield_now().await;
        }
        Ok(())
    }
}
