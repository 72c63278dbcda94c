//! Error taxonomy for the lifecycle/profile controller.
//!
//! Three classes, mirroring how callers are expected to react:
//!
//! - *Transient/reported*: returned as `Result`s; the caller decides whether
//!   to retry, degrade, or surface an operator message.
//! - *Escalating/fatal*: [`FatalError`] values delivered through the fatal
//!   signal. Cross-core invariants can no longer be trusted; the process
//!   supervisor halts the system.
//! - *Silent no-op*: operations invoked in an invalid precondition state
//!   (e.g. stop-advertising while idle) return `Ok` without doing anything —
//!   redundant calls from independent callers are not errors.

use thiserror_no_std::Error;

/// Conditions after which continuing beside the co-processor is unsafe.
///
/// These are delivered through the controller's fatal [`Signal`] rather
/// than by aborting from the detection site, keeping the triggers testable.
///
/// [`Signal`]: embassy_sync::signal::Signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// The co-processor wrote a valid hard-fault record.
    CoproHardfault,
    /// A mode switch reported "restart pending" but the expected external
    /// reset never happened within the deadline.
    ModeSwitchTimeout,
    /// Co-processor firmware reset failed during reinitialization.
    FirmwareResetFailed,
}

/// Reported (non-fatal) lifecycle failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleError {
    /// The CLK48 configuration semaphore could not be claimed.
    #[error("failed to claim CLK48 config semaphore")]
    SemaphoreClaimFailed,
    /// The co-processor did not signal readiness before the start timeout.
    #[error("co-processor start timed out")]
    CoproStartTimeout,
    /// A mode switch failed with a transport status code.
    #[error("mode switch failed with status {0}")]
    ModeSwitchFailed(u8),
    /// The reported stack type/version is not a supported BLE variant.
    /// The co-processor link remains usable for other purposes.
    #[error("unsupported radio stack")]
    UnsupportedStack,
    /// The radio stack refused to start.
    #[error("radio stack failed to start")]
    StackStartFailed,
    /// A fatal condition was raised while this operation was in flight.
    /// The fatal signal already carries the detail.
    #[error("fatal condition raised: {0:?}")]
    Fatal(FatalError),
}

/// Reported profile activation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileError {
    /// The radio stack has not reached the running state.
    #[error("radio stack is not running")]
    StackNotRunning,
    /// The running stack does not support GATT/GAP.
    #[error("radio stack does not support GATT/GAP")]
    UnsupportedStack,
    /// A profile is already active; switching requires `change_app`,
    /// which reinitializes first.
    #[error("a profile is already active")]
    AlreadyActive,
    /// GAP layer initialization failed; its thread has been stopped.
    #[error("GAP init failed")]
    GapInitFailed,
    /// The reinitialization preceding a profile change failed.
    #[error("reinitialization failed: {0}")]
    Reinit(#[from] LifecycleError),
}
