//! BLE co-processor lifecycle and profile controller.
//!
//! The radio stack runs on a separate, independently-updatable co-processor
//! core reachable only through a shared-memory command channel. This crate
//! is the host-side controller that sits above that channel:
//!
//! - [`lifecycle::BleController`] drives the co-processor through
//!   boot → mode-select → version-check → stack-start, and performs the
//!   strictly-ordered full reinitialization sequence.
//! - [`profile`] holds the fixed table of mutually-exclusive connectivity
//!   profiles (serial transport, HID keyboard) and activates exactly one at
//!   a time.
//! - [`advertising`] starts/stops advertising with a bounded wait for the
//!   co-processor to converge on the requested discoverability state.
//! - [`watchdog`] polls the co-processor's fixed-address hard-fault record
//!   and delivers a fatal notification through a [`Signal`] instead of
//!   aborting from a timer callback, so the trigger is testable in
//!   isolation.
//! - [`diagnostics`] exposes RSSI computation and packet TX/RX test modes.
//!
//! Transient failures surface as `Result`s to the caller; only the fatal
//! signal path may bring the process down, and the supervisor that consumes
//! it is out of scope here.
//!
//! [`Signal`]: embassy_sync::signal::Signal

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]

// Must come first so the log shims are visible to the other modules.
#[macro_use]
mod fmt;

pub mod advertising;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod profile;
pub mod watchdog;

pub use advertising::AdvertisingError;
pub use error::{FatalError, LifecycleError, ProfileError};
pub use lifecycle::{
    BleController, ControllerConfig, ControllerParts, CoreLock, FatalSignal, LifecycleState,
    RadioStackKind,
};
pub use profile::{ProfileDescriptor, ProfileHooks, ProfileId, ProfileRegistry};
pub use watchdog::{FaultSource, HardfaultWatchdog};
