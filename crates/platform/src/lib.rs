//! Hardware abstraction layer for the BLE co-processor controller.
//!
//! This crate provides trait-based abstractions for everything the lifecycle
//! controller talks to, enabling development and testing without physical
//! hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (out of scope)
//!         ↓
//! Lifecycle/Profile controller (ble-control crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (shared-memory transport, HSEM, RCC, GAP stack glue)
//! ```
//!
//! # Abstractions
//!
//! - [`CoproLink`] - the opaque command/response channel to the co-processor
//! - [`GapLayer`] - discoverability, advertising, connection parameters
//! - [`HardwareSemaphore`] - inter-core hardware semaphores
//! - [`PowerControl`] - bus domain gating and stay-awake mode
//! - [`BtSettings`] - persisted discoverability preference
//! - [`DeviceIdentity`] - primary MAC address and device base name
//!
//! # Features
//!
//! - `std`: Enable standard library support (for testing)
//! - `defmt`: Enable defmt logging derives

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
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod copro;
pub mod gap;
pub mod hsem;
pub mod identity;
pub mod power;
pub mod settings;

pub use copro::{
    CommandResult, CoproInfo, CoproLink, CoproMode, HardfaultRecord, LinkError,
    LocalVersionInfo, StackType, HARDFAULT_MAGIC,
};
pub use gap::{
    ConnectionParams, GapConfig, GapEvent, GapEventCallback, GapLayer, GapPairing, GapState,
    MacAddress, ADV_NAME_MAX,
};
pub use hsem::{HardwareSemaphore, SemaphoreId};
pub use identity::DeviceIdentity;
pub use power::{BusDomain, PowerControl};
pub use settings::BtSettings;
