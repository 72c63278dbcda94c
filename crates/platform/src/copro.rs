//! Co-processor command channel abstraction.
//!
//! The radio stack runs on a second core reachable only through a
//! shared-memory transport. This module models that transport as an opaque
//! request/response channel plus a handful of read-only diagnostics
//! primitives. The transport's own framing, retries and interrupt plumbing
//! live behind the [`CoproLink`] trait and are not implemented here.

use embassy_time::Duration;

/// Magic value the co-processor writes into its fixed-address fault record
/// when it crashes. Anything else at that address is garbage.
pub const HARDFAULT_MAGIC: u32 = 0x1170_FD0F;

/// Kind of radio stack firmware reported by the co-processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackType {
    /// Firmware did not identify itself as a known BLE variant.
    Unknown,
    /// BLE link layer + host, reduced feature set.
    BleLight,
    /// Full BLE stack including direct-test-mode support.
    BleFull,
}

/// Version and type information read from the co-processor after boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoproInfo {
    /// Reported firmware flavour.
    pub stack_type: StackType,
    /// Stack major version.
    pub version_major: u8,
    /// Stack minor version.
    pub version_minor: u8,
}

/// Firmware modes the co-processor can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoproMode {
    /// Firmware-upgrade service mode.
    FirmwareUpgrade,
    /// Radio stack mode.
    Stack,
}

/// Outcome of a co-processor mode-switch or control command.
///
/// A closed set so call sites pattern-match exhaustively instead of
/// comparing ad hoc integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandResult {
    /// The command completed and the requested state is in effect.
    Ok,
    /// The co-processor accepted the command but will reset the whole
    /// system to complete it. The host must wait for that reset.
    RestartPending,
    /// The command failed with a transport-level status code.
    Failed(u8),
}

/// Fixed-address structure the co-processor writes on an unrecoverable
/// internal error. Read-only from the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardfaultRecord {
    /// Must equal [`HARDFAULT_MAGIC`] for the record to be meaningful.
    pub magic: u32,
    /// Faulting stack pointer.
    pub sp: u32,
    /// Link register at the time of the fault.
    pub lr: u32,
    /// Program counter at the time of the fault.
    pub pc: u32,
}

impl HardfaultRecord {
    /// Returns `true` when the magic constant matches, i.e. the co-processor
    /// actually wrote this record.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.magic == HARDFAULT_MAGIC
    }
}

/// Local controller version fields, for the operator status dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalVersionInfo {
    /// HCI version.
    pub hci_version: u8,
    /// HCI revision.
    pub hci_revision: u16,
    /// Link-manager protocol version.
    pub lmp_version: u8,
    /// Controller manufacturer identifier.
    pub manufacturer: u16,
    /// Link-manager protocol subversion.
    pub lmp_subversion: u16,
}

/// Errors reported by the transport for operations that can fail hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The transport rejected or lost the command.
    #[error("co-processor command failed")]
    CommandFailed,
    /// The co-processor did not acknowledge within its own deadline.
    #[error("co-processor did not respond")]
    NoResponse,
}

/// Callback invoked by the transport when the co-processor reports that the
/// bonding-key storage region changed. The slice is the updated region.
pub type KeyStorageChangedCallback = fn(&[u8]);

/// Opaque command/response channel to the co-processor.
///
/// Implementations own the shared-memory mailboxes and the transport
/// thread. All methods that wait on the other core are `async`; everything
/// else is a plain register/mailbox poke.
pub trait CoproLink {
    /// Kick off the co-processor boot sequence. Idempotent.
    fn boot(&mut self);

    /// Wait until the co-processor signals readiness, bounded by `timeout`.
    /// Returns `false` on timeout.
    async fn wait_ready(&mut self, timeout: Duration) -> bool;

    /// Request a firmware mode transition.
    async fn set_mode(&mut self, mode: CoproMode) -> CommandResult;

    /// Type/version info as reported by the running firmware.
    fn info(&self) -> CoproInfo;

    /// Start the radio stack firmware. Returns `false` on failure.
    fn start_stack(&mut self) -> bool;

    /// `true` once the radio stack has completed its own initialization.
    fn is_stack_ready(&self) -> bool;

    /// `true` while the transport link to the co-processor is alive.
    fn is_alive(&self) -> bool;

    /// Issue a protocol-level reset command (drops all controller state).
    fn protocol_reset(&mut self);

    /// Reset the co-processor firmware itself so it can be re-started.
    fn reset_firmware(&mut self) -> Result<(), LinkError>;

    /// Stop the transport background thread.
    fn stop_transport_thread(&mut self);

    /// Stop the radio-stack background thread.
    fn stop_stack_thread(&mut self);

    /// Raw read of the fixed-address fault record, `None` if the region is
    /// unreadable. Callers must still validate the magic.
    fn hardfault_record(&self) -> Option<HardfaultRecord>;

    /// Register the bonding-key storage change callback.
    fn set_key_storage_changed_callback(&mut self, callback: KeyStorageChangedCallback);

    // ── Diagnostics / test-mode primitives ──────────────────────────────

    /// Read the raw 3-byte RSSI sample (magnitude lo, magnitude hi, AGC).
    fn read_raw_rssi(&mut self) -> Option<[u8; 3]>;

    /// Local controller version fields, `None` if the stack is not up.
    fn local_version(&mut self) -> Option<LocalVersionInfo>;

    /// Set the transmit power level used by the tone test.
    fn set_tx_power(&mut self, level: u8);

    /// Start an unmodulated carrier on `channel`.
    fn tone_start(&mut self, channel: u8);

    /// Stop the carrier test.
    fn tone_stop(&mut self);

    /// Start the packet transmitter test sequence.
    fn packet_tx_start(&mut self, channel: u8, pattern: u8, datarate: u8);

    /// Start the packet receiver test sequence.
    fn packet_rx_start(&mut self, channel: u8, datarate: u8);

    /// End the running packet test, returning the packet counter.
    fn packet_test_end(&mut self) -> u16;

    /// Number of packets sent by the transmitter test so far.
    fn transmitted_packets(&mut self) -> u32;

    /// Start raw receive on `channel`.
    fn rx_start(&mut self, channel: u8);

    /// Stop raw receive.
    fn rx_stop(&mut self);

    /// Upload the custom (non-connectable) advertising payload.
    /// Returns the controller status code, `0` on success.
    fn beacon_set_data(&mut self, data: &[u8]) -> u8;

    /// Start custom advertising. Intervals are in 0.625 ms ticks.
    /// Returns the controller status code, `0` on success.
    #[allow(clippy::too_many_arguments)]
    fn beacon_start(
        &mut self,
        min_interval: u16,
        max_interval: u16,
        channel_mask: u8,
        mac_type: u8,
        mac: [u8; 6],
        power: u8,
    ) -> u8;

    /// Stop custom advertising. Returns the controller status code.
    fn beacon_stop(&mut self) -> u8;

    /// Erase the bonded-device security database. Returns the controller
    /// status code, `0` on success. Callers must hold the NVM semaphore.
    fn clear_security_db(&mut self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::{CommandResult, HardfaultRecord, HARDFAULT_MAGIC};

    #[test]
    fn test_hardfault_record_valid_magic() {
        let record = HardfaultRecord {
            magic: HARDFAULT_MAGIC,
            sp: 0x2000_0400,
            lr: 0x0800_1235,
            pc: 0x0800_2000,
        };
        assert!(record.is_valid());
    }

    #[test]
    fn test_hardfault_record_garbage_magic() {
        let record = HardfaultRecord {
            magic: 0xDEAD_BEEF,
            sp: 0,
            lr: 0,
            pc: 0,
        };
        assert!(!record.is_valid());
    }

    #[test]
    fn test_command_result_failed_carries_code() {
        let result = CommandResult::Failed(0x42);
        match result {
            CommandResult::Failed(code) => assert_eq!(code, 0x42),
            CommandResult::Ok | CommandResult::RestartPending => {
                unreachable!("constructed Failed above")
            }
        }
    }
}
