//! Diagnostics surface: RSSI, packet test modes, custom advertising,
//! operator state dump.
//!
//! Read-only or test-only operations layered on an active stack. Nothing
//! here escalates to fatal, and nothing takes the core lock — these paths
//! never mutate co-processor boot/reset state.

use core::fmt::Write;

use platform::copro::CoproLink;
use platform::gap::GapLayer;
use platform::hsem::HardwareSemaphore;
use platform::identity::DeviceIdentity;
use platform::power::PowerControl;
use platform::settings::BtSettings;

use crate::lifecycle::BleController;

/// Sentinel for an invalid or unreadable RSSI sample, in dBm.
pub const RSSI_INVALID: f32 = -127.0;

/// Advertising channel mask selecting all three primary channels (37/38/39).
pub const ADV_CHANNEL_MASK_ALL: u8 = 0b0000_0111;

/// Remote RSSI value meaning "no measurement available".
const CONN_RSSI_UNAVAILABLE: i8 = 127;

/// Convert a raw 3-byte RSSI sample to dBm.
///
/// The sample layout is magnitude low byte, magnitude high byte, AGC step.
/// The correction is the controller vendor's piecewise-linear fit: a 6 dB
/// step per AGC stage and per magnitude halving above 30, plus a fixed-point
/// residual `(417*m + 18080) >> 10`.
///
/// Returns exactly [`RSSI_INVALID`] for a zero magnitude or an AGC step
/// above 11.
#[must_use]
pub fn rssi_from_raw(raw: [u8; 3]) -> f32 {
    let agc = raw[2];
    let mut magnitude = i32::from(u16::from_le_bytes([raw[0], raw[1]]));

    if magnitude == 0 || agc > 11 {
        return RSSI_INVALID;
    }

    let mut value = f32::from(agc) * 6.0 - 127.0;
    while magnitude > 30 {
        value += 6.0;
        magnitude >>= 1;
    }
    value += ((417 * magnitude + 18_080) >> 10) as f32;
    value
}

/// Convert an interval in milliseconds to the protocol's 0.625 ms ticks,
/// saturating at the field width.
#[must_use]
pub fn ms_to_adv_ticks(ms: u16) -> u16 {
    let ticks = u32::from(ms) * 1000 / 625;
    u16::try_from(ticks).unwrap_or(u16::MAX)
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
    /// Current receiver RSSI in dBm, [`RSSI_INVALID`] when no valid sample
    /// is available.
    pub fn rssi(&mut self) -> f32 {
        self.link.read_raw_rssi().map_or(RSSI_INVALID, rssi_from_raw)
    }

    /// RSSI of the current connection: `(update timestamp, |rssi| dBm)`.
    ///
    /// `None` when the remote reports no valid RSSI or the measurement has
    /// never been updated.
    pub fn connection_rssi(&mut self) -> Option<(u32, u8)> {
        let (timestamp, rssi) = self.gap.remote_conn_rssi();
        if rssi == CONN_RSSI_UNAVAILABLE || timestamp == 0 {
            None
        } else {
            Some((timestamp, rssi.unsigned_abs()))
        }
    }

    // ── Packet/tone test modes ───────────────────────────────────────────

    /// Start an unmodulated carrier on `channel` at `power`.
    pub fn start_tone_tx(&mut self, channel: u8, power: u8) {
        self.link.set_tx_power(power);
        self.link.tone_start(channel);
    }

    /// Stop the carrier test.
    pub fn stop_tone_tx(&mut self) {
        self.link.tone_stop();
    }

    /// Start the packet transmitter test sequence.
    pub fn start_packet_tx(&mut self, channel: u8, pattern: u8, datarate: u8) {
        self.link.packet_tx_start(channel, pattern, datarate);
    }

    /// Start the packet receiver test sequence.
    pub fn start_packet_rx(&mut self, channel: u8, datarate: u8) {
        self.link.packet_rx_start(channel, datarate);
    }

    /// End the running packet test, returning the packet counter.
    pub fn stop_packet_test(&mut self) -> u16 {
        self.link.packet_test_end()
    }

    /// Number of packets sent by the transmitter test so far.
    pub fn transmitted_packets(&mut self) -> u32 {
        self.link.transmitted_packets()
    }

    /// Start raw receive on `channel`.
    pub fn start_rx(&mut self, channel: u8) {
        self.link.rx_start(channel);
    }

    /// Stop raw receive.
    pub fn stop_rx(&mut self) {
        self.link.rx_stop();
    }

    // ── Custom (non-connectable) advertising ─────────────────────────────

    /// Upload the custom advertising payload. Returns `true` on success.
    pub fn custom_adv_set(&mut self, data: &[u8]) -> bool {
        let status = self.link.beacon_set_data(data);
        if status != 0 {
            error!("custom adv set failed with status {}", status);
            return false;
        }
        debug!("custom adv set");
        true
    }

    /// Start custom advertising on all three primary channels.
    ///
    /// Intervals are in milliseconds and converted to the protocol's
    /// 0.625 ms ticks. Returns `true` on success.
    pub fn custom_adv_start(
        &mut self,
        min_interval_ms: u16,
        max_interval_ms: u16,
        mac_type: u8,
        mac: [u8; 6],
        power: u8,
    ) -> bool {
        let status = self.link.beacon_start(
            ms_to_adv_ticks(min_interval_ms),
            ms_to_adv_ticks(max_interval_ms),
            ADV_CHANNEL_MASK_ALL,
            mac_type,
            mac,
            power,
        );
        if status != 0 {
            error!("custom adv start failed with status {}", status);
            return false;
        }
        debug!("custom adv start");
        true
    }

    /// Stop custom advertising. Returns `true` on success.
    pub fn custom_adv_stop(&mut self) -> bool {
        let status = self.link.beacon_stop();
        if status != 0 {
            error!("custom adv stop failed with status {}", status);
            return false;
        }
        debug!("custom adv stop");
        true
    }

    /// Write a human-readable status line for operator display.
    ///
    /// Format is for humans, not machine parsing.
    pub fn dump_state(&mut self, out: &mut impl Write) -> core::fmt::Result {
        if !self.is_alive() {
            return out.write_str("BLE not ready");
        }
        match self.link.local_version() {
            Some(version) => write!(
                out,
                "HCI version: {}.{}, LMP version: {}.{}, manufacturer: {}",
                version.hci_version,
                version.hci_revision,
                version.lmp_version,
                version.lmp_subversion,
                version.manufacturer,
            ),
            None => out.write_str("BLE not ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ms_to_adv_ticks, rssi_from_raw, ADV_CHANNEL_MASK_ALL, RSSI_INVALID};

    #[test]
    fn test_rssi_zero_magnitude_is_sentinel() {
        assert_eq!(rssi_from_raw([0, 0, 0]), RSSI_INVALID);
    }

    #[test]
    fn test_rssi_agc_out_of_range_is_sentinel() {
        // AGC step 12 and above is invalid regardless of magnitude.
        assert_eq!(rssi_from_raw([0x40, 0x00, 12]), RSSI_INVALID);
        assert_eq!(rssi_from_raw([0xFF, 0xFF, 200]), RSSI_INVALID);
    }

    #[test]
    fn test_rssi_agc_eleven_is_still_valid() {
        assert_ne!(rssi_from_raw([10, 0, 11]), RSSI_INVALID);
    }

    #[test]
    fn test_rssi_small_magnitude() {
        // magnitude 10, AGC 3: 3*6-127 = -109, residual (417*10+18080)>>10 = 21
        assert_eq!(rssi_from_raw([10, 0, 3]), -88.0);
    }

    #[test]
    fn test_rssi_halving_ladder() {
        // magnitude 64, AGC 0: two halvings above 30 add 12 dB, leaving 16;
        // residual (417*16+18080)>>10 = 24 → -127 + 12 + 24 = -91
        assert_eq!(rssi_from_raw([64, 0, 0]), -91.0);
    }

    #[test]
    fn test_adv_tick_conversion() {
        assert_eq!(ms_to_adv_ticks(100), 160);
        assert_eq!(ms_to_adv_ticks(20), 32);
        assert_eq!(ms_to_adv_ticks(1000), 1600);
    }

    #[test]
    fn test_adv_tick_conversion_saturates() {
        // 65535 ms would be 104856 ticks — beyond the u16 field.
        assert_eq!(ms_to_adv_ticks(u16::MAX), u16::MAX);
    }

    #[test]
    fn test_channel_mask_selects_three_channels() {
        assert_eq!(ADV_CHANNEL_MASK_ALL.count_ones(), 3);
    }
}
