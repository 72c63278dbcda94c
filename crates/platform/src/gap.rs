//! GAP layer abstraction and configuration types.
//!
//! The GAP/GATT implementation itself (service tables, ATT plumbing) is an
//! external collaborator. This module defines the configuration payload the
//! lifecycle controller hands to it and the narrow control surface the
//! controller drives: init, state query, discoverability, advertising and
//! per-connection RSSI.

/// Maximum advertised-name length in characters.
pub const ADV_NAME_MAX: usize = 22;

/// A 6-byte Bluetooth device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// All-zero placeholder address.
    pub const EMPTY: MacAddress = MacAddress([0; 6]);

    /// Factory default placeholder baked into profile templates.
    pub const DEFAULT: MacAddress = MacAddress([0x6C, 0x7A, 0xD8, 0xAC, 0x57, 0x72]);

    /// Returns `true` for the all-zero placeholder.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }

    /// The address with its byte order reversed (wire order vs. display
    /// order differ between stacks).
    #[must_use]
    pub fn reversed(&self) -> MacAddress {
        let mut out = self.0;
        out.reverse();
        MacAddress(out)
    }
}

/// Pairing policy for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapPairing {
    /// Show a PIN code on the device, peer types it.
    PinCodeShow,
    /// Show a PIN code on both sides, operator confirms the match.
    PinCodeVerifyYesNo,
    /// No pairing (open link).
    None,
}

/// Connection interval bounds and link supervision parameters.
///
/// Intervals are in the protocol's native 1.25 ms units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionParams {
    /// Minimum connection interval.
    pub interval_min: u16,
    /// Maximum connection interval.
    pub interval_max: u16,
    /// Number of connection events the slave may skip.
    pub slave_latency: u16,
    /// Supervision timeout, 0 to use the stack default.
    pub supervision_timeout: u16,
}

/// GAP configuration merged from a profile template and device identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapConfig {
    /// Service UUID placed in the advertising payload.
    pub adv_service_uuid: u16,
    /// GAP appearance code.
    pub appearance: u16,
    /// Whether bonding is allowed.
    pub bonding: bool,
    /// Pairing policy.
    pub pairing: GapPairing,
    /// Device address to advertise with.
    pub mac_address: MacAddress,
    /// Human-readable advertised name.
    pub adv_name: heapless::String<ADV_NAME_MAX>,
    /// Connection parameter bounds.
    pub conn_params: ConnectionParams,
}

/// Advertising / connection state as reported by the GAP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapState {
    /// Not advertising, no connection.
    Idle,
    /// Advertising start requested.
    StartingAdv,
    /// Actively advertising.
    Advertising,
    /// Advertising stop requested.
    StoppingAdv,
    /// A central is connected.
    Connected,
}

/// Events the GAP layer delivers to the profile's event callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapEvent {
    /// A central connected.
    Connected,
    /// The central disconnected.
    Disconnected,
    /// Advertising started.
    AdvertisingStarted,
    /// Advertising stopped.
    AdvertisingStopped,
    /// The pairing PIN code to display.
    PinCodeShow(u32),
    /// The pairing PIN code to confirm.
    PinCodeVerify(u32),
}

/// Profile event callback registered at GAP init.
pub type GapEventCallback = fn(GapEvent);

/// Control surface of the GAP layer.
pub trait GapLayer {
    /// Initialize GAP with the merged profile configuration.
    /// Returns `false` on failure; the caller must then stop the GAP thread.
    fn init(&mut self, config: &GapConfig, callback: GapEventCallback) -> bool;

    /// Stop the GAP background thread.
    fn thread_stop(&mut self);

    /// Current advertising/connection state.
    fn state(&self) -> GapState;

    /// Request the discoverability flag.
    fn set_discoverable(&mut self, discoverable: bool);

    /// Discoverability flag as currently applied by the co-processor.
    fn discoverable(&self) -> bool;

    /// Begin advertising with the configuration given at init.
    fn start_advertising(&mut self);

    /// Stop advertising.
    fn stop_advertising(&mut self);

    /// RSSI of the current connection: `(timestamp, rssi_dbm)`.
    /// A timestamp of 0 means no measurement has been taken.
    fn remote_conn_rssi(&mut self) -> (u32, i8);
}

#[cfg(test)]
mod tests {
    use super::{GapState, MacAddress};

    #[test]
    fn test_mac_zero_detection() {
        assert!(MacAddress::EMPTY.is_zero());
        assert!(!MacAddress::DEFAULT.is_zero());
    }

    #[test]
    fn test_mac_reversed_round_trip() {
        let mac = MacAddress([1, 2, 3, 4, 5, 6]);
        assert_eq!(mac.reversed().0, [6, 5, 4, 3, 2, 1]);
        assert_eq!(mac.reversed().reversed(), mac);
    }

    #[test]
    fn test_gap_state_idle_orders_below_active_states() {
        // The controller uses `state > Idle` as the "any active state" check.
        assert!(GapState::Advertising > GapState::Idle);
        assert!(GapState::Connected > GapState::Idle);
        assert!(GapState::StartingAdv > GapState::Idle);
    }
}
