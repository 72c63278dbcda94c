//! Device identity: factory MAC address and base device name.

use crate::gap::MacAddress;

/// Factory-provisioned identity of this device.
pub trait DeviceIdentity {
    /// The device's primary BLE MAC address.
    fn ble_mac(&self) -> MacAddress;

    /// The device's base name, used to derive advertised names.
    fn device_name(&self) -> &str;
}
