//! Persisted Bluetooth settings.

/// Read access to the persisted Bluetooth preferences.
///
/// Storage itself (flash layout, serialization) is an external collaborator;
/// the controller only ever reads the discoverability preference when
/// advertising starts.
pub trait BtSettings {
    /// Whether the operator wants the device discoverable.
    fn is_discoverable(&self) -> bool;
}
