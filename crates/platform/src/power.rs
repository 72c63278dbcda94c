//! Bus domain gating and stay-awake control.

/// Hardware bus domains the BLE subsystem depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusDomain {
    /// Hardware semaphore block.
    Hsem,
    /// Inter-processor communication controller.
    Ipcc,
    /// AES accelerator shared with the radio stack.
    Aes2,
    /// Public-key accelerator.
    Pka,
    /// CRC unit.
    Crc,
}

impl BusDomain {
    /// All domains required by the BLE subsystem, in enable order.
    pub const BLE_DOMAINS: [BusDomain; 5] = [
        BusDomain::Hsem,
        BusDomain::Ipcc,
        BusDomain::Aes2,
        BusDomain::Pka,
        BusDomain::Crc,
    ];
}

/// Power and clock gating control.
pub trait PowerControl {
    /// Enable a bus domain clock. Idempotent.
    fn enable(&mut self, domain: BusDomain);

    /// Disable a bus domain clock.
    fn disable(&mut self, domain: BusDomain);

    /// Enter stay-awake mode: the device must not drop into low-power sleep
    /// while a teardown/rebuild sequence is in flight.
    fn insomnia_enter(&mut self);

    /// Leave stay-awake mode.
    fn insomnia_exit(&mut self);
}
