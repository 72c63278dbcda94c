//! Co-processor hard-fault watchdog.
//!
//! On an unrecoverable internal error the co-processor writes a magic-tagged
//! record at a fixed shared-memory address. A corrupted or crashed
//! co-processor is unsafe to continue beside, so observing that record is
//! fatal to the whole process.
//!
//! The fatal path is modelled as a supervised background task: the watchdog
//! polls the record periodically and, on a match, sends a
//! [`FatalError::CoproHardfault`] through the shared fatal [`Signal`]. The
//! process supervisor consuming the signal performs the actual halt. This
//! keeps "crash is intentional and total" semantics while letting tests
//! inject a fake record and assert the notification fires without
//! terminating the test process.
//!
//! [`Signal`]: embassy_sync::signal::Signal

use embassy_time::{Duration, Timer};
use platform::copro::HardfaultRecord;

use crate::error::FatalError;
use crate::lifecycle::FatalSignal;

/// Default polling interval for the fault record.
pub const HARDFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Read access to the co-processor fault record.
///
/// Separate from [`platform::CoproLink`] because the record lives at a fixed
/// shared-memory address: reading it needs no transport state, and the
/// watchdog must be able to observe it from any lifecycle state while the
/// controller owns the link.
pub trait FaultSource {
    /// Raw read of the fault record region, `None` if unreadable.
    fn hardfault_record(&self) -> Option<HardfaultRecord>;
}

/// Returns `true` when `record` is a genuine co-processor fault.
#[must_use]
pub fn is_hardfault(record: Option<&HardfaultRecord>) -> bool {
    record.is_some_and(HardfaultRecord::is_valid)
}

/// Periodic hard-fault checker.
pub struct HardfaultWatchdog<F: FaultSource> {
    source: F,
    fatal: &'static FatalSignal,
    interval: Duration,
}

impl<F: FaultSource> HardfaultWatchdog<F> {
    /// Build a watchdog polling `source` every [`HARDFAULT_POLL_INTERVAL`].
    pub fn new(source: F, fatal: &'static FatalSignal) -> Self {
        HardfaultWatchdog {
            source,
            fatal,
            interval: HARDFAULT_POLL_INTERVAL,
        }
    }

    /// Override the polling interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Single poll of the fault record. Returns `true` and raises the fatal
    /// signal when a valid record is observed.
    pub fn check_once(&mut self) -> bool {
        let record = self.source.hardfault_record();
        if is_hardfault(record.as_ref()) {
            error!("co-processor hard fault record observed");
            self.fatal.signal(FatalError::CoproHardfault);
            true
        } else {
            false
        }
    }

    /// Poll until a fault is observed, then deliver it and return.
    ///
    /// Spawn this as a background task; it must be able to report from any
    /// lifecycle state.
    pub async fn run(&mut self) -> FatalError {
        loop {
            Timer::after(self.interval).await;
            if self.check_once() {
                return FatalError::CoproHardfault;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::copro::HARDFAULT_MAGIC;

    struct FakeRegion(Option<HardfaultRecord>);

    impl FaultSource for FakeRegion {
        fn hardfault_record(&self) -> Option<HardfaultRecord> {
            self.0
        }
    }

    fn valid_record() -> HardfaultRecord {
        HardfaultRecord {
            magic: HARDFAULT_MAGIC,
            sp: 0x2000_3000,
            lr: 0x0800_AAAA,
            pc: 0x0800_BBBB,
        }
    }

    #[test]
    fn test_no_record_is_not_a_fault() {
        assert!(!is_hardfault(None));
    }

    #[test]
    fn test_wrong_magic_is_not_a_fault() {
        let record = HardfaultRecord {
            magic: 0x1234_5678,
            sp: 0,
            lr: 0,
            pc: 0,
        };
        assert!(!is_hardfault(Some(&record)));
    }

    #[test]
    fn test_valid_record_is_a_fault() {
        assert!(is_hardfault(Some(&valid_record())));
    }

    #[test]
    fn test_check_once_signals_fatal_on_valid_record() {
        static FATAL: FatalSignal = FatalSignal::new();
        let mut watchdog = HardfaultWatchdog::new(FakeRegion(Some(valid_record())), &FATAL);
        assert!(watchdog.check_once());
        assert_eq!(FATAL.try_take(), Some(FatalError::CoproHardfault));
    }

    #[test]
    fn test_check_once_quiet_without_record() {
        static FATAL: FatalSignal = FatalSignal::new();
        let mut watchdog = HardfaultWatchdog::new(FakeRegion(None), &FATAL);
        assert!(!watchdog.check_once());
        assert_eq!(FATAL.try_take(), None);
    }
}
