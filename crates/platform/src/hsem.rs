//! Inter-core hardware semaphores.
//!
//! These gate access to shared memory regions between the two cores. They
//! are distinct from the host-side core lock: the owner may be the other
//! core, which cannot signal a waiting host task, so acquisition spins with
//! a scheduler yield instead of blocking.

use embassy_futures::yield_now;

/// Hardware semaphore identifiers used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SemaphoreId {
    /// Ownership of the CLK48 clock-domain configuration.
    Clk48Config,
    /// The non-volatile bonding-key region in shared SRAM.
    BleNvmSram,
}

/// Hardware semaphore bank shared with the co-processor.
pub trait HardwareSemaphore {
    /// One-step lock attempt. Returns `true` when the semaphore is held by
    /// this core afterwards (including when it was already held by us).
    fn try_take(&mut self, id: SemaphoreId) -> bool;

    /// Release a semaphore taken by this core.
    fn release(&mut self, id: SemaphoreId);
}

/// Spin until `id` is acquired, yielding to the scheduler between attempts.
///
/// The semaphore owner is a non-cooperating core with no wake signal, so a
/// blocking wait is impossible; the yield keeps other host tasks runnable.
pub async fn acquire_spinning<H: HardwareSemaphore>(hsem: &mut H, id: SemaphoreId) {
    while !hsem.try_take(id) {
        yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::{acquire_spinning, HardwareSemaphore, SemaphoreId};

    /// Semaphore that refuses the first `refusals` attempts.
    struct Stubborn {
        refusals: u32,
        attempts: u32,
    }

    impl HardwareSemaphore for Stubborn {
        fn try_take(&mut self, _id: SemaphoreId) -> bool {
            self.attempts += 1;
            self.attempts > self.refusals
        }

        fn release(&mut self, _id: SemaphoreId) {}
    }

    #[tokio::test]
    async fn test_acquire_spins_until_granted() {
        let mut hsem = Stubborn {
            refusals: 3,
            attempts: 0,
        };
        acquire_spinning(&mut hsem, SemaphoreId::BleNvmSram).await;
        assert_eq!(
            hsem.attempts, 4,
            "must retry exactly until the first granted attempt"
        );
    }

    #[tokio::test]
    async fn test_acquire_immediate_when_free() {
        let mut hsem = Stubborn {
            refusals: 0,
            attempts: 0,
        };
        acquire_spinning(&mut hsem, SemaphoreId::Clk48Config).await;
        assert_eq!(hsem.attempts, 1);
    }
}
