//! Spinlock over a single region slot

use crate::error::ShmResult;
use crate::region::SharedRegion;
use crate::view::AtomicView;

/// Slot value while unlocked
const UNLOCKED: u32 = 0;
/// Slot value while held
const LOCKED: u32 = 1;

/// Consecutive spins between scheduler yields
const SPINS_PER_YIELD: u32 = 64;

/// Mutual exclusion over one slot
///
/// A single-slot CAS loop, intended for very short critical sections only;
/// [`lock`](SpinLock::lock) busy-waits and never suspends the calling
/// thread in the OS scheduler, yielding briefly after repeated failed
/// attempts to avoid starving an oversubscribed system.
///
/// The lock does not track holder identity: calling
/// [`unlock`](SpinLock::unlock) without holding the lock is a caller
/// contract violation with an undefined outcome.
pub struct SpinLock<'r> {
    state: AtomicView<'r>,
}

impl<'r> SpinLock<'r> {
    /// Build a lock over `region[slot]`
    ///
    /// The slot must start at 0 (unlocked) and must not be mutated by
    /// anything other than this lock.
    pub fn new(region: &'r SharedRegion, slot: usize) -> ShmResult<Self> {
        Ok(Self {
            state: AtomicView::new(region, slot)?,
        })
    }

    /// Acquire the lock, spinning until it is available
    pub fn lock(&self) {
        let mut spins = 0u32;
        loop {
            if self.try_lock() {
                return;
            }
            // Spin on plain loads until the lock looks free; retrying the
            // CAS against a held lock just bounces the cache line around.
            while self.state.load() != UNLOCKED {
                std::hint::spin_loop();
                spins += 1;
                if spins >= SPINS_PER_YIELD {
                    spins = 0;
                    std::thread::yield_now();
                }
            }
        }
    }

    /// Attempt the acquire exactly once, without spinning
    pub fn try_lock(&self) -> bool {
        self.state.compare_exchange(UNLOCKED, LOCKED) == UNLOCKED
    }

    /// Release the lock
    ///
    /// Caller contract: only the current holder may call this.
    pub fn unlock(&self) {
        self.state.store(UNLOCKED);
    }

    /// Whether the lock is currently held by someone
    pub fn is_locked(&self) -> bool {
        self.state.load() != UNLOCKED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_unlock_cycle() {
        let region = SharedRegion::new(1).unwrap();
        let lock = SpinLock::new(&region, 0).unwrap();

        assert!(!lock.is_locked());
        lock.lock();
        assert!(lock.is_locked());
        lock.unlock();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_try_lock_fails_while_held() {
        let region = SharedRegion::new(1).unwrap();
        let lock = SpinLock::new(&region, 0).unwrap();

        assert!(lock.try_lock());
        assert!(!lock.try_lock());
        lock.unlock();
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn test_slot_out_of_range() {
        let region = SharedRegion::new(1).unwrap();
        assert!(SpinLock::new(&region, 1).is_err());
    }
}
