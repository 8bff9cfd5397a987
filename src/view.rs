//! Typed atomic accessor over one region slot

use crate::error::{ShmError, ShmResult};
use crate::platform::{slot_wait, slot_wake};
use crate::region::SharedRegion;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Outcome of a [`AtomicView::wait`] call
///
/// Every outcome is advisory: the OS may wake a waiter without a matching
/// notify, and a notify may race a value change. Callers must re-check the
/// slot value after any return and treat `Ok` as "recheck", never as
/// "proceed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Returned from a blocked wait; the slot may or may not have changed
    Ok,
    /// The slot did not hold the expected value, no blocking occurred
    NotEqual,
    /// No notify arrived within the timeout
    TimedOut,
}

/// Atomic accessor bound to one slot of a [`SharedRegion`]
///
/// All operations are sequentially consistent with respect to every other
/// atomic operation on the same slot, across threads and processes mapping
/// the region. Views are cheap to construct and copy; hold one per slot a
/// primitive needs.
#[derive(Clone, Copy)]
pub struct AtomicView<'r> {
    slot: &'r AtomicU32,
}

impl<'r> AtomicView<'r> {
    /// Bind a view to `region[index]`
    ///
    /// An out-of-range index is a construction-time error; no operation on
    /// a constructed view can touch another slot.
    pub fn new(region: &'r SharedRegion, index: usize) -> ShmResult<Self> {
        if index >= region.capacity() {
            return Err(ShmError::SlotOutOfRange {
                index,
                capacity: region.capacity(),
            });
        }
        Ok(Self {
            slot: region.slot(index),
        })
    }

    /// Atomic read
    pub fn load(&self) -> u32 {
        self.slot.load(Ordering::SeqCst)
    }

    /// Atomic write
    pub fn store(&self, value: u32) {
        self.slot.store(value, Ordering::SeqCst);
    }

    /// Atomic wrapping add, returning the pre-update value
    pub fn add(&self, value: u32) -> u32 {
        self.slot.fetch_add(value, Ordering::SeqCst)
    }

    /// Atomic wrapping subtract, returning the pre-update value
    pub fn sub(&self, value: u32) -> u32 {
        self.slot.fetch_sub(value, Ordering::SeqCst)
    }

    /// Atomic bitwise AND, returning the pre-update value
    pub fn and(&self, value: u32) -> u32 {
        self.slot.fetch_and(value, Ordering::SeqCst)
    }

    /// Atomic bitwise OR, returning the pre-update value
    pub fn or(&self, value: u32) -> u32 {
        self.slot.fetch_or(value, Ordering::SeqCst)
    }

    /// Atomic bitwise XOR, returning the pre-update value
    pub fn xor(&self, value: u32) -> u32 {
        self.slot.fetch_xor(value, Ordering::SeqCst)
    }

    /// Unconditional atomic swap, returning the previous value
    pub fn exchange(&self, value: u32) -> u32 {
        self.slot.swap(value, Ordering::SeqCst)
    }

    /// Atomic compare-and-swap
    ///
    /// Stores `new` only if the slot holds `expected`; always returns the
    /// value observed at the time of the attempt (equal to `expected` on
    /// success).
    pub fn compare_exchange(&self, expected: u32, new: u32) -> u32 {
        match self
            .slot
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(observed) => observed,
            Err(observed) => observed,
        }
    }

    /// Block while the slot holds `expected`, for at most `timeout`
    ///
    /// Returns [`WaitOutcome::NotEqual`] immediately if the slot holds a
    /// different value. Spurious wakeups surface as `Ok`; re-check the slot
    /// after every return.
    pub fn wait(&self, expected: u32, timeout: Duration) -> WaitOutcome {
        if self.slot.load(Ordering::SeqCst) != expected {
            return WaitOutcome::NotEqual;
        }
        slot_wait(self.slot, expected, timeout)
    }

    /// Wake up to `count` threads blocked in [`AtomicView::wait`] on this
    /// slot, returning the number actually woken (0 if none were waiting)
    pub fn notify(&self, count: usize) -> usize {
        slot_wake(self.slot, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> SharedRegion {
        SharedRegion::new(8).unwrap()
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let region = region();
        assert!(AtomicView::new(&region, 7).is_ok());
        assert!(matches!(
            AtomicView::new(&region, 8),
            Err(ShmError::SlotOutOfRange { index: 8, capacity: 8 })
        ));
    }

    #[test]
    fn test_read_modify_write_returns_old_value() {
        let region = region();
        let view = region.view(0).unwrap();

        view.store(10);
        assert_eq!(view.add(5), 10);
        assert_eq!(view.sub(3), 15);
        assert_eq!(view.load(), 12);

        view.store(0b1100);
        assert_eq!(view.and(0b1010), 0b1100);
        assert_eq!(view.or(0b0001), 0b1000);
        assert_eq!(view.xor(0b1111), 0b1001);
        assert_eq!(view.load(), 0b0110);
    }

    #[test]
    fn test_exchange_and_compare_exchange() {
        let region = region();
        let view = region.view(1).unwrap();

        assert_eq!(view.exchange(42), 0);
        assert_eq!(view.load(), 42);

        // Success reports the expected value
        assert_eq!(view.compare_exchange(42, 43), 42);
        assert_eq!(view.load(), 43);

        // Failure reports the observed value and leaves the slot alone
        assert_eq!(view.compare_exchange(42, 99), 43);
        assert_eq!(view.load(), 43);
    }

    #[test]
    fn test_wait_not_equal_short_circuits() {
        let region = region();
        let view = region.view(2).unwrap();
        view.store(5);
        assert_eq!(view.wait(4, Duration::from_secs(5)), WaitOutcome::NotEqual);
    }

    #[test]
    fn test_wait_times_out() {
        let region = region();
        let view = region.view(3).unwrap();
        assert_eq!(
            view.wait(0, Duration::from_millis(50)),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_notify_without_waiters() {
        let region = region();
        let view = region.view(4).unwrap();
        assert_eq!(view.notify(1), 0);
    }

    #[test]
    fn test_views_share_one_slot() {
        let region = region();
        let a = region.view(5).unwrap();
        let b = region.view(5).unwrap();
        a.store(77);
        assert_eq!(b.load(), 77);
    }
}
