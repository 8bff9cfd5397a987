//! Blocking wrapper over the SPSC ring buffer

use crate::error::{ShmError, ShmResult};
use crate::region::SharedRegion;
use crate::ring::{PushResult, RingBuffer};
use std::time::{Duration, Instant};

/// SPSC ring with blocking push/pop
///
/// Wraps a [`RingBuffer`], replacing caller-side busy spinning with
/// wait/notify on the index slots: a full producer parks on the head slot
/// (the consumer advances it), an empty consumer parks on the tail slot.
/// After every successful operation exactly one waiter on the opposite
/// side is notified; with a single producer and a single consumer there is
/// never more than one.
///
/// Correctness never relies on notify precision. Each blocked side
/// re-attempts the inner non-blocking operation after every wait return,
/// so missed, spurious, or extra wakeups only cost a retry. A timeout
/// leaves all shared state unchanged.
pub struct BlockingRingBuffer<'r> {
    ring: RingBuffer<'r>,
}

impl<'r> BlockingRingBuffer<'r> {
    /// Build a blocking ring with the same slot geometry as
    /// [`RingBuffer::new`]
    pub fn new(
        region: &'r SharedRegion,
        head_slot: usize,
        tail_slot: usize,
        data_start: usize,
        capacity: usize,
    ) -> ShmResult<Self> {
        Ok(Self {
            ring: RingBuffer::new(region, head_slot, tail_slot, data_start, capacity)?,
        })
    }

    /// Wrap an existing ring
    pub fn from_ring(ring: RingBuffer<'r>) -> Self {
        Self { ring }
    }

    /// The wrapped non-blocking ring
    pub fn ring(&self) -> &RingBuffer<'r> {
        &self.ring
    }

    /// Enqueue `value`, blocking while the ring is full
    ///
    /// Returns [`ShmError::TimedOut`] if `timeout` elapses before space
    /// frees up; the ring is left unchanged in that case.
    pub fn push(&self, value: u32, timeout: Duration) -> ShmResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            // Snapshot the head before the attempt: if the consumer
            // advances it between the failed push and the wait, the wait
            // returns NotEqual immediately instead of sleeping on a stale
            // observation.
            let observed_head = self.ring.head_view().load();

            if self.ring.push(value) == PushResult::Ok {
                self.ring.tail_view().notify(1);
                return Ok(());
            }

            let Some(remaining) = remaining_budget(deadline) else {
                return Err(ShmError::TimedOut);
            };
            let _ = self.ring.head_view().wait(observed_head, remaining);
        }
    }

    /// Dequeue the oldest element, blocking while the ring is empty
    ///
    /// Returns [`ShmError::TimedOut`] if `timeout` elapses before an
    /// element arrives.
    pub fn pop(&self, timeout: Duration) -> ShmResult<u32> {
        let deadline = Instant::now() + timeout;
        loop {
            let observed_tail = self.ring.tail_view().load();

            if let Some(value) = self.ring.pop() {
                self.ring.head_view().notify(1);
                return Ok(value);
            }

            let Some(remaining) = remaining_budget(deadline) else {
                return Err(ShmError::TimedOut);
            };
            let _ = self.ring.tail_view().wait(observed_tail, remaining);
        }
    }
}

/// Time left until `deadline`, or `None` once it has passed
fn remaining_budget(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if now >= deadline {
        None
    } else {
        Some(deadline - now)
    }
}
