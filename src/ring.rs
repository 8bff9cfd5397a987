//! Lock-free bounded SPSC ring buffer over region slots

use crate::error::{ShmError, ShmResult};
use crate::region::SharedRegion;
use crate::view::AtomicView;

/// Result of a push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// The value was enqueued
    Ok,
    /// The ring is full; nothing was mutated
    Full,
}

impl PushResult {
    /// Whether the push was rejected because the ring was full
    pub fn is_full(self) -> bool {
        matches!(self, PushResult::Full)
    }
}

/// Bounded single-producer / single-consumer queue
///
/// Head and tail indices live in two dedicated slots; elements live in a
/// contiguous slot range of the same region. One slot of capacity is
/// permanently unused so a full ring and an empty ring are distinguishable
/// from the index pair alone: the ring holds at most `capacity - 1`
/// elements.
///
/// Contract: exactly one thread pushes and exactly one thread pops. The
/// producer is the sole mutator of the tail index, the consumer the sole
/// mutator of the head index. Neither side ever blocks; `Full` and `Empty`
/// are ordinary recoverable statuses.
pub struct RingBuffer<'r> {
    region: &'r SharedRegion,
    capacity: u32,
    data_start: usize,
    head: AtomicView<'r>,
    tail: AtomicView<'r>,
}

impl<'r> RingBuffer<'r> {
    /// Build a ring over `region[head_slot]`, `region[tail_slot]`, and the
    /// element range `region[data_start .. data_start + capacity]`
    ///
    /// Requires `capacity >= 2` (one slot is reserved) and disjoint index
    /// and element slots. All slots must start at 0 and must not be
    /// mutated by anything other than this ring.
    pub fn new(
        region: &'r SharedRegion,
        head_slot: usize,
        tail_slot: usize,
        data_start: usize,
        capacity: usize,
    ) -> ShmResult<Self> {
        if capacity < 2 || capacity > u32::MAX as usize {
            return Err(ShmError::InvalidCapacity { capacity });
        }
        let data_end = data_start
            .checked_add(capacity)
            .ok_or(ShmError::InvalidCapacity { capacity })?;
        if data_end > region.capacity() {
            return Err(ShmError::SlotOutOfRange {
                index: data_end - 1,
                capacity: region.capacity(),
            });
        }
        let in_data = |slot: usize| slot >= data_start && slot < data_end;
        if head_slot == tail_slot || in_data(head_slot) || in_data(tail_slot) {
            return Err(ShmError::SlotOverlap {
                slot: if in_data(head_slot) || head_slot == tail_slot {
                    head_slot
                } else {
                    tail_slot
                },
            });
        }

        Ok(Self {
            region,
            capacity: capacity as u32,
            data_start,
            head: AtomicView::new(region, head_slot)?,
            tail: AtomicView::new(region, tail_slot)?,
        })
    }

    /// Ring capacity in slots; usable element count is one less
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Current element count
    pub fn len(&self) -> u32 {
        let head = self.checked_index(self.head.load(), "head");
        let tail = self.checked_index(self.tail.load(), "tail");
        (tail + self.capacity - head) % self.capacity
    }

    /// Whether the ring holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the next push would return [`PushResult::Full`]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity - 1
    }

    /// Enqueue `value` (producer side only)
    ///
    /// The element store is issued before the tail publication, so a
    /// consumer that observes the new tail always observes valid data.
    pub fn push(&self, value: u32) -> PushResult {
        let tail = self.checked_index(self.tail.load(), "tail");
        let next = (tail + 1) % self.capacity;
        let head = self.checked_index(self.head.load(), "head");

        if next == head {
            return PushResult::Full;
        }

        self.data_view(tail).store(value);
        self.tail.store(next);
        PushResult::Ok
    }

    /// Dequeue the oldest element, or `None` if the ring is empty
    /// (consumer side only)
    pub fn pop(&self) -> Option<u32> {
        let head = self.checked_index(self.head.load(), "head");
        let tail = self.checked_index(self.tail.load(), "tail");

        if head == tail {
            return None;
        }

        let value = self.data_view(head).load();
        self.head.store((head + 1) % self.capacity);
        Some(value)
    }

    /// View over the head index slot, for blocking wrappers
    pub(crate) fn head_view(&self) -> AtomicView<'r> {
        self.head
    }

    /// View over the tail index slot, for blocking wrappers
    pub(crate) fn tail_view(&self) -> AtomicView<'r> {
        self.tail
    }

    fn data_view(&self, index: u32) -> AtomicView<'r> {
        // In range by construction; the constructor validated the whole
        // element slot range.
        self.region
            .view(self.data_start + index as usize)
            .expect("element slot validated at construction")
    }

    /// Indices outside `[0, capacity)` mean some participant bypassed the
    /// ring and mutated its slots directly; shared state can no longer be
    /// trusted, so fail fast instead of repairing.
    fn checked_index(&self, value: u32, what: &str) -> u32 {
        assert!(
            value < self.capacity,
            "ring {} index {} outside [0, {}); slot range was mutated externally",
            what,
            value,
            self.capacity
        );
        value
    }
}
