//! Reusable N-party rendezvous over two region slots

use crate::error::{ShmError, ShmResult};
use crate::region::SharedRegion;
use crate::view::AtomicView;
use std::time::Duration;

/// Re-arm interval for waiters parked on the generation slot
///
/// The generation word is re-checked after every wait return, so the
/// interval only bounds how long a waiter can sit on a wakeup the portable
/// fallback delivered to a different thread; it does not affect
/// correctness.
const GENERATION_WAIT: Duration = Duration::from_millis(100);

/// N-party rendezvous built on a counter slot and a generation slot
///
/// Each [`wait`](Barrier::wait) returns only once all `parties` calls for
/// the current generation have arrived. The barrier re-arms itself: a new
/// rendezvous begins immediately after release with the next generation.
pub struct Barrier<'r> {
    parties: u32,
    count: AtomicView<'r>,
    generation: AtomicView<'r>,
}

impl<'r> Barrier<'r> {
    /// Build a barrier for `parties` participants over two distinct slots
    ///
    /// Both slots must start at 0 and must not be mutated by anything
    /// other than this barrier.
    pub fn new(
        region: &'r SharedRegion,
        count_slot: usize,
        generation_slot: usize,
        parties: u32,
    ) -> ShmResult<Self> {
        if parties == 0 {
            return Err(ShmError::InvalidCapacity { capacity: 0 });
        }
        if count_slot == generation_slot {
            return Err(ShmError::SlotOverlap {
                slot: generation_slot,
            });
        }
        Ok(Self {
            parties,
            count: AtomicView::new(region, count_slot)?,
            generation: AtomicView::new(region, generation_slot)?,
        })
    }

    /// Number of participating parties
    pub fn parties(&self) -> u32 {
        self.parties
    }

    /// Current generation; advances by exactly 1 per completed rendezvous
    pub fn generation(&self) -> u32 {
        self.generation.load()
    }

    /// Rendezvous with the other parties
    ///
    /// Blocks until all `parties` calls for this generation have arrived.
    /// Exactly one arrival per generation (the closing one) performs the
    /// reset-and-release sequence; only one increment can observe the full
    /// party count.
    pub fn wait(&self) {
        let g = self.generation.load();
        let arrived = self.count.add(1) + 1;

        assert!(
            arrived <= self.parties,
            "barrier arrival count {} exceeds {} parties; count slot was mutated externally",
            arrived,
            self.parties
        );

        if arrived == self.parties {
            self.count.store(0);
            self.generation.add(1);
            self.generation.notify(self.parties as usize - 1);
            return;
        }

        // Park on the generation word until the closing arrival bumps it.
        // Every outcome (Ok, NotEqual, TimedOut) is treated as "recheck";
        // the loop condition alone decides when the rendezvous is over.
        while self.generation.load() == g {
            let _ = self.generation.wait(g, GENERATION_WAIT);
        }
    }
}
