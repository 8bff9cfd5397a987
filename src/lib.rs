//! # Shared-Memory Atomic Primitives
//!
//! A fixed-capacity shared memory region accessed exclusively through
//! atomic operations, plus the coordination primitives built on it: a
//! spinlock, a reusable N-party barrier, and a bounded single-producer /
//! single-consumer ring buffer with a blocking variant.
//!
//! ## Features
//!
//! - **Explicit Ownership**: No process-wide singletons. Every primitive
//!   takes its region and slot indices as constructor arguments, and each
//!   primitive is the sole permitted mutator of the slot range it owns.
//! - **Sequential Consistency**: All slot operations are `SeqCst`; atomic
//!   operations on a slot are observed in one total order by every
//!   participant.
//! - **Cross-Process Ready**: Named regions are backed by `/dev/shm` files
//!   and described by a small serializable handle; on Linux, wait/notify
//!   uses shared futexes so blocked peers in other processes wake too.
//! - **Bounded Busy-Waiting**: The spinlock bounds consecutive spins with
//!   scheduler yields; blocking ring operations park on wait/notify with
//!   explicit timeouts instead of spinning.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────── SharedRegion ────────────────────────┐
//! │ [RegionHeader][slot 0][slot 1][slot 2][slot 3] ... [slot N-1]│
//! └──────────────────────────────────────────────────────────────┘
//!        ▲              ▲         ▲              ▲
//!   AtomicView     SpinLock   Barrier        RingBuffer
//!  (one slot)     (one slot) (count+gen)  (head+tail+data range)
//! ```
//!
//! ## Usage
//!
//! ### Atomic slot access
//!
//! ```rust
//! use shm_sync::{SharedRegion, ShmResult};
//!
//! # fn main() -> ShmResult<()> {
//! let region = SharedRegion::new(4)?;
//! let counter = region.view(0)?;
//!
//! counter.store(41);
//! assert_eq!(counter.add(1), 41);
//! assert_eq!(counter.load(), 42);
//! # Ok(())
//! # }
//! ```
//!
//! ### Producer / consumer over a ring
//!
//! ```rust
//! use shm_sync::{PushResult, RingBuffer, SharedRegion, ShmResult};
//!
//! # fn main() -> ShmResult<()> {
//! let region = SharedRegion::new(8)?;
//! // head in slot 0, tail in slot 1, four element slots from slot 2
//! let ring = RingBuffer::new(&region, 0, 1, 2, 4)?;
//!
//! assert_eq!(ring.push(7), PushResult::Ok);
//! assert_eq!(ring.pop(), Some(7));
//! assert_eq!(ring.pop(), None);
//! # Ok(())
//! # }
//! ```
//!
//! ### Handing a region to another process
//!
//! ```rust,no_run
//! use shm_sync::{RegionHandle, SharedRegion, ShmResult};
//!
//! # fn main() -> ShmResult<()> {
//! let region = SharedRegion::create("telemetry", 64)?;
//! let json = region.handle().to_json()?;
//! // ...move `json` over any channel; the receiver reconstructs a view:
//! let peer = SharedRegion::attach(&RegionHandle::from_json(&json)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Construction-time failures (bad capacity, out-of-range slot, handle
//! mismatch) and timeouts surface as [`ShmError`]. Ring `Full`/`Empty` are
//! ordinary statuses, not errors. An index observed outside its valid
//! range means some participant bypassed the primitives and mutated slots
//! directly; the detecting operation panics instead of repairing shared
//! state it cannot trust.
//!
//! ## Thread Safety
//!
//! - **SharedRegion**: `Send + Sync`; share via `Arc` within a process or
//!   via [`RegionHandle`] across processes.
//! - **AtomicView / SpinLock / Barrier**: safe from any number of threads.
//! - **RingBuffer / BlockingRingBuffer**: one producer and one consumer
//!   only; more on either side is a contract violation.
//!
//! ## Platform Support
//!
//! Linux is the first-class target: `/dev/shm` backing files and shared
//! futex wait/notify work across processes. Other targets fall back to a
//! process-local condvar table; everything works for threads of one
//! process, cross-process blocking does not.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod barrier;
pub mod blocking;
pub mod error;
pub mod lock;
pub mod platform;
pub mod region;
pub mod ring;
pub mod view;

pub use barrier::Barrier;
pub use blocking::BlockingRingBuffer;
pub use error::{ShmError, ShmResult};
pub use lock::SpinLock;
pub use region::{
    CACHE_LINE_SIZE, MAX_SLOTS, REGION_MAGIC, RegionHandle, RegionHeader, SLOT_WIDTH, SharedRegion,
};
pub use ring::{PushResult, RingBuffer};
pub use view::{AtomicView, WaitOutcome};

/// Initialize tracing for low-overhead diagnostics
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
