//! Error types for shared region operations

use thiserror::Error;

/// Errors that can occur while creating, attaching, or operating on a
/// shared region and the primitives built over it.
///
/// `Full` and `Empty` ring states are *not* errors; they are surfaced as
/// ordinary [`crate::ring::PushResult`] / `Option` values. Invariant
/// violations (an index observed outside its valid range) are not
/// represented here either: they indicate the exclusive-mutator contract
/// was already broken elsewhere, and the detecting operation panics rather
/// than repairing state it cannot trust.
#[derive(Error, Debug)]
pub enum ShmError {
    /// A region with this name already exists
    #[error("Region already exists: {name}")]
    AlreadyExists {
        /// Region name
        name: String,
    },

    /// Region not found
    #[error("Region not found: {name}")]
    NotFound {
        /// Region name
        name: String,
    },

    /// A region descriptor is malformed or incompatible with the mapped
    /// memory it refers to
    #[error("Invalid region handle: {reason}")]
    InvalidHandle {
        /// What failed validation
        reason: String,
    },

    /// Requested slot count or primitive capacity is out of range
    #[error("Invalid capacity: {capacity}")]
    InvalidCapacity {
        /// Attempted capacity
        capacity: usize,
    },

    /// Slot index beyond the region's capacity
    #[error("Slot index {index} out of range (region capacity {capacity})")]
    SlotOutOfRange {
        /// Attempted slot index
        index: usize,
        /// Region slot capacity
        capacity: usize,
    },

    /// Two slot roles of one primitive were mapped to overlapping slots
    #[error("Slot {slot} overlaps another slot range of the same primitive")]
    SlotOverlap {
        /// The conflicting slot index
        slot: usize,
    },

    /// A blocking operation exceeded its deadline
    #[error("Operation timed out")]
    TimedOut,

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

/// Result type for shared region operations
pub type ShmResult<T> = Result<T, ShmError>;
