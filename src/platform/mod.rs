//! Platform-specific mapping and slot wait/notify support
//!
//! Linux gets the real thing: file-backed mappings under `/dev/shm` and
//! futex-based waits that work across processes sharing the mapping. Other
//! targets fall back to a process-local condvar table, which preserves the
//! wait/notify semantics for threads of one process only.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::{attach_region_mmap, create_region_mmap, current_pid, region_path, slot_wait, slot_wake};

#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(not(target_os = "linux"))]
pub use fallback::{attach_region_mmap, create_region_mmap, current_pid, region_path, slot_wait, slot_wake};
