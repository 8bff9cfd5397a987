//! Linux-specific shared memory and futex operations

use crate::error::ShmResult;
use crate::view::WaitOutcome;
use memmap2::{MmapMut, MmapOptions};
use nix::unistd::getpid;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Backing file path for a named region
pub fn region_path(name: &str) -> String {
    format!("/dev/shm/shm_sync_{}", name)
}

/// Create a new region backing file and map it
///
/// Creation is exclusive: an existing file at `path` is an error, surfaced
/// by the caller as [`crate::error::ShmError::AlreadyExists`].
pub fn create_region_mmap(path: &str, size: usize) -> ShmResult<MmapMut> {
    let file = OpenOptions::new()
        .create_new(true)
        .read(true)
        .write(true)
        .mode(0o600) // Owner read/write only
        .open(path)?;

    file.set_len(size as u64)?;

    // Pre-fault pages so first-touch latency does not land in a hot path
    let mmap = unsafe { MmapOptions::new().populate().map_mut(&file)? };

    Ok(mmap)
}

/// Map an existing region backing file
pub fn attach_region_mmap(path: &str) -> ShmResult<MmapMut> {
    let file = OpenOptions::new().read(true).write(true).open(path)?;

    let mmap = unsafe { MmapOptions::new().map_mut(&file)? };
    Ok(mmap)
}

/// Get current process ID
pub fn current_pid() -> u32 {
    getpid().as_raw() as u32
}

/// Block on `word` while it holds `expected`, for at most `timeout`.
///
/// Uses a shared (non-private) futex so waiters in other processes mapping
/// the same physical page participate. The kernel re-checks the word under
/// its own lock, so a value change between the caller's pre-check and the
/// syscall is reported as [`WaitOutcome::NotEqual`], never lost.
pub fn slot_wait(word: &AtomicU32, expected: u32, timeout: Duration) -> WaitOutcome {
    let ts = libc::timespec {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as libc::c_long,
    };

    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT,
            expected,
            &ts as *const libc::timespec,
            std::ptr::null::<u32>(),
            0u32,
        )
    };

    if rc == 0 {
        return WaitOutcome::Ok;
    }

    match std::io::Error::last_os_error().raw_os_error() {
        Some(libc::EAGAIN) => WaitOutcome::NotEqual,
        Some(libc::ETIMEDOUT) => WaitOutcome::TimedOut,
        // EINTR and anything else count as spurious wakeups; callers
        // re-check the slot value after every return.
        _ => WaitOutcome::Ok,
    }
}

/// Wake up to `count` waiters blocked on `word`, returning the number woken
pub fn slot_wake(word: &AtomicU32, count: usize) -> usize {
    let count = count.min(libc::c_int::MAX as usize) as libc::c_int;

    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE,
            count,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        )
    };

    if rc < 0 { 0 } else { rc as usize }
}
