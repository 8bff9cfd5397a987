//! Portable wait/notify fallback for non-Linux targets
//!
//! Keyed condvar table in process memory. Semantically equivalent to the
//! futex path for threads of one process; it cannot observe waiters in
//! other processes, so cross-process blocking is Linux-only.

use crate::error::ShmResult;
use crate::view::WaitOutcome;
use memmap2::{MmapMut, MmapOptions};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Backing file path for a named region
pub fn region_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("shm_sync_{}", name))
        .to_string_lossy()
        .into_owned()
}

/// Create a new region backing file and map it
pub fn create_region_mmap(path: &str, size: usize) -> ShmResult<MmapMut> {
    let file = OpenOptions::new()
        .create_new(true)
        .read(true)
        .write(true)
        .open(path)?;

    file.set_len(size as u64)?;

    let mmap = unsafe { MmapOptions::new().map_mut(&file)? };
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
    std::process::id()
}

struct WaitEntry {
    lock: Mutex<()>,
    cond: Condvar,
}

/// Wait entries keyed by slot address, created on first wait
static WAIT_TABLE: LazyLock<Mutex<HashMap<usize, Arc<WaitEntry>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn entry_for(addr: usize) -> Arc<WaitEntry> {
    WAIT_TABLE
        .lock()
        .entry(addr)
        .or_insert_with(|| {
            Arc::new(WaitEntry {
                lock: Mutex::new(()),
                cond: Condvar::new(),
            })
        })
        .clone()
}

/// Block on `word` while it holds `expected`, for at most `timeout`
pub fn slot_wait(word: &AtomicU32, expected: u32, timeout: Duration) -> WaitOutcome {
    let entry = entry_for(word.as_ptr() as usize);
    let mut guard = entry.lock.lock();

    // Re-check under the entry lock: a notifier must take the same lock
    // before signalling, so a store+notify cannot slip between this check
    // and the park below.
    if word.load(Ordering::SeqCst) != expected {
        return WaitOutcome::NotEqual;
    }

    if entry.cond.wait_for(&mut guard, timeout).timed_out() {
        WaitOutcome::TimedOut
    } else {
        WaitOutcome::Ok
    }
}

/// Wake up to `count` waiters blocked on `word`, returning the number woken
pub fn slot_wake(word: &AtomicU32, count: usize) -> usize {
    let entry = {
        let table = WAIT_TABLE.lock();
        match table.get(&(word.as_ptr() as usize)) {
            Some(entry) => entry.clone(),
            None => return 0,
        }
    };

    let _guard = entry.lock.lock();
    if count == usize::MAX {
        entry.cond.notify_all()
    } else {
        let mut woken = 0;
        for _ in 0..count {
            if entry.cond.notify_one() {
                woken += 1;
            } else {
                break;
            }
        }
        woken
    }
}
