//! Shared region structures and lifecycle

use crate::error::{ShmError, ShmResult};
use crate::platform::{attach_region_mmap, create_region_mmap, current_pid, region_path};
use crate::view::AtomicView;
use memmap2::{MmapMut, MmapOptions};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Magic number identifying a region backing file ("SHMSYNC1")
pub const REGION_MAGIC: u64 = 0x5348_4D53_594E_4331;

/// Fixed slot width in bytes; one region holds 32-bit slots only
pub const SLOT_WIDTH: usize = 4;

/// Maximum slot count per region (64 MiB of slot storage)
pub const MAX_SLOTS: usize = 1 << 24;

/// Cache line size used for header alignment
pub const CACHE_LINE_SIZE: usize = 64;

/// Region header with cache-line alignment
///
/// Lives at offset 0 of the mapping; slots start immediately after it.
#[repr(C, align(64))]
pub struct RegionHeader {
    /// Magic number for validation
    pub magic: u64,
    /// Slot count, immutable after creation
    pub capacity: u64,
    /// Slot width in bytes, immutable after creation
    pub slot_width: u32,
    /// Creating process ID
    pub creator_pid: u32,
    /// Live handle count across all participants
    pub attach_count: AtomicU32,
    /// Padding up to one cache line
    _padding: [u8; 36],
}

const _: () = assert!(std::mem::size_of::<RegionHeader>() == CACHE_LINE_SIZE);

impl RegionHeader {
    fn new(capacity: usize, creator_pid: u32) -> Self {
        Self {
            magic: REGION_MAGIC,
            capacity: capacity as u64,
            slot_width: SLOT_WIDTH as u32,
            creator_pid,
            attach_count: AtomicU32::new(1),
            _padding: [0; 36],
        }
    }

    /// Validate header magic and fixed geometry
    pub fn validate(&self) -> ShmResult<()> {
        if self.magic != REGION_MAGIC {
            return Err(ShmError::InvalidHandle {
                reason: format!("bad magic {:#x}", self.magic),
            });
        }
        if self.slot_width != SLOT_WIDTH as u32 {
            return Err(ShmError::InvalidHandle {
                reason: format!("unsupported slot width {}", self.slot_width),
            });
        }
        Ok(())
    }
}

/// Transferable region descriptor
///
/// Small enough to hand to another thread or process over any channel; the
/// receiver reconstructs an equivalent view with [`SharedRegion::attach`]
/// without copying the underlying memory. Anonymous regions carry no name
/// and cannot be re-attached from a descriptor; share those through `Arc`
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHandle {
    /// Backing file name; `None` for anonymous regions
    pub name: Option<String>,
    /// Slot count
    pub capacity: usize,
    /// Slot width in bytes
    pub slot_width: u32,
    /// Byte offset of slot 0 within the mapping
    pub base_offset: u32,
}

impl RegionHandle {
    /// Serialize the descriptor for a byte-oriented transfer channel
    pub fn to_json(&self) -> ShmResult<String> {
        serde_json::to_string(self).map_err(|e| ShmError::InvalidHandle {
            reason: e.to_string(),
        })
    }

    /// Reconstruct a descriptor from its JSON form
    pub fn from_json(json: &str) -> ShmResult<Self> {
        serde_json::from_str(json).map_err(|e| ShmError::InvalidHandle {
            reason: e.to_string(),
        })
    }
}

/// Fixed-capacity block of atomically-accessible 32-bit slots
///
/// All slot access goes through [`AtomicView`]; the region itself only
/// manages the mapping and its lifecycle. The creating handle of a named
/// region unlinks the backing file on drop.
pub struct SharedRegion {
    name: Option<String>,
    owned: bool,
    capacity: usize,
    mmap: MmapMut,
}

// Slot access is atomic-only and the mapping is stable for the lifetime of
// the region, so shared references are safe across threads.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Create an anonymous region for intra-process sharing
    ///
    /// Share it between threads through an `Arc`; every slot starts at 0.
    pub fn new(capacity: usize) -> ShmResult<Self> {
        validate_slot_capacity(capacity)?;

        let mut mmap = MmapOptions::new().len(total_size(capacity)).map_anon()?;
        init_header(&mut mmap, capacity);

        Ok(Self {
            name: None,
            owned: false,
            capacity,
            mmap,
        })
    }

    /// Create a named region backed by a shared memory file
    ///
    /// Creation is exclusive; a second `create` with the same name fails
    /// with [`ShmError::AlreadyExists`]. The backing file is unlinked when
    /// this (creating) handle drops.
    pub fn create(name: &str, capacity: usize) -> ShmResult<Self> {
        validate_slot_capacity(capacity)?;

        let path = region_path(name);
        if std::path::Path::new(&path).exists() {
            return Err(ShmError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let mut mmap = create_region_mmap(&path, total_size(capacity))?;
        init_header(&mut mmap, capacity);

        tracing::debug!(name, capacity, "created shared region");

        Ok(Self {
            name: Some(name.to_string()),
            owned: true,
            capacity,
            mmap,
        })
    }

    /// Attach to an existing named region from its descriptor
    ///
    /// Validates the descriptor against the mapped header; any geometry
    /// mismatch is fatal at construction time.
    pub fn attach(handle: &RegionHandle) -> ShmResult<Self> {
        let name = handle.name.as_deref().ok_or_else(|| ShmError::InvalidHandle {
            reason: "anonymous regions cannot be attached by descriptor".to_string(),
        })?;
        if handle.slot_width != SLOT_WIDTH as u32 {
            return Err(ShmError::InvalidHandle {
                reason: format!("unsupported slot width {}", handle.slot_width),
            });
        }
        if handle.base_offset != CACHE_LINE_SIZE as u32 {
            return Err(ShmError::InvalidHandle {
                reason: format!("unsupported base offset {}", handle.base_offset),
            });
        }
        validate_slot_capacity(handle.capacity)?;

        let path = region_path(name);
        if !std::path::Path::new(&path).exists() {
            return Err(ShmError::NotFound {
                name: name.to_string(),
            });
        }

        let mmap = attach_region_mmap(&path)?;
        if mmap.len() < total_size(handle.capacity) {
            return Err(ShmError::InvalidHandle {
                reason: format!(
                    "mapping holds {} bytes, descriptor requires {}",
                    mmap.len(),
                    total_size(handle.capacity)
                ),
            });
        }

        let header = unsafe { &*(mmap.as_ptr() as *const RegionHeader) };
        header.validate()?;
        if header.capacity != handle.capacity as u64 {
            return Err(ShmError::InvalidHandle {
                reason: format!(
                    "region holds {} slots, descriptor claims {}",
                    header.capacity, handle.capacity
                ),
            });
        }

        header.attach_count.fetch_add(1, Ordering::AcqRel);

        tracing::debug!(name, capacity = handle.capacity, "attached shared region");

        Ok(Self {
            name: Some(name.to_string()),
            owned: false,
            capacity: handle.capacity,
            mmap,
        })
    }

    /// Get the transferable descriptor for this region
    pub fn handle(&self) -> RegionHandle {
        RegionHandle {
            name: self.name.clone(),
            capacity: self.capacity,
            slot_width: SLOT_WIDTH as u32,
            base_offset: CACHE_LINE_SIZE as u32,
        }
    }

    /// Slot count of this region
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Region name, if file-backed
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of live handles, including this one
    pub fn attach_count(&self) -> u32 {
        self.header().attach_count.load(Ordering::Acquire)
    }

    /// Construct a typed accessor over one slot
    ///
    /// Convenience for [`AtomicView::new`].
    pub fn view(&self, index: usize) -> ShmResult<AtomicView<'_>> {
        AtomicView::new(self, index)
    }

    fn header(&self) -> &RegionHeader {
        unsafe { &*(self.mmap.as_ptr() as *const RegionHeader) }
    }

    /// Raw slot word; bounds must have been checked by the caller
    pub(crate) fn slot(&self, index: usize) -> &AtomicU32 {
        debug_assert!(index < self.capacity);
        unsafe {
            let base = self.mmap.as_ptr().add(CACHE_LINE_SIZE) as *const AtomicU32;
            &*base.add(index)
        }
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        self.header().attach_count.fetch_sub(1, Ordering::AcqRel);

        if self.owned {
            if let Some(name) = &self.name {
                let path = region_path(name);
                let _ = std::fs::remove_file(&path);
                tracing::debug!(name, "removed shared region backing file");
            }
        }
    }
}

/// Total mapping size for a slot capacity, header included
fn total_size(capacity: usize) -> usize {
    CACHE_LINE_SIZE + capacity * SLOT_WIDTH
}

fn init_header(mmap: &mut MmapMut, capacity: usize) {
    let header = unsafe { &mut *(mmap.as_mut_ptr() as *mut RegionHeader) };
    *header = RegionHeader::new(capacity, current_pid());
}

/// Validate region slot capacity constraints
pub fn validate_slot_capacity(capacity: usize) -> ShmResult<()> {
    if capacity == 0 || capacity > MAX_SLOTS {
        return Err(ShmError::InvalidCapacity { capacity });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_capacity_validation() {
        assert!(validate_slot_capacity(1).is_ok());
        assert!(validate_slot_capacity(1024).is_ok());
        assert!(validate_slot_capacity(MAX_SLOTS).is_ok());

        assert!(validate_slot_capacity(0).is_err());
        assert!(validate_slot_capacity(MAX_SLOTS + 1).is_err());
    }

    #[test]
    fn test_anonymous_region_starts_zeroed() {
        let region = SharedRegion::new(16).unwrap();
        assert_eq!(region.capacity(), 16);
        for i in 0..16 {
            assert_eq!(region.slot(i).load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_header_geometry() {
        let region = SharedRegion::new(4).unwrap();
        let header = region.header();
        assert!(header.validate().is_ok());
        assert_eq!(header.capacity, 4);
        assert_eq!(header.slot_width, SLOT_WIDTH as u32);
        assert_eq!(region.attach_count(), 1);
    }

    #[test]
    fn test_handle_descriptor_round_trip() {
        let region = SharedRegion::new(8).unwrap();
        let handle = region.handle();
        assert_eq!(handle.capacity, 8);
        assert_eq!(handle.base_offset, CACHE_LINE_SIZE as u32);

        let json = handle.to_json().unwrap();
        assert_eq!(RegionHandle::from_json(&json).unwrap(), handle);
    }

    #[test]
    fn test_anonymous_handle_cannot_attach() {
        let region = SharedRegion::new(8).unwrap();
        let result = SharedRegion::attach(&region.handle());
        assert!(matches!(result, Err(ShmError::InvalidHandle { .. })));
    }
}
