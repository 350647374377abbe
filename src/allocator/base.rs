//! Backend-backed allocator with sorted region tracking.

use tracing::debug;

use crate::{
    allocator::{OwnedRegion, RegionTable},
    MemoryView, Result, SharedBackend,
};

/// Allocator that reserves through the backend and tracks what it owns.
///
/// Every reservation the backend hands out is recorded as an owned region,
/// sorted ascending by address. [`BaseAllocator::free`] only releases
/// addresses this instance tracked; handing it a foreign view fails rather
/// than forwarding a release the backend may honor for somebody else's
/// memory.
///
/// # Usage Examples
///
/// ```rust
/// use memscope::{BaseAllocator, LocalBackend, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let mut allocator = BaseAllocator::new(backend);
///
/// let a = allocator.alloc(32)?;
/// let b = allocator.alloc0(64)?;
/// assert_eq!(allocator.regions().len(), 2);
/// assert_eq!(b.read_bytes(64, 0)?, vec![0u8; 64]);
///
/// allocator.free(&a)?;
/// assert_eq!(allocator.regions().len(), 1);
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// Not synchronized. Methods take `&mut self`; concurrent use requires an
/// external owner serializing access to the allocator and its backend
/// together.
#[derive(Debug)]
pub struct BaseAllocator {
    backend: SharedBackend,
    regions: RegionTable,
}

impl BaseAllocator {
    /// Creates an allocator over `backend` with nothing tracked yet.
    #[must_use]
    pub fn new(backend: SharedBackend) -> Self {
        BaseAllocator {
            backend,
            regions: RegionTable::new(),
        }
    }

    /// Reserves `size` bytes through the backend and tracks the region.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AllocFailed`] when the backend refuses the
    /// reservation, or [`crate::Error::DuplicateRegion`] when the backend
    /// hands out an address this allocator already tracks.
    pub fn alloc(&mut self, size: usize) -> Result<MemoryView> {
        let view = self.backend.alloc(size)?;
        self.regions.insert(view.clone(), size)?;
        debug!("Allocated {} bytes at {:#x}", size, view.address());
        Ok(view)
    }

    /// Reserves `size` zeroed bytes and tracks the region.
    ///
    /// Goes through the backend's `alloc0`, so a backend that hands out
    /// zeroed pages anyway skips the extra fill.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`BaseAllocator::alloc`], plus
    /// [`crate::Error::WriteFailed`] when the backend's zero-fill fails.
    pub fn alloc0(&mut self, size: usize) -> Result<MemoryView> {
        let view = self.backend.alloc0(size)?;
        self.regions.insert(view.clone(), size)?;
        debug!("Allocated {} zeroed bytes at {:#x}", size, view.address());
        Ok(view)
    }

    /// Releases a tracked region: drops the record, then frees through the
    /// backend.
    ///
    /// The record is dropped before the backend call; a backend failure
    /// surfaces with the region already untracked, since there is no
    /// partial-progress state to restore.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UntrackedRegion`] when `view`'s address was
    /// never tracked here (the backend is not consulted), or
    /// [`crate::Error::FreeFailed`] when the backend refuses the release.
    pub fn free(&mut self, view: &MemoryView) -> Result<()> {
        let region = self.regions.remove(view.address())?;
        self.backend.free(region.view())?;
        debug!("Freed {} bytes at {:#x}", region.size(), region.address());
        Ok(())
    }

    /// Tracked regions, sorted ascending by address.
    #[must_use]
    pub fn regions(&self) -> &[OwnedRegion] {
        self.regions.entries()
    }

    /// The backend this allocator reserves through.
    #[must_use]
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }
}
