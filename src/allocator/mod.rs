//! Allocators that reserve and track regions of foreign memory.
//!
//! Two placement policies over one bookkeeping structure. [`BaseAllocator`]
//! forwards every reservation to the backend and remembers what it handed
//! out. [`CaveAllocator`] never asks the backend for memory at all: it
//! places regions inside one fixed, pre-existing window by best-fit gap
//! search.
//!
//! Both keep an owned-region list sorted ascending by address with unique
//! addresses, exposed through `regions()` for inspection. Bookkeeping is a
//! find-then-mutate sequence on a plain list and is deliberately not
//! synchronized; methods take `&mut self`, so exclusive access is the
//! caller's problem at compile time rather than a runtime lock.
//!
//! # Usage Examples
//!
//! ```rust
//! use memscope::{BaseAllocator, LocalBackend, SharedBackend};
//!
//! # fn main() -> memscope::Result<()> {
//! let backend = SharedBackend::new(LocalBackend::new(0x1000));
//! let mut allocator = BaseAllocator::new(backend);
//!
//! let view = allocator.alloc0(64)?;
//! view.write_bytes(&[1, 2, 3], 0)?;
//! allocator.free(&view)?;
//! # Ok(())
//! # }
//! ```

mod base;
mod cave;

pub use base::BaseAllocator;
pub use cave::CaveAllocator;

use crate::{Error, MemoryView, Result};

/// One tracked reservation: an anchored view plus its size in bytes.
#[derive(Debug, Clone)]
pub struct OwnedRegion {
    view: MemoryView,
    size: usize,
}

impl OwnedRegion {
    /// Base address of the region.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address()
    }

    /// Region size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// First address past the region.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.view.address().saturating_add(self.size as u64)
    }

    /// The view anchored at the region's base.
    #[must_use]
    pub fn view(&self) -> &MemoryView {
        &self.view
    }
}

/// Owned-region list, sorted ascending by address, unique addresses.
#[derive(Debug, Default)]
pub(crate) struct RegionTable {
    entries: Vec<OwnedRegion>,
}

impl RegionTable {
    pub(crate) fn new() -> Self {
        RegionTable {
            entries: Vec::new(),
        }
    }

    /// Inserts keeping the ascending-address order: scan forward, insert
    /// before the first entry with a greater address, append if none.
    pub(crate) fn insert(&mut self, view: MemoryView, size: usize) -> Result<()> {
        let address = view.address();
        let mut at = self.entries.len();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.address() == address {
                return Err(Error::DuplicateRegion(address));
            }
            if entry.address() > address {
                at = i;
                break;
            }
        }
        self.entries.insert(at, OwnedRegion { view, size });
        Ok(())
    }

    /// Removes the entry anchored at `address`.
    pub(crate) fn remove(&mut self, address: u64) -> Result<OwnedRegion> {
        let Some(at) = self
            .entries
            .iter()
            .position(|entry| entry.address() == address)
        else {
            return Err(Error::UntrackedRegion(address));
        };
        Ok(self.entries.remove(at))
    }

    pub(crate) fn entries(&self) -> &[OwnedRegion] {
        &self.entries
    }
}
