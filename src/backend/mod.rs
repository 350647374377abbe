//! Raw access to the address space of a foreign process.
//!
//! Everything else in this crate reduces to the four operations defined here:
//! read bytes, write bytes, reserve a region, release a region. A concrete
//! [`MemoryBackend`] implements those four against one specific target - an OS
//! process-memory API, an emulator, or plain in-process buffers - and the rest
//! of the library never needs to know which.
//!
//! # Architecture
//!
//! The trait works on raw `u64` addresses so that implementations stay free of
//! view plumbing. [`SharedBackend`] wraps any implementation in a cheap-clone
//! handle and lifts the contract to [`MemoryView`] level: `alloc` hands back an
//! anchored view, `free` takes one. Views clone the handle, never the foreign
//! bytes.
//!
//! # Key Components
//!
//! - [`MemoryBackend`] - the 4-operation capability contract, plus a default
//!   zero-filling `alloc0`
//! - [`SharedBackend`] - shared handle that mints [`MemoryView`]s
//! - [`Protection`] - access rights of a foreign region
//! - [`LocalBackend`] - complete in-process implementation, used by the test
//!   suites and available as a fixture for callers
//!
//! # Usage Examples
//!
//! ```rust
//! use memscope::{LocalBackend, SharedBackend};
//!
//! # fn main() -> memscope::Result<()> {
//! let backend = SharedBackend::new(LocalBackend::new(0x10000));
//!
//! let view = backend.alloc(64)?;
//! view.write_bytes(&[0xDE, 0xAD, 0xBE, 0xEF], 0)?;
//! assert_eq!(view.read_bytes(4, 0)?, vec![0xDE, 0xAD, 0xBE, 0xEF]);
//!
//! backend.free(&view)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`MemoryBackend`] requires `Send + Sync`; implementations guard their own
//! state ([`LocalBackend`] uses an internal `RwLock`). That makes the *handle*
//! safe to clone across threads - it does not serialize allocator bookkeeping,
//! which stays single-threaded by contract.

mod local;

pub use local::LocalBackend;

use std::{fmt, sync::Arc};

use bitflags::bitflags;

use crate::{MemoryView, Result};

bitflags! {
    /// Access rights of a foreign memory region.
    ///
    /// Fresh reservations made through [`MemoryBackend::alloc`] are
    /// read/write/execute, matching what instrumentation payloads need;
    /// fixture mappings can narrow that to test failure paths.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Protection: u32 {
        /// Region can be read
        const READ = 0x01;
        /// Region can be written
        const WRITE = 0x02;
        /// Region can be executed
        const EXECUTE = 0x04;

        /// Read and write access
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        /// Read and execute access
        const READ_EXECUTE = Self::READ.bits() | Self::EXECUTE.bits();
        /// Full access
        const READ_WRITE_EXECUTE = Self::READ.bits() | Self::WRITE.bits() | Self::EXECUTE.bits();
    }
}

/// Capability contract for raw foreign-process memory access.
///
/// Implementations execute blocking reads, writes, reservations and releases
/// against one target address space. All operations are synchronous and
/// either complete fully or fail with an error - a failed read or write has
/// no partial-progress state.
///
/// Addresses are absolute within the target. New reservations must be
/// read/write/execute so that callers can stage both data and code.
///
/// # Examples
///
/// ```rust,ignore
/// struct ProcessBackend { handle: ProcessHandle }
///
/// impl MemoryBackend for ProcessBackend {
///     fn name(&self) -> &str {
///         "process"
///     }
///
///     fn read_bytes(&self, count: usize, address: u64) -> Result<Vec<u8>> {
///         self.handle.read_memory(address, count)
///     }
///
///     // write_bytes / alloc / free against the OS API ...
/// }
/// ```
pub trait MemoryBackend: Send + Sync {
    /// Short identifier for this backend, used in diagnostics.
    fn name(&self) -> &str;

    /// Reads exactly `count` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] when the target cannot satisfy the
    /// read (unmapped address, no read access, dead target). Short reads are
    /// not permitted; `count` bytes come back or the call fails.
    fn read_bytes(&self, count: usize, address: u64) -> Result<Vec<u8>>;

    /// Writes all of `data` starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] when the target cannot accept the
    /// write. Writes are all-or-nothing.
    fn write_bytes(&self, data: &[u8], address: u64) -> Result<()>;

    /// Reserves `size` bytes of fresh read/write/execute memory.
    ///
    /// Returns the base address of the new region.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AllocFailed`] when the target cannot reserve
    /// the requested amount.
    fn alloc(&self, size: usize) -> Result<u64>;

    /// Releases the reservation anchored at `address`.
    ///
    /// `address` must be the base address a previous [`MemoryBackend::alloc`]
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FreeFailed`] when no reservation is anchored at
    /// `address` or the target refuses the release.
    fn free(&self, address: u64) -> Result<()>;

    /// Reserves like [`MemoryBackend::alloc`] and zero-fills the region.
    ///
    /// The default implementation allocates and then writes `size` zero
    /// bytes. Backends whose reservation primitive already hands out zeroed
    /// pages should override this and skip the second round-trip.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AllocFailed`] when the reservation fails, or
    /// [`crate::Error::WriteFailed`] when the zero-fill does.
    fn alloc0(&self, size: usize) -> Result<u64> {
        let address = self.alloc(size)?;
        self.write_bytes(&vec![0u8; size], address)?;
        Ok(address)
    }
}

/// Cheap-clone shared handle to a [`MemoryBackend`].
///
/// The handle is what the rest of the crate passes around: every
/// [`MemoryView`] holds one, and allocators drive their backend through one.
/// Cloning is an `Arc` bump. On top of the raw contract it lifts allocation
/// to view level - [`SharedBackend::alloc`] returns an anchored
/// [`MemoryView`] and [`SharedBackend::free`] takes one back.
///
/// # Examples
///
/// ```rust
/// use memscope::{LocalBackend, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let view = backend.alloc0(16)?;
/// assert_eq!(view.read_bytes(16, 0)?, vec![0u8; 16]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SharedBackend {
    inner: Arc<dyn MemoryBackend>,
}

impl SharedBackend {
    /// Wraps a backend in a shared handle.
    pub fn new(backend: impl MemoryBackend + 'static) -> Self {
        SharedBackend {
            inner: Arc::new(backend),
        }
    }

    /// Short identifier of the wrapped backend.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Anchors a [`MemoryView`] at `address`.
    ///
    /// No validation happens here; the address is checked by the backend on
    /// first actual access.
    #[must_use]
    pub fn view(&self, address: u64) -> MemoryView {
        MemoryView::new(address, self.clone())
    }

    /// Reads exactly `count` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] when the backend cannot satisfy
    /// the read.
    pub fn read_bytes(&self, count: usize, address: u64) -> Result<Vec<u8>> {
        self.inner.read_bytes(count, address)
    }

    /// Writes all of `data` starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] when the backend cannot accept
    /// the write.
    pub fn write_bytes(&self, data: &[u8], address: u64) -> Result<()> {
        self.inner.write_bytes(data, address)
    }

    /// Reserves `size` bytes of fresh memory and anchors a view at its base.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AllocFailed`] when the backend cannot reserve
    /// the requested amount.
    pub fn alloc(&self, size: usize) -> Result<MemoryView> {
        Ok(self.view(self.inner.alloc(size)?))
    }

    /// Reserves `size` zero-filled bytes and anchors a view at the base.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AllocFailed`] when the reservation fails, or
    /// [`crate::Error::WriteFailed`] when the zero-fill does.
    pub fn alloc0(&self, size: usize) -> Result<MemoryView> {
        Ok(self.view(self.inner.alloc0(size)?))
    }

    /// Releases the reservation the view is anchored at.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FreeFailed`] when no reservation is anchored
    /// at the view's address or the backend refuses the release.
    pub fn free(&self, view: &MemoryView) -> Result<()> {
        self.inner.free(view.address())
    }
}

impl fmt::Debug for SharedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBackend")
            .field("backend", &self.inner.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out dirty fresh regions so tests can prove zero-filling happened.
    struct DirtyBackend {
        inner: LocalBackend,
    }

    impl MemoryBackend for DirtyBackend {
        fn name(&self) -> &str {
            "dirty"
        }

        fn read_bytes(&self, count: usize, address: u64) -> Result<Vec<u8>> {
            self.inner.read_bytes(count, address)
        }

        fn write_bytes(&self, data: &[u8], address: u64) -> Result<()> {
            self.inner.write_bytes(data, address)
        }

        fn alloc(&self, size: usize) -> Result<u64> {
            let address = self.inner.alloc(size)?;
            self.inner.write_bytes(&vec![0xAA; size], address)?;
            Ok(address)
        }

        fn free(&self, address: u64) -> Result<()> {
            self.inner.free(address)
        }
    }

    #[test]
    fn protection_composites() {
        assert!(Protection::READ_WRITE_EXECUTE.contains(Protection::WRITE));
        assert!(Protection::READ_EXECUTE.contains(Protection::EXECUTE));
        assert!(!Protection::READ_WRITE.contains(Protection::EXECUTE));
    }

    #[test]
    fn shared_backend_mints_views() {
        let backend = SharedBackend::new(LocalBackend::new(0x1000));
        let view = backend.view(0x4000_0000);
        assert_eq!(view.address(), 0x4000_0000);
        assert_eq!(backend.name(), "local");
    }

    #[test]
    fn default_alloc0_zero_fills() {
        let backend = SharedBackend::new(DirtyBackend {
            inner: LocalBackend::new(0x1000),
        });

        let dirty = backend.alloc(8).expect("alloc failed");
        assert_eq!(dirty.read_bytes(8, 0).expect("read failed"), vec![0xAA; 8]);

        let clean = backend.alloc0(8).expect("alloc0 failed");
        assert_eq!(clean.read_bytes(8, 0).expect("read failed"), vec![0u8; 8]);
    }
}
