//! The unit of remote reference: an address anchored to a backend.

use std::sync::Arc;

use crate::{
    backend::SharedBackend,
    overlay::{Overlay, Rebind, StructLayout, StructOverlay},
    Result,
};

/// An (address, backend) pair referencing foreign memory.
///
/// A view never caches foreign bytes: raw I/O goes to the backend on every
/// call, and [`MemoryView::overlay`] only binds interpretation onto the
/// address - no read happens until a field accessor is used. Cloning a view
/// clones the backend handle, so views derived from one another (pointer
/// dereference, casting) all talk to the same target.
///
/// The address is immutable; deriving a differently-anchored view means
/// creating a new one.
///
/// # Examples
///
/// ```rust
/// use memscope::{overlay::ScalarField, LocalBackend, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let view = backend.alloc0(16)?;
///
/// let counter: ScalarField<u32> = view.overlay(8);
/// counter.write(7)?;
/// assert_eq!(counter.read()?, 7);
/// assert_eq!(view.read_bytes(4, 8)?, vec![7, 0, 0, 0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryView {
    address: u64,
    backend: SharedBackend,
}

impl MemoryView {
    /// Anchors a view at `address` on `backend`.
    ///
    /// Nothing is validated here; a bad address surfaces on first access.
    #[must_use]
    pub fn new(address: u64, backend: SharedBackend) -> Self {
        MemoryView { address, backend }
    }

    /// Absolute foreign address this view is anchored at.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Backend handle this view reads and writes through.
    #[must_use]
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Reads `count` bytes at `offset` from the view's address.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] when the backend cannot satisfy
    /// the read.
    pub fn read_bytes(&self, count: usize, offset: u64) -> Result<Vec<u8>> {
        self.backend
            .read_bytes(count, self.address.wrapping_add(offset))
    }

    /// Writes all of `data` at `offset` from the view's address.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] when the backend cannot accept
    /// the write.
    pub fn write_bytes(&self, data: &[u8], offset: u64) -> Result<()> {
        self.backend
            .write_bytes(data, self.address.wrapping_add(offset))
    }

    /// Binds a typed accessor of type `T` at `offset`.
    ///
    /// Pure binding: no foreign bytes are read until the accessor is used.
    #[must_use]
    pub fn overlay<T: Overlay>(&self, offset: u64) -> T {
        T::bind(self.clone(), offset)
    }

    /// Rebinds an existing accessor onto this view at `offset`.
    ///
    /// The prototype keeps its configuration (layout, enum mapping); only the
    /// binding changes. The returned accessor is independent of the
    /// prototype.
    #[must_use]
    pub fn overlay_from<T: Rebind>(&self, prototype: &T, offset: u64) -> T {
        prototype.rebind(self.clone(), offset)
    }

    /// Binds a runtime [`StructLayout`] at `offset`.
    ///
    /// Layouts carry their own definition, so unlike [`MemoryView::overlay`]
    /// this takes the layout as a value instead of a type parameter.
    #[must_use]
    pub fn overlay_layout(&self, layout: &Arc<StructLayout>, offset: u64) -> StructOverlay {
        StructOverlay::new(self.clone(), offset, layout.clone())
    }
}
