//! Pointer slots: dereference to a typed target, or rebind the slot itself.

use std::{fmt, marker::PhantomData};

use crate::{
    overlay::{Overlay, Rebind, ScalarField},
    MemoryView, Result,
};

/// Width of a foreign pointer in bytes. Targets are 64-bit.
pub const POINTER_WIDTH: usize = 8;

/// Accessor for a pointer-width slot whose target is overlaid as `T`.
///
/// Three distinct operations live here and it pays to keep them apart:
///
/// - [`PointerField::read`] *dereferences*: it decodes the stored address and
///   overlays a fresh `T` there. The nested overlay comes back, not the raw
///   address.
/// - [`PointerField::read_address`] / [`PointerField::write_address`] access
///   the raw slot value.
/// - [`PointerField::cast`] / [`PointerField::cast_offset`] *rebind the slot's
///   own location* as another accessor type. The stored pointer value is not
///   consulted and no foreign memory is touched - reinterpretation only.
///
/// Since `T` is only ever instantiated on demand, a composite type can
/// contain a `PointerField` to itself without any indirection.
///
/// # Examples
///
/// ```rust
/// use memscope::{overlay::{PointerField, ScalarField}, LocalBackend, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let slot_view = backend.alloc0(8)?;
/// let target_view = backend.alloc0(8)?;
///
/// let pointer: PointerField<ScalarField<u64>> = slot_view.overlay(0);
/// pointer.write_address(target_view.address())?;
///
/// let target = pointer.read()?;
/// assert_eq!(target.address(), target_view.address());
/// # Ok(())
/// # }
/// ```
pub struct PointerField<T: Overlay> {
    view: MemoryView,
    offset: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Overlay> PointerField<T> {
    /// Absolute foreign address of the pointer slot itself.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// Reads the raw address stored in the slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] when the slot cannot be read.
    pub fn read_address(&self) -> Result<u64> {
        let slot: ScalarField<u64> = self.view.overlay(self.offset);
        slot.read()
    }

    /// Writes a raw address into the slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] when the slot cannot be
    /// written.
    pub fn write_address(&self, address: u64) -> Result<()> {
        let slot: ScalarField<u64> = self.view.overlay(self.offset);
        slot.write(address)
    }

    /// Dereferences the pointer: overlays `T` at the stored address.
    ///
    /// Only the slot itself is read; the target stays untouched until the
    /// returned overlay is used.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ReadFailed`] when the slot cannot be read.
    pub fn read(&self) -> Result<T> {
        let target = self.read_address()?;
        Ok(self.view.backend().view(target).overlay(0))
    }

    /// Rebinds the slot's own location as a `U` accessor.
    ///
    /// No foreign memory is read or written; the stored pointer value plays
    /// no part. Useful when a slot holds a pointer on some targets and an
    /// inline value on others.
    #[must_use]
    pub fn cast<U: Overlay>(&self) -> U {
        U::bind(self.view.clone(), self.offset)
    }

    /// Rebinds the location `delta` bytes away from the slot as a `U`
    /// accessor.
    ///
    /// Negative deltas reach backwards. Like [`PointerField::cast`], nothing
    /// is read or written.
    #[must_use]
    pub fn cast_offset<U: Overlay>(&self, delta: i64) -> U {
        U::bind(self.view.clone(), self.offset.wrapping_add_signed(delta))
    }
}

impl<T: Overlay> Rebind for PointerField<T> {
    fn rebind(&self, view: MemoryView, offset: u64) -> Self {
        Self::bind(view, offset)
    }
}

impl<T: Overlay> Overlay for PointerField<T> {
    fn bind(view: MemoryView, offset: u64) -> Self {
        PointerField {
            view,
            offset,
            _marker: PhantomData,
        }
    }
}

impl<T: Overlay> Clone for PointerField<T> {
    fn clone(&self) -> Self {
        PointerField {
            view: self.view.clone(),
            offset: self.offset,
            _marker: PhantomData,
        }
    }
}

impl<T: Overlay> fmt::Debug for PointerField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerField")
            .field("view", &self.view)
            .field("offset", &self.offset)
            .finish()
    }
}
