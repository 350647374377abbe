//! Fixed-width little-endian numeric codecs and their live accessor.
//!
//! The [`Scalar`] trait ties each supported Rust numeric type to its exact
//! encoded width and a runtime [`ScalarKind`] discriminant; [`ScalarField`]
//! is the accessor that decodes and encodes through a view. Byte order is
//! little-endian throughout - the targets this crate inspects are x86-64
//! processes.

use std::marker::PhantomData;

use crate::{
    overlay::{Overlay, Rebind},
    Error, MemoryView, Result,
};

/// Runtime discriminant for the ten scalar codecs.
///
/// The runtime layout tier stores these in descriptors; the static tier gets
/// one from [`Scalar::KIND`]. Width and class are queryable so dynamic code
/// can dispatch without naming concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 64-bit integer
    U64,
    /// Signed 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl ScalarKind {
    /// Encoded width in bytes.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }

    /// True for the signed integer kinds.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64
        )
    }

    /// True for the floating-point kinds.
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    /// True when `value` is representable in this kind's integer range.
    ///
    /// Always false for the floating-point kinds; enum storage and other
    /// integer-valued descriptors use this to validate before encoding.
    #[must_use]
    pub fn holds(&self, value: i128) -> bool {
        match self {
            ScalarKind::U8 => u8::try_from(value).is_ok(),
            ScalarKind::I8 => i8::try_from(value).is_ok(),
            ScalarKind::U16 => u16::try_from(value).is_ok(),
            ScalarKind::I16 => i16::try_from(value).is_ok(),
            ScalarKind::U32 => u32::try_from(value).is_ok(),
            ScalarKind::I32 => i32::try_from(value).is_ok(),
            ScalarKind::U64 => u64::try_from(value).is_ok(),
            ScalarKind::I64 => i64::try_from(value).is_ok(),
            ScalarKind::F32 | ScalarKind::F64 => false,
        }
    }

    /// Lowercase Rust type name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::U8 => "u8",
            ScalarKind::I8 => "i8",
            ScalarKind::U16 => "u16",
            ScalarKind::I16 => "i16",
            ScalarKind::U32 => "u32",
            ScalarKind::I32 => "i32",
            ScalarKind::U64 => "u64",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        }
    }
}

/// Little-endian codec for one fixed-width numeric type.
///
/// `Bytes` is the exact-width byte array of the encoding, which keeps width
/// and codec in lockstep per implementation. Implemented for `u8`, `i8`,
/// `u16`, `i16`, `u32`, `i32`, `u64`, `i64`, `f32` and `f64`.
pub trait Scalar: Sized + Copy {
    /// Exact-width byte array this type encodes to.
    type Bytes: for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Runtime discriminant of this codec.
    const KIND: ScalarKind;

    /// Decodes a value from little-endian bytes.
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Encodes this value to little-endian bytes.
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_scalar {
    ($ty:ty, $kind:ident, $width:literal) => {
        impl Scalar for $ty {
            type Bytes = [u8; $width];
            const KIND: ScalarKind = ScalarKind::$kind;

            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                <$ty>::from_le_bytes(bytes)
            }

            fn to_le_bytes(self) -> Self::Bytes {
                <$ty>::to_le_bytes(self)
            }
        }
    };
}

impl_scalar!(u8, U8, 1);
impl_scalar!(i8, I8, 1);
impl_scalar!(u16, U16, 2);
impl_scalar!(i16, I16, 2);
impl_scalar!(u32, U32, 4);
impl_scalar!(i32, I32, 4);
impl_scalar!(u64, U64, 8);
impl_scalar!(i64, I64, 8);
impl_scalar!(f32, F32, 4);
impl_scalar!(f64, F64, 8);

/// Live accessor for one scalar at (view, offset).
///
/// Reads decode fresh bytes from the backend on every call; writes encode
/// and hand off immediately. Nothing is cached between calls.
///
/// # Examples
///
/// ```rust
/// use memscope::{overlay::ScalarField, LocalBackend, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let view = backend.alloc0(8)?;
///
/// let field: ScalarField<i32> = view.overlay(4);
/// field.write(-2)?;
/// assert_eq!(field.read()?, -2);
/// assert_eq!(view.read_bytes(4, 4)?, vec![0xFE, 0xFF, 0xFF, 0xFF]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ScalarField<T: Scalar> {
    view: MemoryView,
    offset: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Scalar> ScalarField<T> {
    /// Absolute foreign address of this field.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// Reads and decodes the scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadFailed`] when the backend cannot satisfy the
    /// read.
    pub fn read(&self) -> Result<T> {
        let width = T::KIND.width();
        let bytes = self.view.read_bytes(width, self.offset)?;
        let Ok(raw) = T::Bytes::try_from(bytes.as_slice()) else {
            return Err(Error::ReadFailed {
                count: width,
                address: self.address(),
                reason: "backend returned a short read".to_string(),
            });
        };
        Ok(T::from_le_bytes(raw))
    }

    /// Encodes and writes the scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] when the backend cannot accept the
    /// write.
    pub fn write(&self, value: T) -> Result<()> {
        self.view
            .write_bytes(value.to_le_bytes().as_ref(), self.offset)
    }
}

impl<T: Scalar> Rebind for ScalarField<T> {
    fn rebind(&self, view: MemoryView, offset: u64) -> Self {
        Self::bind(view, offset)
    }
}

impl<T: Scalar> Overlay for ScalarField<T> {
    fn bind(view: MemoryView, offset: u64) -> Self {
        ScalarField {
            view,
            offset,
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalBackend, SharedBackend};

    fn fixture() -> MemoryView {
        let backend = SharedBackend::new(LocalBackend::new(0x1000));
        backend.alloc0(16).expect("alloc failed")
    }

    fn roundtrip<T: Scalar + PartialEq + std::fmt::Debug>(view: &MemoryView, value: T) {
        let field: ScalarField<T> = view.overlay(4);
        field.write(value).expect("write failed");
        assert_eq!(field.read().expect("read failed"), value);
    }

    #[test]
    fn unsigned_boundaries() {
        let view = fixture();
        roundtrip(&view, 0u8);
        roundtrip(&view, u8::MAX);
        roundtrip(&view, 0u16);
        roundtrip(&view, u16::MAX);
        roundtrip(&view, 0u32);
        roundtrip(&view, u32::MAX);
        roundtrip(&view, 0u64);
        roundtrip(&view, u64::MAX);
    }

    #[test]
    fn signed_boundaries() {
        let view = fixture();
        roundtrip(&view, -1i8);
        roundtrip(&view, i8::MAX);
        roundtrip(&view, i8::MIN);
        roundtrip(&view, -1i16);
        roundtrip(&view, i16::MAX);
        roundtrip(&view, i16::MIN);
        roundtrip(&view, -1i32);
        roundtrip(&view, i32::MAX);
        roundtrip(&view, i32::MIN);
        roundtrip(&view, -1i64);
        roundtrip(&view, i64::MAX);
        roundtrip(&view, i64::MIN);
    }

    #[test]
    fn float_roundtrips() {
        let view = fixture();
        roundtrip(&view, 1.5f32);
        roundtrip(&view, -0.25f32);
        roundtrip(&view, f64::MIN_POSITIVE);
        roundtrip(&view, -123.456f64);
    }

    #[test]
    fn encoding_is_little_endian() {
        let view = fixture();
        let field: ScalarField<u32> = view.overlay(0);
        field.write(0x0102_0304).expect("write failed");
        assert_eq!(
            view.read_bytes(4, 0).expect("read failed"),
            vec![0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn kind_metadata() {
        assert_eq!(ScalarKind::U8.width(), 1);
        assert_eq!(ScalarKind::F64.width(), 8);
        assert!(ScalarKind::I16.is_signed());
        assert!(!ScalarKind::U16.is_signed());
        assert!(ScalarKind::F32.is_float());
        assert_eq!(ScalarKind::I64.name(), "i64");
        assert_eq!(<u16 as Scalar>::KIND, ScalarKind::U16);
    }

    #[test]
    fn fields_do_not_cache() {
        let view = fixture();
        let field: ScalarField<u16> = view.overlay(2);

        field.write(7).expect("write failed");
        view.write_bytes(&[0xFF, 0x00], 2).expect("raw write failed");
        assert_eq!(field.read().expect("read failed"), 0x00FF);
    }
}
