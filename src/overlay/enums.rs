//! Symbolic access to integer-backed enum storage.
//!
//! Foreign structures store enums as plain integers; this module maps them to
//! and from symbolic form at both tiers. The static tier is [`EnumRepr`], a
//! trait a Rust enum implements once to get typed access through
//! [`EnumField`]. The runtime tier is [`EnumDef`], a name/value table built at
//! runtime and attached to layout descriptors.
//!
//! Stored values that match no variant are surfaced as
//! [`Error::UnknownVariant`] rather than silently passed through; a scan that
//! needs the raw integer anyway can use [`EnumField::raw`].

use std::{fmt, marker::PhantomData, sync::Arc};

use crate::{
    overlay::{Overlay, Rebind, Scalar, ScalarField, ScalarKind},
    Error, MemoryView, Result,
};

/// Maps a Rust enum to and from its stored integer representation.
///
/// `Raw` is the integer type the foreign process stores; the `Into<i128>`
/// bound keeps floating-point storage out at compile time. Implemented by
/// hand per enum:
///
/// ```rust
/// use memscope::overlay::EnumRepr;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// enum ThreadState {
///     Idle,
///     Running,
///     Blocked,
/// }
///
/// impl EnumRepr for ThreadState {
///     type Raw = u32;
///     const NAME: &'static str = "ThreadState";
///
///     fn from_raw(raw: u32) -> Option<Self> {
///         match raw {
///             0 => Some(ThreadState::Idle),
///             1 => Some(ThreadState::Running),
///             2 => Some(ThreadState::Blocked),
///             _ => None,
///         }
///     }
///
///     fn to_raw(self) -> u32 {
///         self as u32
///     }
/// }
/// ```
pub trait EnumRepr: Copy {
    /// Integer type the foreign process stores this enum as.
    type Raw: Scalar + Into<i128>;

    /// Enum name used in diagnostics.
    const NAME: &'static str;

    /// Maps a stored value to a variant, or `None` for unknown values.
    fn from_raw(raw: Self::Raw) -> Option<Self>;

    /// Maps a variant to its stored value.
    fn to_raw(self) -> Self::Raw;
}

/// Live accessor for one enum-typed slot at (view, offset).
///
/// Reads fetch the raw integer and map it through [`EnumRepr::from_raw`];
/// writes go the other way. Nothing is cached between calls.
#[derive(Clone)]
pub struct EnumField<E: EnumRepr> {
    view: MemoryView,
    offset: u64,
    _marker: PhantomData<fn() -> E>,
}

impl<E: EnumRepr> EnumField<E> {
    /// Absolute foreign address of this field.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// Accessor for the raw stored integer, bypassing the variant mapping.
    ///
    /// Useful when a value that matches no variant still has to be inspected
    /// or preserved.
    #[must_use]
    pub fn raw(&self) -> ScalarField<E::Raw> {
        ScalarField::bind(self.view.clone(), self.offset)
    }

    /// Reads the stored integer and maps it to a variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariant`] when the stored value matches no
    /// variant, or [`Error::ReadFailed`] when the backend cannot satisfy the
    /// read.
    pub fn read(&self) -> Result<E> {
        let raw = self.raw().read()?;
        E::from_raw(raw).ok_or_else(|| Error::UnknownVariant {
            name: E::NAME.to_string(),
            value: raw.into(),
        })
    }

    /// Encodes `variant` and writes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] when the backend cannot accept the
    /// write.
    pub fn write(&self, variant: E) -> Result<()> {
        self.raw().write(variant.to_raw())
    }
}

impl<E: EnumRepr> Rebind for EnumField<E> {
    fn rebind(&self, view: MemoryView, offset: u64) -> Self {
        Self::bind(view, offset)
    }
}

impl<E: EnumRepr> Overlay for EnumField<E> {
    fn bind(view: MemoryView, offset: u64) -> Self {
        EnumField {
            view,
            offset,
            _marker: PhantomData,
        }
    }
}

impl<E: EnumRepr> fmt::Debug for EnumField<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumField")
            .field("name", &E::NAME)
            .field("address", &format_args!("{:#x}", self.address()))
            .finish()
    }
}

/// Runtime enum definition: a name, an integer storage kind and a
/// variant table.
///
/// The runtime counterpart of [`EnumRepr`], built when the enum's shape is
/// only known at runtime and attached to layouts through
/// [`crate::overlay::FieldDescriptor::Enum`]. Variant values are held widened
/// to `i128` so one table type covers every storage kind.
///
/// # Examples
///
/// ```rust
/// use memscope::overlay::{EnumDef, ScalarKind};
///
/// let state = EnumDef::new(
///     "ThreadState",
///     ScalarKind::U32,
///     &[("Idle", 0), ("Running", 1), ("Blocked", 2)],
/// );
///
/// assert_eq!(state.name_of(1).unwrap(), "Running");
/// assert_eq!(state.value_of("Blocked").unwrap(), 2);
/// assert!(state.name_of(99).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct EnumDef {
    name: Arc<str>,
    kind: ScalarKind,
    variants: Vec<(Arc<str>, i128)>,
}

impl EnumDef {
    /// Builds a definition from a variant table.
    ///
    /// # Panics
    ///
    /// Panics when `kind` is a floating-point kind, or when a variant value
    /// does not fit in `kind`'s range. Both are construction-time programmer
    /// errors, not runtime data conditions.
    #[must_use]
    pub fn new(name: &str, kind: ScalarKind, variants: &[(&str, i128)]) -> Self {
        assert!(
            !kind.is_float(),
            "enum '{name}' must use an integer storage kind"
        );
        for (variant, value) in variants {
            assert!(
                kind.holds(*value),
                "variant '{variant}' of enum '{name}' does not fit in {}",
                kind.name()
            );
        }

        EnumDef {
            name: Arc::from(name),
            kind,
            variants: variants
                .iter()
                .map(|(variant, value)| (Arc::from(*variant), *value))
                .collect(),
        }
    }

    /// The enum's name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integer kind the foreign process stores this enum as.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Iterates the variant table in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = (&str, i128)> {
        self.variants.iter().map(|(name, value)| (&**name, *value))
    }

    /// Maps a stored value to its variant name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariant`] when no variant has this value.
    pub fn name_of(&self, value: i128) -> Result<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| &**name)
            .ok_or_else(|| Error::UnknownVariant {
                name: self.name.to_string(),
                value,
            })
    }

    /// Maps a variant name to its stored value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVariantName`] when no variant has this name.
    pub fn value_of(&self, variant: &str) -> Result<i128> {
        self.variants
            .iter()
            .find(|(name, _)| &**name == variant)
            .map(|(_, value)| *value)
            .ok_or_else(|| Error::UnknownVariantName {
                name: self.name.to_string(),
                variant: variant.to_string(),
            })
    }
}
