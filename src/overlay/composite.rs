//! Runtime struct layouts: descriptors, builders and dynamically typed
//! field access.
//!
//! The static tier in the sibling modules needs the shape of a structure at
//! compile time. This module is the other tier: a [`StructLayout`] is plain
//! data built at runtime, so layouts can come from config files, scripts or
//! interactive exploration of an unknown target. Binding a layout to a
//! [`MemoryView`] yields a [`StructOverlay`]; resolving one of its fields
//! yields a [`BoundField`], which reads and writes [`Value`]s or hands out
//! the static-tier accessor for callers that know the concrete type after
//! all.
//!
//! # Key Components
//!
//! - [`FieldDescriptor`] - what one field is (scalar, pointer, string, enum,
//!   nested struct, forward reference)
//! - [`StructLayout`] / [`StructLayoutBuilder`] - named, ordered field table
//! - [`StructOverlay`] - a layout bound to (view, offset)
//! - [`BoundField`] - one resolved field, the unit of dynamic access
//! - [`Value`] - dynamically typed read/write payload with a `Display`
//!   suitable for inspection dumps
//!
//! # Usage Examples
//!
//! ```rust
//! use memscope::{
//!     overlay::{ScalarKind, StructLayout, Value},
//!     LocalBackend, SharedBackend,
//! };
//!
//! # fn main() -> memscope::Result<()> {
//! let backend = SharedBackend::new(LocalBackend::new(0x1000));
//! let view = backend.alloc0(0x40)?;
//!
//! let player = StructLayout::builder("Player")
//!     .scalar("health", 0x00, ScalarKind::I32)
//!     .cstring("name", 0x10)
//!     .build()?;
//!
//! let overlay = view.overlay_layout(&player, 0);
//! overlay.field("health")?.write(&Value::I32(200))?;
//! overlay.field("name")?.write(&Value::Str("rogue".into()))?;
//!
//! for field in overlay.fields() {
//!     println!("{} = {}", field.name(), field.read()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Layouts are immutable once built and shared through `Arc`. Overlays and
//! bound fields are cheap clones of (view, offset, descriptor) with no
//! interior state; concurrent reads against one layout are fine, subject to
//! the backend's own guarantees.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    overlay::{
        CStringField, EnumDef, LazyRef, Overlay, Rebind, Scalar, ScalarField, ScalarKind,
        WideStringField,
    },
    Error, MemoryView, Result,
};

/// Runtime description of one field's type.
///
/// The runtime counterpart of the static accessor types: each variant names
/// the codec a [`BoundField`] dispatches to. Descriptors nest through `Box`
/// and `Arc`, so one descriptor tree can describe arbitrarily deep
/// structures.
#[derive(Debug, Clone)]
pub enum FieldDescriptor {
    /// Fixed-width numeric field of the given kind.
    Scalar(ScalarKind),
    /// Pointer-width slot whose target is described by the inner descriptor.
    Pointer(Box<FieldDescriptor>),
    /// NUL-terminated byte string decoded as UTF-8.
    CString,
    /// NUL-terminated UTF-16 little-endian string.
    WideString,
    /// Integer storage mapped through a runtime enum definition.
    Enum(Arc<EnumDef>),
    /// Structure embedded inline at the field's offset.
    Struct(Arc<StructLayout>),
    /// Forward reference to a layout resolved through a registry on first
    /// access; required when a layout contains a pointer to itself.
    Lazy(LazyRef),
}

impl FieldDescriptor {
    /// Short kind label used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldDescriptor::Scalar(kind) => kind.name(),
            FieldDescriptor::Pointer(_) => "pointer",
            FieldDescriptor::CString => "string",
            FieldDescriptor::WideString => "wide string",
            FieldDescriptor::Enum(_) => "enum",
            FieldDescriptor::Struct(_) | FieldDescriptor::Lazy(_) => "struct",
        }
    }
}

/// One named field of a [`StructLayout`]: name, offset and descriptor.
#[derive(Debug, Clone)]
pub struct LayoutField {
    name: Arc<str>,
    offset: u64,
    descriptor: FieldDescriptor,
}

impl LayoutField {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte offset relative to the owning structure's base.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The field's type description.
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

/// Named, ordered table of field descriptors describing one structure.
///
/// Built once through [`StructLayoutBuilder`], then shared immutably via
/// `Arc`. Field order is declaration order and is independent of the byte
/// offsets, matching how exploration usually proceeds (fields get added as
/// they are identified, not in address order).
#[derive(Debug)]
pub struct StructLayout {
    name: Arc<str>,
    fields: Vec<LayoutField>,
    index: HashMap<Arc<str>, usize>,
}

impl StructLayout {
    /// Starts a builder for a layout with this name.
    #[must_use]
    pub fn builder(name: &str) -> StructLayoutBuilder {
        StructLayoutBuilder::new(name)
    }

    /// The layout's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LayoutField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Chainable builder for [`StructLayout`].
///
/// Field methods append in call order; [`StructLayoutBuilder::build`]
/// validates name uniqueness and freezes the layout behind an `Arc`.
#[derive(Debug)]
pub struct StructLayoutBuilder {
    name: Arc<str>,
    fields: Vec<LayoutField>,
}

impl StructLayoutBuilder {
    /// Starts an empty builder for a layout with this name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        StructLayoutBuilder {
            name: Arc::from(name),
            fields: Vec::new(),
        }
    }

    /// Appends a field with an explicit descriptor.
    #[must_use]
    pub fn field(mut self, name: &str, offset: u64, descriptor: FieldDescriptor) -> Self {
        self.fields.push(LayoutField {
            name: Arc::from(name),
            offset,
            descriptor,
        });
        self
    }

    /// Appends a fixed-width numeric field.
    #[must_use]
    pub fn scalar(self, name: &str, offset: u64, kind: ScalarKind) -> Self {
        self.field(name, offset, FieldDescriptor::Scalar(kind))
    }

    /// Appends a pointer field whose target is described by `target`.
    #[must_use]
    pub fn pointer(self, name: &str, offset: u64, target: FieldDescriptor) -> Self {
        self.field(name, offset, FieldDescriptor::Pointer(Box::new(target)))
    }

    /// Appends a NUL-terminated UTF-8 string field.
    #[must_use]
    pub fn cstring(self, name: &str, offset: u64) -> Self {
        self.field(name, offset, FieldDescriptor::CString)
    }

    /// Appends a NUL-terminated UTF-16 string field.
    #[must_use]
    pub fn wide_string(self, name: &str, offset: u64) -> Self {
        self.field(name, offset, FieldDescriptor::WideString)
    }

    /// Appends an enum field mapped through `def`.
    #[must_use]
    pub fn enumeration(self, name: &str, offset: u64, def: Arc<EnumDef>) -> Self {
        self.field(name, offset, FieldDescriptor::Enum(def))
    }

    /// Appends a structure embedded inline at `offset`.
    #[must_use]
    pub fn nested(self, name: &str, offset: u64, layout: Arc<StructLayout>) -> Self {
        self.field(name, offset, FieldDescriptor::Struct(layout))
    }

    /// Appends a forward reference resolved through a registry on first
    /// access.
    #[must_use]
    pub fn lazy(self, name: &str, offset: u64, reference: LazyRef) -> Self {
        self.field(name, offset, FieldDescriptor::Lazy(reference))
    }

    /// Validates and freezes the layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateField`] when two fields share a name.
    pub fn build(self) -> Result<Arc<StructLayout>> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(Error::DuplicateField {
                    layout: self.name.to_string(),
                    field: field.name.to_string(),
                });
            }
        }

        Ok(Arc::new(StructLayout {
            name: self.name,
            fields: self.fields,
            index,
        }))
    }
}

/// A [`StructLayout`] bound to (view, base offset).
///
/// Binding reads nothing; field access resolves addresses as
/// `view.address + base offset + field offset` and hits the backend live,
/// like every other accessor in this crate.
#[derive(Debug, Clone)]
pub struct StructOverlay {
    view: MemoryView,
    offset: u64,
    layout: Arc<StructLayout>,
}

impl StructOverlay {
    pub(crate) fn new(view: MemoryView, offset: u64, layout: Arc<StructLayout>) -> Self {
        StructOverlay {
            view,
            offset,
            layout,
        }
    }

    /// Name of the bound layout.
    #[must_use]
    pub fn name(&self) -> &str {
        self.layout.name()
    }

    /// Absolute foreign address of the structure's base.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// The bound layout.
    #[must_use]
    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    /// Resolves one field by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] when the layout has no field with
    /// this name.
    pub fn field(&self, name: &str) -> Result<BoundField> {
        let Some(field) = self.layout.get(name) else {
            return Err(Error::UnknownField {
                layout: self.layout.name().to_string(),
                field: name.to_string(),
            });
        };
        Ok(self.bind_field(field))
    }

    /// Iterates all fields in declaration order.
    ///
    /// Together with [`Value`]'s `Display`, this is the inspection-dump path
    /// for structures whose contents are being explored.
    pub fn fields(&self) -> impl Iterator<Item = BoundField> + '_ {
        self.layout.fields().iter().map(|field| self.bind_field(field))
    }

    fn bind_field(&self, field: &LayoutField) -> BoundField {
        BoundField {
            view: self.view.clone(),
            offset: self.offset.wrapping_add(field.offset),
            name: field.name.clone(),
            descriptor: field.descriptor.clone(),
        }
    }
}

impl Rebind for StructOverlay {
    fn rebind(&self, view: MemoryView, offset: u64) -> Self {
        StructOverlay::new(view, offset, self.layout.clone())
    }
}

/// One resolved field of a [`StructOverlay`]: the unit of dynamic access.
///
/// Offers two roads in: dynamically typed [`BoundField::read`] /
/// [`BoundField::write`] speaking [`Value`], and typed escapes
/// ([`BoundField::scalar`], [`BoundField::cstring`], ...) that hand out the
/// static-tier accessor once the caller knows the concrete type.
#[derive(Debug, Clone)]
pub struct BoundField {
    view: MemoryView,
    offset: u64,
    name: Arc<str>,
    descriptor: FieldDescriptor,
}

impl BoundField {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute foreign address of this field.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// The field's type description.
    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Reads the field dynamically.
    ///
    /// Struct-valued and pointer-valued fields read shallowly: the returned
    /// [`Value`] carries a bound handle to navigate further, not a deep copy
    /// of foreign memory.
    ///
    /// # Errors
    ///
    /// Backend failures surface as [`Error::ReadFailed`]; decode failures as
    /// [`Error::UnknownVariant`], [`Error::UnterminatedString`] or
    /// [`Error::InvalidText`]; unresolved forward references as
    /// [`Error::UnresolvedLayout`].
    pub fn read(&self) -> Result<Value> {
        match &self.descriptor {
            FieldDescriptor::Scalar(kind) => read_scalar(&self.view, self.offset, *kind),
            FieldDescriptor::Pointer(target) => {
                let address = self.pointer_slot().read()?;
                Ok(Value::Pointer {
                    address,
                    target: Box::new(self.target_field(address, target)),
                })
            }
            FieldDescriptor::CString => Ok(Value::Str(
                CStringField::bind(self.view.clone(), self.offset).read()?,
            )),
            FieldDescriptor::WideString => Ok(Value::WStr(
                WideStringField::bind(self.view.clone(), self.offset).read()?,
            )),
            FieldDescriptor::Enum(def) => {
                let value = read_widened(&self.view, self.offset, def.kind())?;
                Ok(Value::Variant {
                    name: def.name_of(value)?.to_string(),
                    value,
                })
            }
            FieldDescriptor::Struct(layout) => Ok(Value::Struct(StructOverlay::new(
                self.view.clone(),
                self.offset,
                layout.clone(),
            ))),
            FieldDescriptor::Lazy(lazy) => Ok(Value::Struct(StructOverlay::new(
                self.view.clone(),
                self.offset,
                lazy.resolve()?,
            ))),
        }
    }

    /// Writes the field dynamically.
    ///
    /// The value's variant must match the descriptor exactly; a `U32` value
    /// against an `I32` field is a mismatch, not a coercion. Struct-valued
    /// fields are navigated, never written wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] when the value's kind disagrees with
    /// the descriptor, [`Error::UnknownVariantName`] for an enum variant the
    /// definition lacks, or [`Error::WriteFailed`] from the backend.
    pub fn write(&self, value: &Value) -> Result<()> {
        match &self.descriptor {
            FieldDescriptor::Scalar(kind) => {
                let Some(bytes) = scalar_value_bytes(*kind, value) else {
                    return Err(self.mismatch(kind.name(), value.kind_name()));
                };
                self.view.write_bytes(&bytes, self.offset)
            }
            FieldDescriptor::Pointer(_) => {
                let Value::Pointer { address, .. } = value else {
                    return Err(self.mismatch("pointer", value.kind_name()));
                };
                self.pointer_slot().write(*address)
            }
            FieldDescriptor::CString => {
                let Value::Str(text) = value else {
                    return Err(self.mismatch("string", value.kind_name()));
                };
                CStringField::bind(self.view.clone(), self.offset).write(text)
            }
            FieldDescriptor::WideString => {
                let Value::WStr(text) = value else {
                    return Err(self.mismatch("wide string", value.kind_name()));
                };
                WideStringField::bind(self.view.clone(), self.offset).write(text)
            }
            FieldDescriptor::Enum(def) => {
                let Value::Variant { name, .. } = value else {
                    return Err(self.mismatch("enum", value.kind_name()));
                };
                let raw = def.value_of(name)?;
                write_widened(&self.view, self.offset, def.kind(), raw)
            }
            FieldDescriptor::Struct(_) | FieldDescriptor::Lazy(_) => {
                Err(self.mismatch("a writable leaf", "struct"))
            }
        }
    }

    /// Typed escape to a [`ScalarField`] of the declared kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] unless the descriptor is a scalar of
    /// exactly `T`'s kind.
    pub fn scalar<T: Scalar>(&self) -> Result<ScalarField<T>> {
        match &self.descriptor {
            FieldDescriptor::Scalar(kind) if *kind == T::KIND => {
                Ok(ScalarField::bind(self.view.clone(), self.offset))
            }
            other => Err(self.mismatch(T::KIND.name(), other.kind_name())),
        }
    }

    /// Typed escape to a [`CStringField`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] unless the descriptor is a C string.
    pub fn cstring(&self) -> Result<CStringField> {
        match &self.descriptor {
            FieldDescriptor::CString => Ok(CStringField::bind(self.view.clone(), self.offset)),
            other => Err(self.mismatch("string", other.kind_name())),
        }
    }

    /// Typed escape to a [`WideStringField`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] unless the descriptor is a wide
    /// string.
    pub fn wide_string(&self) -> Result<WideStringField> {
        match &self.descriptor {
            FieldDescriptor::WideString => {
                Ok(WideStringField::bind(self.view.clone(), self.offset))
            }
            other => Err(self.mismatch("wide string", other.kind_name())),
        }
    }

    /// The enum definition attached to this field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] unless the descriptor is an enum.
    pub fn enum_def(&self) -> Result<Arc<EnumDef>> {
        match &self.descriptor {
            FieldDescriptor::Enum(def) => Ok(def.clone()),
            other => Err(self.mismatch("enum", other.kind_name())),
        }
    }

    /// Binds the field as a structure.
    ///
    /// Works for inline structs and forward references; the latter resolve
    /// through their registry here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] for non-struct fields,
    /// [`Error::UnresolvedLayout`] or [`Error::RegistryGone`] when a forward
    /// reference cannot resolve.
    pub fn as_struct(&self) -> Result<StructOverlay> {
        let layout = match &self.descriptor {
            FieldDescriptor::Struct(layout) => layout.clone(),
            FieldDescriptor::Lazy(lazy) => lazy.resolve()?,
            other => return Err(self.mismatch("struct", other.kind_name())),
        };
        Ok(StructOverlay::new(self.view.clone(), self.offset, layout))
    }

    /// Follows a pointer field to its target.
    ///
    /// Reads the stored address and binds the pointer's target descriptor
    /// there, as a new [`BoundField`] carrying this field's name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] for non-pointer fields or
    /// [`Error::ReadFailed`] when the slot cannot be read.
    pub fn deref(&self) -> Result<BoundField> {
        let FieldDescriptor::Pointer(target) = &self.descriptor else {
            return Err(self.mismatch("pointer", self.descriptor.kind_name()));
        };
        let address = self.pointer_slot().read()?;
        Ok(self.target_field(address, target))
    }

    /// Reads the raw address stored in a pointer field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] for non-pointer fields or
    /// [`Error::ReadFailed`] from the backend.
    pub fn read_address(&self) -> Result<u64> {
        self.require_pointer()?;
        self.pointer_slot().read()
    }

    /// Stores a raw address into a pointer field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldMismatch`] for non-pointer fields or
    /// [`Error::WriteFailed`] from the backend.
    pub fn write_address(&self, address: u64) -> Result<()> {
        self.require_pointer()?;
        self.pointer_slot().write(address)
    }

    fn require_pointer(&self) -> Result<()> {
        match &self.descriptor {
            FieldDescriptor::Pointer(_) => Ok(()),
            other => Err(self.mismatch("pointer", other.kind_name())),
        }
    }

    fn pointer_slot(&self) -> ScalarField<u64> {
        ScalarField::bind(self.view.clone(), self.offset)
    }

    fn target_field(&self, address: u64, target: &FieldDescriptor) -> BoundField {
        BoundField {
            view: self.view.backend().view(address),
            offset: 0,
            name: self.name.clone(),
            descriptor: target.clone(),
        }
    }

    fn mismatch(&self, expected: &'static str, found: &'static str) -> Error {
        Error::FieldMismatch {
            field: self.name.to_string(),
            expected,
            found,
        }
    }
}

/// Dynamically typed payload for [`BoundField`] reads and writes.
///
/// Pointer and struct values are shallow: they carry bound handles into
/// foreign memory, not copies of it. `Display` renders a single-line form
/// meant for inspection dumps.
#[derive(Debug, Clone)]
pub enum Value {
    /// Unsigned 8-bit integer
    U8(u8),
    /// Signed 8-bit integer
    I8(i8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Signed 16-bit integer
    I16(i16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Signed 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// UTF-8 text from a C-string field
    Str(String),
    /// Text decoded from a UTF-16 wide-string field
    WStr(String),
    /// Symbolic enum variant plus its raw stored value
    Variant {
        /// Variant name per the enum definition
        name: String,
        /// Raw stored value, widened
        value: i128,
    },
    /// Stored pointer plus a handle bound at its target
    Pointer {
        /// The address held in the slot
        address: u64,
        /// The pointer's target, bound and ready to navigate
        target: Box<BoundField>,
    },
    /// Structure handle for further navigation
    Struct(StructOverlay),
}

impl Value {
    /// Short kind label used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::U16(_) => "u16",
            Value::I16(_) => "i16",
            Value::U32(_) => "u32",
            Value::I32(_) => "i32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::WStr(_) => "wide string",
            Value::Variant { .. } => "enum",
            Value::Pointer { .. } => "pointer",
            Value::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Str(s) | Value::WStr(s) => write!(f, "\"{s}\""),
            Value::Variant { name, .. } => f.write_str(name),
            Value::Pointer { address, .. } => write!(f, "-> {address:#x}"),
            Value::Struct(s) => write!(f, "{} @ {:#x}", s.name(), s.address()),
        }
    }
}

fn read_scalar(view: &MemoryView, offset: u64, kind: ScalarKind) -> Result<Value> {
    Ok(match kind {
        ScalarKind::U8 => Value::U8(ScalarField::<u8>::bind(view.clone(), offset).read()?),
        ScalarKind::I8 => Value::I8(ScalarField::<i8>::bind(view.clone(), offset).read()?),
        ScalarKind::U16 => Value::U16(ScalarField::<u16>::bind(view.clone(), offset).read()?),
        ScalarKind::I16 => Value::I16(ScalarField::<i16>::bind(view.clone(), offset).read()?),
        ScalarKind::U32 => Value::U32(ScalarField::<u32>::bind(view.clone(), offset).read()?),
        ScalarKind::I32 => Value::I32(ScalarField::<i32>::bind(view.clone(), offset).read()?),
        ScalarKind::U64 => Value::U64(ScalarField::<u64>::bind(view.clone(), offset).read()?),
        ScalarKind::I64 => Value::I64(ScalarField::<i64>::bind(view.clone(), offset).read()?),
        ScalarKind::F32 => Value::F32(ScalarField::<f32>::bind(view.clone(), offset).read()?),
        ScalarKind::F64 => Value::F64(ScalarField::<f64>::bind(view.clone(), offset).read()?),
    })
}

fn scalar_value_bytes(kind: ScalarKind, value: &Value) -> Option<Vec<u8>> {
    match (kind, value) {
        (ScalarKind::U8, Value::U8(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::I8, Value::I8(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::U16, Value::U16(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::I16, Value::I16(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::U32, Value::U32(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::I32, Value::I32(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::U64, Value::U64(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::I64, Value::I64(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::F32, Value::F32(v)) => Some(v.to_le_bytes().to_vec()),
        (ScalarKind::F64, Value::F64(v)) => Some(v.to_le_bytes().to_vec()),
        _ => None,
    }
}

fn read_widened(view: &MemoryView, offset: u64, kind: ScalarKind) -> Result<i128> {
    Ok(match kind {
        ScalarKind::U8 => i128::from(ScalarField::<u8>::bind(view.clone(), offset).read()?),
        ScalarKind::I8 => i128::from(ScalarField::<i8>::bind(view.clone(), offset).read()?),
        ScalarKind::U16 => i128::from(ScalarField::<u16>::bind(view.clone(), offset).read()?),
        ScalarKind::I16 => i128::from(ScalarField::<i16>::bind(view.clone(), offset).read()?),
        ScalarKind::U32 => i128::from(ScalarField::<u32>::bind(view.clone(), offset).read()?),
        ScalarKind::I32 => i128::from(ScalarField::<i32>::bind(view.clone(), offset).read()?),
        ScalarKind::U64 => i128::from(ScalarField::<u64>::bind(view.clone(), offset).read()?),
        ScalarKind::I64 => i128::from(ScalarField::<i64>::bind(view.clone(), offset).read()?),
        ScalarKind::F32 | ScalarKind::F64 => {
            unreachable!("enum storage is always an integer kind")
        }
    })
}

fn write_widened(view: &MemoryView, offset: u64, kind: ScalarKind, value: i128) -> Result<()> {
    match kind {
        ScalarKind::U8 => ScalarField::<u8>::bind(view.clone(), offset).write(value as u8),
        ScalarKind::I8 => ScalarField::<i8>::bind(view.clone(), offset).write(value as i8),
        ScalarKind::U16 => ScalarField::<u16>::bind(view.clone(), offset).write(value as u16),
        ScalarKind::I16 => ScalarField::<i16>::bind(view.clone(), offset).write(value as i16),
        ScalarKind::U32 => ScalarField::<u32>::bind(view.clone(), offset).write(value as u32),
        ScalarKind::I32 => ScalarField::<i32>::bind(view.clone(), offset).write(value as i32),
        ScalarKind::U64 => ScalarField::<u64>::bind(view.clone(), offset).write(value as u64),
        ScalarKind::I64 => ScalarField::<i64>::bind(view.clone(), offset).write(value as i64),
        ScalarKind::F32 | ScalarKind::F64 => {
            unreachable!("enum storage is always an integer kind")
        }
    }
}
