//! Typed accessors over foreign memory.
//!
//! An overlay binds interpretation - a codec and a byte offset - onto a
//! [`MemoryView`]. Binding reads nothing; every field access afterwards goes
//! straight to the backend, and no decoded value is ever cached. The same
//! bytes can be bound through any number of overlays at once.
//!
//! # Architecture
//!
//! Two tiers share the binding model:
//!
//! - **Static tier**: generic accessors checked at compile time -
//!   [`ScalarField`], [`PointerField`], [`CStringField`], [`WideStringField`],
//!   [`EnumField`]. User-defined composite structs group them by implementing
//!   [`Overlay`]. Self-referential types work directly: a `PointerField<Node>`
//!   inside `Node` stores no `Node`.
//! - **Runtime tier**: layouts as data - [`StructLayout`] built from ordered
//!   `(name, offset, descriptor)` tuples, bound with
//!   [`MemoryView::overlay_layout`], navigated through [`StructOverlay`] and
//!   [`BoundField`]. Forward references between layouts go through
//!   [`LayoutRegistry`]. This is the tier for structures discovered at
//!   runtime, where recompiling is not an option.
//!
//! # Key Components
//!
//! - [`Overlay`] / [`Rebind`] - the binding traits behind
//!   [`MemoryView::overlay`] and [`MemoryView::overlay_from`]
//! - [`Scalar`] + [`ScalarField`] - fixed-width little-endian numerics
//! - [`PointerField`] - dereference, cast and cast_offset
//! - [`CStringField`] / [`WideStringField`] - terminated string codecs
//! - [`EnumRepr`] + [`EnumField`] / [`EnumDef`] - symbolic integer mappings
//! - [`FieldDescriptor`], [`StructLayout`], [`StructOverlay`], [`BoundField`],
//!   [`Value`] - the runtime tier
//! - [`LayoutRegistry`] + [`LazyRef`] - forward references for
//!   self-referential layouts
//!
//! # Usage Examples
//!
//! ```rust
//! use memscope::overlay::{CStringField, Overlay, PointerField, Rebind, ScalarField};
//! use memscope::{LocalBackend, MemoryView, SharedBackend};
//!
//! /// 0x00: i64 value | 0x08: ptr next | 0x10: name bytes
//! struct Node {
//!     value: ScalarField<i64>,
//!     next: PointerField<Node>,
//!     name: CStringField,
//! }
//!
//! impl Rebind for Node {
//!     fn rebind(&self, view: MemoryView, offset: u64) -> Self {
//!         Node::bind(view, offset)
//!     }
//! }
//!
//! impl Overlay for Node {
//!     fn bind(view: MemoryView, offset: u64) -> Self {
//!         Node {
//!             value: view.overlay(offset),
//!             next: view.overlay(offset + 0x08),
//!             name: view.overlay(offset + 0x10),
//!         }
//!     }
//! }
//!
//! # fn main() -> memscope::Result<()> {
//! let backend = SharedBackend::new(LocalBackend::new(0x1000));
//! let first = backend.alloc0(0x20)?;
//! let second = backend.alloc0(0x20)?;
//!
//! let node: Node = first.overlay(0);
//! node.value.write(-1)?;
//! node.name.write("head")?;
//! node.next.write_address(second.address())?;
//!
//! let tail: Node = node.next.read()?;
//! tail.value.write(7)?;
//! assert_eq!(second.overlay::<Node>(0).value.read()?, 7);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Accessors are plain values over a cloneable view; they carry no
//! synchronization. Concurrent access to the same foreign bytes is the
//! caller's problem, exactly as it is with two debuggers attached to one
//! process.

mod composite;
mod enums;
mod pointer;
mod registry;
mod scalar;
mod string;

pub use composite::{
    BoundField, FieldDescriptor, LayoutField, StructLayout, StructLayoutBuilder, StructOverlay,
    Value,
};
pub use enums::{EnumDef, EnumField, EnumRepr};
pub use pointer::{PointerField, POINTER_WIDTH};
pub use registry::{LayoutRegistry, LazyRef};
pub use scalar::{Scalar, ScalarField, ScalarKind};
pub use string::{CStringField, WideStringField};

use crate::MemoryView;

/// Rebinding: every accessor can produce an independent copy of itself bound
/// to a new location.
///
/// This is the prototype path of [`MemoryView::overlay_from`] - configure an
/// accessor once (a layout, an enum mapping), then stamp copies of it across
/// views and offsets. Configuration is shared; the binding is new.
pub trait Rebind: Sized {
    /// Returns a copy of this accessor bound to `view` at `offset`.
    fn rebind(&self, view: MemoryView, offset: u64) -> Self;
}

/// Accessors that can be instantiated from their type alone.
///
/// [`MemoryView::overlay`] turns the type parameter into a bound accessor
/// through this trait. Accessors whose definition is runtime data (a
/// [`StructOverlay`] needs its [`StructLayout`]) implement only [`Rebind`]
/// and are bound through [`MemoryView::overlay_layout`] instead.
pub trait Overlay: Rebind {
    /// Binds a fresh accessor of this type to `view` at `offset`.
    ///
    /// Must not read foreign memory; binding is interpretation only.
    fn bind(view: MemoryView, offset: u64) -> Self;
}
