//! # memscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the memscope library. Import this module to get quick access to the essential
//! types for working with a live target's memory.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all memscope operations
pub use crate::Error;

/// The result type used throughout memscope
pub use crate::Result;

// ================================================================================================
// Backends and Views
// ================================================================================================

/// An address anchored to the backend that produced it
pub use crate::MemoryView;

/// Transport contract, shared handle, in-process target and protection flags
pub use crate::backend::{LocalBackend, MemoryBackend, Protection, SharedBackend};

// ================================================================================================
// Allocators
// ================================================================================================

/// Placement engines and their bookkeeping record
pub use crate::allocator::{BaseAllocator, CaveAllocator, OwnedRegion};

// ================================================================================================
// Overlay Binding
// ================================================================================================

/// The binding contracts behind [`MemoryView::overlay`] and [`MemoryView::overlay_from`]
pub use crate::overlay::{Overlay, Rebind};

// ================================================================================================
// Compile-Time Fields
// ================================================================================================

/// Fixed-width little-endian scalars
pub use crate::overlay::{Scalar, ScalarField, ScalarKind};

/// Pointer slots and the width they occupy
pub use crate::overlay::{PointerField, POINTER_WIDTH};

/// NUL-terminated narrow and wide strings
pub use crate::overlay::{CStringField, WideStringField};

/// Discriminants mapped onto Rust enums
pub use crate::overlay::{EnumDef, EnumField, EnumRepr};

// ================================================================================================
// Runtime Layouts
// ================================================================================================

/// Layout descriptions assembled at runtime
pub use crate::overlay::{FieldDescriptor, LayoutField, StructLayout, StructLayoutBuilder};

/// Layouts bound to live memory and their dynamically typed contents
pub use crate::overlay::{BoundField, StructOverlay, Value};

/// Shared layout storage and forward references
pub use crate::overlay::{LayoutRegistry, LazyRef};
