// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # memscope
//!
//! [![Crates.io](https://img.shields.io/crates/v/memscope.svg)](https://crates.io/crates/memscope)
//! [![Documentation](https://docs.rs/memscope/badge.svg)](https://docs.rs/memscope)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/memscope/blob/main/LICENSE-APACHE)
//!
//! A cross-platform framework for inspecting, allocating and typing the memory of live
//! foreign processes. Built in pure Rust, `memscope` projects typed views onto raw address
//! space, so that scalars, pointers, strings, enums and whole structure layouts become
//! first-class values that decode and encode through whatever transport reaches the target.
//!
//! ## Features
//!
//! - **🔌 Pluggable transports** - Four raw operations are enough to adapt a debugger session, an emulator or a hypervisor
//! - **🧭 Typed overlays** - Scalars, pointers, strings, enums and nested structs anchored to raw addresses
//! - **🕳️ Code cave allocation** - Best-fit placement inside address space the target already owns
//! - **🧱 Runtime layouts** - Describe structures discovered while reversing, no compile-time types required
//! - **🔁 Forward references** - Self-referential and mutually recursive layouts through a shared registry
//! - **🛡️ Memory safe** - Pure Rust with comprehensive error handling, `unsafe` is denied crate-wide
//! - **🔧 Cross-platform** - The library never touches an OS API; backends decide how to reach the target
//!
//! ## Quick Start
//!
//! Add `memscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! memscope = "0.2"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use memscope::prelude::*;
//!
//! // An in-process target; a real tool would wrap ptrace, a driver or a VM here
//! let backend = SharedBackend::new(LocalBackend::new(0x10000));
//!
//! let mut heap = BaseAllocator::new(backend);
//! let view = heap.alloc0(0x40)?;
//!
//! view.overlay::<ScalarField<u32>>(0x8).write(1337)?;
//! assert_eq!(view.overlay::<ScalarField<u32>>(0x8).read()?, 1337);
//! # Ok::<(), memscope::Error>(())
//! ```
//!
//! ### Raw Access
//!
//! Views anchor an address to the backend that produced it and move plain bytes:
//!
//! ```rust
//! use memscope::{LocalBackend, Protection, SharedBackend};
//!
//! let local = LocalBackend::new(0x10000);
//! local.map(0x400000, vec![0u8; 0x100], Protection::READ_WRITE)?;
//!
//! let backend = SharedBackend::new(local);
//! let view = backend.view(0x400000);
//!
//! view.write_bytes(&[0xDE, 0xAD, 0xBE, 0xEF], 0x10)?;
//! assert_eq!(view.read_bytes(4, 0x10)?, [0xDE, 0xAD, 0xBE, 0xEF]);
//! # Ok::<(), memscope::Error>(())
//! ```
//!
//! ### Structured Access
//!
//! The [`overlay`] module projects named, typed fields onto raw memory, including
//! layouts assembled at runtime from whatever a reversing session turns up. See the
//! module documentation for layouts, registries and forward references.
//!
//! ## Architecture
//!
//! `memscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`backend`] - The four-operation transport contract and the shared handle over it
//! - [`allocator`] - Tracked general allocation and best-fit code cave placement
//! - [`overlay`] - Typed projections, from single scalars to whole struct layouts
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Typed Access
//!
//! The overlay tier comes in two flavors:
//!
//! - **Compile time**: [`ScalarField`](overlay::ScalarField), [`PointerField`](overlay::PointerField),
//!   [`CStringField`](overlay::CStringField), [`WideStringField`](overlay::WideStringField) and
//!   [`EnumField`](overlay::EnumField), for structures known when the tool is written
//! - **Runtime**: [`StructLayout`](overlay::StructLayout) built from field descriptors and navigated
//!   by name through [`StructOverlay`](overlay::StructOverlay), for structures discovered live
//!
//! Overlays never cache. Every read decodes bytes fetched at call time and every write
//! encodes back immediately, so two overlays on the same address always agree.
//!
//! ### Allocation Engine
//!
//! - [`BaseAllocator`] obtains fresh regions from the backend and tracks them
//! - [`CaveAllocator`] carves best-fit intervals out of a window the target already maps
//! - Both keep a sorted region table, refuse addresses they never produced and
//!   release only whole regions
//!
//! ## Advanced Usage
//!
//! ### Runtime Layouts
//!
//! ```rust
//! use memscope::prelude::*;
//!
//! let layout = StructLayout::builder("Player")
//!     .scalar("health", 0x0, ScalarKind::I32)
//!     .scalar("mana", 0x4, ScalarKind::I32)
//!     .cstring("name", 0x8)
//!     .build()?;
//!
//! let backend = SharedBackend::new(LocalBackend::new(0x10000));
//! let mut heap = BaseAllocator::new(backend);
//! let view = heap.alloc0(0x40)?;
//!
//! let player = view.overlay_layout(&layout, 0);
//! player.field("health")?.write(&Value::I32(100))?;
//! assert!(matches!(player.field("health")?.read(), Ok(Value::I32(100))));
//! # Ok::<(), memscope::Error>(())
//! ```
//!
//! ### Code Caves
//!
//! ```rust
//! use memscope::prelude::*;
//!
//! let local = LocalBackend::new(0x10000);
//! // Slack space past the end of a code section
//! local.map(0x401000, vec![0u8; 0x200], Protection::READ_WRITE_EXECUTE)?;
//!
//! let backend = SharedBackend::new(local);
//! let mut cave = CaveAllocator::new(backend, 0x401000, 0x200);
//!
//! let stub = cave.alloc(0x20)?;
//! stub.write_bytes(&[0x90; 0x20], 0)?;
//! # Ok::<(), memscope::Error>(())
//! ```
//!
//! ## Addressing Model
//!
//! Addresses are `u64` values in the target's address space. Multi-byte values cross the
//! transport in little-endian order and pointer slots are
//! [`POINTER_WIDTH`](overlay::POINTER_WIDTH) bytes wide. A target with other conventions
//! wants its own field types; the raw byte operations carry no such assumptions.
//!
//! ## Performance
//!
//! The bookkeeping is sized for instrumentation workloads:
//!
//! - **Sorted region tables** with linear scans, fastest at the tens-of-regions scale
//! - **Concurrent layout registry** backed by `dashmap`, no global lock around lookups
//! - **No hidden caching** between accesses, so a tool observes the target as it is
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error information:
//!
//! ```rust
//! use memscope::prelude::*;
//!
//! let backend = SharedBackend::new(LocalBackend::new(0x1000));
//! let mut cave = CaveAllocator::new(backend, 0x400000, 0x40);
//!
//! match cave.alloc(0x100) {
//!     Ok(view) => println!("placed at {:#x}", view.address()),
//!     Err(Error::CaveExhausted(size)) => println!("no interval fits {} bytes", size),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ### Testing
//!
//! The suite pairs unit tests with property tests that drive both allocators through
//! randomized allocate and free sequences:
//!
//! ```bash
//! cargo test
//! cargo test --release  # For performance tests
//! ```
//!
//! ### Benchmarks
//!
//! ```bash
//! cargo bench  # Criterion benchmarks for allocator placement
//! ```
#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;
pub(crate) mod view;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the memscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use memscope::prelude::*;
///
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let mut heap = BaseAllocator::new(backend);
///
/// let scratch = heap.alloc0(0x20)?;
/// scratch.overlay::<ScalarField<u64>>(0).write(42)?;
/// # Ok::<(), memscope::Error>(())
/// ```
pub mod prelude;

/// Tracked placement of memory inside a live target.
///
/// Two engines cover the two ways a tool takes space in a foreign process:
///
/// - [`BaseAllocator`] requests fresh regions from the backend, the moral
///   equivalent of `VirtualAllocEx` against a debugged process
/// - [`CaveAllocator`] hands out intervals of a window the target already maps,
///   for environments where reserving new memory is impossible or too loud
///
/// Both keep placements in a sorted table, refuse to free addresses they never
/// produced and release only whole regions.
///
/// # Examples
///
/// ```rust
/// use memscope::prelude::*;
///
/// let backend = SharedBackend::new(LocalBackend::new(0x10000));
/// let mut heap = BaseAllocator::new(backend);
///
/// let a = heap.alloc(0x100)?;
/// let b = heap.alloc(0x40)?;
///
/// heap.free(&a)?;
/// assert_eq!(heap.regions().len(), 1);
/// # Ok::<(), memscope::Error>(())
/// ```
pub mod allocator;

/// Transports that carry reads and writes into a target address space.
///
/// Everything in memscope funnels through [`MemoryBackend`], a four-operation
/// contract (read, write, alloc, free) that adapters implement for a debugger,
/// an emulator, a kernel driver or any other channel into the target.
/// [`SharedBackend`] wraps an adapter in a cheaply cloneable handle and lifts
/// the raw operations to [`MemoryView`] anchors.
///
/// # Key Types
///
/// - [`MemoryBackend`] - The contract adapters implement
/// - [`SharedBackend`] - Shared handle, the entry point for views and allocators
/// - [`LocalBackend`] - In-process target emulation, used by tests and examples
/// - [`Protection`] - Region permission flags
pub mod backend;

/// Typed projections onto raw target memory.
///
/// An overlay binds a typed accessor to an address so that every read decodes
/// live bytes and every write encodes straight back through the backend.
///
/// # Key Types
///
/// Compile-time layer:
///
/// - [`overlay::ScalarField`] - Fixed-width little-endian integers and floats
/// - [`overlay::PointerField`] - 8-byte slots that chase to further overlays
/// - [`overlay::CStringField`] / [`overlay::WideStringField`] - NUL-terminated text
/// - [`overlay::EnumField`] - Discriminants mapped onto a Rust enum
///
/// Runtime layer:
///
/// - [`overlay::StructLayout`] - A named field map assembled with a builder
/// - [`overlay::StructOverlay`] - A layout bound to an address, fields by name
/// - [`overlay::Value`] - Dynamically typed field contents
/// - [`overlay::LayoutRegistry`] - Shared layouts and forward references
///
/// # Examples
///
/// ```rust
/// use memscope::prelude::*;
///
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let mut heap = BaseAllocator::new(backend);
/// let view = heap.alloc0(0x10)?;
///
/// let field = view.overlay::<ScalarField<i64>>(0x8);
/// field.write(-77)?;
/// assert_eq!(field.read()?, -77);
/// # Ok::<(), memscope::Error>(())
/// ```
pub mod overlay;

/// `memscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust
/// use memscope::{MemoryView, Result};
///
/// fn read_header(view: &MemoryView) -> Result<Vec<u8>> {
///     view.read_bytes(16, 0)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `memscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for transport failures, allocation bookkeeping and typed decoding.
///
/// # Examples
///
/// ```rust
/// use memscope::{Error, LocalBackend, SharedBackend};
///
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
///
/// match backend.read_bytes(4, 0xDEAD0000) {
///     Ok(bytes) => println!("read {} bytes", bytes.len()),
///     Err(Error::ReadFailed { address, reason, .. }) => {
///         println!("read at {:#x} failed: {}", address, reason);
///     }
///     Err(e) => println!("other error: {}", e),
/// }
/// ```
pub use error::Error;

/// An address anchored to the backend that produced it.
///
/// [`MemoryView`] is the unit of reference in memscope: allocators hand them out,
/// overlays bind to them and raw byte access goes through them. Offsets are
/// relative to the anchor, so the same code works wherever a structure lands.
///
/// # Example
///
/// ```rust
/// use memscope::{LocalBackend, Protection, SharedBackend};
///
/// let local = LocalBackend::new(0x1000);
/// local.map(0x5000, vec![7u8; 0x10], Protection::READ_WRITE)?;
///
/// let backend = SharedBackend::new(local);
/// let view = backend.view(0x5008);
/// assert_eq!(view.read_bytes(2, 0)?, [7, 7]);
/// # Ok::<(), memscope::Error>(())
/// ```
pub use view::MemoryView;

/// Transport contract and the handles over it.
///
/// These types connect the library to a target address space:
///
/// - [`MemoryBackend`] - The four raw operations an adapter implements
/// - [`SharedBackend`] - Cloneable handle that lifts them to [`MemoryView`]s
/// - [`LocalBackend`] - In-process target used by tests and examples
/// - [`Protection`] - Region permission flags
///
/// # Example
///
/// ```rust
/// use memscope::{LocalBackend, SharedBackend};
///
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let scratch = backend.alloc(0x20)?;
/// backend.free(&scratch)?;
/// # Ok::<(), memscope::Error>(())
/// ```
pub use backend::{LocalBackend, MemoryBackend, Protection, SharedBackend};

/// Placement engines for taking space inside the target.
///
/// - [`BaseAllocator`] - Fresh regions obtained from the backend
/// - [`CaveAllocator`] - Best-fit intervals inside an existing window
///
/// # Example
///
/// ```rust
/// use memscope::{BaseAllocator, LocalBackend, SharedBackend};
///
/// let backend = SharedBackend::new(LocalBackend::new(0x4000));
/// let mut heap = BaseAllocator::new(backend);
///
/// let view = heap.alloc(0x80)?;
/// heap.free(&view)?;
/// # Ok::<(), memscope::Error>(())
/// ```
pub use allocator::{BaseAllocator, CaveAllocator};
