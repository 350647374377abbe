use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers every failure mode of foreign-process memory access, allocation
/// bookkeeping, and typed decoding. Each variant carries the context needed to tell
/// *where* in the foreign address space something went wrong.
///
/// # Error Categories
///
/// ## Backend I/O Errors
/// - [`Error::ReadFailed`] - A raw read against the foreign process failed
/// - [`Error::WriteFailed`] - A raw write against the foreign process failed
///
/// ## Allocator Errors
/// - [`Error::AllocFailed`] - The backend could not reserve fresh memory
/// - [`Error::FreeFailed`] - The backend could not release a reservation
/// - [`Error::CaveExhausted`] - No free interval in a cave was large enough
/// - [`Error::DuplicateRegion`] - Bookkeeping found two regions at one address
/// - [`Error::UntrackedRegion`] - Free was asked for an address never tracked
///
/// ## Decode Errors
/// - [`Error::UnknownVariant`] - A stored enum value matches no known variant
/// - [`Error::UnknownVariantName`] - A variant name matches no entry of an enum
/// - [`Error::UnterminatedString`] - No terminator within the scan limit
/// - [`Error::InvalidText`] - String bytes could not be decoded or encoded
///
/// ## Layout Errors
/// - [`Error::DuplicateLayout`] - A layout name was registered twice
/// - [`Error::DuplicateField`] - A layout declared one field name twice
/// - [`Error::UnknownField`] - Field lookup by name failed
/// - [`Error::FieldMismatch`] - A field was accessed as the wrong kind
/// - [`Error::UnresolvedLayout`] - A forward reference names an unregistered layout
/// - [`Error::RegistryGone`] - The registry behind a forward reference was dropped
///
/// # Examples
///
/// ```rust
/// use memscope::{Error, LocalBackend, SharedBackend};
///
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// match backend.read_bytes(16, 0xDEAD_0000) {
///     Ok(bytes) => println!("read {} bytes", bytes.len()),
///     Err(Error::ReadFailed { address, reason, .. }) => {
///         eprintln!("read at {address:#x} failed: {reason}");
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Backend I/O errors
    /// A raw read against the foreign process failed.
    ///
    /// This is the library's equivalent of an OS-level read failure: the address
    /// is not mapped, the page is not readable, or the target process is gone.
    ///
    /// # Fields
    ///
    /// * `count` - Number of bytes the caller asked for
    /// * `address` - Absolute foreign address of the attempted read
    /// * `reason` - Backend-specific description of the failure
    #[error("Failed to read {count} bytes at {address:#x} - {reason}")]
    ReadFailed {
        /// Number of bytes the caller asked for
        count: usize,
        /// Absolute foreign address of the attempted read
        address: u64,
        /// Backend-specific description of the failure
        reason: String,
    },

    /// A raw write against the foreign process failed.
    ///
    /// Same failure surface as [`Error::ReadFailed`], for the write direction.
    /// Writes are all-or-nothing; there is no partial-progress state to recover.
    #[error("Failed to write {count} bytes at {address:#x} - {reason}")]
    WriteFailed {
        /// Number of bytes the caller tried to write
        count: usize,
        /// Absolute foreign address of the attempted write
        address: u64,
        /// Backend-specific description of the failure
        reason: String,
    },

    // Allocator errors
    /// The backend could not reserve fresh memory in the foreign process.
    #[error("Failed to allocate {size} bytes - {reason}")]
    AllocFailed {
        /// Requested reservation size in bytes
        size: usize,
        /// Backend-specific description of the failure
        reason: String,
    },

    /// The backend could not release a reservation.
    ///
    /// When this surfaces from [`crate::BaseAllocator::free`], the tracking
    /// record has already been dropped; the reservation itself may still be
    /// live in the foreign process.
    #[error("Failed to release the region at {address:#x} - {reason}")]
    FreeFailed {
        /// Base address of the reservation
        address: u64,
        /// Backend-specific description of the failure
        reason: String,
    },

    /// No free interval inside the cave was large enough for the request.
    ///
    /// Raised by [`crate::CaveAllocator::alloc`] when the best-fit scan finds
    /// no gap of at least the requested size. Freeing cave regions or asking
    /// for less are the only ways forward; the cave never grows.
    #[error("Cave does not have a free interval big enough for {0} bytes")]
    CaveExhausted(usize),

    /// Allocator bookkeeping found two regions anchored at one address.
    ///
    /// Defensive check on sorted-list insertion. Seeing this means the backend
    /// handed out overlapping reservations or the same backend range is being
    /// tracked by two paths - both bugs outside the allocator itself.
    #[error("A region at {0:#x} is already tracked")]
    DuplicateRegion(u64),

    /// Free was asked for an address this allocator never tracked.
    ///
    /// The allocator refuses to forward an untracked address to the backend;
    /// releasing memory that some other owner may still track is worse than
    /// failing loudly.
    #[error("No tracked region at {0:#x}")]
    UntrackedRegion(u64),

    // Decode errors
    /// A stored enum value matches no known variant.
    ///
    /// The raw integer was read successfully but the symbolic mapping has no
    /// entry for it. Carries the enum's name and the offending raw value.
    #[error("Value {value:#x} does not match any variant of enum '{name}'")]
    UnknownVariant {
        /// Name of the enum the value was decoded against
        name: String,
        /// The raw stored value, widened
        value: i128,
    },

    /// A variant name matches no entry of the enum it was used against.
    ///
    /// The symbolic counterpart of [`Error::UnknownVariant`]: the caller named
    /// a variant the enum definition does not declare.
    #[error("Enum '{name}' has no variant named '{variant}'")]
    UnknownVariantName {
        /// Name of the enum that was searched
        name: String,
        /// The variant name that was not found
        variant: String,
    },

    /// A string scan hit its byte limit without finding a terminator.
    ///
    /// Foreign memory is scanned in chunks up to a caller-controlled limit;
    /// unterminated data past that limit is indistinguishable from a bad
    /// pointer, so the scan gives up instead of walking the address space.
    #[error("No terminator within {limit} bytes at {address:#x}")]
    UnterminatedString {
        /// Absolute foreign address where the scan started
        address: u64,
        /// The scan limit that was exhausted
        limit: usize,
    },

    /// String bytes could not be decoded, or the text to write is unencodable.
    ///
    /// Covers invalid UTF-8/UTF-16 sequences on the read side and interior
    /// NUL characters on the write side.
    #[error("Invalid text at {address:#x} - {reason}")]
    InvalidText {
        /// Absolute foreign address of the string field
        address: u64,
        /// What made the text invalid
        reason: String,
    },

    // Layout errors
    /// A layout with this name is already registered.
    #[error("Layout '{0}' is already registered")]
    DuplicateLayout(String),

    /// A layout declared the same field name twice.
    #[error("Layout '{layout}' already has a field named '{field}'")]
    DuplicateField {
        /// Name of the layout being built
        layout: String,
        /// The repeated field name
        field: String,
    },

    /// Field lookup by name failed.
    #[error("Layout '{layout}' has no field named '{field}'")]
    UnknownField {
        /// Name of the layout that was searched
        layout: String,
        /// The missing field name
        field: String,
    },

    /// A field was accessed as a kind it does not have.
    ///
    /// Raised by the typed escape hatches on [`crate::overlay::BoundField`]
    /// when the descriptor disagrees with the requested accessor.
    #[error("Field '{field}' is {found}, not {expected}")]
    FieldMismatch {
        /// Name of the mismatched field
        field: String,
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind the descriptor actually declares
        found: &'static str,
    },

    /// A forward reference names a layout that is not registered.
    ///
    /// Lazy references resolve on first access; until the named layout is
    /// registered, every resolution attempt fails with this error.
    #[error("Layout '{0}' is not registered")]
    UnresolvedLayout(String),

    /// The registry behind a forward reference was dropped.
    ///
    /// Lazy references hold the registry weakly so that self-referential
    /// layouts cannot leak; if the registry itself goes away before the
    /// reference resolves, there is nothing left to resolve against.
    #[error("The layout registry backing this reference was dropped")]
    RegistryGone,
}
