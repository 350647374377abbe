//! Terminated string codecs: C strings and UTF-16 wide strings.
//!
//! Reads scan forward for the terminator in chunks, because the string's
//! length is unknown until the terminator is found and byte-at-a-time reads
//! against a live process are a syscall each. A chunk that runs past the end
//! of readable memory is refused by the backend, so the scanner narrows the
//! chunk until single units fail - a string ending flush against a region
//! boundary still decodes.
//!
//! Writes are unbounded by design: the codec knows nothing about the size of
//! the buffer it writes into, and overflow is the caller's responsibility.

use std::ffi::CString;

use widestring::U16CString;

use crate::{
    overlay::{Overlay, Rebind},
    Error, MemoryView, Result,
};

/// Bytes fetched per scan step for narrow strings.
const SCAN_CHUNK_BYTES: usize = 64;

/// UTF-16 units fetched per scan step for wide strings.
const SCAN_CHUNK_UNITS: usize = 32;

/// Accessor for a NUL-terminated byte string decoded as UTF-8.
///
/// # Examples
///
/// ```rust
/// use memscope::{overlay::CStringField, LocalBackend, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let backend = SharedBackend::new(LocalBackend::new(0x1000));
/// let view = backend.alloc0(32)?;
///
/// let name: CStringField = view.overlay(0);
/// name.write("test")?;
/// assert_eq!(name.read()?, "test");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CStringField {
    view: MemoryView,
    offset: u64,
}

impl CStringField {
    /// Default scan limit in bytes.
    pub const DEFAULT_LIMIT: usize = 4096;

    /// Absolute foreign address of the string's first byte.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// Scans for the terminator and decodes the preceding bytes as UTF-8.
    ///
    /// Equivalent to [`CStringField::read_bounded`] with
    /// [`CStringField::DEFAULT_LIMIT`].
    ///
    /// # Errors
    ///
    /// See [`CStringField::read_bounded`].
    pub fn read(&self) -> Result<String> {
        self.read_bounded(Self::DEFAULT_LIMIT)
    }

    /// Scans at most `limit` bytes for the terminator and decodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnterminatedString`] when no NUL shows up within
    /// `limit` bytes, [`Error::InvalidText`] when the collected bytes are not
    /// UTF-8, or [`Error::ReadFailed`] when even a one-byte read fails.
    pub fn read_bounded(&self, limit: usize) -> Result<String> {
        let mut collected = Vec::new();
        let mut scanned = 0usize;

        while scanned < limit {
            let mut chunk_len = SCAN_CHUNK_BYTES.min(limit - scanned);
            let chunk = loop {
                match self
                    .view
                    .read_bytes(chunk_len, self.offset.wrapping_add(scanned as u64))
                {
                    Ok(chunk) => break chunk,
                    Err(_) if chunk_len > 1 => chunk_len /= 2,
                    Err(e) => return Err(e),
                }
            };

            if let Some(nul) = chunk.iter().position(|&b| b == 0) {
                collected.extend_from_slice(&chunk[..nul]);
                return String::from_utf8(collected).map_err(|e| Error::InvalidText {
                    address: self.address(),
                    reason: e.to_string(),
                });
            }
            scanned += chunk.len();
            collected.extend_from_slice(&chunk);
        }

        Err(Error::UnterminatedString {
            address: self.address(),
            limit,
        })
    }

    /// Encodes `text` plus a terminator and writes it.
    ///
    /// Exactly `text.len() + 1` bytes are written. No buffer capacity is
    /// checked; overflowing the destination is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidText`] when `text` contains an interior NUL,
    /// or [`Error::WriteFailed`] when the backend refuses the write.
    pub fn write(&self, text: &str) -> Result<()> {
        let encoded = CString::new(text).map_err(|e| Error::InvalidText {
            address: self.address(),
            reason: e.to_string(),
        })?;
        self.view.write_bytes(encoded.as_bytes_with_nul(), self.offset)
    }
}

impl Rebind for CStringField {
    fn rebind(&self, view: MemoryView, offset: u64) -> Self {
        Self::bind(view, offset)
    }
}

impl Overlay for CStringField {
    fn bind(view: MemoryView, offset: u64) -> Self {
        CStringField { view, offset }
    }
}

/// Accessor for a NUL-terminated UTF-16 little-endian string.
///
/// The wide sibling of [`CStringField`]; Windows targets store user-facing
/// text this way. Scan limits are in bytes and are rounded down to whole
/// 16-bit units.
#[derive(Debug, Clone)]
pub struct WideStringField {
    view: MemoryView,
    offset: u64,
}

impl WideStringField {
    /// Default scan limit in bytes.
    pub const DEFAULT_LIMIT: usize = 4096;

    /// Absolute foreign address of the string's first unit.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.view.address().wrapping_add(self.offset)
    }

    /// Scans for the terminator and decodes the preceding units as UTF-16.
    ///
    /// # Errors
    ///
    /// See [`WideStringField::read_bounded`].
    pub fn read(&self) -> Result<String> {
        self.read_bounded(Self::DEFAULT_LIMIT)
    }

    /// Scans at most `limit` bytes for the terminator and decodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnterminatedString`] when no terminator shows up
    /// within `limit` bytes, [`Error::InvalidText`] on invalid UTF-16, or
    /// [`Error::ReadFailed`] when even a one-unit read fails.
    pub fn read_bounded(&self, limit: usize) -> Result<String> {
        let limit_units = limit / 2;
        let mut collected: Vec<u16> = Vec::new();
        let mut scanned_units = 0usize;

        while scanned_units < limit_units {
            let mut chunk_units = SCAN_CHUNK_UNITS.min(limit_units - scanned_units);
            let chunk = loop {
                match self.view.read_bytes(
                    chunk_units * 2,
                    self.offset.wrapping_add(scanned_units as u64 * 2),
                ) {
                    Ok(chunk) => break chunk,
                    Err(_) if chunk_units > 1 => chunk_units /= 2,
                    Err(e) => return Err(e),
                }
            };

            for pair in chunk.chunks_exact(2) {
                let unit = u16::from_le_bytes([pair[0], pair[1]]);
                if unit == 0 {
                    return widestring::U16Str::from_slice(&collected)
                        .to_string()
                        .map_err(|e| Error::InvalidText {
                            address: self.address(),
                            reason: e.to_string(),
                        });
                }
                collected.push(unit);
            }
            scanned_units += chunk_units;
        }

        Err(Error::UnterminatedString {
            address: self.address(),
            limit,
        })
    }

    /// Encodes `text` as UTF-16 plus a terminator and writes it.
    ///
    /// Exactly `(units + 1) * 2` bytes are written, where `units` is the
    /// UTF-16 length of `text`. No buffer capacity is checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidText`] when `text` contains an interior NUL,
    /// or [`Error::WriteFailed`] when the backend refuses the write.
    pub fn write(&self, text: &str) -> Result<()> {
        let wide = U16CString::from_str(text).map_err(|e| Error::InvalidText {
            address: self.address(),
            reason: e.to_string(),
        })?;

        let units = wide.as_slice_with_nul();
        let mut encoded = Vec::with_capacity(units.len() * 2);
        for unit in units {
            encoded.extend_from_slice(&unit.to_le_bytes());
        }
        self.view.write_bytes(&encoded, self.offset)
    }
}

impl Rebind for WideStringField {
    fn rebind(&self, view: MemoryView, offset: u64) -> Self {
        Self::bind(view, offset)
    }
}

impl Overlay for WideStringField {
    fn bind(view: MemoryView, offset: u64) -> Self {
        WideStringField { view, offset }
    }
}
