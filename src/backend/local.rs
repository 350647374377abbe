//! In-process backend over plain heap buffers.
//!
//! [`LocalBackend`] implements the full [`MemoryBackend`] contract without a
//! foreign process: regions live in `Vec<u8>` buffers keyed by base address.
//! The test suites run the allocator and overlay layers against it, and
//! callers can use it the same way to exercise instrumentation logic before
//! pointing it at a live target.
//!
//! Fixture memory can be placed at exact addresses with [`LocalBackend::map`],
//! including read-only or write-only mappings to reproduce the access-denied
//! failure modes of a real process.

use std::{collections::HashMap, sync::RwLock};

use tracing::{debug, trace};

use crate::{
    backend::{MemoryBackend, Protection},
    Error, Result,
};

/// Bump-allocation base, kept far above typical image and heap ranges.
const DEFAULT_BASE: u64 = 0x7FFF_0000_0000;

/// Rounds up to the backend's 16-byte region alignment.
fn align_up(address: u64) -> u64 {
    address.wrapping_add(0xF) & !0xF
}

/// One mapped region of the simulated address space.
struct LocalRegion {
    data: Vec<u8>,
    protection: Protection,
}

struct LocalState {
    regions: HashMap<u64, LocalRegion>,
    next_address: u64,
    current_size: usize,
    max_size: usize,
}

impl LocalState {
    /// Finds the region fully containing `[address, address + count)`,
    /// returning its base and the in-region offset of `address`.
    ///
    /// Ranges never span two regions; separate reservations are not adjacent
    /// in any guaranteed way, so spanning reads would invent contiguity the
    /// contract does not promise.
    fn locate_base(&self, address: u64, count: usize) -> Option<(u64, usize)> {
        // Fast path: address is a region base.
        if let Some(region) = self.regions.get(&address) {
            if count <= region.data.len() {
                return Some((address, 0));
            }
        }

        // Slow path: scan for a containing region.
        for (&base, region) in &self.regions {
            if base <= address {
                let offset = (address - base) as usize;
                if offset <= region.data.len() && count <= region.data.len() - offset {
                    return Some((base, offset));
                }
            }
        }

        None
    }

    /// Returns the end address of any region overlapping `[start, end)`.
    fn overlapping(&self, start: u64, end: u64) -> Option<u64> {
        self.regions.iter().find_map(|(&base, region)| {
            let region_end = base + region.data.len() as u64;
            (start < region_end && base < end).then_some(region_end)
        })
    }

    /// Picks the next bump address, skipping any fixture mapping in the way.
    fn place(&mut self, size: usize) -> Result<u64> {
        let mut candidate = self.next_address;
        loop {
            let Some(end) = candidate.checked_add(size as u64) else {
                return Err(Error::AllocFailed {
                    size,
                    reason: "address space exhausted".to_string(),
                });
            };
            match self.overlapping(candidate, end) {
                Some(region_end) => candidate = align_up(region_end),
                None => {
                    self.next_address = align_up(end);
                    return Ok(candidate);
                }
            }
        }
    }
}

/// In-process [`MemoryBackend`] implementation over heap buffers.
///
/// Behaves like a cooperative foreign process: reservations are 16-byte
/// aligned, handed out read/write/execute and zero-filled, reads and writes
/// must stay inside one region and honor its [`Protection`], and a
/// configurable capacity limit bounds the total of live region bytes.
///
/// # Examples
///
/// ```rust
/// use memscope::{LocalBackend, Protection, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let local = LocalBackend::with_base(0x1000, 0x800);
/// local.map(0x500, vec![1, 2, 3, 4], Protection::READ)?;
///
/// let backend = SharedBackend::new(local);
/// assert_eq!(backend.read_bytes(4, 0x500)?, vec![1, 2, 3, 4]);
/// assert!(backend.write_bytes(&[9], 0x500).is_err());
/// # Ok(())
/// # }
/// ```
pub struct LocalBackend {
    state: RwLock<LocalState>,
}

impl LocalBackend {
    /// Creates a backend that can hold up to `max_size` live bytes.
    ///
    /// Reservations are bumped from `0x7FFF_0000_0000`.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self::with_base(DEFAULT_BASE, max_size)
    }

    /// Creates a backend bumping reservations from `base`.
    ///
    /// Useful when tests want small, readable addresses.
    #[must_use]
    pub fn with_base(base: u64, max_size: usize) -> Self {
        LocalBackend {
            state: RwLock::new(LocalState {
                regions: HashMap::new(),
                next_address: base,
                current_size: 0,
                max_size,
            }),
        }
    }

    /// Maps `data` at exactly `address` with the given protection.
    ///
    /// This is the fixture-seeding entry point: cave windows, pre-existing
    /// structures and protection edge cases all start as mapped regions.
    /// Mapped regions count against the capacity limit and can be released
    /// with [`MemoryBackend::free`] like any reservation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocFailed`] when `data` is empty, the mapping would
    /// overlap an existing region, wrap the address space, or exceed the
    /// capacity limit.
    pub fn map(&self, address: u64, data: Vec<u8>, protection: Protection) -> Result<()> {
        let size = data.len();
        if size == 0 {
            return Err(Error::AllocFailed {
                size,
                reason: "zero-size mapping".to_string(),
            });
        }

        let mut state = write_lock!(self.state);
        if state.current_size.saturating_add(size) > state.max_size {
            return Err(Error::AllocFailed {
                size,
                reason: format!("backend limit of {} bytes exceeded", state.max_size),
            });
        }
        let Some(end) = address.checked_add(size as u64) else {
            return Err(Error::AllocFailed {
                size,
                reason: "mapping wraps the address space".to_string(),
            });
        };
        if state.overlapping(address, end).is_some() {
            return Err(Error::AllocFailed {
                size,
                reason: format!("mapping at {address:#x} overlaps an existing region"),
            });
        }

        state.regions.insert(address, LocalRegion { data, protection });
        state.current_size += size;
        debug!("Mapped {} bytes at {:#x}", size, address);
        Ok(())
    }

    /// Number of live regions, reservations and mappings combined.
    #[must_use]
    pub fn region_count(&self) -> usize {
        read_lock!(self.state).regions.len()
    }

    /// Total live bytes across all regions.
    #[must_use]
    pub fn mapped_bytes(&self) -> usize {
        read_lock!(self.state).current_size
    }
}

impl MemoryBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn read_bytes(&self, count: usize, address: u64) -> Result<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let state = read_lock!(self.state);
        let Some((base, offset)) = state.locate_base(address, count) else {
            return Err(Error::ReadFailed {
                count,
                address,
                reason: "address range is not mapped".to_string(),
            });
        };
        let Some(region) = state.regions.get(&base) else {
            return Err(Error::ReadFailed {
                count,
                address,
                reason: "address range is not mapped".to_string(),
            });
        };
        if !region.protection.contains(Protection::READ) {
            return Err(Error::ReadFailed {
                count,
                address,
                reason: "region is not readable".to_string(),
            });
        }

        trace!("Read {} bytes at {:#x}", count, address);
        Ok(region.data[offset..offset + count].to_vec())
    }

    fn write_bytes(&self, data: &[u8], address: u64) -> Result<()> {
        let count = data.len();
        if count == 0 {
            return Ok(());
        }

        let mut state = write_lock!(self.state);
        let Some((base, offset)) = state.locate_base(address, count) else {
            return Err(Error::WriteFailed {
                count,
                address,
                reason: "address range is not mapped".to_string(),
            });
        };
        let Some(region) = state.regions.get_mut(&base) else {
            return Err(Error::WriteFailed {
                count,
                address,
                reason: "address range is not mapped".to_string(),
            });
        };
        if !region.protection.contains(Protection::WRITE) {
            return Err(Error::WriteFailed {
                count,
                address,
                reason: "region is not writable".to_string(),
            });
        }

        region.data[offset..offset + count].copy_from_slice(data);
        trace!("Wrote {} bytes at {:#x}", count, address);
        Ok(())
    }

    fn alloc(&self, size: usize) -> Result<u64> {
        if size == 0 {
            return Err(Error::AllocFailed {
                size,
                reason: "zero-size reservation".to_string(),
            });
        }

        let mut state = write_lock!(self.state);
        if state.current_size.saturating_add(size) > state.max_size {
            return Err(Error::AllocFailed {
                size,
                reason: format!("backend limit of {} bytes exceeded", state.max_size),
            });
        }

        let address = state.place(size)?;
        state.regions.insert(
            address,
            LocalRegion {
                data: vec![0; size],
                protection: Protection::READ_WRITE_EXECUTE,
            },
        );
        state.current_size += size;
        debug!("Allocated {} bytes at {:#x}", size, address);
        Ok(address)
    }

    fn free(&self, address: u64) -> Result<()> {
        let mut state = write_lock!(self.state);
        let Some(region) = state.regions.remove(&address) else {
            return Err(Error::FreeFailed {
                address,
                reason: "no region is anchored at this address".to_string(),
            });
        };
        state.current_size -= region.data.len();
        debug!("Released {} bytes at {:#x}", region.data.len(), address);
        Ok(())
    }

    /// Fresh regions here are zeroed `Vec`s already; skip the second write.
    fn alloc0(&self, size: usize) -> Result<u64> {
        self.alloc(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_free() {
        let backend = LocalBackend::new(0x1000);

        let address = backend.alloc(64).expect("alloc failed");
        assert_eq!(backend.read_bytes(64, address).expect("read failed"), vec![0u8; 64]);

        backend.write_bytes(&[1, 2, 3], address + 8).expect("write failed");
        assert_eq!(
            backend.read_bytes(3, address + 8).expect("read failed"),
            vec![1, 2, 3]
        );

        backend.free(address).expect("free failed");
        assert!(backend.read_bytes(1, address).is_err());
        assert!(matches!(backend.free(address), Err(Error::FreeFailed { .. })));
    }

    #[test]
    fn test_alignment() {
        let backend = LocalBackend::with_base(0x1000, 0x1000);

        let first = backend.alloc(10).expect("alloc failed");
        let second = backend.alloc(10).expect("alloc failed");
        assert_eq!(first, 0x1000);
        assert_eq!(second, 0x1010);
    }

    #[test]
    fn test_memory_limit() {
        let backend = LocalBackend::new(64);

        let address = backend.alloc(48).expect("alloc failed");
        assert!(matches!(backend.alloc(32), Err(Error::AllocFailed { .. })));

        backend.free(address).expect("free failed");
        backend.alloc(32).expect("alloc after free failed");
    }

    #[test]
    fn test_zero_size_alloc() {
        let backend = LocalBackend::new(0x1000);
        assert!(matches!(backend.alloc(0), Err(Error::AllocFailed { .. })));
    }

    #[test]
    fn test_out_of_bounds() {
        let backend = LocalBackend::new(0x1000);
        let address = backend.alloc(16).expect("alloc failed");

        assert!(backend.read_bytes(17, address).is_err());
        assert!(backend.read_bytes(8, address + 12).is_err());
        assert!(backend.write_bytes(&[0u8; 17], address).is_err());
        assert!(backend.read_bytes(1, 0xDEAD_0000).is_err());
    }

    #[test]
    fn test_interior_access() {
        let backend = LocalBackend::new(0x1000);
        let address = backend.alloc(32).expect("alloc failed");

        backend.write_bytes(&[0xFF; 4], address + 28).expect("write failed");
        assert_eq!(
            backend.read_bytes(4, address + 28).expect("read failed"),
            vec![0xFF; 4]
        );
    }

    #[test]
    fn test_map_overlap() {
        let backend = LocalBackend::new(0x1000);

        backend
            .map(0x500, vec![0xAB; 16], Protection::READ_WRITE)
            .expect("map failed");
        assert_eq!(backend.read_bytes(2, 0x508).expect("read failed"), vec![0xAB; 2]);

        assert!(backend.map(0x508, vec![0; 4], Protection::READ).is_err());
        assert!(backend.map(0x4F8, vec![0; 16], Protection::READ).is_err());
        backend.map(0x510, vec![0; 4], Protection::READ).expect("adjacent map failed");
    }

    #[test]
    fn test_protection() {
        let backend = LocalBackend::new(0x1000);

        backend.map(0x100, vec![7; 8], Protection::READ).expect("map failed");
        assert!(backend.read_bytes(8, 0x100).is_ok());
        assert!(matches!(
            backend.write_bytes(&[1], 0x100),
            Err(Error::WriteFailed { .. })
        ));

        backend.map(0x200, vec![0; 8], Protection::WRITE).expect("map failed");
        assert!(backend.write_bytes(&[1], 0x200).is_ok());
        assert!(matches!(
            backend.read_bytes(1, 0x200),
            Err(Error::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_alloc_skips_mapped_regions() {
        let backend = LocalBackend::with_base(0x1000, 0x1000);
        backend
            .map(0x1008, vec![0; 16], Protection::READ_WRITE)
            .expect("map failed");

        let address = backend.alloc(32).expect("alloc failed");
        assert_eq!(address, 0x1020);
        assert_eq!(backend.region_count(), 2);
    }
}
