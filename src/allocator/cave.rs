//! Best-fit placement inside one fixed window of foreign memory.

use tracing::{debug, trace};

use crate::{
    allocator::{OwnedRegion, RegionTable},
    Error, MemoryView, Result, SharedBackend,
};

/// Allocator over a pre-existing "cave": slack memory already mapped in the
/// foreign process.
///
/// Padding at the end of an executable section, an over-sized reservation,
/// an abandoned buffer: all usable scratch space that no allocation call
/// ever has to reserve. The cave manages one such window `[start,
/// start+size)` purely by bookkeeping. `alloc` picks a gap by best-fit
/// search and anchors a view there; `free` drops the record. The backend is
/// used for I/O through the returned views, never for reservations.
///
/// Best-fit keeps the large gaps intact: among all gaps big enough for a
/// request, the smallest wins, ties going to the lowest address (except the
/// single-region case, where an exact tie selects the trailing gap).
///
/// # Usage Examples
///
/// ```rust
/// use memscope::{CaveAllocator, LocalBackend, Protection, SharedBackend};
///
/// # fn main() -> memscope::Result<()> {
/// let local = LocalBackend::new(0x1000);
/// local.map(0x7000, vec![0u8; 0x100], Protection::READ_WRITE_EXECUTE)?;
/// let backend = SharedBackend::new(local);
///
/// // Reuse the mapped window as scratch space, no new reservations.
/// let mut cave = CaveAllocator::new(backend, 0x7000, 0x100);
/// let patch = cave.alloc(0x20)?;
/// assert_eq!(patch.address(), 0x7000);
/// patch.write_bytes(&[0x90; 0x20], 0)?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// Not synchronized; same exclusive-access model as
/// [`crate::BaseAllocator`].
#[derive(Debug)]
pub struct CaveAllocator {
    backend: SharedBackend,
    start: u64,
    size: usize,
    regions: RegionTable,
}

impl CaveAllocator {
    /// Creates an allocator over the window `[start, start+size)`.
    ///
    /// The window is taken on faith: nothing checks that the foreign process
    /// actually has memory mapped there. I/O through views handed out later
    /// will surface that.
    #[must_use]
    pub fn new(backend: SharedBackend, start: u64, size: usize) -> Self {
        CaveAllocator {
            backend,
            start,
            size,
            regions: RegionTable::new(),
        }
    }

    /// First address of the managed window.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Window size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// First address past the managed window.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size as u64)
    }

    /// Tracked regions, sorted ascending by address.
    #[must_use]
    pub fn regions(&self) -> &[OwnedRegion] {
        self.regions.entries()
    }

    /// Places `size` bytes in the best-fitting gap and tracks the region.
    ///
    /// No backend call happens; the returned view is anchored into memory
    /// the foreign process already has.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaveExhausted`] when no free interval is large
    /// enough.
    pub fn alloc(&mut self, size: usize) -> Result<MemoryView> {
        let address = self.find_space(size)?;
        let view = self.backend.view(address);
        self.regions.insert(view.clone(), size)?;
        debug!(
            "Placed {} bytes at {:#x} in cave [{:#x}..{:#x})",
            size,
            address,
            self.start,
            self.end()
        );
        Ok(view)
    }

    /// Places like [`CaveAllocator::alloc`], then zero-fills through the
    /// returned view.
    ///
    /// The fill is a plain write into the cave; the backend's own zeroed
    /// reservation path is never involved, since that would reserve new
    /// memory outside the window.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaveExhausted`] when no gap fits, or
    /// [`Error::WriteFailed`] when the cave's memory refuses the fill.
    pub fn alloc0(&mut self, size: usize) -> Result<MemoryView> {
        let view = self.alloc(size)?;
        view.write_bytes(&vec![0u8; size], 0)?;
        Ok(view)
    }

    /// Drops the tracking record for a placed region.
    ///
    /// The cave never reserved anything from the backend, so there is
    /// nothing to release; the interval simply becomes placeable again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UntrackedRegion`] when `view`'s address was never
    /// placed by this allocator.
    pub fn free(&mut self, view: &MemoryView) -> Result<()> {
        let region = self.regions.remove(view.address())?;
        debug!("Untracked {} bytes at {:#x}", region.size(), region.address());
        Ok(())
    }

    /// Best-fit gap search over the current placements.
    fn find_space(&self, size: usize) -> Result<u64> {
        if size > self.size {
            return Err(Error::CaveExhausted(size));
        }

        match self.regions.entries() {
            [] => Ok(self.start),
            [only] => {
                let before = (only.address() - self.start) as usize;
                let after = (self.end() - only.end()) as usize;
                match (before >= size, after >= size) {
                    (true, false) => Ok(self.start),
                    (false, true) => Ok(only.end()),
                    // An exact tie selects the trailing gap.
                    (true, true) => Ok(if before < after { self.start } else { only.end() }),
                    (false, false) => Err(Error::CaveExhausted(size)),
                }
            }
            entries => {
                // Scan gaps in ascending address order; strict improvement
                // keeps the earliest gap on ties.
                let mut best: Option<(u64, usize)> = None;
                let mut consider = |address: u64, gap: usize| {
                    if gap >= size && best.map_or(true, |(_, chosen)| gap < chosen) {
                        best = Some((address, gap));
                    }
                };

                consider(self.start, (entries[0].address() - self.start) as usize);
                for pair in entries.windows(2) {
                    let at = pair[0].end();
                    consider(at, (pair[1].address() - at) as usize);
                }
                let last = &entries[entries.len() - 1];
                consider(last.end(), (self.end() - last.end()) as usize);

                match best {
                    Some((address, gap)) => {
                        trace!(
                            "Best-fit gap of {} bytes at {:#x} for a {} byte request",
                            gap,
                            address,
                            size
                        );
                        Ok(address)
                    }
                    None => Err(Error::CaveExhausted(size)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalBackend, Protection};

    fn cave() -> CaveAllocator {
        let backend = SharedBackend::new(LocalBackend::new(0x1000));
        CaveAllocator::new(backend, 0x1000, 0x100)
    }

    /// Plants a region record directly, bypassing placement.
    fn plant(cave: &mut CaveAllocator, address: u64, size: usize) {
        let view = cave.backend.view(address);
        cave.regions.insert(view, size).expect("insert failed");
    }

    #[test]
    fn empty_cave_places_at_start() {
        let cave = cave();
        assert_eq!(cave.find_space(0x40).expect("find failed"), 0x1000);
    }

    #[test]
    fn oversized_requests_fail_up_front() {
        let cave = cave();
        assert!(matches!(
            cave.find_space(0x101),
            Err(Error::CaveExhausted(0x101))
        ));
    }

    #[test]
    fn one_region_leading_gap_only() {
        // Leading gap 0x90, trailing gap 0x10.
        let mut cave = cave();
        plant(&mut cave, 0x1090, 0x60);
        assert_eq!(cave.find_space(0x40).expect("find failed"), 0x1000);
    }

    #[test]
    fn one_region_trailing_gap_only() {
        // Leading gap 0x10, trailing gap 0xE0.
        let mut cave = cave();
        plant(&mut cave, 0x1010, 0x10);
        assert_eq!(cave.find_space(0x40).expect("find failed"), 0x1020);
    }

    #[test]
    fn one_region_prefers_the_smaller_gap() {
        // Leading gap 0x60, trailing gap 0x90; both fit a 0x40 request.
        let mut cave = cave();
        plant(&mut cave, 0x1060, 0x10);
        assert_eq!(cave.find_space(0x40).expect("find failed"), 0x1000);
    }

    #[test]
    fn one_region_tie_selects_the_trailing_gap() {
        // Both gaps are exactly 0x60.
        let mut cave = cave();
        plant(&mut cave, 0x1060, 0x40);
        assert_eq!(cave.find_space(0x60).expect("find failed"), 0x10A0);
    }

    #[test]
    fn one_region_with_no_sufficient_gap_fails() {
        let mut cave = cave();
        plant(&mut cave, 0x1060, 0x40);
        assert!(matches!(
            cave.find_space(0x70),
            Err(Error::CaveExhausted(0x70))
        ));
    }

    #[test]
    fn best_fit_picks_the_smallest_sufficient_gap() {
        // Gaps of 10, 3 and 50 bytes; a request for 5 must take the 10.
        let mut cave = cave();
        cave.size = 0x52;
        plant(&mut cave, 0x100A, 6);
        plant(&mut cave, 0x1013, 0xD);
        assert_eq!(cave.find_space(5).expect("find failed"), 0x1000);
    }

    #[test]
    fn multi_region_tie_selects_the_lowest_address() {
        // Leading gap 8 and inter-region gap 8; the leading gap wins.
        let mut cave = cave();
        cave.size = 0x20;
        plant(&mut cave, 0x1008, 8);
        plant(&mut cave, 0x1018, 8);
        assert_eq!(cave.find_space(8).expect("find failed"), 0x1000);
    }

    #[test]
    fn placements_stay_inside_and_disjoint() {
        let mut cave = cave();
        let a = cave.alloc(0x30).expect("alloc failed");
        let _b = cave.alloc(0x30).expect("alloc failed");
        let c = cave.alloc(0x30).expect("alloc failed");
        cave.free(&a).expect("free failed");
        let _d = cave.alloc(0x20).expect("alloc failed");
        cave.free(&c).expect("free failed");
        let _e = cave.alloc(0x50).expect("alloc failed");

        let regions = cave.regions();
        for region in regions {
            assert!(region.address() >= cave.start());
            assert!(region.end() <= cave.end());
        }
        for pair in regions.windows(2) {
            assert!(pair[0].end() <= pair[1].address());
        }
    }

    #[test]
    fn freed_intervals_are_reused() {
        let mut cave = cave();
        let _a = cave.alloc(0x40).expect("alloc failed");
        let b = cave.alloc(0x40).expect("alloc failed");
        let _c = cave.alloc(0x40).expect("alloc failed");

        let reclaimed = b.address();
        cave.free(&b).expect("free failed");
        let reused = cave.alloc(0x40).expect("alloc failed");
        assert_eq!(reused.address(), reclaimed);
    }

    #[test]
    fn free_untracks_without_touching_storage() {
        let local = LocalBackend::new(0x1000);
        local
            .map(0x1000, vec![0xFF; 0x100], Protection::READ_WRITE_EXECUTE)
            .expect("map failed");
        let backend = SharedBackend::new(local);
        let mut cave = CaveAllocator::new(backend, 0x1000, 0x100);

        let view = cave.alloc(0x10).expect("alloc failed");
        cave.free(&view).expect("free failed");

        // The cave's backing memory is untouched by free.
        assert_eq!(view.read_bytes(4, 0).expect("read failed"), vec![0xFF; 4]);
        assert!(matches!(cave.free(&view), Err(Error::UntrackedRegion(_))));
    }

    #[test]
    fn alloc0_zero_fills_inside_the_cave() {
        let local = LocalBackend::new(0x1000);
        local
            .map(0x1000, vec![0xFF; 0x100], Protection::READ_WRITE_EXECUTE)
            .expect("map failed");
        let backend = SharedBackend::new(local);
        let mut cave = CaveAllocator::new(backend.clone(), 0x1000, 0x100);

        let view = cave.alloc0(0x10).expect("alloc failed");
        assert_eq!(view.address(), 0x1000);
        assert_eq!(view.read_bytes(0x10, 0).expect("read failed"), vec![0u8; 0x10]);
        // Bytes past the placement keep their old contents.
        assert_eq!(backend.read_bytes(4, 0x1010).expect("read failed"), vec![0xFF; 4]);
    }

    #[test]
    fn the_cave_never_reserves_from_the_backend() {
        let local = LocalBackend::new(0x1000);
        let backend = SharedBackend::new(local);
        let mut cave = CaveAllocator::new(backend.clone(), 0x5000, 0x100);

        let _view = cave.alloc(0x40).expect("alloc failed");
        let _other = cave.alloc(0x40).expect("alloc failed");

        // Placement is pure bookkeeping: no region was created.
        assert!(backend.read_bytes(1, 0x5000).is_err());
        assert_eq!(cave.regions().len(), 2);
    }

    #[test]
    fn window_accessors() {
        let cave = cave();
        assert_eq!(cave.start(), 0x1000);
        assert_eq!(cave.size(), 0x100);
        assert_eq!(cave.end(), 0x1100);
    }
}
