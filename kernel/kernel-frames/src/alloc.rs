//! The frame allocator: two-phase initialization, first-fit allocation,
//! validated release.

use crate::layout::{MemoryLayout, Region};
use crate::memory::FrameMemory;
use crate::owner::{Caller, Owner, TargetAddress};
use crate::table::{BootPhase, FrameTable};
use crate::template::MappingTemplate;
use kernel_addresses::{DirectMap, PhysicalAddress, VirtualAddress};
use kernel_sync::SpinLock;
use log::{debug, info, warn};

/// Byte written over every frame as it is freed, so stale owner data can
/// never leak into (or be read back by) the next owner.
pub const FREE_FILL: u8 = 0x01;

/// A frame allocation failed. Recoverable: callers under memory pressure
/// are expected to handle this, reclaim, and retry on their own policy.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum AllocError {
    #[error("no free frames in the {0} region")]
    Exhausted(Region),
}

/// Page-granularity physical memory allocator over `N` frames.
///
/// All state sits in one [`FrameTable`] behind a single whole-table
/// [`SpinLock`]; the allocation scan needs a consistent snapshot of its
/// entire search region, so per-frame locking is not an option. Critical
/// sections are short and bounded (a scan plus a few stores, or a frame
/// scrub), and nothing inside them can block.
///
/// Frames start [`Owner::Reserved`] and are released to [`Owner::Free`] by
/// the two boot phases; see [`init_early`](Self::init_early) and
/// [`init_full`](Self::init_full).
pub struct FrameAllocator<M: FrameMemory, const N: usize> {
    table: SpinLock<FrameTable<N>>,
    layout: MemoryLayout,
    map: DirectMap,
    memory: M,
}

impl<M: FrameMemory, const N: usize> FrameAllocator<M, N> {
    /// A cold allocator: every frame reserved, nothing allocatable until
    /// the init phases run. Const, so a kernel can hold it in a `static`.
    ///
    /// # Panics
    /// If the layout describes more frames than the table holds.
    #[must_use]
    pub const fn new(layout: MemoryLayout, map: DirectMap, memory: M) -> Self {
        assert!(layout.frame_count() <= N);
        Self {
            table: SpinLock::new(FrameTable::new()),
            layout,
            map,
            memory,
        }
    }

    /// Phase 1 of boot: release the frames covered by the minimal early
    /// mapping, given as a virtual range `[start, end)`. Exactly one
    /// execution context exists at this point.
    ///
    /// # Panics
    /// If called more than once or after [`init_full`](Self::init_full);
    /// misordered boot is unrecoverable.
    pub fn init_early(&self, start: VirtualAddress, end: VirtualAddress) {
        let mut table = self.table.lock();
        assert!(
            table.phase == BootPhase::Cold,
            "init_early must be the first initialization phase"
        );
        let released = table.release_range(self.map, start, end);
        table.phase = BootPhase::EarlyMapped;
        drop(table);
        info!("early init: released {released} frames ({start}..{end})");
    }

    /// Phase 2 of boot: release the remaining frames, once the complete
    /// mapping is installed on every execution context. After this the
    /// allocator is in its concurrent steady state.
    ///
    /// # Panics
    /// If [`init_early`](Self::init_early) has not run, or this ran already.
    pub fn init_full(&self, start: VirtualAddress, end: VirtualAddress) {
        let mut table = self.table.lock();
        assert!(
            table.phase == BootPhase::EarlyMapped,
            "init_full must follow init_early exactly once"
        );
        let released = table.release_range(self.map, start, end);
        table.phase = BootPhase::Ready;
        drop(table);
        info!("full init: released {released} frames ({start}..{end})");
    }

    /// Allocate one frame from the caller's region.
    ///
    /// First-fit by ascending physical address. On success the frame's
    /// owner is recorded, its mapped address is set to the direct-map
    /// address ([`TargetAddress::Auto`]) or the caller's choice verbatim
    /// ([`TargetAddress::Fixed`]), and the frame's kernel direct-map
    /// address is returned. The mapping template is *not* touched here;
    /// whoever installs the page-table entry records it via
    /// [`set_template`](Self::set_template).
    ///
    /// # Errors
    /// [`AllocError::Exhausted`] when the region has no free frame. This is
    /// an expected condition under memory pressure, never a panic.
    pub fn allocate(
        &self,
        caller: Caller,
        target: TargetAddress,
    ) -> Result<VirtualAddress, AllocError> {
        let region = caller.region();
        let (start, end) = self.layout.region_frames(region);

        let mut table = self.table.lock();
        let Some(index) = table.first_free_in(start..end) else {
            drop(table);
            warn!("{region} region exhausted ({caller:?})");
            return Err(AllocError::Exhausted(region));
        };
        let frame = PhysicalAddress::from_frame_index(index);
        let mapped_at = match target {
            TargetAddress::Auto => self.map.virtual_of(frame),
            TargetAddress::Fixed(va) => va,
        };
        table.assign(index, caller.as_owner(), mapped_at);
        drop(table);

        debug!("allocated frame {index} ({frame}) to {caller:?}");
        Ok(self.map.virtual_of(frame))
    }

    /// Free the frame behind `va`, a value previously returned by
    /// [`allocate`](Self::allocate) to this caller.
    ///
    /// The frame is filled with [`FREE_FILL`] before its metadata is reset,
    /// under the table lock, so its next owner can never observe the old
    /// contents.
    ///
    /// # Panics
    /// If the recorded owner is not `caller`. This covers double frees and
    /// frames never released by init. Freeing memory you do not own is
    /// never silently tolerated: continuing would risk handing one frame to
    /// two owners.
    pub fn free(&self, caller: Caller, va: VirtualAddress) {
        let index = self.frame_index_of(va);
        let frame = PhysicalAddress::from_frame_index(index);

        let mut table = self.table.lock();
        let owner = table.owner(index);
        assert!(
            caller.owns(owner),
            "frame {index} is owned by {owner:?}, freed on behalf of {caller:?}"
        );
        // SAFETY: `frame` is page-aligned by construction and, being owned
        // by the freeing caller, covered by the full mapping; the lock
        // keeps every other context out until the metadata is reset.
        unsafe {
            self.memory.fill_frame(frame, FREE_FILL);
        }
        table.clear(index);
        drop(table);

        debug!("freed frame {index} ({frame}) from {caller:?}");
    }

    /// Record the page-table-entry template for a frame this caller owns.
    ///
    /// # Panics
    /// On ownership mismatch, like [`free`](Self::free).
    pub fn set_template(&self, caller: Caller, va: VirtualAddress, template: MappingTemplate) {
        let index = self.frame_index_of(va);
        let mut table = self.table.lock();
        let owner = table.owner(index);
        assert!(
            caller.owns(owner),
            "frame {index} is owned by {owner:?}, template set on behalf of {caller:?}"
        );
        table.set_template(index, template);
    }

    /// Recorded owner of the frame behind `va`.
    #[must_use]
    pub fn owner_of(&self, va: VirtualAddress) -> Owner {
        let index = self.frame_index_of(va);
        self.table.lock().owner(index)
    }

    /// Virtual address the frame behind `va` is recorded as mapped at, or
    /// `None` while it has no owner.
    #[must_use]
    pub fn mapping_of(&self, va: VirtualAddress) -> Option<VirtualAddress> {
        let index = self.frame_index_of(va);
        let table = self.table.lock();
        match table.owner(index) {
            Owner::Reserved | Owner::Free => None,
            Owner::Kernel | Owner::Process(_) => Some(table.mapped_at(index)),
        }
    }

    /// Recorded mapping template of the frame behind `va`.
    #[must_use]
    pub fn template_of(&self, va: VirtualAddress) -> MappingTemplate {
        let index = self.frame_index_of(va);
        self.table.lock().template(index)
    }

    /// Number of free frames in a region.
    #[must_use]
    pub fn free_frames(&self, region: Region) -> usize {
        let (start, end) = self.layout.region_frames(region);
        self.table.lock().free_count(start..end)
    }

    /// Frame index behind a direct-mapped virtual address; addresses into
    /// the middle of a frame refer to the containing frame.
    ///
    /// # Panics
    /// If the address falls outside managed physical memory. Such an
    /// address cannot have come from [`allocate`](Self::allocate), so this
    /// is the same caller-error class as an ownership mismatch.
    fn frame_index_of(&self, va: VirtualAddress) -> usize {
        let index = self.map.physical_of(va.align_down()).frame_index();
        assert!(
            index < self.layout.frame_count(),
            "{va} is outside managed physical memory"
        );
        index
    }
}
