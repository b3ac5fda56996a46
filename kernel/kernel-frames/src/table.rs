//! The frame table: parallel per-frame metadata arrays.
//!
//! One entry per physical frame, indexed by frame number. State lives in
//! three parallel arrays (owner, mapped virtual address, mapping template)
//! instead of a free-list threaded through the frames themselves: lookups
//! cost an index instead of a pointer chase, and a stray write into free
//! memory cannot corrupt the allocator's bookkeeping. The price is an O(n)
//! scan per allocation, paid deliberately.

use crate::owner::Owner;
use crate::template::MappingTemplate;
use core::ops::Range;
use kernel_addresses::{DirectMap, PAGE_SIZE, VirtualAddress};

/// Initialization progress. The transition is one-way:
/// `Cold → EarlyMapped → Ready`, driven by the two init phases.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum BootPhase {
    /// No frames released yet.
    Cold,
    /// Phase 1 done: the minimally-mapped range is released.
    EarlyMapped,
    /// Phase 2 done: all usable frames released, concurrent steady state.
    Ready,
}

/// Per-frame metadata for `N` frames.
///
/// The phase marker lives inside this struct so it is guarded by the same
/// lock as the data it gates.
pub(crate) struct FrameTable<const N: usize> {
    pub(crate) phase: BootPhase,
    owners: [Owner; N],
    mapped_at: [VirtualAddress; N],
    templates: [MappingTemplate; N],
}

impl<const N: usize> FrameTable<N> {
    pub(crate) const fn new() -> Self {
        Self {
            phase: BootPhase::Cold,
            owners: [Owner::Reserved; N],
            mapped_at: [VirtualAddress::zero(); N],
            templates: [MappingTemplate::new(); N],
        }
    }

    /// Release every whole frame in the virtual range `[start, end)` to
    /// `Free`. `start` is rounded up to the next frame boundary; a trailing
    /// partial frame is not released. Returns the number of frames released.
    ///
    /// Frames past the table are ignored (the layout, not the init range,
    /// bounds what is ever handed out anyway).
    pub(crate) fn release_range(
        &mut self,
        map: DirectMap,
        start: VirtualAddress,
        end: VirtualAddress,
    ) -> usize {
        let mut released = 0;
        let mut pa = map.physical_of(start.align_up());
        let end = map.physical_of(end);
        while pa.as_u64() + PAGE_SIZE <= end.as_u64() {
            let index = pa.frame_index();
            if index >= N {
                break;
            }
            debug_assert!(
                matches!(self.owners[index], Owner::Reserved),
                "frame released twice during init"
            );
            self.owners[index] = Owner::Free;
            self.mapped_at[index] = VirtualAddress::zero();
            self.templates[index] = MappingTemplate::new();
            released += 1;
            pa += PAGE_SIZE;
        }
        released
    }

    /// First-fit: lowest `Free` frame index in `frames`, if any.
    pub(crate) fn first_free_in(&self, frames: Range<usize>) -> Option<usize> {
        let start = frames.start;
        self.owners[frames]
            .iter()
            .position(|owner| owner.is_free())
            .map(|offset| start + offset)
    }

    pub(crate) fn free_count(&self, frames: Range<usize>) -> usize {
        self.owners[frames]
            .iter()
            .filter(|owner| owner.is_free())
            .count()
    }

    /// Hand the frame to `owner`, recording where it is mapped. The
    /// template is left untouched; recording it is the mapping subsystem's
    /// move, not the allocator's.
    pub(crate) const fn assign(&mut self, index: usize, owner: Owner, mapped_at: VirtualAddress) {
        self.owners[index] = owner;
        self.mapped_at[index] = mapped_at;
    }

    /// Return the frame to `Free`, erasing mapping address and template so
    /// nothing of the previous owner survives into the next assignment.
    pub(crate) const fn clear(&mut self, index: usize) {
        self.owners[index] = Owner::Free;
        self.mapped_at[index] = VirtualAddress::zero();
        self.templates[index] = MappingTemplate::new();
    }

    pub(crate) const fn owner(&self, index: usize) -> Owner {
        self.owners[index]
    }

    pub(crate) const fn mapped_at(&self, index: usize) -> VirtualAddress {
        self.mapped_at[index]
    }

    pub(crate) const fn template(&self, index: usize) -> MappingTemplate {
        self.templates[index]
    }

    pub(crate) const fn set_template(&mut self, index: usize, template: MappingTemplate) {
        self.templates[index] = template;
    }
}
