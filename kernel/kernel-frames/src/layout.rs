//! Physical memory layout: the kernel/user region partition.
//!
//! The machine exposes one flat physical region. Low frames up to
//! [`USER_REGION_BASE`] are reserved for kernel-internal allocations; the
//! rest belong to user processes. A kernel request never resolves to a user
//! frame and vice versa.

use core::fmt;
use kernel_addresses::{PAGE_SIZE, PhysicalAddress};

/// Top of usable physical memory (224 MiB).
pub const PHYS_TOP: u64 = 0xE00_0000;

/// First physical address of the user region (4 MiB).
pub const USER_REGION_BASE: u64 = 0x40_0000;

/// Number of frames the canonical machine exposes.
pub const FRAME_COUNT: usize = (PHYS_TOP / PAGE_SIZE) as usize;

const _: () = {
    assert!(PHYS_TOP % PAGE_SIZE == 0);
    assert!(USER_REGION_BASE % PAGE_SIZE == 0);
    assert!(USER_REGION_BASE < PHYS_TOP);
};

/// Caller class a sub-range of frames is reserved for.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Region {
    /// Low frames, for kernel-internal allocations.
    Kernel,
    /// High frames, for user-process allocations.
    User,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel => f.write_str("kernel"),
            Self::User => f.write_str("user"),
        }
    }
}

/// The region partition of physical memory.
///
/// - Kernel region: frames in `[kernel_base, user_base)`. `kernel_base` is
///   the first frame past the loaded kernel image, so it comes from the
///   linker-provided end-of-kernel symbol at boot.
/// - User region: frames in `[user_base, phys_top)`.
///
/// All three bounds are page-aligned and ordered; `new` enforces this
/// fatally since a bad partition silently corrupts every later allocation.
///
/// ```rust
/// # use kernel_frames::{MemoryLayout, PHYS_TOP, USER_REGION_BASE};
/// # use kernel_addresses::PhysicalAddress;
/// let kernel_end = PhysicalAddress::new(0x11_0000); // linker symbol, page-rounded
/// let layout = MemoryLayout::new(
///     kernel_end.align_up(),
///     PhysicalAddress::new(USER_REGION_BASE),
///     PhysicalAddress::new(PHYS_TOP),
/// );
/// assert!(layout.frame_count() > 0);
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MemoryLayout {
    kernel_base: PhysicalAddress,
    user_base: PhysicalAddress,
    phys_top: PhysicalAddress,
}

impl MemoryLayout {
    /// Build a partition from its three bounds.
    ///
    /// # Panics
    /// If any bound is not page-aligned or the bounds are not ascending.
    #[must_use]
    pub const fn new(
        kernel_base: PhysicalAddress,
        user_base: PhysicalAddress,
        phys_top: PhysicalAddress,
    ) -> Self {
        assert!(kernel_base.is_page_aligned());
        assert!(user_base.is_page_aligned());
        assert!(phys_top.is_page_aligned());
        assert!(kernel_base.as_u64() <= user_base.as_u64());
        assert!(user_base.as_u64() < phys_top.as_u64());
        Self {
            kernel_base,
            user_base,
            phys_top,
        }
    }

    /// Total number of frames up to the top of physical memory.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.phys_top.frame_index()
    }

    /// Half-open frame-index range `[start, end)` of a region.
    #[inline]
    #[must_use]
    pub(crate) const fn region_frames(&self, region: Region) -> (usize, usize) {
        match region {
            Region::Kernel => (self.kernel_base.frame_index(), self.user_base.frame_index()),
            Region::User => (self.user_base.frame_index(), self.phys_top.frame_index()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const fn layout() -> MemoryLayout {
        MemoryLayout::new(
            PhysicalAddress::new(2 * PAGE_SIZE),
            PhysicalAddress::new(8 * PAGE_SIZE),
            PhysicalAddress::new(12 * PAGE_SIZE),
        )
    }

    #[test]
    fn region_bounds() {
        let layout = layout();
        assert_eq!(layout.region_frames(Region::Kernel), (2, 8));
        assert_eq!(layout.region_frames(Region::User), (8, 12));
        assert_eq!(layout.frame_count(), 12);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn unaligned_bound_is_rejected() {
        let _ = MemoryLayout::new(
            PhysicalAddress::new(100),
            PhysicalAddress::new(8 * PAGE_SIZE),
            PhysicalAddress::new(12 * PAGE_SIZE),
        );
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn inverted_bounds_are_rejected() {
        let _ = MemoryLayout::new(
            PhysicalAddress::new(8 * PAGE_SIZE),
            PhysicalAddress::new(2 * PAGE_SIZE),
            PhysicalAddress::new(12 * PAGE_SIZE),
        );
    }
}
