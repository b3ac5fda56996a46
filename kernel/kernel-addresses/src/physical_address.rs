use crate::{PAGE_SHIFT, PAGE_SIZE, page_align_down, page_align_up};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Physical memory address.
///
/// A thin wrapper around `u64` that denotes **physical** addresses (host
/// RAM). Like [`VirtualAddress`](super::VirtualAddress), this type carries
/// intent and prevents accidental VA↔PA mix-ups.
///
/// ### Semantics
/// - Use [`PhysicalAddress::frame_index`] to obtain the index of the frame
///   containing this address, and [`PhysicalAddress::from_frame_index`] for
///   the inverse (which always yields a page-aligned address).
/// - [`align_up`](Self::align_up) / [`align_down`](Self::align_down) round
///   to frame boundaries.
///
/// ### Examples
/// ```rust
/// # use kernel_addresses::*;
/// let pa = PhysicalAddress::new(0x40_2042);
/// assert_eq!(pa.frame_index(), 0x402);
/// assert_eq!(PhysicalAddress::from_frame_index(0x402).as_u64(), 0x40_2000);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Index of the frame containing this address.
    #[inline]
    #[must_use]
    pub const fn frame_index(self) -> usize {
        (self.0 >> PAGE_SHIFT) as usize
    }

    /// Base address of the frame with the given index.
    #[inline]
    #[must_use]
    pub const fn from_frame_index(index: usize) -> Self {
        Self::new((index as u64) << PAGE_SHIFT)
    }

    /// Round up to the next frame boundary.
    #[inline]
    #[must_use]
    pub const fn align_up(self) -> Self {
        Self::new(page_align_up(self.0))
    }

    /// Round down to the containing frame boundary.
    #[inline]
    #[must_use]
    pub const fn align_down(self) -> Self {
        Self::new(page_align_down(self.0))
    }

    #[inline]
    #[must_use]
    pub const fn is_page_aligned(self) -> bool {
        self.0 % PAGE_SIZE == 0
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl Add<u64> for PhysicalAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for PhysicalAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_index_round_trip() {
        let pa = PhysicalAddress::new(0xE00_0000 - PAGE_SIZE);
        assert_eq!(pa.frame_index(), 57343);
        assert_eq!(PhysicalAddress::from_frame_index(57343), pa);
    }

    #[test]
    fn in_frame_offsets_share_the_index() {
        let base = PhysicalAddress::from_frame_index(7);
        assert_eq!((base + 1).frame_index(), 7);
        assert_eq!((base + (PAGE_SIZE - 1)).frame_index(), 7);
        assert_eq!((base + PAGE_SIZE).frame_index(), 8);
    }

    #[test]
    fn alignment() {
        let pa = PhysicalAddress::new(0x1001);
        assert!(!pa.is_page_aligned());
        assert_eq!(pa.align_up().as_u64(), 0x2000);
        assert_eq!(pa.align_down().as_u64(), 0x1000);
        assert!(pa.align_up().is_page_aligned());
    }
}
