//! # Physical and Virtual Address Types
//!
//! Strongly typed wrappers for the raw addresses handled by the physical
//! memory manager, plus the fixed-offset translation between them.
//!
//! ## Overview
//!
//! Physical memory is managed at page (frame) granularity. Everything in
//! this crate is built around that one page size:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | A location in physical memory (host RAM). |
//! | [`VirtualAddress`] | A location in the kernel's virtual address space. |
//! | [`DirectMap`] | The fixed-offset VA↔PA translation for direct-mapped memory. |
//!
//! Both address types are `#[repr(transparent)]` wrappers around `u64` and
//! carry *intent* only: they prevent accidental VA↔PA mix-ups at compile
//! time while staying zero-cost.
//!
//! ## Frames
//!
//! A frame is one [`PAGE_SIZE`] unit of physical memory, identified by its
//! index `pa / PAGE_SIZE`. [`PhysicalAddress::frame_index`] and
//! [`PhysicalAddress::from_frame_index`] convert between the two views.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_addresses::*;
//! let map = DirectMap::KERNEL;
//! let pa = PhysicalAddress::new(0x40_2000);
//! let va = map.virtual_of(pa);
//! assert_eq!(map.physical_of(va), pa);
//! assert_eq!(pa.frame_index(), 0x402);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::cast_possible_truncation)]

mod direct_map;
mod physical_address;
mod virtual_address;

pub use direct_map::{DIRECT_MAP_BASE, DirectMap};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;

/// Size of one page/frame in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// `log2(PAGE_SIZE)`.
pub const PAGE_SHIFT: u32 = 12;

const _: () = {
    assert!(PAGE_SIZE == 1 << PAGE_SHIFT);
};

/// Align `addr` upwards to the next page boundary.
#[inline]
#[must_use]
pub const fn page_align_up(addr: u64) -> u64 {
    (addr + (PAGE_SIZE - 1)) & !(PAGE_SIZE - 1)
}

/// Align `addr` downwards to the containing page boundary.
#[inline]
#[must_use]
pub const fn page_align_down(addr: u64) -> u64 {
    addr & !(PAGE_SIZE - 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_alignment_helpers() {
        assert_eq!(page_align_up(0), 0);
        assert_eq!(page_align_up(1), PAGE_SIZE);
        assert_eq!(page_align_up(PAGE_SIZE), PAGE_SIZE);
        assert_eq!(page_align_down(PAGE_SIZE + 1), PAGE_SIZE);
        assert_eq!(page_align_down(PAGE_SIZE - 1), 0);
    }
}
