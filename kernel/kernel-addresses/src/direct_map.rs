//! Fixed-offset translation between direct-mapped virtual addresses and
//! physical addresses.
//!
//! The kernel keeps all of physical memory visible at a fixed virtual base:
//! physical address `pa` is reachable at `DIRECT_MAP_BASE + pa`. Both
//! directions are therefore a single addition or subtraction, with no page
//! walk and no failure mode inside the mapped range.

use crate::{PhysicalAddress, VirtualAddress};

/// Virtual base of the kernel's direct map of physical memory.
///
/// Anything mapped at [`DIRECT_MAP_BASE`]` + pa` lets the kernel access
/// physical memory via a fixed offset.
pub const DIRECT_MAP_BASE: u64 = 0xFFFF_8880_0000_0000;

/// Fixed-offset VA↔PA translator for direct-mapped physical memory.
///
/// ### Contract
/// - [`physical_of`](Self::physical_of) is only valid for virtual addresses
///   inside the direct map; [`virtual_of`](Self::virtual_of) is its exact
///   inverse.
/// - Both are total and pure within the mapped range. Calling them with
///   addresses outside that range is a caller error; it is caught by debug
///   assertions only.
///
/// ### Examples
/// ```rust
/// # use kernel_addresses::*;
/// let map = DirectMap::KERNEL;
/// let pa = PhysicalAddress::new(0x1234_0000);
/// assert_eq!(map.physical_of(map.virtual_of(pa)), pa);
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DirectMap {
    base: u64,
}

impl DirectMap {
    /// The kernel's canonical higher-half direct map.
    pub const KERNEL: Self = Self::new(VirtualAddress::new(DIRECT_MAP_BASE));

    /// A direct map rooted at `base`.
    ///
    /// Tests use small bases; the kernel uses [`DirectMap::KERNEL`].
    #[inline]
    #[must_use]
    pub const fn new(base: VirtualAddress) -> Self {
        Self {
            base: base.as_u64(),
        }
    }

    /// Virtual base of the map.
    #[inline]
    #[must_use]
    pub const fn base(self) -> VirtualAddress {
        VirtualAddress::new(self.base)
    }

    /// Physical address corresponding to a direct-mapped virtual address.
    #[inline]
    #[must_use]
    pub const fn physical_of(self, va: VirtualAddress) -> PhysicalAddress {
        debug_assert!(va.as_u64() >= self.base);
        PhysicalAddress::new(va.as_u64() - self.base)
    }

    /// Direct-mapped virtual address of a physical address.
    #[inline]
    #[must_use]
    pub const fn virtual_of(self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(self.base + pa.as_u64())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PAGE_SIZE;

    #[test]
    fn translation_round_trip() {
        let map = DirectMap::KERNEL;
        let pa = PhysicalAddress::new(3 * PAGE_SIZE + 42);
        let va = map.virtual_of(pa);
        assert_eq!(va.as_u64(), DIRECT_MAP_BASE + 3 * PAGE_SIZE + 42);
        assert_eq!(map.physical_of(va), pa);
    }

    #[test]
    fn custom_base() {
        let map = DirectMap::new(VirtualAddress::new(0x10_0000));
        assert_eq!(map.base().as_u64(), 0x10_0000);
        assert_eq!(
            map.physical_of(VirtualAddress::new(0x10_1000)).as_u64(),
            0x1000
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "assertion failed")]
    fn below_base_is_rejected_in_debug() {
        let map = DirectMap::new(VirtualAddress::new(0x10_0000));
        let _ = map.physical_of(VirtualAddress::new(0x1000));
    }
}
