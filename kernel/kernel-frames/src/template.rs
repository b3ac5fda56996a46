//! Page-table-entry attribute template stored per frame.
//!
//! The frame table remembers which attributes the mapping subsystem intends
//! to use when it installs (or reinstalls) the frame's page-table entry.
//! The allocator only stores and clears this value; it never writes a page
//! table itself. That separation lets a frame be mapped immediately,
//! deferred, or mapped more than once without the allocator caring.

use bitfield_struct::bitfield;

/// Attribute bits of an x86 page-table entry, address field excluded.
///
/// Bit positions match the hardware layout so the mapping subsystem can OR
/// the frame's base address straight into this value. `PS` stays zero: the
/// allocator only deals in 4 KiB frames.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct MappingTemplate {
    /// Present (P, bit 0).
    pub present: bool,

    /// Writable (RW, bit 1).
    pub writable: bool,

    /// User/Supervisor (US, bit 2). Set to allow user-mode access.
    pub user_access: bool,

    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4).
    pub cache_disabled: bool,

    /// Accessed (A, bit 5). Set by the CPU, not a permission bit.
    pub accessed: bool,

    /// Dirty (D, bit 6). Set by the CPU on first write.
    pub dirty: bool,

    /// PS (bit 7). Always zero for 4 KiB frames.
    _ps: bool,

    /// Global (G, bit 8).
    pub global: bool,

    #[bits(55)]
    _reserved: u64,
}

impl MappingTemplate {
    /// `true` when no attributes are recorded (the state after `free`).
    #[inline]
    #[must_use]
    pub const fn is_clear(self) -> bool {
        self.into_bits() == 0
    }

    /// Present + writable, supervisor only.
    #[inline]
    #[must_use]
    pub const fn kernel_rw() -> Self {
        Self::new().with_present(true).with_writable(true)
    }

    /// Present + writable, user accessible.
    #[inline]
    #[must_use]
    pub const fn user_rw() -> Self {
        Self::kernel_rw().with_user_access(true)
    }
}
