//! Frame ownership and the caller-facing request variants.
//!
//! The allocator records *who* holds each frame and lets callers state who
//! they are and where they want the frame mapped. Both requests used to be
//! magic sentinel values in older allocators (`pid == -1` for the kernel,
//! `va == -1` for "pick one"); here they are tagged variants so a colliding
//! sentinel is unrepresentable.

use crate::layout::Region;
use core::fmt;
use kernel_addresses::VirtualAddress;

/// Identifier of a user process.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ProcessId(u32);

impl ProcessId {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}", self.0)
    }
}

/// Current holder of a physical frame.
///
/// `Reserved` is the boot state: the frame has not been released to the
/// allocator by either initialization phase and must never be handed out.
/// The allocation scan only matches `Free`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Owner {
    /// Not released to the allocator (kernel image, holes, uninitialized).
    Reserved,
    /// Eligible for allocation.
    Free,
    /// Held by kernel code.
    Kernel,
    /// Held by a user process.
    Process(ProcessId),
}

impl Owner {
    #[inline]
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// Who is asking for (or returning) a frame.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Caller {
    /// Kernel-internal allocation (page tables, kernel stacks, pipes).
    Kernel,
    /// Allocation on behalf of a user process.
    Process(ProcessId),
}

impl Caller {
    /// The region this caller class is allowed to allocate from.
    #[inline]
    #[must_use]
    pub(crate) const fn region(self) -> Region {
        match self {
            Self::Kernel => Region::Kernel,
            Self::Process(_) => Region::User,
        }
    }

    /// Owner tag recorded for a frame handed to this caller.
    #[inline]
    #[must_use]
    pub(crate) const fn as_owner(self) -> Owner {
        match self {
            Self::Kernel => Owner::Kernel,
            Self::Process(pid) => Owner::Process(pid),
        }
    }

    /// Whether a frame recorded as `owner` belongs to this caller.
    #[inline]
    #[must_use]
    pub(crate) const fn owns(self, owner: Owner) -> bool {
        match (self, owner) {
            (Self::Kernel, Owner::Kernel) => true,
            (Self::Process(pid), Owner::Process(other)) => pid.as_u32() == other.as_u32(),
            _ => false,
        }
    }
}

/// Where the caller wants the frame exposed in virtual memory.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TargetAddress {
    /// Record the kernel direct-map address of whatever frame is found.
    Auto,
    /// Record this caller-chosen virtual address verbatim.
    Fixed(VirtualAddress),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn caller_region_selection() {
        assert_eq!(Caller::Kernel.region(), Region::Kernel);
        assert_eq!(Caller::Process(ProcessId::new(1)).region(), Region::User);
    }

    #[test]
    fn ownership_matching() {
        let one = ProcessId::new(1);
        let two = ProcessId::new(2);
        assert!(Caller::Kernel.owns(Owner::Kernel));
        assert!(Caller::Process(one).owns(Owner::Process(one)));
        assert!(!Caller::Process(one).owns(Owner::Process(two)));
        assert!(!Caller::Kernel.owns(Owner::Process(one)));
        assert!(!Caller::Process(one).owns(Owner::Kernel));
        assert!(!Caller::Kernel.owns(Owner::Free));
        assert!(!Caller::Kernel.owns(Owner::Reserved));
    }
}
