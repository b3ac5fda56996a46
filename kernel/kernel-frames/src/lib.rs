//! # Physical Frame Allocation
//!
//! Page-granularity physical memory allocator: tracks which frames are
//! free, assigns frames to kernel-internal callers or to specific user
//! processes, and reclaims them. Process creation, page-table pages, kernel
//! stacks, and pipe buffers all draw from here, which makes this the one
//! subsystem where a bug means silent corruption instead of a clean crash.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 FrameAllocator                      │
//! │    • two-phase boot initialization                  │
//! │    • first-fit allocate / validated free            │
//! │    • one whole-table SpinLock                       │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                  FrameTable                         │
//! │    • parallel per-frame arrays, indexed by frame    │
//! │    • owner / mapped VA / mapping template           │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │        DirectMap + FrameMemory (collaborators)      │
//! │    • fixed-offset VA↔PA translation                 │
//! │    • raw frame bytes for the free-time scrub        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design decisions
//!
//! - **Tables, not a free-list.** Allocation state is parallel per-frame
//!   metadata arrays indexed by frame number, not an intrusive list
//!   threaded through free frames. The scan is O(region size) where a list
//!   pop would be O(1), but the bookkeeping lives entirely outside
//!   allocatable memory: a wild write through a stale pointer can corrupt a
//!   frame's *contents*, never the allocator's view of who owns what, and
//!   the whole state is trivially auditable frame by frame.
//! - **One lock for the whole table.** The first-fit scan must observe a
//!   consistent snapshot of its entire search region, so the granularity is
//!   the table, not the frame. Critical sections are short and bounded;
//!   the lock is a spin lock with no suspension points.
//! - **Regions by caller class.** Low frames serve kernel-internal
//!   allocations, frames above the partition boundary serve user
//!   processes. A request only ever searches its own region.
//! - **Frames are scrubbed on free.** Every released frame is overwritten
//!   with [`FREE_FILL`] before becoming allocatable again, so data never
//!   travels between owners and use-after-free reads are recognizable.
//!
//! ## Boot
//!
//! Early boot runs on a minimal static mapping that covers only part of
//! physical memory; touching the rest before the full mapping is installed
//! would fault. Initialization therefore happens in two phases:
//! [`FrameAllocator::init_early`] releases the minimally-mapped range,
//! [`FrameAllocator::init_full`] releases the rest once every execution
//! context runs on the complete mapping. Only after that is the allocator
//! called concurrently.
//!
//! ```rust,no_run
//! use kernel_addresses::{DirectMap, PhysicalAddress};
//! use kernel_frames::{
//!     Caller, DirectMapFrameMemory, FRAME_COUNT, FrameAllocator, MemoryLayout, PHYS_TOP,
//!     TargetAddress, USER_REGION_BASE,
//! };
//!
//! static FRAMES: FrameAllocator<DirectMapFrameMemory, FRAME_COUNT> = FrameAllocator::new(
//!     MemoryLayout::new(
//!         PhysicalAddress::new(0x11_0000), // linker end-of-kernel, page-rounded
//!         PhysicalAddress::new(USER_REGION_BASE),
//!         PhysicalAddress::new(PHYS_TOP),
//!     ),
//!     DirectMap::KERNEL,
//!     DirectMapFrameMemory::new(DirectMap::KERNEL),
//! );
//!
//! fn kernel_stack_page() -> Option<u64> {
//!     FRAMES
//!         .allocate(Caller::Kernel, TargetAddress::Auto)
//!         .ok()
//!         .map(|va| va.as_u64())
//! }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code, clippy::cast_possible_truncation)]

mod alloc;
mod layout;
mod memory;
mod owner;
mod table;
mod template;

pub use alloc::{AllocError, FREE_FILL, FrameAllocator};
pub use layout::{FRAME_COUNT, MemoryLayout, PHYS_TOP, Region, USER_REGION_BASE};
pub use memory::{DirectMapFrameMemory, FrameMemory};
pub use owner::{Caller, Owner, ProcessId, TargetAddress};
pub use template::MappingTemplate;
