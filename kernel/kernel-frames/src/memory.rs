//! Access to the raw bytes of a physical frame.
//!
//! The allocator's only byte-level touch of memory is the scrub on `free`.
//! That access goes through this seam so a live kernel can reach frames via
//! the direct map while tests substitute a buffer-backed double.

use kernel_addresses::{DirectMap, PAGE_SIZE, PhysicalAddress};

/// Byte-level access to physical frames.
pub trait FrameMemory {
    /// Fill every byte of the frame at `frame` with `byte`.
    ///
    /// # Safety
    /// - `frame` must be page-aligned and inside memory this implementation
    ///   can reach.
    /// - No other context may be reading or writing the frame; the
    ///   allocator guarantees this by scrubbing only frames it is about to
    ///   release, under the table lock.
    unsafe fn fill_frame(&self, frame: PhysicalAddress, byte: u8);
}

/// [`FrameMemory`] for a live kernel: frames are reached through the
/// direct map and written in place.
pub struct DirectMapFrameMemory {
    map: DirectMap,
}

impl DirectMapFrameMemory {
    #[inline]
    #[must_use]
    pub const fn new(map: DirectMap) -> Self {
        Self { map }
    }
}

impl FrameMemory for DirectMapFrameMemory {
    unsafe fn fill_frame(&self, frame: PhysicalAddress, byte: u8) {
        debug_assert!(frame.is_page_aligned());
        let ptr: *mut u8 = self.map.virtual_of(frame).as_mut_ptr();
        // SAFETY: the caller vouches that the direct map covers `frame` and
        // that no other context is using it.
        unsafe {
            core::ptr::write_bytes(ptr, byte, PAGE_SIZE as usize);
        }
    }
}
