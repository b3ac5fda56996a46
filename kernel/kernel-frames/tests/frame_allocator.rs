//! End-to-end allocator behavior over a small 12-frame layout:
//! frames 0..2 hold the "kernel image", 2..8 are the kernel region,
//! 8..12 the user region. Frame memory is a plain buffer.

#![allow(clippy::cast_possible_truncation)]

use kernel_addresses::{DirectMap, PAGE_SIZE, PhysicalAddress, VirtualAddress};
use kernel_frames::{
    AllocError, Caller, FREE_FILL, FrameAllocator, FrameMemory, MappingTemplate, MemoryLayout,
    Owner, ProcessId, Region, TargetAddress,
};
use std::sync::{Arc, Mutex};

const FRAMES: usize = 12;
const KERNEL_BASE_FRAME: usize = 2;
const USER_BASE_FRAME: usize = 8;
const PAGE: usize = PAGE_SIZE as usize;

/// Buffer-backed physical memory, indexed by physical address.
#[derive(Clone)]
struct TestMemory(Arc<Mutex<Vec<u8>>>);

impl TestMemory {
    fn new() -> Self {
        // Nonzero garbage, so a missing scrub is visible.
        Self(Arc::new(Mutex::new(vec![0xAA; FRAMES * PAGE])))
    }

    fn write(&self, pa: PhysicalAddress, bytes: &[u8]) {
        let start = usize::try_from(pa.as_u64()).unwrap();
        self.0.lock().unwrap()[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn frame_bytes(&self, index: usize) -> Vec<u8> {
        self.0.lock().unwrap()[index * PAGE..(index + 1) * PAGE].to_vec()
    }
}

impl FrameMemory for TestMemory {
    unsafe fn fill_frame(&self, frame: PhysicalAddress, byte: u8) {
        let start = usize::try_from(frame.as_u64()).unwrap();
        self.0.lock().unwrap()[start..start + PAGE].fill(byte);
    }
}

fn layout() -> MemoryLayout {
    MemoryLayout::new(
        PhysicalAddress::from_frame_index(KERNEL_BASE_FRAME),
        PhysicalAddress::from_frame_index(USER_BASE_FRAME),
        PhysicalAddress::from_frame_index(FRAMES),
    )
}

fn allocator() -> (FrameAllocator<TestMemory, FRAMES>, TestMemory) {
    let memory = TestMemory::new();
    let alloc = FrameAllocator::new(layout(), DirectMap::KERNEL, memory.clone());
    (alloc, memory)
}

fn frame_va(index: usize) -> VirtualAddress {
    DirectMap::KERNEL.virtual_of(PhysicalAddress::from_frame_index(index))
}

/// Phase 1 releases the kernel region, phase 2 the user region.
fn init(alloc: &FrameAllocator<TestMemory, FRAMES>) {
    alloc.init_early(frame_va(KERNEL_BASE_FRAME), frame_va(USER_BASE_FRAME));
    alloc.init_full(frame_va(USER_BASE_FRAME), frame_va(FRAMES));
}

fn frame_of(va: VirtualAddress) -> usize {
    DirectMap::KERNEL.physical_of(va).frame_index()
}

const PID1: Caller = Caller::Process(ProcessId::new(1));
const PID2: Caller = Caller::Process(ProcessId::new(2));

#[test]
fn two_phase_init_releases_the_usable_range() {
    let (alloc, _) = allocator();
    assert_eq!(alloc.free_frames(Region::Kernel), 0);

    alloc.init_early(frame_va(KERNEL_BASE_FRAME), frame_va(USER_BASE_FRAME));
    assert_eq!(alloc.free_frames(Region::Kernel), 6);
    assert_eq!(alloc.free_frames(Region::User), 0);

    alloc.init_full(frame_va(USER_BASE_FRAME), frame_va(FRAMES));
    assert_eq!(alloc.free_frames(Region::User), 4);
}

#[test]
fn allocations_before_full_init_stay_in_the_early_range() {
    let (alloc, _) = allocator();
    alloc.init_early(frame_va(KERNEL_BASE_FRAME), frame_va(USER_BASE_FRAME));

    let va = alloc.allocate(Caller::Kernel, TargetAddress::Auto).unwrap();
    assert!((KERNEL_BASE_FRAME..USER_BASE_FRAME).contains(&frame_of(va)));

    // The user region is not released yet.
    assert_eq!(
        alloc.allocate(PID1, TargetAddress::Auto),
        Err(AllocError::Exhausted(Region::User))
    );
}

#[test]
#[should_panic(expected = "init_early must be the first initialization phase")]
fn repeated_early_init_is_fatal() {
    let (alloc, _) = allocator();
    alloc.init_early(frame_va(KERNEL_BASE_FRAME), frame_va(USER_BASE_FRAME));
    alloc.init_early(frame_va(KERNEL_BASE_FRAME), frame_va(USER_BASE_FRAME));
}

#[test]
#[should_panic(expected = "init_full must follow init_early")]
fn full_init_without_early_init_is_fatal() {
    let (alloc, _) = allocator();
    alloc.init_full(frame_va(USER_BASE_FRAME), frame_va(FRAMES));
}

#[test]
fn regions_are_respected() {
    let (alloc, _) = allocator();
    init(&alloc);

    let kernel_va = alloc.allocate(Caller::Kernel, TargetAddress::Auto).unwrap();
    assert!((KERNEL_BASE_FRAME..USER_BASE_FRAME).contains(&frame_of(kernel_va)));

    let user_va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    assert!((USER_BASE_FRAME..FRAMES).contains(&frame_of(user_va)));

    assert_eq!(alloc.owner_of(kernel_va), Owner::Kernel);
    assert_eq!(alloc.owner_of(user_va), Owner::Process(ProcessId::new(1)));
}

#[test]
fn allocations_are_unique_until_exhaustion() {
    let (alloc, _) = allocator();
    init(&alloc);

    let mut seen = Vec::new();
    for _ in 0..6 {
        let va = alloc.allocate(Caller::Kernel, TargetAddress::Auto).unwrap();
        assert!(!seen.contains(&va), "frame handed out twice");
        seen.push(va);
    }
    assert_eq!(
        alloc.allocate(Caller::Kernel, TargetAddress::Auto),
        Err(AllocError::Exhausted(Region::Kernel))
    );
    // Kernel exhaustion leaves the user region untouched.
    assert_eq!(alloc.free_frames(Region::User), 4);
}

/// The 4-frame user region scenario: four distinct allocations, a failing
/// fifth, then freeing the second lets a sixth succeed on the same frame.
#[test]
fn user_region_exhaustion_and_reuse() {
    let (alloc, _) = allocator();
    init(&alloc);

    let vas: Vec<_> = (0..4)
        .map(|_| alloc.allocate(PID1, TargetAddress::Auto).unwrap())
        .collect();
    let distinct: std::collections::HashSet<_> = vas.iter().copied().collect();
    assert_eq!(distinct.len(), 4);

    assert_eq!(
        alloc.allocate(PID1, TargetAddress::Auto),
        Err(AllocError::Exhausted(Region::User))
    );

    alloc.free(PID1, vas[1]);
    let reused = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    assert_eq!(reused, vas[1]);
}

#[test]
fn conservation_of_free_frames() {
    let (alloc, _) = allocator();
    init(&alloc);
    assert_eq!(alloc.free_frames(Region::User), 4);

    let a = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    let b = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    let _c = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    assert_eq!(alloc.free_frames(Region::User), 1);

    alloc.free(PID1, a);
    assert_eq!(alloc.free_frames(Region::User), 2);
    alloc.free(PID1, b);
    assert_eq!(alloc.free_frames(Region::User), 3);
}

#[test]
fn freed_frames_are_scrubbed_before_reuse() {
    let (alloc, memory) = allocator();
    init(&alloc);

    let va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    let pa = DirectMap::KERNEL.physical_of(va);
    memory.write(pa, b"user secrets");

    alloc.free(PID1, va);
    let reused = alloc.allocate(PID2, TargetAddress::Auto).unwrap();
    assert_eq!(reused, va);
    assert!(
        memory
            .frame_bytes(pa.frame_index())
            .iter()
            .all(|&b| b == FREE_FILL),
        "previous owner's data survived the free"
    );
}

#[test]
fn fixed_target_is_recorded_verbatim() {
    let (alloc, _) = allocator();
    init(&alloc);

    let wanted = VirtualAddress::new(0x40_0000);
    let va = alloc.allocate(PID1, TargetAddress::Fixed(wanted)).unwrap();
    // The returned address is always the frame's direct-map address...
    assert!((USER_BASE_FRAME..FRAMES).contains(&frame_of(va)));
    // ...while the recorded mapping is the caller's choice.
    assert_eq!(alloc.mapping_of(va), Some(wanted));

    let auto = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    assert_eq!(alloc.mapping_of(auto), Some(auto));
}

#[test]
fn templates_are_stored_and_cleared_on_free() {
    let (alloc, _) = allocator();
    init(&alloc);

    let va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    assert!(alloc.template_of(va).is_clear());

    alloc.set_template(PID1, va, MappingTemplate::user_rw());
    assert_eq!(alloc.template_of(va), MappingTemplate::user_rw());

    alloc.free(PID1, va);
    let reused = alloc.allocate(PID2, TargetAddress::Auto).unwrap();
    assert_eq!(reused, va);
    assert!(
        alloc.template_of(reused).is_clear(),
        "stale template leaked to the new owner"
    );
}

#[test]
fn concurrent_allocations_hand_out_distinct_frames() {
    let (alloc, _) = allocator();
    init(&alloc);

    // 4 threads race for the 4 user frames; each frame may win at most once.
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let alloc = &alloc;
                scope.spawn(move || {
                    alloc
                        .allocate(
                            Caller::Process(ProcessId::new(i)),
                            TargetAddress::Auto,
                        )
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let distinct: std::collections::HashSet<_> = results.iter().copied().collect();
    assert_eq!(distinct.len(), 4);
    assert_eq!(alloc.free_frames(Region::User), 0);
}

#[test]
#[should_panic(expected = "owned by")]
fn freeing_another_process_frame_is_fatal() {
    let (alloc, _) = allocator();
    init(&alloc);
    let va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    alloc.free(PID2, va);
}

#[test]
#[should_panic(expected = "owned by")]
fn kernel_free_of_a_user_frame_is_fatal() {
    let (alloc, _) = allocator();
    init(&alloc);
    let va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    alloc.free(Caller::Kernel, va);
}

#[test]
#[should_panic(expected = "owned by")]
fn double_free_is_fatal() {
    let (alloc, _) = allocator();
    init(&alloc);
    let va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    alloc.free(PID1, va);
    alloc.free(PID1, va);
}

#[test]
#[should_panic(expected = "owned by")]
fn freeing_a_reserved_frame_is_fatal() {
    let (alloc, _) = allocator();
    init(&alloc);
    // Frame 0 is kernel-image territory, never released.
    alloc.free(Caller::Kernel, frame_va(0));
}

#[test]
#[should_panic(expected = "outside managed physical memory")]
fn freeing_past_the_top_of_memory_is_fatal() {
    let (alloc, _) = allocator();
    init(&alloc);
    alloc.free(Caller::Kernel, frame_va(FRAMES + 1));
}

#[test]
fn set_template_validates_ownership() {
    let (alloc, _) = allocator();
    init(&alloc);
    let va = alloc.allocate(PID1, TargetAddress::Auto).unwrap();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        alloc.set_template(PID2, va, MappingTemplate::user_rw());
    }));
    assert!(result.is_err());
    assert!(alloc.template_of(va).is_clear());
}
