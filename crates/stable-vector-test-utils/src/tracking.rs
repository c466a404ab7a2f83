//! Instrumented allocators.
//!
//! [`TrackingAlloc`] (a [`BlockAlloc`]) and [`TrackingResource`] (a
//! [`MemoryResource`]) forward to the process allocator while counting live
//! blocks and bytes, and can be told to fail after a number of successful
//! allocations. Tracking allocators compare equal only to clones of
//! themselves, so two independently created ones behave like distinct
//! memory arenas.

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stable_vector::pmr::MemoryResource;
use stable_vector::{AllocError, BlockAlloc, Global};

const NEVER: usize = usize::MAX;

/// Shared allocation counters and failure switch.
#[derive(Debug)]
pub struct Tracker {
    live_blocks: AtomicUsize,
    live_bytes: AtomicUsize,
    allocations: AtomicUsize,
    fail_after: AtomicUsize,
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            live_blocks: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(NEVER),
        }
    }
}

impl Tracker {
    /// Blocks allocated and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.load(Ordering::SeqCst)
    }

    /// Bytes in blocks not yet released.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }

    /// Successful allocations over the tracker's lifetime.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Let `n` more allocations succeed, then fail every one after.
    pub fn fail_after(&self, n: usize) {
        self.fail_after.store(n, Ordering::SeqCst);
    }

    /// Stop injecting failures.
    pub fn never_fail(&self) {
        self.fail_after.store(NEVER, Ordering::SeqCst);
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let admitted = self
            .fail_after
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                NEVER => Some(NEVER),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok();
        if !admitted {
            return Err(AllocError::Exhausted { layout });
        }
        let ptr = Global.allocate(layout)?;
        self.live_blocks.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_add(layout.size(), Ordering::SeqCst);
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(ptr)
    }

    /// # Safety
    ///
    /// As [`BlockAlloc::deallocate`].
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live_blocks.fetch_sub(1, Ordering::SeqCst);
        self.live_bytes.fetch_sub(layout.size(), Ordering::SeqCst);
        // SAFETY: forwarded from the caller; the block came from `Global`.
        unsafe { Global.deallocate(ptr, layout) };
    }
}

/// A [`BlockAlloc`] that counts what it hands out.
#[derive(Clone, Debug, Default)]
pub struct TrackingAlloc {
    tracker: Arc<Tracker>,
}

impl TrackingAlloc {
    /// An allocator with a fresh tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters shared by every clone of this allocator.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

impl PartialEq for TrackingAlloc {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tracker, &other.tracker)
    }
}

impl Eq for TrackingAlloc {}

impl BlockAlloc for TrackingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.tracker.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller.
        unsafe { self.tracker.deallocate(ptr, layout) }
    }
}

/// A [`MemoryResource`] that counts what it hands out.
#[derive(Debug, Default)]
pub struct TrackingResource {
    tracker: Tracker,
}

impl TrackingResource {
    /// A resource with a fresh tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// This resource's counters.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

impl MemoryResource for TrackingResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.tracker.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller.
        unsafe { self.tracker.deallocate(ptr, layout) }
    }
}
