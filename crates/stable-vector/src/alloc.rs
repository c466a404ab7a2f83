//! The allocator capability used for block storage.
//!
//! [`BlockAlloc`] is the seam between a [`StableVec`](crate::StableVec) and
//! the memory it lives in. Two implementations ship with the crate:
//! [`Global`] (the process allocator) and
//! [`PolymorphicAlloc`](crate::pmr::PolymorphicAlloc), a type-erased handle
//! to a runtime-selected [`MemoryResource`](crate::pmr::MemoryResource).

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// Allocates and frees the raw storage of container blocks.
///
/// Implementations have value semantics: a clone refers to the same
/// underlying memory source. Two allocators compare equal when memory
/// obtained from one can be released through the other, which is what lets a
/// container adopt another container's blocks on move.
pub trait BlockAlloc: Clone + PartialEq {
    /// `true` when every instance of the type compares equal, so storage may
    /// always be adopted without comparing instances.
    const ALWAYS_EQUAL: bool = false;

    /// Allocate storage for `layout`. Never called with a zero-sized layout
    /// by the containers in this crate.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Release storage previously returned by [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator (or one equal to it)
    /// with the same `layout`, and must not have been released already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// The allocator a copy of a container should use.
    ///
    /// Defaults to a clone of `self`.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }
}

/// Marker for allocators whose instances are interchangeable.
///
/// Enables [`StableVec::move_assign_adopting`](crate::StableVec::move_assign_adopting),
/// which never needs an element-wise fallback.
pub trait AlwaysEqual: BlockAlloc {}

/// The process-wide allocator ([`std::alloc::alloc`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Global;

impl BlockAlloc for Global {
    const ALWAYS_EQUAL: bool = true;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return dangling(layout);
        }
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::Exhausted { layout })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            // SAFETY: ptr was allocated by `std::alloc::alloc` with this layout
            // per the caller contract.
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

impl AlwaysEqual for Global {}

/// A well-aligned, non-null pointer with no backing storage.
pub(crate) fn dangling(layout: Layout) -> Result<NonNull<u8>, AllocError> {
    NonNull::new(ptr::without_provenance_mut(layout.align())).ok_or(AllocError::Exhausted { layout })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_round_trips_a_block() {
        let layout = Layout::array::<u32>(16).unwrap();
        let ptr = Global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);
        unsafe {
            ptr.cast::<u32>().as_ptr().write(7);
            assert_eq!(ptr.cast::<u32>().as_ptr().read(), 7);
            Global.deallocate(ptr, layout);
        }
    }

    #[test]
    fn zero_sized_layout_is_dangling_and_aligned() {
        let layout = Layout::from_size_align(0, 64).unwrap();
        let ptr = Global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize, 64);
        unsafe { Global.deallocate(ptr, layout) };
    }

    #[test]
    fn global_is_always_equal() {
        assert!(<Global as BlockAlloc>::ALWAYS_EQUAL);
        assert_eq!(Global.select_on_copy(), Global);
    }
}
