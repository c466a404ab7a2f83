//! Block descriptors and the directory that orders them.
//!
//! A [`Block`] describes one fixed-capacity storage chunk. The storage itself
//! is allocated separately and never moves; only descriptors live in the
//! [`Directory`], which may reallocate as it grows. Block `i` always holds
//! exactly `2^i` slots, so only the newest block can be partially filled.

use std::alloc::Layout;
use std::ptr::NonNull;

use smallvec::SmallVec;

use crate::alloc::BlockAlloc;
use crate::error::AllocError;
use crate::index;

/// Descriptors kept inline before the directory spills to the heap.
/// Eight blocks hold 255 elements.
pub(crate) const INLINE_BLOCKS: usize = 8;

/// One storage chunk: `capacity` uninitialized slots starting at `begin`.
pub(crate) struct Block<T> {
    begin: NonNull<T>,
    capacity: usize,
    is_last: bool,
}

impl<T> Block<T> {
    /// First slot.
    #[inline]
    pub(crate) fn begin(&self) -> *mut T {
        self.begin.as_ptr()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether this is the highest-indexed block in use.
    #[inline]
    pub(crate) fn is_last(&self) -> bool {
        self.is_last
    }

    /// Pointer to slot `offset`.
    ///
    /// # Safety
    ///
    /// `offset <= capacity`.
    #[inline]
    pub(crate) unsafe fn slot(&self, offset: usize) -> *mut T {
        debug_assert!(offset <= self.capacity);
        // SAFETY: offset is within (or one past) the allocation.
        unsafe { self.begin.as_ptr().add(offset) }
    }

    fn layout(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|_| AllocError::CapacityOverflow)
    }
}

/// Ordered block descriptors, oldest (capacity 1) first.
pub(crate) struct Directory<T> {
    blocks: SmallVec<[Block<T>; INLINE_BLOCKS]>,
}

impl<T> Directory<T> {
    pub(crate) fn new() -> Self {
        Self {
            blocks: SmallVec::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[Block<T>] {
        &self.blocks
    }

    #[inline]
    pub(crate) fn tail(&self) -> Option<&Block<T>> {
        self.blocks.last()
    }

    /// Block `block`.
    ///
    /// # Safety
    ///
    /// `block < self.len()`.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self, block: usize) -> &Block<T> {
        debug_assert!(block < self.blocks.len());
        // SAFETY: guaranteed by the caller.
        unsafe { self.blocks.get_unchecked(block) }
    }

    /// Append a block of capacity `2^len()` and make it the tail.
    ///
    /// Zero-sized element types get a dangling block without consulting the
    /// allocator. On error the directory is unchanged.
    pub(crate) fn grow<A: BlockAlloc>(&mut self, alloc: &A) -> Result<(), AllocError> {
        let block_id = self.blocks.len();
        if block_id >= usize::BITS as usize {
            return Err(AllocError::CapacityOverflow);
        }
        let capacity = index::block_capacity(block_id);
        let layout = Block::<T>::layout(capacity)?;
        let begin = if layout.size() == 0 {
            crate::alloc::dangling(layout)?
        } else {
            alloc.allocate(layout)?
        };
        trace!("allocated block {} ({} slots, {} bytes)", block_id, capacity, layout.size());
        if let Some(prev) = self.blocks.last_mut() {
            prev.is_last = false;
        }
        self.blocks.push(Block {
            begin: begin.cast(),
            capacity,
            is_last: true,
        });
        Ok(())
    }

    /// Release the tail block's storage and make its predecessor the tail.
    ///
    /// # Safety
    ///
    /// The directory is non-empty, the tail holds no live elements, and
    /// `alloc` is equal to the allocator that produced the tail.
    pub(crate) unsafe fn release_tail<A: BlockAlloc>(&mut self, alloc: &A) {
        let Some(tail) = self.blocks.pop() else {
            return;
        };
        trace!("releasing block {} ({} slots)", self.blocks.len(), tail.capacity);
        if let Ok(layout) = Block::<T>::layout(tail.capacity) {
            if layout.size() != 0 {
                // SAFETY: the block was allocated by `grow` with this layout
                // through an allocator equal to `alloc`.
                unsafe { alloc.deallocate(tail.begin.cast(), layout) };
            }
        }
        if let Some(new_tail) = self.blocks.last_mut() {
            new_tail.is_last = true;
        }
    }

    /// Release every block without touching slot contents.
    ///
    /// # Safety
    ///
    /// No block holds a live element that still needs dropping, and `alloc`
    /// is equal to the allocator that produced the blocks.
    pub(crate) unsafe fn release_all<A: BlockAlloc>(&mut self, alloc: &A) {
        while !self.blocks.is_empty() {
            // SAFETY: forwarded from the caller.
            unsafe { self.release_tail(alloc) };
        }
    }
}
