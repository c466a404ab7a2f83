//! The [`StableVec`] container: growth, shrink and element access.
//!
//! Elements are appended into the tail block until it is full, at which
//! point a block twice the size of the previous one is allocated. Existing
//! blocks are never reallocated, so element addresses are stable for as long
//! as the element is live. A block is released as soon as removals from the
//! back leave it empty.

use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::ptr;

use crate::alloc::{BlockAlloc, Global};
use crate::block::{Block, Directory};
use crate::error::{AllocError, EmplaceError};
use crate::index;
use crate::iter::{Iter, IterMut};

/// A growable, random-access sequence whose elements never move.
///
/// Storage is a list of blocks with capacities 1, 2, 4, 8, ... so indexing
/// is O(1) and at most one block (the tail) is partially filled. Appending
/// never relocates existing elements: a reference or pointer obtained for
/// an element stays valid until that element is removed.
///
/// ```
/// use stable_vector::StableVec;
///
/// let mut v = StableVec::new();
/// let first: *const u32 = v.push_back(1);
/// for i in 2..1000 {
///     v.push_back(i);
/// }
/// assert_eq!(first, &v[0] as *const u32);
/// ```
pub struct StableVec<T, A: BlockAlloc = Global> {
    /// Live elements.
    pub(crate) len: usize,
    /// Initialized slots in the tail block; 0 when there are no blocks.
    pub(crate) end: usize,
    pub(crate) blocks: Directory<T>,
    pub(crate) alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: the vector exclusively owns its elements and block storage.
unsafe impl<T: Send, A: BlockAlloc + Send> Send for StableVec<T, A> {}
// SAFETY: shared access only hands out shared references to elements.
unsafe impl<T: Sync, A: BlockAlloc + Sync> Sync for StableVec<T, A> {}

impl<T> StableVec<T> {
    /// Create an empty vector on the global allocator. Does not allocate.
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A: BlockAlloc> StableVec<T, A> {
    /// Create an empty vector that takes its blocks from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self {
            len: 0,
            end: 0,
            blocks: Directory::new(),
            alloc,
            _marker: PhantomData,
        }
    }

    /// The allocator backing this vector.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots currently allocated, `2^block_count - 1`.
    ///
    /// Always less than `2 * len + 1`.
    pub fn capacity(&self) -> usize {
        index::capacity_of(self.blocks.len())
    }

    /// Number of allocated blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // ── Growth ──────────────────────────────────────────────────

    /// Append `value` and return a reference to it in its final location.
    ///
    /// Aborts through [`std::alloc::handle_alloc_error`] if a new block
    /// cannot be allocated; see [`try_push_back`](Self::try_push_back).
    pub fn push_back(&mut self, value: T) -> &mut T {
        self.emplace_back(|| value)
    }

    /// Append `value`, reporting allocator exhaustion instead of aborting.
    ///
    /// On error the vector is unchanged and `value` is dropped.
    pub fn try_push_back(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.reserve_slot()?;
        // SAFETY: reserve_slot left a free slot at `end` in the tail block.
        Ok(unsafe { self.write_slot(value) })
    }

    /// Construct a new last element with `make`, called once storage for it
    /// is available.
    ///
    /// If `make` panics, a block allocated for this element is released
    /// before the panic continues and the vector is left as it was.
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        match self.try_emplace_back(|| Ok::<T, Infallible>(make())) {
            Ok(slot) => slot,
            Err(e) => e.handle(),
        }
    }

    /// Construct a new last element with a fallible constructor.
    ///
    /// All-or-nothing: if allocation fails or `make` returns `Err` (or
    /// panics), any block allocated for this call is released and no other
    /// element is touched.
    pub fn try_emplace_back<E, F>(&mut self, make: F) -> Result<&mut T, EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let allocated = self.reserve_slot()?;
        let mut guard = RollbackGuard {
            vec: &mut *self,
            armed: allocated,
        };
        let value = make().map_err(EmplaceError::Construct)?;
        guard.armed = false;
        drop(guard);
        // SAFETY: reserve_slot left a free slot at `end` in the tail block.
        Ok(unsafe { self.write_slot(value) })
    }

    /// Make sure the tail block has a free slot at `end`, allocating the
    /// next block if it is full. Returns whether a block was allocated.
    pub(crate) fn reserve_slot(&mut self) -> Result<bool, AllocError> {
        if let Some(tail) = self.blocks.tail() {
            if self.end < tail.capacity() {
                return Ok(false);
            }
        }
        self.blocks.grow(&self.alloc)?;
        self.end = 0;
        Ok(true)
    }

    /// Move `value` into the free slot at `end`.
    ///
    /// # Safety
    ///
    /// The tail block exists and `end < tail.capacity()`.
    pub(crate) unsafe fn write_slot(&mut self, value: T) -> &mut T {
        // SAFETY: guaranteed by the caller.
        unsafe {
            let slot = self.tail_slot(self.end);
            ptr::write(slot, value);
            self.end += 1;
            self.len += 1;
            &mut *slot
        }
    }

    // ── Shrink ──────────────────────────────────────────────────

    /// Remove and return the last element, releasing the tail block if it
    /// becomes empty. `None` if the vector is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.end -= 1;
        // SAFETY: the vector was non-empty, so the tail block exists and
        // slot `end` held the last live element.
        let value = unsafe { ptr::read(self.tail_slot(self.end)) };
        if self.end == 0 {
            // SAFETY: the tail holds no live element any more.
            unsafe { self.release_tail_block() };
        }
        Some(value)
    }

    /// Drop elements from the back until `len` remain.
    ///
    /// Elements are destroyed last-first. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            drop(self.pop_back());
        }
    }

    /// Drop every element and release every block.
    pub fn clear(&mut self) {
        if std::mem::needs_drop::<T>() {
            self.truncate(0);
        } else {
            // SAFETY: elements have no drop glue, so discarding them is a no-op.
            unsafe { self.forget_elements() };
        }
    }

    /// Release all blocks without dropping elements.
    ///
    /// # Safety
    ///
    /// Every live element must already be owned elsewhere or need no drop.
    pub(crate) unsafe fn forget_elements(&mut self) {
        self.len = 0;
        self.end = 0;
        // SAFETY: forwarded from the caller; blocks came from `self.alloc`.
        unsafe { self.blocks.release_all(&self.alloc) };
    }

    /// Release the (empty) tail block and retarget `end` at the new tail.
    ///
    /// # Safety
    ///
    /// A tail block exists and holds no live element.
    pub(crate) unsafe fn release_tail_block(&mut self) {
        // SAFETY: forwarded from the caller; blocks came from `self.alloc`.
        unsafe { self.blocks.release_tail(&self.alloc) };
        self.end = self.blocks.tail().map_or(0, Block::capacity);
    }

    // ── Access ──────────────────────────────────────────────────

    /// The element at `index`, or `None` if out of bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            // SAFETY: bounds checked above.
            Some(unsafe { self.get_unchecked(index) })
        } else {
            None
        }
    }

    /// Mutable access to the element at `index`, or `None` if out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            // SAFETY: bounds checked above.
            Some(unsafe { self.get_unchecked_mut(index) })
        } else {
            None
        }
    }

    /// The element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index < self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len, "index {index} out of bounds (len {})", self.len);
        // SAFETY: guaranteed by the caller.
        unsafe { &*self.slot_ptr(index) }
    }

    /// Mutable access to the element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index < self.len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len, "index {index} out of bounds (len {})", self.len);
        // SAFETY: guaranteed by the caller.
        unsafe { &mut *self.slot_ptr(index) }
    }

    /// First element.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Mutable first element.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Last element.
    pub fn back(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: non-empty, so slot `end - 1` of the tail is live.
        Some(unsafe { &*self.tail_slot(self.end - 1) })
    }

    /// Mutable last element.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: non-empty, so slot `end - 1` of the tail is live.
        Some(unsafe { &mut *self.tail_slot(self.end - 1) })
    }

    /// Front-to-back iterator over shared references.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.blocks.as_slice(), self.begin(), self.end(), self.len)
    }

    /// Front-to-back iterator over mutable references.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let (begin, end, len) = (self.begin(), self.end(), self.len);
        IterMut::new(self.blocks.as_slice(), begin, end, len)
    }

    /// Pointer to the slot holding logical index `index`.
    ///
    /// # Safety
    ///
    /// `index < self.capacity()`.
    #[inline]
    pub(crate) unsafe fn slot_ptr(&self, index: usize) -> *mut T {
        let (block, offset) = index::locate(index);
        // SAFETY: index < capacity implies the block exists and offset < its capacity.
        unsafe { self.blocks.get_unchecked(block).slot(offset) }
    }

    /// Pointer to slot `offset` of the tail block.
    ///
    /// # Safety
    ///
    /// A tail block exists and `offset <= tail.capacity()`.
    #[inline]
    unsafe fn tail_slot(&self, offset: usize) -> *mut T {
        // SAFETY: guaranteed by the caller.
        unsafe {
            self.blocks
                .get_unchecked(self.blocks.len() - 1)
                .slot(offset)
        }
    }
}

/// Releases the block allocated for an append if construction does not
/// complete.
struct RollbackGuard<'a, T, A: BlockAlloc> {
    vec: &'a mut StableVec<T, A>,
    armed: bool,
}

impl<T, A: BlockAlloc> Drop for RollbackGuard<'_, T, A> {
    fn drop(&mut self) {
        if self.armed {
            trace!("rolling back block {} after failed construction", self.vec.blocks.len() - 1);
            // SAFETY: the block was allocated for the element being built and
            // nothing has been written to it.
            unsafe { self.vec.release_tail_block() };
        }
    }
}

impl<T, A: BlockAlloc> Drop for StableVec<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: BlockAlloc + Default> Default for StableVec<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

#[cold]
#[track_caller]
pub(crate) fn index_out_of_bounds(index: usize, len: usize) -> ! {
    panic!("index out of bounds: the len is {len} but the index is {index}")
}

impl<T, A: BlockAlloc> Index<usize> for StableVec<T, A> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => index_out_of_bounds(index, self.len),
        }
    }
}

impl<T, A: BlockAlloc> IndexMut<usize> for StableVec<T, A> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => index_out_of_bounds(index, len),
        }
    }
}

impl<T: fmt::Debug, A: BlockAlloc> fmt::Debug for StableVec<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A, B> PartialEq<StableVec<U, B>> for StableVec<T, A>
where
    T: PartialEq<U>,
    A: BlockAlloc,
    B: BlockAlloc,
{
    fn eq(&self, other: &StableVec<U, B>) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq, A: BlockAlloc> Eq for StableVec<T, A> {}

impl<T, U, A, const N: usize> PartialEq<[U; N]> for StableVec<T, A>
where
    T: PartialEq<U>,
    A: BlockAlloc,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.len == N && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T, U, A> PartialEq<Vec<U>> for StableVec<T, A>
where
    T: PartialEq<U>,
    A: BlockAlloc,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        self.len == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Hash, A: BlockAlloc> Hash for StableVec<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for item in self {
            item.hash(state);
        }
    }
}
