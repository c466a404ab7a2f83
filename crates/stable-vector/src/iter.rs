//! Borrowing and owning iterators.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;

use crate::alloc::{BlockAlloc, Global};
use crate::block::{Block, Directory};
use crate::cursor::{advance, retreat, slot, Position};
use crate::index;
use crate::vector::StableVec;

/// Shared iterator over a [`StableVec`], created by
/// [`StableVec::iter`].
pub struct Iter<'a, T> {
    blocks: &'a [Block<T>],
    front: Position,
    back: Position,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(blocks: &'a [Block<T>], front: Position, back: Position, len: usize) -> Self {
        Self {
            blocks,
            front,
            back,
            remaining: len,
        }
    }
}

// SAFETY: behaves like `&'a [T]`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
// SAFETY: behaves like `&'a [T]`.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: remaining > 0, so `front` designates a live slot.
        let item = unsafe { &*slot(self.blocks, self.front) };
        self.remaining -= 1;
        self.front = advance(self.blocks, self.front);
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.back = retreat(self.blocks, self.back);
        self.remaining -= 1;
        // SAFETY: the slot before the old `back` is live.
        Some(unsafe { &*slot(self.blocks, self.back) })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.clone().collect::<Vec<_>>()).finish()
    }
}

/// Mutable iterator over a [`StableVec`], created by
/// [`StableVec::iter_mut`].
pub struct IterMut<'a, T> {
    blocks: &'a [Block<T>],
    front: Position,
    back: Position,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(blocks: &'a [Block<T>], front: Position, back: Position, len: usize) -> Self {
        Self {
            blocks,
            front,
            back,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

// SAFETY: behaves like `&'a mut [T]`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: behaves like `&'a mut [T]`.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: `front` designates a live slot, and each slot is yielded
        // at most once.
        let item = unsafe { &mut *slot(self.blocks, self.front) };
        self.remaining -= 1;
        self.front = advance(self.blocks, self.front);
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        self.back = retreat(self.blocks, self.back);
        self.remaining -= 1;
        // SAFETY: as in `next`.
        Some(unsafe { &mut *slot(self.blocks, self.back) })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Owning iterator, created by `StableVec::into_iter`.
///
/// Block storage is released when the iterator is dropped; elements not
/// yet yielded are dropped first.
pub struct IntoIter<T, A: BlockAlloc = Global> {
    blocks: Directory<T>,
    alloc: A,
    /// Logical index of the next front element.
    front: usize,
    /// One past the logical index of the next back element.
    back: usize,
}

// SAFETY: owns its remaining elements.
unsafe impl<T: Send, A: BlockAlloc + Send> Send for IntoIter<T, A> {}
// SAFETY: shared access exposes nothing but the element count.
unsafe impl<T: Sync, A: BlockAlloc + Sync> Sync for IntoIter<T, A> {}

impl<T, A: BlockAlloc> IntoIter<T, A> {
    /// # Safety
    ///
    /// `index` is in `front..back`.
    unsafe fn read_at(&self, index: usize) -> T {
        let (block, offset) = index::locate(index);
        // SAFETY: indices in front..back are live and read exactly once.
        unsafe { ptr::read(self.blocks.get_unchecked(block).slot(offset)) }
    }
}

impl<T, A: BlockAlloc> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        // SAFETY: index was in front..back.
        Some(unsafe { self.read_at(index) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T, A: BlockAlloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: the old back - 1 was in front..back.
        Some(unsafe { self.read_at(self.back) })
    }
}

impl<T, A: BlockAlloc> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: BlockAlloc> FusedIterator for IntoIter<T, A> {}

impl<T, A: BlockAlloc> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        struct ReleaseBlocks<'a, T, A: BlockAlloc>(&'a mut IntoIter<T, A>);

        impl<T, A: BlockAlloc> Drop for ReleaseBlocks<'_, T, A> {
            fn drop(&mut self) {
                let it = &mut *self.0;
                it.front = it.back;
                // SAFETY: every element has been moved out or dropped.
                unsafe { it.blocks.release_all(&it.alloc) };
            }
        }

        let mut guard = ReleaseBlocks(self);
        for item in guard.0.by_ref() {
            drop(item);
        }
    }
}

impl<T: fmt::Debug, A: BlockAlloc> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &(self.back - self.front))
            .finish_non_exhaustive()
    }
}

impl<T, A: BlockAlloc> IntoIterator for StableVec<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let mut this = ManuallyDrop::new(self);
        let blocks = std::mem::replace(&mut this.blocks, Directory::new());
        // SAFETY: `this` is never used or dropped again, so the allocator is
        // moved out exactly once.
        let alloc = unsafe { ptr::read(&this.alloc) };
        IntoIter {
            blocks,
            alloc,
            front: 0,
            back: this.len,
        }
    }
}

impl<'a, T, A: BlockAlloc> IntoIterator for &'a StableVec<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: BlockAlloc> IntoIterator for &'a mut StableVec<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
