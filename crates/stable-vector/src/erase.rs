//! Removal from the middle of a [`StableVec`].
//!
//! Erasure shifts the survivors down by swapping each one into the hole
//! ahead of it, then pops the displaced values off the back. Elements are
//! moved, never cloned, and every slot stays initialized while the chain
//! runs.

use std::ptr;

use crate::alloc::BlockAlloc;
use crate::cursor::{advance, slot, Position};
use crate::vector::{index_out_of_bounds, StableVec};

impl<T, A: BlockAlloc> StableVec<T, A> {
    /// Remove the element at `pos` and return the position of the element
    /// that followed it.
    ///
    /// Erasing the last element returns the new [`end`](Self::end). Erasing
    /// at the end position is a no-op that returns it unchanged.
    ///
    /// # Panics
    ///
    /// If `pos` names an index past `len()`.
    #[track_caller]
    pub fn erase(&mut self, pos: Position) -> Position {
        let (index, pos) = self.resolve(pos);
        if index == self.len {
            return pos;
        }
        let next = advance(self.blocks.as_slice(), pos);
        self.shift_down(pos, next);
        drop(self.pop_back());
        self.position_of(index)
    }

    /// Remove the elements in `[first, last)` and return the position now
    /// holding what was at `last`.
    ///
    /// If `last` was the end position, the returned position is the new
    /// end. An empty range is a no-op.
    ///
    /// # Panics
    ///
    /// If either position names an index past `len()` or `first` comes
    /// after `last`.
    #[track_caller]
    pub fn erase_range(&mut self, first: Position, last: Position) -> Position {
        let (first_index, first) = self.resolve(first);
        let (last_index, last) = self.resolve(last);
        assert!(
            first_index <= last_index,
            "erase range starts at {first_index} but ends at {last_index}"
        );
        if first_index == last_index {
            return last;
        }
        let last_was_end = last_index == self.len;
        self.shift_down(first, last);
        self.truncate(self.len - (last_index - first_index));
        if last_was_end {
            self.end()
        } else {
            self.position_of(first_index)
        }
    }

    /// Remove and return the element at `index`, shifting later elements
    /// down by one.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len;
        if index >= len {
            index_out_of_bounds(index, len);
        }
        let pos = self.position_of(index);
        let next = self.next_position(pos);
        self.shift_down(pos, next);
        match self.pop_back() {
            Some(value) => value,
            None => unreachable!("non-empty vector popped nothing"),
        }
    }

    /// Swap `[src, end)` down onto `[dst, ...)`, leaving the displaced
    /// values at the back in the slots formerly at `[end - (src - dst), end)`.
    ///
    /// Both positions must be canonical.
    fn shift_down(&mut self, mut dst: Position, mut src: Position) {
        let end = self.end();
        let blocks = self.blocks.as_slice();
        while src != end {
            // SAFETY: dst precedes src and both designate live slots.
            unsafe { ptr::swap(slot(blocks, dst), slot(blocks, src)) };
            dst = advance(blocks, dst);
            src = advance(blocks, src);
        }
    }
}
