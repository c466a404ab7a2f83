//! Positions and cursors: bidirectional navigation over a [`StableVec`].
//!
//! A [`Position`] is a plain `(block, offset)` pair. Advancing past the last
//! slot of a full non-tail block normalizes to offset 0 of the next block;
//! the tail block never normalizes, so the end position of a vector whose
//! tail is full is `(tail, capacity)`. An empty vector's begin and end are
//! both [`Position::DETACHED`].
//!
//! A position names a logical index, not a vector. Every public entry point
//! resolves it to the canonical pair for that index before touching a slot,
//! so a position saved as `end()` keeps naming the old length after further
//! pushes, and [`Position::DETACHED`] names index 0. Removals shift elements
//! down, so afterwards a saved position names whatever moved into its index.

use std::fmt;
use std::ptr;

use crate::alloc::{BlockAlloc, Global};
use crate::block::Block;
use crate::index;
use crate::vector::StableVec;

/// A location inside a [`StableVec`]: block id plus slot offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    block: usize,
    offset: usize,
}

impl Position {
    /// The begin and end position of every empty vector.
    pub const DETACHED: Position = Position {
        block: usize::MAX,
        offset: 0,
    };

    pub(crate) const fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }

    /// Block id.
    pub fn block(self) -> usize {
        self.block
    }

    /// Slot offset within the block.
    pub fn offset(self) -> usize {
        self.offset
    }

    /// `true` for [`Position::DETACHED`].
    pub fn is_detached(self) -> bool {
        self.block == usize::MAX
    }
}

/// The position after `pos`.
///
/// `pos` must designate a live slot of `blocks`.
#[inline]
pub(crate) fn advance<T>(blocks: &[Block<T>], pos: Position) -> Position {
    let block = &blocks[pos.block];
    let offset = pos.offset + 1;
    if offset == block.capacity() && !block.is_last() {
        Position::new(pos.block + 1, 0)
    } else {
        Position::new(pos.block, offset)
    }
}

/// The position before `pos`.
///
/// `pos` must not be the first slot.
#[inline]
pub(crate) fn retreat<T>(blocks: &[Block<T>], pos: Position) -> Position {
    if pos.offset == 0 {
        let prev = pos.block - 1;
        Position::new(prev, blocks[prev].capacity() - 1)
    } else {
        Position::new(pos.block, pos.offset - 1)
    }
}

/// Slot pointer for `pos`.
///
/// # Safety
///
/// `pos.block < blocks.len()` and `pos.offset` is within that block.
#[inline]
pub(crate) unsafe fn slot<T>(blocks: &[Block<T>], pos: Position) -> *mut T {
    // SAFETY: guaranteed by the caller.
    unsafe { blocks.get_unchecked(pos.block).slot(pos.offset) }
}

impl<T, A: BlockAlloc> StableVec<T, A> {
    /// Position of the first element, [`Position::DETACHED`] when empty.
    pub fn begin(&self) -> Position {
        if self.is_empty() {
            Position::DETACHED
        } else {
            Position::new(0, 0)
        }
    }

    /// One past the last element, [`Position::DETACHED`] when empty.
    pub fn end(&self) -> Position {
        if self.is_empty() {
            Position::DETACHED
        } else {
            Position::new(self.blocks.len() - 1, self.end)
        }
    }

    /// The position after `pos`.
    ///
    /// # Panics
    ///
    /// If `pos` is the end position or names an index past `len()`.
    #[track_caller]
    pub fn next_position(&self, pos: Position) -> Position {
        let (index, pos) = self.resolve(pos);
        assert!(index < self.len, "cannot advance past the end");
        advance(self.blocks.as_slice(), pos)
    }

    /// The position before `pos`.
    ///
    /// # Panics
    ///
    /// If `pos` is the begin position or names an index past `len()`.
    #[track_caller]
    pub fn prev_position(&self, pos: Position) -> Position {
        let (index, pos) = self.resolve(pos);
        assert!(index > 0, "cannot retreat before the beginning");
        retreat(self.blocks.as_slice(), pos)
    }

    /// Logical index of `pos`; `len()` for the end position.
    ///
    /// `(b, capacity of b)` is accepted and names the first index of block
    /// `b + 1`. [`Position::DETACHED`] names index 0.
    ///
    /// # Panics
    ///
    /// If `pos` names an index past `len()` or a block this vector lacks.
    #[track_caller]
    pub fn index_of(&self, pos: Position) -> usize {
        if pos.is_detached() {
            return 0;
        }
        assert!(
            pos.block < self.blocks.len() && pos.offset <= index::block_capacity(pos.block),
            "position {pos:?} does not belong to this vector"
        );
        let idx = index::index_of(pos.block, pos.offset);
        assert!(idx <= self.len, "position {pos:?} is past the end");
        idx
    }

    /// Validate `pos` and return its index with the canonical position for
    /// that index. Only canonical positions may reach the slot helpers.
    #[track_caller]
    pub(crate) fn resolve(&self, pos: Position) -> (usize, Position) {
        let index = self.index_of(pos);
        (index, self.position_of(index))
    }

    /// Position of logical index `index`; the end position for `len()`.
    ///
    /// # Panics
    ///
    /// If `index > len()`.
    #[track_caller]
    pub fn position_of(&self, index: usize) -> Position {
        assert!(index <= self.len, "index {index} is past the end (len {})", self.len);
        if index == self.len {
            return self.end();
        }
        let (block, offset) = index::locate(index);
        Position::new(block, offset)
    }

    /// The element at `pos`, `None` for the end position.
    pub fn get_at(&self, pos: Position) -> Option<&T> {
        let index = self.index_of(pos);
        self.get(index)
    }

    /// Mutable access to the element at `pos`, `None` for the end position.
    pub fn get_at_mut(&mut self, pos: Position) -> Option<&mut T> {
        let index = self.index_of(pos);
        self.get_mut(index)
    }

    /// A read-only cursor at the first element.
    pub fn cursor(&self) -> Cursor<'_, T, A> {
        self.cursor_at(self.begin())
    }

    /// A read-only cursor at `pos`.
    #[track_caller]
    pub fn cursor_at(&self, pos: Position) -> Cursor<'_, T, A> {
        let (_, pos) = self.resolve(pos);
        Cursor { vec: self, pos }
    }

    /// A mutating cursor at the first element.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, T, A> {
        let pos = self.begin();
        CursorMut { vec: self, pos }
    }

    /// A mutating cursor at `pos`.
    #[track_caller]
    pub fn cursor_mut_at(&mut self, pos: Position) -> CursorMut<'_, T, A> {
        let (_, pos) = self.resolve(pos);
        CursorMut { vec: self, pos }
    }
}

/// Read-only bidirectional cursor. Its position is always canonical.
///
/// Two cursors compare equal when they refer to the same vector at the same
/// position, or when both are detached.
pub struct Cursor<'a, T, A: BlockAlloc = Global> {
    vec: &'a StableVec<T, A>,
    pos: Position,
}

impl<'a, T, A: BlockAlloc> Cursor<'a, T, A> {
    /// Current position.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Logical index of the current position.
    pub fn index(&self) -> usize {
        self.vec.index_of(self.pos)
    }

    /// `true` at the end position.
    pub fn is_end(&self) -> bool {
        self.pos == self.vec.end()
    }

    /// The element under the cursor, `None` at the end.
    pub fn current(&self) -> Option<&'a T> {
        if self.is_end() {
            return None;
        }
        // SAFETY: a non-end position of this vector designates a live slot.
        Some(unsafe { &*slot(self.vec.blocks.as_slice(), self.pos) })
    }

    /// Step forward. No effect at the end.
    pub fn move_next(&mut self) {
        if !self.is_end() {
            self.pos = advance(self.vec.blocks.as_slice(), self.pos);
        }
    }

    /// Step back. No effect at the beginning.
    pub fn move_prev(&mut self) {
        if self.pos != self.vec.begin() {
            self.pos = retreat(self.vec.blocks.as_slice(), self.pos);
        }
    }
}

impl<T, A: BlockAlloc> Clone for Cursor<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: BlockAlloc> Copy for Cursor<'_, T, A> {}

impl<T, A: BlockAlloc> PartialEq for Cursor<'_, T, A> {
    fn eq(&self, other: &Self) -> bool {
        if self.pos.is_detached() && other.pos.is_detached() {
            return true;
        }
        ptr::eq(self.vec, other.vec) && self.pos == other.pos
    }
}

impl<T, A: BlockAlloc> Eq for Cursor<'_, T, A> {}

impl<T: fmt::Debug, A: BlockAlloc> fmt::Debug for Cursor<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.pos)
            .field("current", &self.current())
            .finish()
    }
}

/// Mutating bidirectional cursor.
pub struct CursorMut<'a, T, A: BlockAlloc = Global> {
    vec: &'a mut StableVec<T, A>,
    pos: Position,
}

impl<'a, T, A: BlockAlloc> CursorMut<'a, T, A> {
    /// Current position.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Logical index of the current position.
    pub fn index(&self) -> usize {
        self.vec.index_of(self.pos)
    }

    /// `true` at the end position.
    pub fn is_end(&self) -> bool {
        self.pos == self.vec.end()
    }

    /// The element under the cursor, `None` at the end.
    pub fn current(&self) -> Option<&T> {
        self.as_cursor().current()
    }

    /// Mutable access to the element under the cursor, `None` at the end.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        if self.is_end() {
            return None;
        }
        // SAFETY: a non-end position of this vector designates a live slot,
        // and the cursor holds the vector exclusively.
        Some(unsafe { &mut *slot(self.vec.blocks.as_slice(), self.pos) })
    }

    /// Step forward. No effect at the end.
    pub fn move_next(&mut self) {
        if !self.is_end() {
            self.pos = advance(self.vec.blocks.as_slice(), self.pos);
        }
    }

    /// Step back. No effect at the beginning.
    pub fn move_prev(&mut self) {
        if self.pos != self.vec.begin() {
            self.pos = retreat(self.vec.blocks.as_slice(), self.pos);
        }
    }

    /// Remove the element under the cursor, leaving the cursor on the
    /// element that followed it. `None` at the end.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }
        let index = self.vec.index_of(self.pos);
        let removed = self.vec.remove(index);
        self.pos = self.vec.position_of(index);
        Some(removed)
    }

    /// A read-only view at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor {
            vec: &*self.vec,
            pos: self.pos,
        }
    }
}

impl<'a, T, A: BlockAlloc> From<CursorMut<'a, T, A>> for Cursor<'a, T, A> {
    fn from(cursor: CursorMut<'a, T, A>) -> Self {
        Cursor {
            vec: cursor.vec,
            pos: cursor.pos,
        }
    }
}

impl<T: fmt::Debug, A: BlockAlloc> fmt::Debug for CursorMut<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("position", &self.pos)
            .field("current", &self.current())
            .finish()
    }
}
