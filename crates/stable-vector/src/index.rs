//! Logical index to (block, offset) mapping.
//!
//! Block `b` holds `2^b` slots and covers logical indices
//! `[2^b - 1, 2^(b+1) - 2]`:
//!
//! ```text
//!                 14
//!                 13
//!                 12
//!                 11
//!             6   10
//!             5    9
//!         2   4    8
//!     0   1   3    7
//!    b0  b1  b2   b3
//! ```
//!
//! Adding one to the index turns the block id into the position of the
//! highest set bit, so the mapping needs no search and no per-block prefix
//! sums.

/// Map a logical index to `(block, offset)`.
///
/// Valid for every `index < usize::MAX`.
#[inline]
pub const fn locate(index: usize) -> (usize, usize) {
    let biased = index + 1;
    let block = biased.ilog2() as usize;
    (block, biased ^ (1 << block))
}

/// Inverse of [`locate`].
#[inline]
pub const fn index_of(block: usize, offset: usize) -> usize {
    (1 << block) - 1 + offset
}

/// Number of slots in block `block`.
#[inline]
pub const fn block_capacity(block: usize) -> usize {
    1 << block
}

/// Total slots held by the first `block_count` blocks.
#[inline]
pub const fn capacity_of(block_count: usize) -> usize {
    if block_count == 0 {
        0
    } else {
        usize::MAX >> (usize::BITS as usize - block_count)
    }
}
