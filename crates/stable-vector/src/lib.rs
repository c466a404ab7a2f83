//! A growable vector whose elements never move.
//!
//! [`StableVec`] stores elements in a list of blocks whose capacities double:
//! 1, 2, 4, 8, ... Appending allocates a new block only when the last one is
//! full, and existing blocks are never reallocated, so references, pointers
//! and [`Position`]s to live elements survive any amount of growth. Random
//! access stays O(1): the block holding index `i` is the position of the
//! highest set bit of `i + 1`.
//!
//! # Architecture
//!
//! ```text
//! StableVec<T, A>
//! ├── Directory (SmallVec of block descriptors, 8 inline)
//! │   └── Block[i] → 2^i slots from A, never moved
//! ├── len / end (live elements, initialized slots in the tail)
//! └── A: BlockAlloc
//!     ├── Global (process allocator, always equal)
//!     └── pmr::PolymorphicAlloc → Arc<dyn MemoryResource>
//!         ├── NewDeleteResource (default)
//!         └── MonotonicResource (bump arena, MonotonicConfig)
//! ```
//!
//! # Failure safety
//!
//! - A failed append ([`StableVec::try_emplace_back`], or a panic inside
//!   [`StableVec::emplace_back`]) releases any block allocated for it and
//!   leaves the vector as it was.
//! - Assignment ([`Clone::clone_from`]) builds the copy on the side and
//!   publishes it only once complete.
//! - Moves between unequal allocators ([`StableVec::move_in`]) either move
//!   every element or none.
//!
//! ```
//! use stable_vector::stable_vec;
//!
//! let mut v = stable_vec![1, 2, 3];
//! let two: *const i32 = &v[1];
//! v.extend(4..1000);
//! assert_eq!(two, &v[1] as *const i32);
//! assert_eq!(v.iter().rev().next(), Some(&999));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
mod logging;

pub mod alloc;
mod block;
pub mod config;
pub mod cursor;
mod erase;
pub mod error;
pub mod index;
pub mod iter;
mod ownership;
pub mod pmr;
mod vector;

// Public re-exports for the primary API surface.
pub use alloc::{AlwaysEqual, BlockAlloc, Global};
pub use config::MonotonicConfig;
pub use cursor::{Cursor, CursorMut, Position};
pub use error::{AllocError, ConfigError, EmplaceError};
pub use iter::{IntoIter, Iter, IterMut};
pub use vector::StableVec;

/// Create a [`StableVec`] on the global allocator from a list of elements.
///
/// ```
/// use stable_vector::stable_vec;
///
/// let v = stable_vec!["a", "b"];
/// assert_eq!(v, ["a", "b"]);
/// let empty: stable_vector::StableVec<u8> = stable_vec![];
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! stable_vec {
    () => {
        $crate::StableVec::new()
    };
    ($($item:expr),+ $(,)?) => {
        <$crate::StableVec<_>>::from([$($item),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_builds_in_order() {
        let v = stable_vec![3, 1, 4, 1, 5];
        assert_eq!(v, [3, 1, 4, 1, 5]);
        assert_eq!(v.allocator(), &Global);
    }

    #[test]
    fn scenario_erase_three_from_ten() {
        let mut v: StableVec<i32> = (0..10).collect();
        let pos = v.position_of(3);
        let next = v.erase(pos);
        assert_eq!(v, [0, 1, 2, 4, 5, 6, 7, 8, 9]);
        assert_eq!(v.get_at(next), Some(&4));
    }

    #[test]
    fn scenario_push_thirty_two_then_drain() {
        let mut v = StableVec::new();
        for i in 0..32 {
            v.push_back(i);
        }
        let mut observed = Vec::new();
        for _ in 0..32 {
            observed.push(*v.back().unwrap());
            v.pop_back();
        }
        assert_eq!(observed, (0..32).rev().collect::<Vec<_>>());
        assert_eq!(v.begin(), v.end());
    }

    #[test]
    fn scenario_degenerate_erase_ranges() {
        let mut v: StableVec<i32> = (0..5).collect();
        let end = v.end();
        assert_eq!(v.erase_range(end, end), v.end());
        let begin = v.begin();
        assert_eq!(v.erase_range(begin, begin), v.begin());
        assert_eq!(v, [0, 1, 2, 3, 4]);
        let next = v.erase_range(v.begin(), v.end());
        assert!(v.is_empty());
        assert_eq!(next, v.end());
    }

    #[test]
    fn vector_is_send_and_sync_for_plain_data() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StableVec<u64>>();
        assert_send_sync::<pmr::StableVec<String>>();
        assert_send_sync::<Iter<'static, u8>>();
    }
}
