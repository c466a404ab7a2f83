//! Copying, moving and bulk construction.
//!
//! Copies are built into a fresh vector and only then published, so a
//! failed or panicking element clone leaves the destination untouched.
//! Moves adopt the source's blocks whenever the two allocators can release
//! each other's storage, and fall back to element-wise transfer otherwise.

use std::convert::Infallible;
use std::mem;
use std::ptr;

use crate::alloc::{AlwaysEqual, BlockAlloc};
use crate::error::{AllocError, EmplaceError};
use crate::vector::StableVec;

impl<T, A: BlockAlloc> StableVec<T, A> {
    /// Copy every element with `clone` into a new vector on
    /// `self.allocator().select_on_copy()`.
    ///
    /// If `clone` fails or panics, the partial copy is dropped and `self` is
    /// untouched.
    pub fn try_clone_with<E, F>(&self, mut clone: F) -> Result<Self, EmplaceError<E>>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        let mut copy = Self::new_in(self.alloc.select_on_copy());
        for item in self {
            copy.try_emplace_back(|| clone(item))?;
        }
        Ok(copy)
    }

    /// Replace the contents of `self` with copies of `source` made by
    /// `clone`, keeping `self`'s allocator.
    ///
    /// Strong guarantee: the copy is built on the side and swapped in only
    /// once complete, so on error `self` is unchanged.
    pub fn try_clone_from_with<E, F>(&mut self, source: &Self, mut clone: F) -> Result<(), EmplaceError<E>>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        let mut fresh = Self::new_in(self.alloc.clone());
        for item in source {
            fresh.try_emplace_back(|| clone(item))?;
        }
        self.swap_storage(&mut fresh);
        Ok(())
    }

    /// Build a vector on `alloc` that takes over the contents of `src`,
    /// leaving `src` empty.
    ///
    /// Blocks are adopted when the allocators compare equal. Otherwise the
    /// elements are moved one by one into blocks from `alloc`; if that runs
    /// out of memory, `src` is left exactly as it was.
    pub fn move_in(src: &mut Self, alloc: A) -> Result<Self, AllocError> {
        let mut dst = Self::new_in(alloc);
        if A::ALWAYS_EQUAL || dst.alloc == src.alloc {
            dst.adopt(src);
            return Ok(dst);
        }
        debug!("allocators differ, moving {} elements one by one", src.len);
        for item in src.iter() {
            if let Err(e) = dst.reserve_slot() {
                // SAFETY: dst only holds bitwise duplicates that src still owns.
                unsafe { dst.forget_elements() };
                return Err(e);
            }
            // SAFETY: a free slot was reserved above. The duplicate's
            // ownership is settled once every element has been moved.
            unsafe { dst.write_slot(ptr::read(item)) };
        }
        // SAFETY: every element is now owned by dst.
        unsafe { src.forget_elements() };
        Ok(dst)
    }

    /// Move-assign from `src`.
    ///
    /// Adopts `src`'s blocks when the allocators compare equal, leaving
    /// `src` empty. Otherwise falls back to [`clone_from`](Clone::clone_from),
    /// leaving `src` unchanged.
    pub fn move_assign(&mut self, src: &mut Self)
    where
        T: Clone,
    {
        if A::ALWAYS_EQUAL || self.alloc == src.alloc {
            self.adopt(src);
        } else {
            debug!("allocators differ, move-assign falls back to copying {} elements", src.len);
            self.clone_from(src);
        }
    }

    /// Move-assign from `src` for allocators whose instances are always
    /// interchangeable. Never copies; `src` is left empty.
    pub fn move_assign_adopting(&mut self, src: &mut Self)
    where
        A: AlwaysEqual,
    {
        self.adopt(src);
    }

    /// Drop own contents and take `src`'s blocks.
    ///
    /// The allocators must compare equal.
    fn adopt(&mut self, src: &mut Self) {
        self.clear();
        self.swap_storage(src);
    }

    fn swap_storage(&mut self, other: &mut Self) {
        mem::swap(&mut self.blocks, &mut other.blocks);
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.end, &mut other.end);
    }

    /// Build a vector on `alloc` from any sequence convertible into `T`.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Self
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        let mut v = Self::new_in(alloc);
        v.extend_from(iter);
        v
    }

    /// Build a vector on `alloc` from fallible element results, stopping at
    /// the first error.
    pub fn try_from_iter_in<E, I>(iter: I, alloc: A) -> Result<Self, EmplaceError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let mut v = Self::new_in(alloc);
        for item in iter {
            v.try_emplace_back(|| item)?;
        }
        Ok(v)
    }

    fn extend_from<I>(&mut self, iter: I)
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        for item in iter {
            self.emplace_back(|| item.into());
        }
    }
}

impl<T: Clone, A: BlockAlloc> Clone for StableVec<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone_with(|item| Ok::<T, Infallible>(item.clone())) {
            Ok(copy) => copy,
            Err(e) => e.handle(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(e) = self.try_clone_from_with(source, |item| Ok::<T, Infallible>(item.clone())) {
            e.handle();
        }
    }
}

impl<T, A: BlockAlloc + Default> FromIterator<T> for StableVec<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, A::default())
    }
}

impl<T, A: BlockAlloc> Extend<T> for StableVec<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.extend_from(iter);
    }
}

impl<'a, T: Copy + 'a, A: BlockAlloc> Extend<&'a T> for StableVec<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend_from(iter.into_iter().copied());
    }
}

impl<T, A: BlockAlloc + Default, const N: usize> From<[T; N]> for StableVec<T, A> {
    fn from(items: [T; N]) -> Self {
        Self::from_iter_in(items, A::default())
    }
}

impl<T: Clone, A: BlockAlloc + Default> From<&[T]> for StableVec<T, A> {
    fn from(items: &[T]) -> Self {
        Self::from_iter_in(items.iter().cloned(), A::default())
    }
}

impl<T, A: BlockAlloc + Default> From<Vec<T>> for StableVec<T, A> {
    fn from(items: Vec<T>) -> Self {
        Self::from_iter_in(items, A::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Global;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    /// Clone panics once the shared budget runs out.
    #[derive(Debug, PartialEq)]
    struct Budgeted {
        value: i32,
        budget: Rc<Cell<usize>>,
    }

    impl Clone for Budgeted {
        fn clone(&self) -> Self {
            let left = self.budget.get();
            if left == 0 {
                panic!("clone budget exhausted");
            }
            self.budget.set(left - 1);
            Self {
                value: self.value,
                budget: self.budget.clone(),
            }
        }
    }

    fn budgeted(n: i32, budget: &Rc<Cell<usize>>) -> StableVec<Budgeted> {
        (0..n)
            .map(|value| Budgeted {
                value,
                budget: budget.clone(),
            })
            .collect()
    }

    #[test]
    fn clone_copies_values_into_fresh_storage() {
        let a: StableVec<String> = StableVec::from(["x".to_string(), "y".to_string()]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(&a[0] as *const String, &b[0] as *const String);
    }

    #[test]
    fn panicking_clone_from_keeps_destination() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let source = budgeted(10, &budget);
        let mut dest = budgeted(3, &budget);
        budget.set(5);
        let result = catch_unwind(AssertUnwindSafe(|| dest.clone_from(&source)));
        assert!(result.is_err());
        assert_eq!(dest.len(), 3);
        assert!(dest.iter().map(|b| b.value).eq(0..3));
        budget.set(usize::MAX);
        dest.clone_from(&source);
        assert_eq!(dest, source);
    }

    #[test]
    fn failed_clone_with_reports_the_element_error() {
        let v: StableVec<i32> = (0..8).collect();
        let err = v
            .try_clone_with(|&x| if x == 5 { Err(x) } else { Ok(x) })
            .unwrap_err();
        assert_eq!(err.into_construct(), Some(5));
    }

    #[test]
    fn move_in_with_global_adopts_blocks() {
        let mut src: StableVec<u64> = (0..50).collect();
        let first = &src[0] as *const u64;
        let dst = StableVec::move_in(&mut src, Global).unwrap();
        assert!(src.is_empty());
        assert_eq!(src.block_count(), 0);
        assert_eq!(&dst[0] as *const u64, first);
        assert!(dst.iter().copied().eq(0..50));
    }

    #[test]
    fn move_assign_releases_old_contents() {
        let mut a: StableVec<String> = ["old"].iter().map(|s| s.to_string()).collect();
        let mut b: StableVec<String> = ["new", "er"].iter().map(|s| s.to_string()).collect();
        a.move_assign(&mut b);
        assert_eq!(a, ["new", "er"]);
        assert!(b.is_empty());
        a.move_assign_adopting(&mut b);
        assert!(a.is_empty());
    }

    #[test]
    fn try_from_iter_stops_at_first_error() {
        let items = vec![Ok(1), Ok(2), Err("bad"), Ok(4)];
        let err = StableVec::try_from_iter_in(items, Global).unwrap_err();
        assert_eq!(err, EmplaceError::Construct("bad"));
        let ok: StableVec<i32> = StableVec::try_from_iter_in(vec![Ok::<_, ()>(1), Ok(2)], Global).unwrap();
        assert_eq!(ok, [1, 2]);
    }

    #[test]
    fn from_iter_in_converts_items() {
        let v: StableVec<i64> = StableVec::from_iter_in([1i32, 2, 3], Global);
        assert_eq!(v, [1i64, 2, 3]);
    }

    #[test]
    fn extend_appends_owned_and_copied() {
        let mut v: StableVec<u8> = StableVec::from(vec![1, 2]);
        v.extend([3, 4]);
        v.extend(&[5, 6]);
        let slice: &[u8] = &[7];
        v.extend(<StableVec<u8>>::from(slice));
        assert_eq!(v, [1, 2, 3, 4, 5, 6, 7]);
    }
}
