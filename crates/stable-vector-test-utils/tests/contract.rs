//! Behavioural contract of `StableVec`: ordering, address stability,
//! copy/move semantics and failure safety.

use std::panic::{catch_unwind, AssertUnwindSafe};

use stable_vector::{stable_vec, StableVec};
use stable_vector_test_utils::{CloneBudget, DropCounter, PanicOnClone, TrackingAlloc};

fn pushed(n: i32) -> StableVec<i32> {
    let mut v = StableVec::new();
    for i in 0..n {
        v.push_back(i);
    }
    v
}

fn addresses<T, A: stable_vector::BlockAlloc>(v: &StableVec<T, A>) -> Vec<*const T> {
    v.iter().map(|x| x as *const T).collect()
}

#[test]
fn default_vector_is_empty() {
    let v: StableVec<i32> = StableVec::default();
    assert!(v.is_empty());
    assert_eq!(v.len(), 0);
    assert_eq!(v.begin(), v.end());
}

#[test]
fn forward_iteration_visits_indexed_slots() {
    let mut v = pushed(32);
    for (i, elem) in v.iter().enumerate() {
        assert!(std::ptr::eq(elem, &v[i]));
    }
    for elem in v.iter_mut() {
        *elem += 1;
    }
    assert!(v.iter().copied().eq(1..33));
}

#[test]
fn backward_iteration_visits_indexed_slots() {
    let v = pushed(32);
    let mut i = 32;
    for elem in v.iter().rev() {
        i -= 1;
        assert!(std::ptr::eq(elem, &v[i]));
    }
    assert_eq!(i, 0);
}

#[test]
fn clone_has_equal_values_at_new_addresses() {
    let orig = pushed(32);
    let copy = orig.clone();
    assert_eq!(orig.len(), copy.len());
    for (a, b) in orig.iter().zip(copy.iter()) {
        assert_eq!(a, b);
        assert!(!std::ptr::eq(a, b));
    }
}

#[test]
fn clone_from_replaces_longer_destination() {
    let orig = pushed(32);
    let mut copy: StableVec<i32> = (0..33).map(|i| -i).collect();
    copy.clone_from(&orig);
    assert_eq!(copy, orig);
    for (a, b) in orig.iter().zip(copy.iter()) {
        assert!(!std::ptr::eq(a, b));
    }
}

#[test]
fn move_keeps_addresses_and_empties_source() {
    let mut source = pushed(32);
    let before = addresses(&source);
    let dest = std::mem::take(&mut source);
    assert!(source.is_empty());
    assert_eq!(source.begin(), source.end());
    assert_eq!(addresses(&dest), before);
}

#[test]
fn move_assign_keeps_addresses_and_empties_source() {
    let mut source = pushed(32);
    let mut dest: StableVec<i32> = (0..33).map(|i| -i).collect();
    let before = addresses(&source);
    dest.move_assign(&mut source);
    assert_eq!(dest.len(), 32);
    assert!(source.is_empty());
    assert_eq!(source.begin(), source.end());
    assert_eq!(addresses(&dest), before);
}

#[test]
fn panicking_clone_leaks_nothing() {
    for n in 1..20u64 {
        for k in 0..n {
            let budget = CloneBudget::unlimited();
            let alloc = TrackingAlloc::new();
            let mut src = StableVec::new_in(alloc.clone());
            for value in 0..n {
                src.push_back(PanicOnClone::new(value, &budget));
            }
            let blocks = alloc.tracker().live_blocks();
            budget.set(k as usize);
            let result = catch_unwind(AssertUnwindSafe(|| src.clone()));
            assert!(result.is_err(), "clone of {n} with budget {k} succeeded");
            assert_eq!(alloc.tracker().live_blocks(), blocks);
        }
    }
}

#[test]
fn panicking_clone_from_leaves_both_sides_unchanged() {
    let budget = CloneBudget::unlimited();
    let mut src = StableVec::new();
    let mut dest = StableVec::new();
    for value in [0, 0, 99, 0] {
        src.push_back(PanicOnClone::new(value, &budget));
    }
    for value in 1..=4 {
        dest.push_back(PanicOnClone::new(value, &budget));
    }
    let dest_addrs = addresses(&dest);
    let src_addrs = addresses(&src);
    budget.set(2);
    let result = catch_unwind(AssertUnwindSafe(|| dest.clone_from(&src)));
    assert!(result.is_err());
    assert!(dest.iter().map(|e| e.value).eq(1..=4));
    assert!(src.iter().map(|e| e.value).eq([0, 0, 99, 0]));
    assert_eq!(addresses(&dest), dest_addrs);
    assert_eq!(addresses(&src), src_addrs);
}

#[test]
fn panicking_range_construction_drops_the_prefix() {
    let counter = DropCounter::new();
    let result = catch_unwind(AssertUnwindSafe(|| {
        let items = (0..7).map(|i| {
            if i == 5 {
                panic!("element {i} failed");
            }
            counter.track(i)
        });
        StableVec::<stable_vector_test_utils::Counted>::from_iter_in(items, stable_vector::Global)
    }));
    assert!(result.is_err());
    assert_eq!(counter.created(), 5);
    assert_eq!(counter.live(), 0);
}

#[test]
fn panicking_emplace_keeps_prefix_for_every_length() {
    for prefix in 0..32u64 {
        let counter = DropCounter::new();
        let alloc = TrackingAlloc::new();
        let mut v = StableVec::new_in(alloc.clone());
        for j in 0..prefix {
            v.push_back(counter.track(j));
        }
        let blocks = alloc.tracker().live_blocks();
        let result = catch_unwind(AssertUnwindSafe(|| {
            v.emplace_back(|| panic!("constructor failed"));
        }));
        assert!(result.is_err());
        assert_eq!(v.len() as u64, prefix);
        assert_eq!(alloc.tracker().live_blocks(), blocks);
        assert!(v.iter().map(|c| c.value).eq(0..prefix));
        drop(v);
        assert_eq!(counter.live(), 0);
        assert_eq!(alloc.tracker().live_blocks(), 0);
    }
}

#[test]
fn conversion_from_compatible_range() {
    let src = [1u8, 2, 3, 4, 5, 6];
    let v: StableVec<u32> = StableVec::from_iter_in(src, stable_vector::Global);
    assert_eq!(v, [1u32, 2, 3, 4, 5, 6]);
}

#[test]
fn erase_moves_owned_elements_down() {
    let mut v: StableVec<Box<i32>> = StableVec::new();
    for i in 0..10 {
        v.push_back(Box::new(i));
    }
    let mut pos = v.begin();
    while **v.get_at(pos).unwrap() != 3 {
        pos = v.next_position(pos);
    }
    let next = v.erase(pos);
    assert_eq!(**v.get_at(next).unwrap(), 4);
    assert_eq!(v.len(), 9);
    assert!(v.iter().map(|b| **b).eq([0, 1, 2, 4, 5, 6, 7, 8, 9]));
}

#[test]
fn erase_at_end_and_before_end() {
    let mut v: StableVec<Box<i32>> = (0..10).map(Box::new).collect();
    let end = v.end();
    assert_eq!(v.erase(end), v.end());
    assert_eq!(v.len(), 10);

    let last = v.prev_position(v.end());
    let next = v.erase(last);
    assert_eq!(next, v.end());
    assert!(v.iter().map(|b| **b).eq(0..9));
}

#[test]
fn pop_back_observes_values_in_reverse() {
    let mut v = pushed(32);
    let mut i = 31;
    while !v.is_empty() {
        assert_eq!(v.back(), Some(&i));
        v.pop_back();
        i -= 1;
    }
}

#[test]
fn dropping_releases_every_block_and_element() {
    let counter = DropCounter::new();
    let alloc = TrackingAlloc::new();
    let mut v = StableVec::new_in(alloc.clone());
    for i in 0..1000 {
        v.push_back(counter.track(i));
    }
    let range_start = v.position_of(100);
    let range_end = v.position_of(900);
    v.erase_range(range_start, range_end);
    v.remove(50);
    let copy = v.clone();
    drop(v);
    drop(copy);
    assert_eq!(counter.live(), 0);
    assert_eq!(alloc.tracker().live_blocks(), 0);
    assert_eq!(alloc.tracker().live_bytes(), 0);
}

#[test]
fn macro_and_conversions_agree() {
    let from_macro = stable_vec![1, 2, 3];
    let from_vec: StableVec<i32> = vec![1, 2, 3].into();
    let from_slice: StableVec<i32> = (&[1, 2, 3][..]).into();
    assert_eq!(from_macro, from_vec);
    assert_eq!(from_vec, from_slice);
}
