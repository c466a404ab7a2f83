//! Element types that count, fail or panic on demand.
//!
//! - [`PanicOnClone`]: clones panic once a shared [`CloneBudget`] runs out.
//! - [`Counted`]: tracked by a [`DropCounter`], which reports leaks and
//!   double drops.

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared number of clones allowed before [`PanicOnClone`] panics.
#[derive(Clone, Debug)]
pub struct CloneBudget {
    remaining: Arc<AtomicUsize>,
}

impl CloneBudget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// A budget of `clones` clones.
    pub fn new(clones: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(clones)),
        }
    }

    /// Allow exactly `clones` more clones; the next one panics.
    pub fn set(&self, clones: usize) {
        self.remaining.store(clones, Ordering::SeqCst);
    }

    /// Clones left before the next one panics.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    fn spend(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                if left == usize::MAX {
                    Some(left)
                } else {
                    left.checked_sub(1)
                }
            })
            .is_ok()
    }
}

/// A value whose `Clone` panics when its [`CloneBudget`] is spent.
#[derive(Debug)]
pub struct PanicOnClone {
    /// Payload, copied by `clone`.
    pub value: u64,
    budget: CloneBudget,
}

impl PanicOnClone {
    /// A value drawing on `budget` whenever it is cloned.
    pub fn new(value: u64, budget: &CloneBudget) -> Self {
        Self {
            value,
            budget: budget.clone(),
        }
    }
}

impl Clone for PanicOnClone {
    fn clone(&self) -> Self {
        if !self.budget.spend() {
            panic!("clone budget exhausted while cloning {}", self.value);
        }
        Self {
            value: self.value,
            budget: self.budget.clone(),
        }
    }
}

impl PartialEq for PanicOnClone {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Counts [`Counted`] instances created and dropped.
#[derive(Clone, Debug, Default)]
pub struct DropCounter {
    inner: Arc<Counts>,
}

#[derive(Debug, Default)]
struct Counts {
    created: AtomicUsize,
    dropped: AtomicUsize,
    live: AtomicIsize,
}

impl DropCounter {
    /// A counter with nothing tracked yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `value` in a tracked element.
    pub fn track(&self, value: u64) -> Counted {
        self.inner.created.fetch_add(1, Ordering::SeqCst);
        self.inner.live.fetch_add(1, Ordering::SeqCst);
        Counted {
            value,
            counter: self.clone(),
        }
    }

    /// Instances created, clones included.
    pub fn created(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    /// Instances dropped.
    pub fn dropped(&self) -> usize {
        self.inner.dropped.load(Ordering::SeqCst)
    }

    /// Instances created but not yet dropped. Negative after a double drop.
    pub fn live(&self) -> isize {
        self.inner.live.load(Ordering::SeqCst)
    }
}

/// An element registered with a [`DropCounter`]. Clones are counted too.
#[derive(Debug)]
pub struct Counted {
    /// Payload.
    pub value: u64,
    counter: DropCounter,
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        self.counter.track(self.value)
    }
}

impl PartialEq for Counted {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.counter.inner.dropped.fetch_add(1, Ordering::SeqCst);
        self.counter.inner.live.fetch_sub(1, Ordering::SeqCst);
    }
}
