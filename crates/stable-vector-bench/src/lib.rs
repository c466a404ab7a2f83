//! Shared workloads for the stable-vector benchmarks.
//!
//! - [`SIZES`]: element counts every benchmark is run at
//! - [`Container`]: the operations benchmarked, implemented for `Vec` and
//!   [`StableVec`] so each workload is written once
//! - [`populate`]: fill a container with `0..n`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use stable_vector::StableVec;

/// Element counts from 2 to 65536, growing by a factor of 8 (the last step
/// is clamped to the upper bound).
pub const SIZES: [usize; 7] = [2, 8, 64, 512, 4096, 32_768, 65_536];

/// Operations common to `Vec<usize>` and `StableVec<usize>`.
pub trait Container: Default {
    /// Name used in benchmark ids.
    const NAME: &'static str;

    fn push(&mut self, value: usize);
    fn pop(&mut self) -> Option<usize>;
    fn sum_forward(&self) -> usize;
    fn sum_backward(&self) -> usize;
}

impl Container for Vec<usize> {
    const NAME: &'static str = "vec";

    fn push(&mut self, value: usize) {
        Vec::push(self, value);
    }

    fn pop(&mut self) -> Option<usize> {
        Vec::pop(self)
    }

    fn sum_forward(&self) -> usize {
        self.iter().sum()
    }

    fn sum_backward(&self) -> usize {
        self.iter().rev().sum()
    }
}

impl Container for StableVec<usize> {
    const NAME: &'static str = "stable_vec";

    fn push(&mut self, value: usize) {
        self.push_back(value);
    }

    fn pop(&mut self) -> Option<usize> {
        self.pop_back()
    }

    fn sum_forward(&self) -> usize {
        self.iter().sum()
    }

    fn sum_backward(&self) -> usize {
        self.iter().rev().sum()
    }
}

/// A container holding `0..n`.
pub fn populate<C: Container>(n: usize) -> C {
    let mut c = C::default();
    for i in 0..n {
        c.push(i);
    }
    c
}

/// Pop every element, summing them.
pub fn drain_back<C: Container>(c: &mut C) -> usize {
    let mut sum = 0;
    while let Some(x) = c.pop() {
        sum += x;
    }
    sum
}
