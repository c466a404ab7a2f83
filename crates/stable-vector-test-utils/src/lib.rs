//! Test utilities for stable-vector development.
//!
//! Provides element fixtures ([`PanicOnClone`], [`Counted`]) for exercising
//! failure paths and leak accounting, and instrumented allocators
//! ([`TrackingAlloc`], [`TrackingResource`]) for checking block ownership
//! and injecting allocation failures.

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod tracking;

pub use fixtures::{CloneBudget, Counted, DropCounter, PanicOnClone};
pub use tracking::{Tracker, TrackingAlloc, TrackingResource};
