//! Byte-driven operation replay for `stable-vector`.
//!
//! Turns arbitrary byte strings into container operation sequences and
//! replays them against a pair of [`StableVec`](stable_vector::StableVec)s
//! and a plain `Vec` model, reporting the first divergence.
//!
//! # Architecture
//!
//! - [`decode`] turns bytes into [`Op`]s, tracking the [`Model`] as it goes
//! - [`Replayer`] executes ops on real containers of [`Fragile`] elements
//!   and cross-checks each step against the model
//! - [`replay`] does both and checks that no element outlives the run
//!
//! Elements fail on demand (construction or copy with a zero count), so
//! the decoded sequences exercise the all-or-nothing failure paths of
//! append, element replacement and copy-assignment.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod fragile;
pub mod replay;
pub mod types;

pub use codec::{decode, OP_KINDS};
pub use error::{Divergence, DivergenceKind, FragileError, Side};
pub use fragile::Fragile;
pub use replay::{replay, Replayer};
pub use types::{Model, Observation, Op};
