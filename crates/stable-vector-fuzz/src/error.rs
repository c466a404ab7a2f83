//! Error types for fuzz elements and replay.

use std::fmt;

use crate::types::{Observation, Op};

/// Why a [`Fragile`](crate::Fragile) element could not be made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragileError {
    /// Constructed with a zero count.
    Construct,
    /// Copied from an element whose count was already zero.
    Copy,
}

impl fmt::Display for FragileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct => write!(f, "construction with a zero count"),
            Self::Copy => write!(f, "copy of an element with a zero count"),
        }
    }
}

impl std::error::Error for FragileError {}

/// Which of the two replayed vectors a divergence concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The vector operations act on.
    Primary,
    /// The move/copy/swap partner.
    Other,
}

/// What differed between the container and the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DivergenceKind {
    /// The operation observed a different value.
    Observation {
        /// From the model.
        expected: Observation,
        /// From the container.
        actual: Observation,
    },
    /// Element counts differ.
    Length {
        /// Which vector.
        side: Side,
        /// From the model.
        expected: usize,
        /// From the container.
        actual: usize,
    },
    /// An element differs.
    Element {
        /// Which vector.
        side: Side,
        /// Element index.
        index: usize,
        /// From the model.
        expected: u8,
        /// From the container.
        actual: u8,
    },
    /// The container holds more or fewer blocks than its length requires.
    BlockCount {
        /// Which vector.
        side: Side,
        /// Blocks needed for the length.
        expected: usize,
        /// Blocks held.
        actual: usize,
    },
    /// Elements alive outside the two vectors, or missing from them.
    LiveElements {
        /// Elements held by both vectors.
        expected: usize,
        /// Elements alive according to the shared token.
        actual: usize,
    },
}

/// First point at which a replay disagreed with the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    /// Zero-based step; equal to the operation count for end-of-run checks.
    pub step: usize,
    /// The operation at that step, if any.
    pub op: Option<Op>,
    /// What differed.
    pub kind: DivergenceKind,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            Some(op) => write!(f, "divergence at step {} ({op}): ", self.step)?,
            None => write!(f, "divergence after {} steps: ", self.step)?,
        }
        match &self.kind {
            DivergenceKind::Observation { expected, actual } => {
                write!(f, "observed {actual:?}, expected {expected:?}")
            }
            DivergenceKind::Length {
                side,
                expected,
                actual,
            } => write!(f, "{side:?} length {actual}, expected {expected}"),
            DivergenceKind::Element {
                side,
                index,
                expected,
                actual,
            } => write!(f, "{side:?}[{index}] is {actual}, expected {expected}"),
            DivergenceKind::BlockCount {
                side,
                expected,
                actual,
            } => write!(f, "{side:?} holds {actual} blocks, expected {expected}"),
            DivergenceKind::LiveElements { expected, actual } => {
                write!(f, "{actual} elements alive, expected {expected}")
            }
        }
    }
}

impl std::error::Error for Divergence {}
