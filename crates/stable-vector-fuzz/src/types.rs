//! Operations, observations and the reference model.

use std::fmt;

/// One container operation decoded from fuzz input.
///
/// Indices are already reduced modulo the length of the primary vector at
/// the point the operation is decoded, so every operation in a decoded
/// sequence is valid when replayed in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Remove the last element of the primary vector.
    PopBack,
    /// Read the first element.
    Front,
    /// Read the last element.
    Back,
    /// Read the element at `index`.
    IndexRead {
        /// Element index.
        index: usize,
    },
    /// Replace the element at `index` with a freshly constructed one.
    IndexWrite {
        /// Element index.
        index: usize,
        /// Constructor argument; zero makes construction fail.
        count: u8,
    },
    /// Erase the element at `index`.
    Erase {
        /// Element index.
        index: usize,
    },
    /// Erase `[first, last)`.
    EraseRange {
        /// First erased index.
        first: usize,
        /// One past the last erased index.
        last: usize,
    },
    /// Append a freshly constructed element.
    PushBack {
        /// Constructor argument; zero makes construction fail.
        count: u8,
    },
    /// Move the primary vector into the secondary one.
    MoveAssign,
    /// Copy the primary vector into the secondary one.
    CopyAssign,
    /// Sum element counts front to back.
    IterateForward,
    /// Sum element counts back to front.
    IterateBackward,
    /// Exchange the two vectors.
    Swap,
}

impl Op {
    /// Short name for logs and divergence reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PopBack => "pop_back",
            Self::Front => "front",
            Self::Back => "back",
            Self::IndexRead { .. } => "v[]",
            Self::IndexWrite { .. } => "v[]=x",
            Self::Erase { .. } => "erase i",
            Self::EraseRange { .. } => "erase b,e",
            Self::PushBack { .. } => "push_back",
            Self::MoveAssign => "move assign",
            Self::CopyAssign => "copy assign",
            Self::IterateForward => "iterate forward",
            Self::IterateBackward => "iterate backward",
            Self::Swap => "swap",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::IndexRead { index } | Self::Erase { index } => {
                write!(f, "{} @{index}", self.name())
            }
            Self::IndexWrite { index, count } => write!(f, "{} @{index} <- {count}", self.name()),
            Self::EraseRange { first, last } => write!(f, "{} [{first}, {last})", self.name()),
            Self::PushBack { count } => write!(f, "{} {count}", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// What an operation let the caller see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// The operation returns nothing.
    Nothing,
    /// An element's count, or `None` if there was no element.
    Value(Option<u8>),
    /// Sum of counts over an iteration.
    Sum(u64),
}

/// Reference semantics on plain `Vec<u8>` element counts.
///
/// Construction with count zero fails. A copy has its source's count minus
/// one and fails if the source count is zero; a failed copy-assignment
/// leaves the destination untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    /// The primary vector.
    pub primary: Vec<u8>,
    /// The secondary vector (target of move and copy assignment).
    pub other: Vec<u8>,
}

impl Model {
    /// Apply `op` and report what it observed.
    pub fn apply(&mut self, op: &Op) -> Observation {
        match *op {
            Op::PopBack => Observation::Value(self.primary.pop()),
            Op::Front => Observation::Value(self.primary.first().copied()),
            Op::Back => Observation::Value(self.primary.last().copied()),
            Op::IndexRead { index } => Observation::Value(self.primary.get(index).copied()),
            Op::IndexWrite { index, count } => {
                if count != 0 {
                    if let Some(slot) = self.primary.get_mut(index) {
                        *slot = count;
                    }
                }
                Observation::Nothing
            }
            Op::Erase { index } => {
                if index < self.primary.len() {
                    self.primary.remove(index);
                }
                Observation::Nothing
            }
            Op::EraseRange { first, last } => {
                if first <= last && last <= self.primary.len() {
                    self.primary.drain(first..last);
                }
                Observation::Nothing
            }
            Op::PushBack { count } => {
                if count != 0 {
                    self.primary.push(count);
                }
                Observation::Nothing
            }
            Op::MoveAssign => {
                self.other = std::mem::take(&mut self.primary);
                Observation::Nothing
            }
            Op::CopyAssign => {
                if self.primary.iter().all(|&c| c != 0) {
                    self.other = self.primary.iter().map(|&c| c - 1).collect();
                }
                Observation::Nothing
            }
            Op::IterateForward | Op::IterateBackward => {
                Observation::Sum(self.primary.iter().map(|&c| u64::from(c)).sum())
            }
            Op::Swap => {
                std::mem::swap(&mut self.primary, &mut self.other);
                Observation::Nothing
            }
        }
    }
}
