//! Byte string to operation sequence.
//!
//! Each operation starts with a selector byte taken modulo [`OP_KINDS`].
//! Operands follow the selector: an index is 8 little-endian bytes reduced
//! modulo the current length, a count is one byte. Selectors 0 through 7
//! need a non-empty vector or operand bytes; when those are missing the
//! selector falls through to the next kind, and a fall-through past 7 lands
//! on move-assign. Selectors 8 through 12 never fall through.
//!
//! ```text
//!  0 pop_back   1 front   2 back   3 v[] idx   4 v[]=x idx count
//!  5 erase idx  6 erase idx idx    7 push_back count
//!  8 move  9 copy  10 forward  11 backward  12 swap
//! ```
//!
//! Whether a vector is empty depends on what earlier operations did, so the
//! decoder runs the [`Model`] as it goes.

use crate::types::{Model, Op};

/// Number of distinct selectors.
pub const OP_KINDS: u8 = 13;

/// Bytes consumed by an index operand.
pub const INDEX_BYTES: usize = 8;

/// Decode `data` into the operation sequence it drives.
///
/// Never fails: decoding stops when the input is exhausted.
pub fn decode(data: &[u8]) -> Vec<Op> {
    let mut decoder = Decoder {
        input: data,
        model: Model::default(),
    };
    let mut ops = Vec::new();
    while let Some(op) = decoder.next_op() {
        decoder.model.apply(&op);
        ops.push(op);
    }
    ops
}

struct Decoder<'a> {
    input: &'a [u8],
    model: Model,
}

impl Decoder<'_> {
    fn next_op(&mut self) -> Option<Op> {
        let (&byte, rest) = self.input.split_first()?;
        self.input = rest;
        let selector = byte % OP_KINDS;
        let op = match selector {
            0..=7 => (selector..=7)
                .find_map(|kind| self.try_kind(kind))
                .unwrap_or(Op::MoveAssign),
            8 => Op::MoveAssign,
            9 => Op::CopyAssign,
            10 => Op::IterateForward,
            11 => Op::IterateBackward,
            _ => Op::Swap,
        };
        Some(op)
    }

    /// Decode selector `kind` (0..=7), or `None` to fall through.
    fn try_kind(&mut self, kind: u8) -> Option<Op> {
        let len = self.model.primary.len();
        if kind < 7 && len == 0 {
            return None;
        }
        match kind {
            0 => Some(Op::PopBack),
            1 => Some(Op::Front),
            2 => Some(Op::Back),
            3 => self.index(len).map(|index| Op::IndexRead { index }),
            4 => {
                let index = self.index(len)?;
                let count = self.count()?;
                Some(Op::IndexWrite { index, count })
            }
            5 => self.index(len).map(|index| Op::Erase { index }),
            6 => {
                let a = self.index(len);
                let b = self.index(len);
                let (a, b) = (a?, b?);
                Some(Op::EraseRange {
                    first: a.min(b),
                    last: a.max(b),
                })
            }
            _ => self.count().map(|count| Op::PushBack { count }),
        }
    }

    fn index(&mut self, len: usize) -> Option<usize> {
        if self.input.len() < INDEX_BYTES {
            return None;
        }
        let (head, rest) = self.input.split_at(INDEX_BYTES);
        self.input = rest;
        let raw = u64::from_le_bytes(head.try_into().ok()?);
        Some((raw % len as u64) as usize)
    }

    fn count(&mut self) -> Option<u8> {
        let (&count, rest) = self.input.split_first()?;
        self.input = rest;
        Some(count)
    }
}
