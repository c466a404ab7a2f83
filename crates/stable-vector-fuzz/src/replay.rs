//! Drive a pair of `StableVec`s and the [`Model`] in lockstep.

use std::sync::Arc;

use stable_vector::StableVec;

use crate::codec::decode;
use crate::error::{Divergence, DivergenceKind, Side};
use crate::fragile::Fragile;
use crate::types::{Model, Observation, Op};

/// Replays operations on real containers and checks every step against
/// the model: observed values, lengths, element counts, block counts and
/// the number of live elements.
pub struct Replayer {
    primary: StableVec<Fragile>,
    other: StableVec<Fragile>,
    model: Model,
    token: Arc<()>,
    steps: usize,
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replayer {
    /// Two empty vectors and an empty model.
    pub fn new() -> Self {
        Self {
            primary: StableVec::new(),
            other: StableVec::new(),
            model: Model::default(),
            token: Arc::new(()),
            steps: 0,
        }
    }

    /// Steps executed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Elements alive anywhere, according to the shared token.
    pub fn live_elements(&self) -> usize {
        Arc::strong_count(&self.token) - 1
    }

    /// The model state.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Execute one operation and verify the result.
    pub fn step(&mut self, op: &Op) -> Result<(), Divergence> {
        let expected = self.model.apply(op);
        let actual = self.execute(op);
        if expected != actual {
            return Err(self.divergence(Some(*op), DivergenceKind::Observation { expected, actual }));
        }
        self.verify(Some(*op))?;
        self.steps += 1;
        Ok(())
    }

    /// Execute `ops` in order, stopping at the first divergence.
    pub fn run(&mut self, ops: &[Op]) -> Result<(), Divergence> {
        ops.iter().try_for_each(|op| self.step(op))
    }

    fn execute(&mut self, op: &Op) -> Observation {
        let v = &mut self.primary;
        match *op {
            Op::PopBack => Observation::Value(v.pop_back().map(|e| e.count())),
            Op::Front => Observation::Value(v.front().map(Fragile::count)),
            Op::Back => Observation::Value(v.back().map(Fragile::count)),
            Op::IndexRead { index } => Observation::Value(v.get(index).map(Fragile::count)),
            Op::IndexWrite { index, count } => {
                if let Ok(element) = Fragile::try_new(count, &self.token) {
                    if let Some(slot) = v.get_mut(index) {
                        *slot = element;
                    }
                }
                Observation::Nothing
            }
            Op::Erase { index } => {
                if index < v.len() {
                    let pos = v.position_of(index);
                    v.erase(pos);
                }
                Observation::Nothing
            }
            Op::EraseRange { first, last } => {
                if first <= last && last <= v.len() {
                    let (first, last) = (v.position_of(first), v.position_of(last));
                    v.erase_range(first, last);
                }
                Observation::Nothing
            }
            Op::PushBack { count } => {
                let token = &self.token;
                // A zero count is rejected by the constructor; the vector must
                // come out unchanged, which `verify` checks.
                let _ = v.try_emplace_back(|| Fragile::try_new(count, token));
                Observation::Nothing
            }
            Op::MoveAssign => {
                self.other.move_assign_adopting(&mut self.primary);
                Observation::Nothing
            }
            Op::CopyAssign => {
                let _ = self
                    .other
                    .try_clone_from_with(&self.primary, Fragile::try_clone);
                Observation::Nothing
            }
            Op::IterateForward => Observation::Sum(v.iter().map(|e| u64::from(e.count())).sum()),
            Op::IterateBackward => {
                Observation::Sum(v.iter().rev().map(|e| u64::from(e.count())).sum())
            }
            Op::Swap => {
                std::mem::swap(&mut self.primary, &mut self.other);
                Observation::Nothing
            }
        }
    }

    /// Compare both containers with the model.
    pub fn verify(&self, op: Option<Op>) -> Result<(), Divergence> {
        self.verify_side(Side::Primary, &self.primary, &self.model.primary, op)?;
        self.verify_side(Side::Other, &self.other, &self.model.other, op)?;
        let expected = self.primary.len() + self.other.len();
        let actual = self.live_elements();
        if expected != actual {
            return Err(self.divergence(op, DivergenceKind::LiveElements { expected, actual }));
        }
        Ok(())
    }

    fn verify_side(
        &self,
        side: Side,
        vec: &StableVec<Fragile>,
        model: &[u8],
        op: Option<Op>,
    ) -> Result<(), Divergence> {
        if vec.len() != model.len() {
            return Err(self.divergence(
                op,
                DivergenceKind::Length {
                    side,
                    expected: model.len(),
                    actual: vec.len(),
                },
            ));
        }
        for (index, (element, &expected)) in vec.iter().zip(model).enumerate() {
            if element.count() != expected {
                return Err(self.divergence(
                    op,
                    DivergenceKind::Element {
                        side,
                        index,
                        expected,
                        actual: element.count(),
                    },
                ));
            }
        }
        let expected_blocks = (usize::BITS - model.len().leading_zeros()) as usize;
        if vec.block_count() != expected_blocks {
            return Err(self.divergence(
                op,
                DivergenceKind::BlockCount {
                    side,
                    expected: expected_blocks,
                    actual: vec.block_count(),
                },
            ));
        }
        Ok(())
    }

    fn divergence(&self, op: Option<Op>, kind: DivergenceKind) -> Divergence {
        Divergence {
            step: self.steps,
            op,
            kind,
        }
    }
}

/// Decode `data`, replay it, and check that dropping the containers
/// releases every element. Returns the number of operations replayed.
pub fn replay(data: &[u8]) -> Result<usize, Divergence> {
    let ops = decode(data);
    let mut replayer = Replayer::new();
    replayer.run(&ops)?;
    let token = Arc::clone(&replayer.token);
    drop(replayer);
    let leaked = Arc::strong_count(&token) - 1;
    if leaked != 0 {
        return Err(Divergence {
            step: ops.len(),
            op: None,
            kind: DivergenceKind::LiveElements {
                expected: 0,
                actual: leaked,
            },
        });
    }
    Ok(ops.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_push_and_write_change_nothing() {
        let mut r = Replayer::new();
        r.run(&[
            Op::PushBack { count: 3 },
            Op::PushBack { count: 0 },
            Op::IndexWrite { index: 0, count: 0 },
            Op::IndexWrite { index: 0, count: 5 },
        ])
        .unwrap();
        assert_eq!(r.model().primary, vec![5]);
        assert_eq!(r.live_elements(), 1);
    }

    #[test]
    fn copy_assign_with_exhausted_element_keeps_destination() {
        let mut r = Replayer::new();
        r.run(&[
            Op::PushBack { count: 1 },
            Op::CopyAssign,
            Op::Swap,
            Op::CopyAssign,
        ])
        .unwrap();
        assert_eq!(r.model().primary, vec![0]);
        assert_eq!(r.model().other, vec![1]);
    }

    #[test]
    fn move_assign_empties_primary() {
        let mut r = Replayer::new();
        r.run(&[
            Op::PushBack { count: 2 },
            Op::PushBack { count: 4 },
            Op::MoveAssign,
            Op::IterateForward,
        ])
        .unwrap();
        assert!(r.model().primary.is_empty());
        assert_eq!(r.model().other, vec![2, 4]);
    }

    #[test]
    fn replay_counts_operations() {
        assert_eq!(replay(&[7, 1, 7, 2, 10, 11, 0]), Ok(5));
    }
}
