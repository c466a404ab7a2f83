//! Replays of arbitrary and pseudo-random byte strings never diverge from
//! the model.

use proptest::prelude::*;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stable_vector_fuzz::{decode, replay, Op, Replayer};

/// Bytes that push `n` elements with count `count`.
fn pushes(n: usize, count: u8) -> Vec<u8> {
    (0..n).flat_map(|_| [7, count]).collect()
}

#[test]
fn long_push_then_drain_sequence() {
    let mut data = pushes(300, 2);
    data.extend(std::iter::repeat_n(0, 300));
    assert_eq!(replay(&data), Ok(600));
}

#[test]
fn range_erase_across_many_blocks() {
    let mut data = pushes(100, 9);
    data.push(6);
    data.extend_from_slice(&5u64.to_le_bytes());
    data.extend_from_slice(&90u64.to_le_bytes());
    data.extend([10, 11]);
    let ops = decode(&data);
    assert_eq!(ops[100], Op::EraseRange { first: 5, last: 90 });
    assert_eq!(replay(&data), Ok(ops.len()));
}

#[test]
fn copies_wear_elements_down_until_copy_fails() {
    // push 3, then copy + swap repeatedly: counts go 3, 2, 1, 0, then the
    // copy fails and the partner keeps its previous contents.
    let mut data = pushes(5, 3);
    for _ in 0..6 {
        data.extend([9, 12]);
    }
    let mut replayer = Replayer::new();
    replayer.run(&decode(&data)).unwrap();
    assert_eq!(replayer.live_elements(), 10);
    assert_eq!(replay(&data), Ok(5 + 12));
}

#[test]
fn seeded_soak() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x57AB_1E);
    for round in 0..200 {
        let len = (rng.next_u32() % 4096) as usize;
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        if let Err(divergence) = replay(&data) {
            panic!("round {round}: {divergence}");
        }
    }
}

#[test]
fn push_biased_soak_grows_large_vectors() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..20 {
        let mut data = Vec::new();
        for _ in 0..2000 {
            let roll = rng.next_u32();
            if roll % 4 == 0 {
                let mut tail = [0u8; 9];
                rng.fill_bytes(&mut tail);
                data.extend_from_slice(&tail);
            } else {
                data.extend([7, (roll >> 8) as u8 | 1]);
            }
        }
        replay(&data).unwrap();
    }
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_diverge(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let ops = decode(&data);
        prop_assert_eq!(replay(&data), Ok(ops.len()));
    }

    #[test]
    fn decoded_indices_are_in_range(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
        let mut replayer = Replayer::new();
        for op in decode(&data) {
            let len = replayer.model().primary.len();
            match op {
                Op::IndexRead { index } | Op::IndexWrite { index, .. } | Op::Erase { index } => {
                    prop_assert!(index < len);
                }
                Op::EraseRange { first, last } => {
                    prop_assert!(first <= last && last < len);
                }
                _ => {}
            }
            prop_assert!(replayer.step(&op).is_ok());
        }
    }
}
