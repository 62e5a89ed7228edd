//! AIR proving knowledge of attribute limbs whose Poseidon2 sponge digest is
//! the public commitment.
//!
//! Each row holds the whole absorb chain: [`COMMITMENT_NUM_PERMS`] vectorized
//! permutations. The limbs are private trace cells; only the 8-element digest
//! is public. Every row carries the same chain, so all constraints are
//! unconditional.

use core::borrow::Borrow;

use p3_air::{Air, AirBuilder, AirBuilderWithPublicValues, BaseAir, BaseAirWithPublicValues};
use p3_baby_bear::{
    default_babybear_poseidon2_16, BabyBear, GenericPoseidon2LinearLayersBabyBear,
    BABYBEAR_RC16_EXTERNAL_FINAL, BABYBEAR_RC16_EXTERNAL_INITIAL, BABYBEAR_RC16_INTERNAL,
};
use p3_field::PrimeCharacteristicRing;
use p3_matrix::{dense::RowMajorMatrix, Matrix};
use p3_maybe_rayon::prelude::*;
use p3_poseidon2_air::{num_cols, Poseidon2Cols, RoundConstants, VectorizedPoseidon2Air};
use p3_symmetric::Permutation;

use crate::error::{IdentityError, IdentityResult};
use crate::field::FELT_LIMBS;
use crate::hasher::{Commitment, COMMITMENT_WIDTH, POSEIDON2_RATE, POSEIDON2_WIDTH};
use crate::schema::IDENTITY_SLOT_COUNT;

pub const POSEIDON2_SBOX_DEGREE: u64 = 7;
pub const POSEIDON2_SBOX_REGISTERS: usize = 1;
pub const POSEIDON2_HALF_FULL_ROUNDS: usize = 4;
pub const POSEIDON2_PARTIAL_ROUNDS: usize = 13;

pub const COMMITMENT_INPUT_LEN: usize = IDENTITY_SLOT_COUNT * FELT_LIMBS;
pub const COMMITMENT_NUM_PERMS: usize = COMMITMENT_INPUT_LEN.div_ceil(POSEIDON2_RATE);
pub const COMMITMENT_TRACE_ROWS: usize = 8;

pub(crate) const PERM_WIDTH: usize = num_cols::<
    POSEIDON2_WIDTH,
    POSEIDON2_SBOX_DEGREE,
    POSEIDON2_SBOX_REGISTERS,
    POSEIDON2_HALF_FULL_ROUNDS,
    POSEIDON2_PARTIAL_ROUNDS,
>();

type PermCols<T> = Poseidon2Cols<
    T,
    POSEIDON2_WIDTH,
    POSEIDON2_SBOX_DEGREE,
    POSEIDON2_SBOX_REGISTERS,
    POSEIDON2_HALF_FULL_ROUNDS,
    POSEIDON2_PARTIAL_ROUNDS,
>;

#[derive(Clone, Debug)]
pub struct CommitmentTrace {
    pub trace: RowMajorMatrix<BabyBear>,
    pub digest: Commitment,
}

pub struct AttributeCommitmentAir {
    inner: VectorizedPoseidon2Air<
        BabyBear,
        GenericPoseidon2LinearLayersBabyBear,
        POSEIDON2_WIDTH,
        POSEIDON2_SBOX_DEGREE,
        POSEIDON2_SBOX_REGISTERS,
        POSEIDON2_HALF_FULL_ROUNDS,
        POSEIDON2_PARTIAL_ROUNDS,
        COMMITMENT_NUM_PERMS,
    >,
}

fn round_constants(
) -> RoundConstants<BabyBear, POSEIDON2_WIDTH, POSEIDON2_HALF_FULL_ROUNDS, POSEIDON2_PARTIAL_ROUNDS>
{
    RoundConstants::new(
        BABYBEAR_RC16_EXTERNAL_INITIAL,
        BABYBEAR_RC16_INTERNAL,
        BABYBEAR_RC16_EXTERNAL_FINAL,
    )
}

impl AttributeCommitmentAir {
    pub fn new() -> Self {
        Self {
            inner: VectorizedPoseidon2Air::new(round_constants()),
        }
    }
}

impl Default for AttributeCommitmentAir {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseAir<BabyBear> for AttributeCommitmentAir {
    fn width(&self) -> usize {
        self.inner.width()
    }
}

impl BaseAirWithPublicValues<BabyBear> for AttributeCommitmentAir {
    fn num_public_values(&self) -> usize {
        COMMITMENT_WIDTH
    }
}

impl<AB> Air<AB> for AttributeCommitmentAir
where
    AB: AirBuilder<F = BabyBear> + AirBuilderWithPublicValues,
{
    fn eval(&self, builder: &mut AB) {
        self.inner.eval(builder);

        let main = builder.main();
        let local = main.row_slice(0).expect("commitment trace is empty");
        let row = (*local).as_ref();
        let public_digest = builder.public_values().to_vec();

        for perm_idx in 0..COMMITMENT_NUM_PERMS {
            let perm: &PermCols<AB::Var> = perm_slice(row, perm_idx).borrow();
            let inputs = &perm.inputs;

            if perm_idx == 0 {
                // Sponge starts from a zero capacity; the rate cells are the secret limbs.
                for input in &inputs[POSEIDON2_RATE..] {
                    builder.assert_eq(input.clone(), BabyBear::ZERO);
                }
                continue;
            }

            let prev: &PermCols<AB::Var> = perm_slice(row, perm_idx - 1).borrow();
            let prev_output = &prev.ending_full_rounds[POSEIDON2_HALF_FULL_ROUNDS - 1].post;
            for i in 0..POSEIDON2_WIDTH {
                if !is_absorbed(perm_idx, i) {
                    builder.assert_eq(inputs[i].clone(), prev_output[i].clone());
                }
            }
        }

        let last: &PermCols<AB::Var> = perm_slice(row, COMMITMENT_NUM_PERMS - 1).borrow();
        let output = &last.ending_full_rounds[POSEIDON2_HALF_FULL_ROUNDS - 1].post;
        for i in 0..COMMITMENT_WIDTH {
            builder.assert_eq(output[i].clone(), public_digest[i]);
        }
    }
}

fn perm_slice<T>(row: &[T], perm_idx: usize) -> &[T] {
    let start = perm_idx * PERM_WIDTH;
    &row[start..start + PERM_WIDTH]
}

/// Whether state cell `i` of permutation `perm_idx` is overwritten by a limb.
fn is_absorbed(perm_idx: usize, i: usize) -> bool {
    i < POSEIDON2_RATE && perm_idx * POSEIDON2_RATE + i < COMMITMENT_INPUT_LEN
}

/// Builds the commitment trace for `limbs` and returns it with its digest.
pub fn build_commitment_trace(limbs: &[BabyBear]) -> IdentityResult<CommitmentTrace> {
    if limbs.len() != COMMITMENT_INPUT_LEN {
        return Err(IdentityError::arity(COMMITMENT_INPUT_LEN, limbs.len()));
    }

    let perm = default_babybear_poseidon2_16();
    let mut state = [BabyBear::ZERO; POSEIDON2_WIDTH];
    let mut chain = Vec::with_capacity(COMMITMENT_NUM_PERMS);
    for chunk in limbs.chunks(POSEIDON2_RATE) {
        state[..chunk.len()].copy_from_slice(chunk);
        chain.push(state);
        perm.permute_mut(&mut state);
    }

    let mut digest = [BabyBear::ZERO; COMMITMENT_WIDTH];
    digest.copy_from_slice(&state[..COMMITMENT_WIDTH]);

    let inputs: Vec<[BabyBear; POSEIDON2_WIDTH]> = (0..COMMITMENT_TRACE_ROWS)
        .flat_map(|_| chain.iter().copied())
        .collect();
    let trace = p3_poseidon2_air::generate_vectorized_trace_rows::<
        BabyBear,
        GenericPoseidon2LinearLayersBabyBear,
        POSEIDON2_WIDTH,
        POSEIDON2_SBOX_DEGREE,
        POSEIDON2_SBOX_REGISTERS,
        POSEIDON2_HALF_FULL_ROUNDS,
        POSEIDON2_PARTIAL_ROUNDS,
        COMMITMENT_NUM_PERMS,
    >(inputs, &round_constants(), 0);

    Ok(CommitmentTrace {
        trace,
        digest: Commitment::from_elements(digest),
    })
}

/// Re-reads the chaining cells and the digest from every row of `trace`.
pub(crate) fn check_commitment_trace(
    trace: &RowMajorMatrix<BabyBear>,
    expected: &Commitment,
) -> IdentityResult<()> {
    if trace.height() != COMMITMENT_TRACE_ROWS {
        return Err(IdentityError::unsatisfied(format!(
            "commitment trace has {} rows, expected {COMMITMENT_TRACE_ROWS}",
            trace.height()
        )));
    }
    if trace.width() != PERM_WIDTH * COMMITMENT_NUM_PERMS {
        return Err(IdentityError::unsatisfied(format!(
            "commitment trace has {} columns, expected {}",
            trace.width(),
            PERM_WIDTH * COMMITMENT_NUM_PERMS
        )));
    }

    trace
        .values
        .par_chunks_exact(trace.width())
        .enumerate()
        .try_for_each(|(row_idx, row)| check_row(row, expected).map_err(|err| {
            IdentityError::unsatisfied(format!("row {row_idx}: {err}"))
        }))
}

fn check_row(row: &[BabyBear], expected: &Commitment) -> Result<(), String> {
    let first: &PermCols<BabyBear> = perm_slice(row, 0).borrow();
    if first.inputs[POSEIDON2_RATE..].iter().any(|v| *v != BabyBear::ZERO) {
        return Err("initial sponge capacity is not zero".into());
    }

    for perm_idx in 1..COMMITMENT_NUM_PERMS {
        let perm: &PermCols<BabyBear> = perm_slice(row, perm_idx).borrow();
        let prev: &PermCols<BabyBear> = perm_slice(row, perm_idx - 1).borrow();
        let prev_output = &prev.ending_full_rounds[POSEIDON2_HALF_FULL_ROUNDS - 1].post;
        for i in (0..POSEIDON2_WIDTH).filter(|&i| !is_absorbed(perm_idx, i)) {
            if perm.inputs[i] != prev_output[i] {
                return Err(format!("permutation {perm_idx} does not chain at cell {i}"));
            }
        }
    }

    let last: &PermCols<BabyBear> = perm_slice(row, COMMITMENT_NUM_PERMS - 1).borrow();
    let output = &last.ending_full_rounds[POSEIDON2_HALF_FULL_ROUNDS - 1].post;
    if output[..COMMITMENT_WIDTH] != expected.elements()[..] {
        return Err("final permutation output differs from the commitment".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::CommitmentHasher;

    fn limbs() -> Vec<BabyBear> {
        (0..COMMITMENT_INPUT_LEN as u32)
            .map(|i| BabyBear::from_u32(i * 7919 + 3))
            .collect()
    }

    #[test]
    fn shape_constants() {
        assert_eq!(COMMITMENT_INPUT_LEN, 81);
        assert_eq!(COMMITMENT_NUM_PERMS, 11);
        assert_eq!(
            AttributeCommitmentAir::new().width(),
            PERM_WIDTH * COMMITMENT_NUM_PERMS
        );
    }

    #[test]
    fn trace_digest_matches_hasher() {
        let limbs = limbs();
        let trace = build_commitment_trace(&limbs).unwrap();
        let expected = CommitmentHasher::new().hash(&limbs).unwrap();
        assert_eq!(trace.digest, expected);
        assert_eq!(trace.trace.height(), COMMITMENT_TRACE_ROWS);
        check_commitment_trace(&trace.trace, &expected).unwrap();
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(matches!(
            build_commitment_trace(&limbs()[..80]),
            Err(IdentityError::InvalidArity {
                expected: 81,
                actual: 80
            })
        ));
    }

    #[test]
    fn check_catches_a_foreign_digest() {
        let trace = build_commitment_trace(&limbs()).unwrap();
        let other = CommitmentHasher::new().hash(&[BabyBear::ONE]).unwrap();
        assert!(matches!(
            check_commitment_trace(&trace.trace, &other),
            Err(IdentityError::ConstraintUnsatisfied(_))
        ));
    }

    #[test]
    fn check_catches_a_broken_chain() {
        let mut trace = build_commitment_trace(&limbs()).unwrap();
        let width = trace.trace.width();
        // Last capacity cell of the second permutation is a chained cell.
        let cell = PERM_WIDTH + POSEIDON2_WIDTH - 1;
        trace.trace.values[width * 3 + cell] += BabyBear::ONE;
        assert!(matches!(
            check_commitment_trace(&trace.trace, &trace.digest),
            Err(IdentityError::ConstraintUnsatisfied(_))
        ));
    }
}
