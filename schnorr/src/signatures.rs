//! Signature type and the Fiat-Shamir challenge hash.

use curve::{Affine, KoalaBear, ScalarField};
use num_bigint::BigUint;
use p3_baby_bear::{BabyBear, Poseidon2BabyBear, default_babybear_poseidon2_16};
use p3_field::{PrimeCharacteristicRing, PrimeField32};
use p3_symmetric::{CryptographicHasher, PaddingFreeSponge};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DIGEST_ELEMENT_BITS, HALF_BITS, POINT_ENCODING_LEN, POSEIDON2_OUT, POSEIDON2_RATE,
    POSEIDON2_WIDTH,
};
use crate::errors::SchnorrError;

type ChallengeSponge =
    PaddingFreeSponge<Poseidon2BabyBear<POSEIDON2_WIDTH>, POSEIDON2_WIDTH, POSEIDON2_RATE, POSEIDON2_OUT>;

/// A Schnorr signature `(R, s)`.
///
/// Valid when `s * G == R + e * pk` for `e = H(R || pk || msg)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Nonce commitment `R = k * G`.
    pub r: Affine,
    /// Response `s = k + e * sk`.
    pub s: ScalarField,
}

impl Signature {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SchnorrError> {
        bincode::serialize(self).map_err(|err| SchnorrError::Encoding {
            kind: "signature",
            message: err.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchnorrError> {
        let sig: Signature = bincode::deserialize(bytes).map_err(|err| SchnorrError::Encoding {
            kind: "signature",
            message: err.to_string(),
        })?;
        if sig.r.is_infinity() {
            return Err(SchnorrError::InvalidPoint);
        }
        if !sig.r.is_on_curve() {
            return Err(SchnorrError::NotOnCurve);
        }
        Ok(sig)
    }
}

/// Computes the challenge `e = H(R || pk || msg)` as a scalar.
///
/// Both points are absorbed through [`encode_point`]; the eight digest
/// elements are packed 31 bits apiece into a 248-bit integer and reduced
/// modulo the group order.
///
/// Fails with [`SchnorrError::InvalidPoint`] if either point is at infinity.
pub fn hash_challenge(
    r: &Affine,
    pk: &Affine,
    msg: &[BabyBear],
) -> Result<ScalarField, SchnorrError> {
    if r.is_infinity() || pk.is_infinity() {
        return Err(SchnorrError::InvalidPoint);
    }

    let mut input = Vec::with_capacity(2 * POINT_ENCODING_LEN + msg.len());
    input.extend_from_slice(&encode_point(r));
    input.extend_from_slice(&encode_point(pk));
    input.extend_from_slice(msg);

    let sponge = ChallengeSponge::new(default_babybear_poseidon2_16());
    let digest = sponge.hash_iter(input);

    let packed = digest
        .iter()
        .rev()
        .fold(BigUint::default(), |acc, element| {
            (acc << DIGEST_ELEMENT_BITS) + BigUint::from(element.as_canonical_u32())
        });

    Ok(ScalarField::from_biguint_reduced(&packed))
}

/// Encodes a point as 32 BabyBear elements.
///
/// Every KoalaBear coefficient of `x` then `y` is split into its low and high
/// 16-bit halves, which keeps the encoding injective even though KoalaBear
/// values can exceed the BabyBear modulus.
pub fn encode_point(point: &Affine) -> [BabyBear; POINT_ENCODING_LEN] {
    let mut out = [BabyBear::ZERO; POINT_ENCODING_LEN];
    let coeffs = point.x_coeffs().into_iter().chain(point.y_coeffs());
    for (pair, coeff) in out.chunks_exact_mut(2).zip(coeffs) {
        let (lo, hi) = split_coefficient(coeff);
        pair[0] = lo;
        pair[1] = hi;
    }
    out
}

fn split_coefficient(coeff: KoalaBear) -> (BabyBear, BabyBear) {
    let value = coeff.as_canonical_u32();
    let mask = (1u32 << HALF_BITS) - 1;
    (
        BabyBear::from_u32(value & mask),
        BabyBear::from_u32(value >> HALF_BITS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve::Group;

    #[test]
    fn encode_point_separates_distinct_points() {
        let g = Affine::generator();
        let h = g.double();
        assert_ne!(encode_point(&g), encode_point(&h));
        assert_ne!(encode_point(&g), encode_point(&-g));
    }

    #[test]
    fn halves_stay_below_16_bits() {
        let encoded = encode_point(&Affine::generator().mul_u64(99));
        assert!(encoded.iter().all(|e| e.as_canonical_u32() < 1 << 16));
    }

    #[test]
    fn challenge_rejects_infinity() {
        let g = Affine::generator();
        assert_eq!(
            hash_challenge(&Affine::INFINITY, &g, &[]),
            Err(SchnorrError::InvalidPoint)
        );
        assert_eq!(
            hash_challenge(&g, &Affine::INFINITY, &[]),
            Err(SchnorrError::InvalidPoint)
        );
    }

    #[test]
    fn challenge_depends_on_message() {
        let g = Affine::generator();
        let pk = g.mul_u64(5);
        let a = hash_challenge(&g, &pk, &[BabyBear::ONE]).expect("finite points");
        let b = hash_challenge(&g, &pk, &[BabyBear::TWO]).expect("finite points");
        assert_ne!(a, b);
        assert_eq!(a, hash_challenge(&g, &pk, &[BabyBear::ONE]).expect("finite points"));
    }
}
