//! Poseidon2 commitment over flattened attribute limbs.

use core::fmt;

use p3_baby_bear::{default_babybear_poseidon2_16, BabyBear, Poseidon2BabyBear};
use p3_field::{PrimeCharacteristicRing, PrimeField32};
use p3_symmetric::{CryptographicHasher, PaddingFreeSponge};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};
use crate::field::FELT_LIMBS;
use crate::schema::AttributeTuple;

pub const POSEIDON2_WIDTH: usize = 16;
pub const POSEIDON2_RATE: usize = 8;
pub const COMMITMENT_WIDTH: usize = 8;

pub type CommitmentPermutation = Poseidon2BabyBear<POSEIDON2_WIDTH>;

type CommitmentSponge =
    PaddingFreeSponge<CommitmentPermutation, POSEIDON2_WIDTH, POSEIDON2_RATE, COMMITMENT_WIDTH>;

/// Public commitment to an attribute tuple: the Poseidon2 digest of its limbs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment([BabyBear; COMMITMENT_WIDTH]);

impl Commitment {
    pub fn from_elements(elements: [BabyBear; COMMITMENT_WIDTH]) -> Self {
        Self(elements)
    }

    pub fn elements(&self) -> &[BabyBear; COMMITMENT_WIDTH] {
        &self.0
    }

    /// Little-endian canonical encoding, 4 bytes per element.
    pub fn to_bytes(&self) -> [u8; 4 * COMMITMENT_WIDTH] {
        let mut out = [0u8; 4 * COMMITMENT_WIDTH];
        for (chunk, element) in out.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&element.as_canonical_u32().to_le_bytes());
        }
        out
    }

    /// Rejects elements that are not canonical BabyBear values.
    pub fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        if bytes.len() != 4 * COMMITMENT_WIDTH {
            return Err(IdentityError::arity(4 * COMMITMENT_WIDTH, bytes.len()));
        }
        let mut elements = [BabyBear::default(); COMMITMENT_WIDTH];
        for (element, chunk) in elements.iter_mut().zip(bytes.chunks_exact(4)) {
            let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if raw >= BabyBear::ORDER_U32 {
                return Err(IdentityError::FieldMismatch(format!(
                    "{raw:#x} is not a canonical BabyBear element"
                )));
            }
            *element = BabyBear::from_u32(raw);
        }
        Ok(Self(elements))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hashes attribute limbs with a padding-free Poseidon2 sponge.
#[derive(Clone, Debug)]
pub struct CommitmentHasher {
    sponge: CommitmentSponge,
}

impl CommitmentHasher {
    pub fn new() -> Self {
        Self {
            sponge: CommitmentSponge::new(default_babybear_poseidon2_16()),
        }
    }

    /// Deterministic and order-sensitive; empty input is rejected.
    pub fn hash(&self, elements: &[BabyBear]) -> IdentityResult<Commitment> {
        if elements.is_empty() {
            return Err(IdentityError::arity(1, 0));
        }
        Ok(Commitment(self.sponge.hash_iter(elements.iter().copied())))
    }

    pub fn hash_attributes(&self, attributes: &AttributeTuple) -> IdentityResult<Commitment> {
        self.hash(&flatten_attributes(attributes))
    }
}

impl Default for CommitmentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Limbs of every attribute, concatenated in schema order.
pub fn flatten_attributes(attributes: &AttributeTuple) -> Vec<BabyBear> {
    let mut out = Vec::with_capacity(attributes.len() * FELT_LIMBS);
    for value in attributes.values() {
        out.extend(value.to_limbs::<BabyBear>());
    }
    out
}
