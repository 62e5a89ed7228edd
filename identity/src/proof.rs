//! The proof artifact.

use core::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::artifact::{seal, unseal, Artifact};
use crate::compiler::{CircuitId, Relation};
use crate::error::{IdentityError, IdentityResult};
use crate::keys::KeyId;
use crate::stark_config::{CommitmentStarkProof, SignatureStarkProof};

/// A STARK proof tagged with the circuit and key pair it was produced under.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    relation: Relation,
    circuit_id: CircuitId,
    key_id: KeyId,
    stark_proof: Vec<u8>,
}

impl Proof {
    pub(crate) fn new(
        relation: Relation,
        circuit_id: CircuitId,
        key_id: KeyId,
        stark_proof: Vec<u8>,
    ) -> Self {
        Self {
            relation,
            circuit_id,
            key_id,
            stark_proof,
        }
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn circuit_id(&self) -> CircuitId {
        self.circuit_id
    }

    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Size of the encoded STARK proof in bytes.
    pub fn size(&self) -> usize {
        self.stark_proof.len()
    }

    pub(crate) fn stark_proof(&self) -> &[u8] {
        &self.stark_proof
    }
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proof")
            .field("relation", &self.relation)
            .field("circuit_id", &self.circuit_id)
            .field("key_id", &self.key_id)
            .field("bytes", &self.stark_proof.len())
            .finish()
    }
}

impl Artifact for Proof {
    const KIND: &'static str = "proof";

    fn to_bytes(&self) -> IdentityResult<Vec<u8>> {
        seal(Self::KIND, self)
    }

    /// Any malformed input, including a well-formed envelope around a STARK
    /// proof that does not decode for its relation, is a
    /// [`IdentityError::ProofDecode`].
    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        let proof: Self = unseal(Self::KIND, bytes).map_err(IdentityError::ProofDecode)?;
        match proof.relation {
            Relation::AttributeCommitment => {
                decode_stark::<CommitmentStarkProof>(&proof.stark_proof)?;
            }
            Relation::SignaturePossession => {
                decode_stark::<SignatureStarkProof>(&proof.stark_proof)?;
            }
        }
        Ok(proof)
    }
}

pub(crate) fn encode_stark<P: Serialize>(proof: &P) -> IdentityResult<Vec<u8>> {
    postcard::to_allocvec(proof).map_err(|err| IdentityError::ArtifactEncode {
        kind: Proof::KIND,
        message: err.to_string(),
    })
}

pub(crate) fn decode_stark<P: DeserializeOwned>(bytes: &[u8]) -> IdentityResult<P> {
    postcard::from_bytes(bytes).map_err(|err| IdentityError::ProofDecode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, CircuitDeclaration};
    use crate::keys::setup;

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            Proof::from_bytes(&[0xde, 0xad, 0xbe, 0xef]),
            Err(IdentityError::ProofDecode(_))
        ));
        assert!(matches!(Proof::from_bytes(&[]), Err(IdentityError::ProofDecode(_))));
    }

    #[test]
    fn envelope_around_a_bogus_stark_proof_is_a_decode_error() {
        let compiled = compile(&CircuitDeclaration::signature_possession()).unwrap();
        let (pk, _) = setup(&compiled, &mut rand::rng()).unwrap();
        let proof = Proof::new(
            Relation::SignaturePossession,
            compiled.id(),
            pk.key_id(),
            vec![1, 2, 3],
        );
        let bytes = proof.to_bytes().unwrap();
        assert!(matches!(
            Proof::from_bytes(&bytes),
            Err(IdentityError::ProofDecode(_))
        ));
    }
}
