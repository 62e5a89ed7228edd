//! One-time key generation bound to a compiled circuit.

use core::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use crate::artifact::{seal, unseal_artifact, Artifact};
use crate::compiler::{CircuitId, ConstraintSystem, Relation};
use crate::error::{IdentityError, IdentityResult};
use crate::field::FieldId;
use crate::params::ProofParameters;

const KEY_ID_CONTEXT: &str = "identity-zk 2025 key pair id";
const VK_FINGERPRINT_CONTEXT: &str = "identity-zk 2025 verifying key fingerprint";

/// Identity of one setup run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId([u8; 32]);

impl KeyId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.short())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    relation: Relation,
    field: FieldId,
    circuit_id: CircuitId,
    key_id: KeyId,
    num_public_values: usize,
    parameters: ProofParameters,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvingKey {
    relation: Relation,
    field: FieldId,
    circuit_id: CircuitId,
    key_id: KeyId,
    num_public_values: usize,
    parameters: ProofParameters,
    verifying_key_fingerprint: [u8; 32],
}

macro_rules! key_accessors {
    ($key:ty) => {
        impl $key {
            pub fn relation(&self) -> Relation {
                self.relation
            }

            pub fn field(&self) -> FieldId {
                self.field
            }

            pub fn circuit_id(&self) -> CircuitId {
                self.circuit_id
            }

            pub fn key_id(&self) -> KeyId {
                self.key_id
            }

            pub fn num_public_values(&self) -> usize {
                self.num_public_values
            }

            pub fn parameters(&self) -> &ProofParameters {
                &self.parameters
            }

            /// Fails unless this key was generated for `cs`.
            pub fn ensure_circuit(&self, cs: &ConstraintSystem) -> IdentityResult<()> {
                if self.circuit_id != cs.id() {
                    return Err(IdentityError::mismatch(format!(
                        "key belongs to circuit {}, not {}",
                        self.circuit_id.short(),
                        cs.id().short()
                    )));
                }
                if self.relation != cs.relation() || self.field != cs.field() {
                    return Err(IdentityError::mismatch(format!(
                        "key is for a {} circuit over {}",
                        self.relation, self.field
                    )));
                }
                if self.parameters != *cs.parameters() {
                    return Err(IdentityError::mismatch(
                        "key proof parameters differ from the circuit's",
                    ));
                }
                Ok(())
            }
        }
    };
}

key_accessors!(VerifyingKey);
key_accessors!(ProvingKey);

impl VerifyingKey {
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key(VK_FINGERPRINT_CONTEXT);
        hasher.update(self.circuit_id.as_bytes());
        hasher.update(self.key_id.as_bytes());
        hasher.update(self.relation.name().as_bytes());
        hasher.update(self.field.name().as_bytes());
        hasher.update(&(self.num_public_values as u64).to_le_bytes());
        for knob in [
            self.parameters.log_blowup,
            self.parameters.log_final_poly_len,
            self.parameters.num_queries,
            self.parameters.commit_proof_of_work_bits,
            self.parameters.query_proof_of_work_bits,
            self.parameters.num_random_codewords,
        ] {
            hasher.update(&(knob as u64).to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }
}

impl ProvingKey {
    pub fn verifying_key_fingerprint(&self) -> &[u8; 32] {
        &self.verifying_key_fingerprint
    }

    /// Whether `vk` was produced by the same setup run as this key.
    pub fn matches(&self, vk: &VerifyingKey) -> bool {
        vk.fingerprint() == self.verifying_key_fingerprint
    }
}

/// Runs the one-time setup for `cs`.
///
/// Draws 32 bytes of entropy, binds them to the circuit identity, and wipes
/// them before returning. Every run yields a fresh, non-interchangeable pair.
pub fn setup<R: RngCore + CryptoRng + ?Sized>(
    cs: &ConstraintSystem,
    rng: &mut R,
) -> IdentityResult<(ProvingKey, VerifyingKey)> {
    let mut entropy = Zeroizing::new([0u8; 32]);
    rng.fill_bytes(&mut entropy[..]);

    let mut hasher = blake3::Hasher::new_derive_key(KEY_ID_CONTEXT);
    hasher.update(cs.id().as_bytes());
    hasher.update(&entropy[..]);
    let key_id = KeyId(*hasher.finalize().as_bytes());
    drop(entropy);

    let vk = VerifyingKey {
        relation: cs.relation(),
        field: cs.field(),
        circuit_id: cs.id(),
        key_id,
        num_public_values: cs.num_public_values(),
        parameters: *cs.parameters(),
    };
    let pk = ProvingKey {
        relation: vk.relation,
        field: vk.field,
        circuit_id: vk.circuit_id,
        key_id,
        num_public_values: vk.num_public_values,
        parameters: vk.parameters,
        verifying_key_fingerprint: vk.fingerprint(),
    };

    info!(
        circuit = %cs.id().short(),
        key = %key_id.short(),
        relation = %cs.relation(),
        "generated key pair"
    );

    Ok((pk, vk))
}

impl Artifact for VerifyingKey {
    const KIND: &'static str = "verifying key";

    fn to_bytes(&self) -> IdentityResult<Vec<u8>> {
        seal(Self::KIND, self)
    }

    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        unseal_artifact(Self::KIND, bytes)
    }
}

impl Artifact for ProvingKey {
    const KIND: &'static str = "proving key";

    fn to_bytes(&self) -> IdentityResult<Vec<u8>> {
        seal(Self::KIND, self)
    }

    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        unseal_artifact(Self::KIND, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, CircuitDeclaration};
    use crate::schema::AttributeSchema;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity_cs() -> ConstraintSystem {
        compile(&CircuitDeclaration::attribute_commitment(
            AttributeSchema::identity(),
        ))
        .unwrap()
    }

    #[test]
    fn keys_embed_the_circuit() {
        let cs = identity_cs();
        let (pk, vk) = setup(&cs, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(pk.circuit_id(), cs.id());
        assert_eq!(vk.circuit_id(), cs.id());
        assert_eq!(pk.key_id(), vk.key_id());
        assert!(pk.matches(&vk));
        pk.ensure_circuit(&cs).unwrap();
        vk.ensure_circuit(&cs).unwrap();
    }

    #[test]
    fn each_setup_is_distinct() {
        let cs = identity_cs();
        let mut rng = StdRng::seed_from_u64(2);
        let (pk1, vk1) = setup(&cs, &mut rng).unwrap();
        let (_, vk2) = setup(&cs, &mut rng).unwrap();
        assert_ne!(vk1.key_id(), vk2.key_id());
        assert!(!pk1.matches(&vk2));
    }

    #[test]
    fn keys_reject_foreign_circuits() {
        let cs = identity_cs();
        let other = compile(&CircuitDeclaration::signature_possession()).unwrap();
        let (pk, _) = setup(&cs, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(matches!(
            pk.ensure_circuit(&other),
            Err(IdentityError::KeyCircuitMismatch(_))
        ));
    }

    #[test]
    fn keys_with_edited_parameters_are_refused() {
        let cs = identity_cs();
        let (pk, _) = setup(&cs, &mut StdRng::seed_from_u64(5)).unwrap();
        let edited = ProvingKey {
            parameters: ProofParameters {
                num_queries: pk.parameters.num_queries + 1,
                ..pk.parameters
            },
            ..pk.clone()
        };
        let edited = ProvingKey::from_bytes(&edited.to_bytes().unwrap()).unwrap();
        assert_eq!(edited.circuit_id(), cs.id());
        assert!(matches!(
            edited.ensure_circuit(&cs),
            Err(IdentityError::KeyCircuitMismatch(_))
        ));
        pk.ensure_circuit(&cs).unwrap();
    }

    #[test]
    fn key_bytes_round_trip_and_detect_tampering() {
        let cs = identity_cs();
        let (pk, vk) = setup(&cs, &mut StdRng::seed_from_u64(4)).unwrap();

        let vk_bytes = vk.to_bytes().unwrap();
        assert_eq!(VerifyingKey::from_bytes(&vk_bytes).unwrap(), vk);
        let pk_bytes = pk.to_bytes().unwrap();
        assert_eq!(ProvingKey::from_bytes(&pk_bytes).unwrap(), pk);

        let mut tampered = vk_bytes.clone();
        tampered[10] ^= 0x40;
        assert!(VerifyingKey::from_bytes(&tampered).is_err());
        assert!(matches!(
            VerifyingKey::from_bytes(&pk_bytes),
            Err(IdentityError::ArtifactDecode { .. })
        ));
    }
}
