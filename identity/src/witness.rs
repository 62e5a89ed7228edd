//! Witness assembly: the private values laid out as an execution trace,
//! together with the public inputs the proof will be checked against.
//!
//! The builder runs every native check before any trace is produced, so a
//! tuple that does not open the claimed commitment never reaches the prover.

use core::fmt;

use curve::{Affine, COORD_LIMBS};
use p3_baby_bear::BabyBear;
use p3_field::{PrimeCharacteristicRing, PrimeField32};
use p3_koala_bear::KoalaBear;
use p3_matrix::dense::RowMajorMatrix;
use p3_matrix::Matrix;
use schnorr::{hash_challenge, Signature, VerifyingKey as PublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::artifact::{seal, unseal, Artifact};
use crate::commitment_air::{build_commitment_trace, check_commitment_trace};
use crate::compiler::{CircuitId, ConstraintSystem, Relation};
use crate::error::{IdentityError, IdentityResult};
use crate::field::{Felt, FieldId, FELT_LIMBS};
use crate::hasher::{flatten_attributes, Commitment, CommitmentHasher, COMMITMENT_WIDTH};
use crate::schema::AttributeTuple;
use crate::signature_air::{
    build_signature_trace, check_signature_trace, signature_public_values, SIGNATURE_PUBLIC_VALUES,
};

/// Public inputs of one statement.
///
/// A commitment statement holds the digest. A signature statement holds the
/// signer, the nonce commitment `R`, the response `s` and the signed message;
/// the challenge is never stored and is recomputed from the message whenever
/// the statement is lowered into circuit wires.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicInputs {
    statement: Statement,
}

/// Every value is canonical in its field: digest, points and `s` limbs in the
/// relation's native field, message elements in BabyBear.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum Statement {
    Commitment {
        digest: Vec<u32>,
    },
    Signature {
        public_key: Vec<u32>,
        nonce: Vec<u32>,
        response: Vec<u32>,
        message: Vec<u32>,
    },
}

impl PublicInputs {
    /// The public side of an attribute commitment statement: the digest.
    pub fn commitment(commitment: &Commitment) -> Self {
        Self {
            statement: Statement::Commitment {
                digest: canonical(commitment.elements()),
            },
        }
    }

    /// The public side of a signature possession statement.
    ///
    /// Fails when the key or `R` is not a finite curve point.
    pub fn signature(
        public_key: &PublicKey,
        message: &[BabyBear],
        signature: &Signature,
    ) -> IdentityResult<Self> {
        let pk = PublicKey::from_affine(public_key.as_affine())?;
        let r = PublicKey::from_affine(signature.r)?;
        Ok(Self {
            statement: Statement::Signature {
                public_key: point_values(&pk.as_affine()),
                nonce: point_values(&r.as_affine()),
                response: Felt::from(signature.s).to_limb_values().to_vec(),
                message: canonical(message),
            },
        })
    }

    pub fn relation(&self) -> Relation {
        match self.statement {
            Statement::Commitment { .. } => Relation::AttributeCommitment,
            Statement::Signature { .. } => Relation::SignaturePossession,
        }
    }

    pub fn field(&self) -> FieldId {
        self.relation().native_field()
    }

    /// Number of public wires the statement lowers to.
    pub fn num_wires(&self) -> usize {
        match self.relation() {
            Relation::AttributeCommitment => COMMITMENT_WIDTH,
            Relation::SignaturePossession => SIGNATURE_PUBLIC_VALUES,
        }
    }

    /// The claimed digest, for commitment statements.
    pub fn as_commitment(&self) -> Option<Commitment> {
        let elements: [BabyBear; COMMITMENT_WIDTH] =
            self.baby_bear_values().ok()?.try_into().ok()?;
        Some(Commitment::from_elements(elements))
    }

    /// The signer, for signature statements.
    pub fn public_key(&self) -> Option<PublicKey> {
        let (pk, ..) = self.signature_parts().ok()?;
        PublicKey::from_affine(pk).ok()
    }

    /// The signed message, for signature statements.
    pub fn message(&self) -> Option<Vec<BabyBear>> {
        match &self.statement {
            Statement::Signature { message, .. } => {
                Some(message.iter().map(|v| BabyBear::from_u32(*v)).collect())
            }
            Statement::Commitment { .. } => None,
        }
    }

    pub(crate) fn baby_bear_values(&self) -> IdentityResult<Vec<BabyBear>> {
        match &self.statement {
            Statement::Commitment { digest } => {
                Ok(digest.iter().map(|v| BabyBear::from_u32(*v)).collect())
            }
            Statement::Signature { .. } => Err(self.wrong_field(FieldId::BabyBear)),
        }
    }

    /// Lowers a signature statement to `pk | R | s limbs | -e limbs`, with
    /// `e = H(R || pk || message)`.
    pub(crate) fn koala_bear_values(&self) -> IdentityResult<Vec<KoalaBear>> {
        if !matches!(self.statement, Statement::Signature { .. }) {
            return Err(self.wrong_field(FieldId::KoalaBear));
        }
        let (pk, r, s, message) =
            self.signature_parts()
                .map_err(|message| IdentityError::ArtifactDecode {
                    kind: Self::KIND,
                    message,
                })?;
        let e = hash_challenge(&r, &pk, &message)?;
        Ok(signature_public_values(&pk, &r, &s, &Felt::from(-e)))
    }

    fn wrong_field(&self, field: FieldId) -> IdentityError {
        IdentityError::FieldMismatch(format!(
            "public inputs are over {}, not {field}",
            self.field()
        ))
    }

    fn signature_parts(&self) -> Result<(Affine, Affine, Felt, Vec<BabyBear>), String> {
        let Statement::Signature {
            public_key,
            nonce,
            response,
            message,
        } = &self.statement
        else {
            return Err("not a signature statement".into());
        };
        let pk = read_point(public_key, "public key")?;
        let r = read_point(nonce, "nonce commitment")?;
        let limbs: [u32; FELT_LIMBS] = response
            .as_slice()
            .try_into()
            .map_err(|_| format!("expected {FELT_LIMBS} response limbs, found {}", response.len()))?;
        let s = Felt::from_limb_values(&limbs).ok_or("response is not a canonical scalar")?;
        let baby_bear = FieldId::BabyBear.modulus();
        if message.iter().any(|v| *v >= baby_bear) {
            return Err("message is not canonical in BabyBear".into());
        }
        let message = message.iter().map(|v| BabyBear::from_u32(*v)).collect();
        Ok((pk, r, s, message))
    }

    fn validate(&self) -> Result<(), String> {
        match &self.statement {
            Statement::Commitment { digest } => {
                if digest.len() != COMMITMENT_WIDTH {
                    return Err(format!(
                        "expected {COMMITMENT_WIDTH} digest values, found {}",
                        digest.len()
                    ));
                }
                let modulus = FieldId::BabyBear.modulus();
                if digest.iter().any(|v| *v >= modulus) {
                    return Err("digest is not canonical in BabyBear".into());
                }
                Ok(())
            }
            Statement::Signature { .. } => self.signature_parts().map(|_| ()),
        }
    }
}

fn canonical<F: PrimeField32>(values: &[F]) -> Vec<u32> {
    values.iter().map(PrimeField32::as_canonical_u32).collect()
}

fn point_values(point: &Affine) -> Vec<u32> {
    canonical(&[point.x_coeffs(), point.y_coeffs()].concat())
}

/// Finite, canonical and on the curve.
fn read_point(values: &[u32], what: &str) -> Result<Affine, String> {
    if values.len() != 2 * COORD_LIMBS {
        return Err(format!(
            "{what} has {} coordinates, expected {}",
            values.len(),
            2 * COORD_LIMBS
        ));
    }
    let modulus = FieldId::KoalaBear.modulus();
    if values.iter().any(|v| *v >= modulus) {
        return Err(format!("{what} is not canonical in KoalaBear"));
    }
    let coeffs = |start: usize| -> [KoalaBear; COORD_LIMBS] {
        core::array::from_fn(|i| KoalaBear::from_u32(values[start + i]))
    };
    let point = Affine::from_coeffs(coeffs(0), coeffs(COORD_LIMBS));
    PublicKey::from_affine(point).map_err(|err| format!("{what}: {err}"))?;
    Ok(point)
}

impl Artifact for PublicInputs {
    const KIND: &'static str = "public inputs";

    fn to_bytes(&self) -> IdentityResult<Vec<u8>> {
        seal(Self::KIND, self)
    }

    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        let decode_error = |message| IdentityError::ArtifactDecode {
            kind: Self::KIND,
            message,
        };
        let inputs: Self = unseal(Self::KIND, bytes).map_err(decode_error)?;
        inputs.validate().map_err(decode_error)?;
        Ok(inputs)
    }
}

/// A signature together with what it signs and who signed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureMaterial {
    pub public_key: PublicKey,
    pub message: Vec<BabyBear>,
    pub signature: Signature,
}

impl SignatureMaterial {
    pub fn new(public_key: PublicKey, message: Vec<BabyBear>, signature: Signature) -> Self {
        Self {
            public_key,
            message,
            signature,
        }
    }

    pub fn public_inputs(&self) -> IdentityResult<PublicInputs> {
        PublicInputs::signature(&self.public_key, &self.message, &self.signature)
    }
}

pub(crate) enum WitnessTrace {
    BabyBear(RowMajorMatrix<BabyBear>),
    KoalaBear(RowMajorMatrix<KoalaBear>),
}

impl WitnessTrace {
    fn wipe(&mut self) {
        match self {
            Self::BabyBear(trace) => trace.values.fill(BabyBear::ZERO),
            Self::KoalaBear(trace) => trace.values.fill(KoalaBear::ZERO),
        }
    }
}

/// A satisfying assignment for one compiled circuit.
///
/// The trace is wiped on drop. Once handed to the prover it is consumed.
pub struct Witness {
    circuit_id: CircuitId,
    public: PublicInputs,
    trace: Option<WitnessTrace>,
}

impl Witness {
    pub fn circuit_id(&self) -> CircuitId {
        self.circuit_id
    }

    pub fn public_inputs(&self) -> &PublicInputs {
        &self.public
    }

    pub(crate) fn take_trace(&mut self) -> Option<WitnessTrace> {
        self.trace.take()
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("circuit_id", &self.circuit_id)
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl Drop for Witness {
    fn drop(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            trace.wipe();
        }
    }
}

/// Builds witnesses for one constraint system.
#[derive(Debug)]
pub struct WitnessBuilder<'a> {
    cs: &'a ConstraintSystem,
    hasher: CommitmentHasher,
}

impl<'a> WitnessBuilder<'a> {
    pub fn new(cs: &'a ConstraintSystem) -> Self {
        Self {
            cs,
            hasher: CommitmentHasher::new(),
        }
    }

    /// Builds the witness for "these attributes open `claimed`".
    ///
    /// Fails with [`IdentityError::CommitmentMismatch`] when the tuple hashes
    /// to anything else, and with [`IdentityError::InvalidArity`] when the
    /// tuple does not have one value per schema slot.
    pub fn build(
        &self,
        attributes: &AttributeTuple,
        claimed: &Commitment,
    ) -> IdentityResult<Witness> {
        self.cs.expect_relation(Relation::AttributeCommitment)?;
        let schema = self.cs.schema().ok_or_else(|| {
            IdentityError::mismatch("attribute commitment circuit carries no schema")
        })?;
        attributes.ensure_schema(schema)?;

        let actual = self.hasher.hash_attributes(attributes)?;
        if actual != *claimed {
            warn!(
                circuit = %self.cs.id().short(),
                claimed = %claimed.to_hex(),
                "attributes do not open the claimed commitment"
            );
            return Err(IdentityError::CommitmentMismatch);
        }

        let mut limbs = flatten_attributes(attributes);
        let built = build_commitment_trace(&limbs);
        limbs.fill(BabyBear::ZERO);
        let mut built = built?;

        if built.digest != *claimed {
            built.trace.values.fill(BabyBear::ZERO);
            return Err(IdentityError::unsatisfied(
                "trace digest differs from the native hash",
            ));
        }
        if let Err(err) = check_commitment_trace(&built.trace, claimed) {
            built.trace.values.fill(BabyBear::ZERO);
            return Err(err);
        }

        debug!(
            circuit = %self.cs.id().short(),
            rows = built.trace.height(),
            columns = built.trace.width(),
            "built commitment witness"
        );

        Ok(Witness {
            circuit_id: self.cs.id(),
            public: PublicInputs::commitment(claimed),
            trace: Some(WitnessTrace::BabyBear(built.trace)),
        })
    }

    /// Builds the witness for "I hold a valid signature on this message".
    pub fn build_signature(&self, material: &SignatureMaterial) -> IdentityResult<Witness> {
        self.cs.expect_relation(Relation::SignaturePossession)?;

        let public = material.public_inputs()?;
        let pk = material.public_key.as_affine();
        let e = hash_challenge(&material.signature.r, &pk, &material.message)?;
        let s = Felt::from(material.signature.s);
        let neg_e = Felt::from(-e);

        let public_values = public.koala_bear_values()?;
        let mut built = build_signature_trace(&pk, &s, &neg_e);
        if let Err(reason) = check_signature_trace(&built, &public_values) {
            built.trace.values.fill(KoalaBear::ZERO);
            warn!(circuit = %self.cs.id().short(), %reason, "signature witness rejected");
            return Err(IdentityError::ConstraintUnsatisfied(reason));
        }

        debug!(
            circuit = %self.cs.id().short(),
            rows = built.trace.height(),
            columns = built.trace.width(),
            "built signature witness"
        );

        Ok(Witness {
            circuit_id: self.cs.id(),
            public,
            trace: Some(WitnessTrace::KoalaBear(built.trace)),
        })
    }
}
