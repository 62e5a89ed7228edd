//! Lowers a circuit declaration into a normalized descriptor and assigns it a
//! structural identity.

use core::fmt;

use p3_air::BaseAir;
use p3_baby_bear::BabyBear;
use p3_field::PrimeField32;
use p3_koala_bear::KoalaBear;
use p3_matrix::Matrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifact::{seal, unseal_artifact, Artifact};
use crate::commitment_air::{
    AttributeCommitmentAir, COMMITMENT_INPUT_LEN, COMMITMENT_NUM_PERMS, COMMITMENT_TRACE_ROWS,
    POSEIDON2_HALF_FULL_ROUNDS, POSEIDON2_PARTIAL_ROUNDS, POSEIDON2_SBOX_DEGREE,
};
use crate::error::{IdentityError, IdentityResult};
use crate::field::FieldId;
use crate::hasher::{COMMITMENT_WIDTH, POSEIDON2_RATE, POSEIDON2_WIDTH};
use crate::params::ProofParameters;
use crate::schema::{AttributeSchema, IDENTITY_SLOT_COUNT};
use crate::signature_air::{
    build_preprocessed_trace, SignatureAir, SIGNATURE_PUBLIC_VALUES, SIGNATURE_TRACE_ROWS,
};

const DESCRIPTOR_VERSION: u16 = 1;
const CIRCUIT_ID_CONTEXT: &str = "identity-zk 2025 circuit id";
const PREPROCESSED_CONTEXT: &str = "identity-zk 2025 preprocessed trace";

/// The statement a circuit proves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Knowledge of attributes hashing to a public commitment.
    AttributeCommitment,
    /// A valid signature by a public key over a public message.
    SignaturePossession,
}

impl Relation {
    /// The STARK field the relation is arithmetized over.
    pub fn native_field(self) -> FieldId {
        match self {
            Self::AttributeCommitment => FieldId::BabyBear,
            Self::SignaturePossession => FieldId::KoalaBear,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AttributeCommitment => "attribute-commitment",
            Self::SignaturePossession => "signature-possession",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural identity of a compiled circuit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircuitId([u8; 32]);

impl CircuitId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 bytes in hex, for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CircuitId({})", self.short())
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// What the caller asks to be compiled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDeclaration {
    relation: Relation,
    schema: Option<AttributeSchema>,
    field: FieldId,
    parameters: ProofParameters,
}

impl CircuitDeclaration {
    /// Attribute commitment over `schema`, in its native field.
    pub fn attribute_commitment(schema: AttributeSchema) -> Self {
        Self {
            relation: Relation::AttributeCommitment,
            schema: Some(schema),
            field: Relation::AttributeCommitment.native_field(),
            parameters: ProofParameters::default(),
        }
    }

    pub fn signature_possession() -> Self {
        Self {
            relation: Relation::SignaturePossession,
            schema: None,
            field: Relation::SignaturePossession.native_field(),
            parameters: ProofParameters::default(),
        }
    }

    /// Requests a specific wire field; only the native one compiles.
    pub fn with_field(mut self, field: FieldId) -> Self {
        self.field = field;
        self
    }

    pub fn with_parameters(mut self, parameters: ProofParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }
}

/// Poseidon2 instance baked into the commitment circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParameters {
    pub width: usize,
    pub rate: usize,
    pub digest_len: usize,
    pub sbox_degree: u64,
    pub half_full_rounds: usize,
    pub partial_rounds: usize,
    pub input_len: usize,
    pub num_permutations: usize,
}

/// Normalized description of a compiled circuit; its encoding is hashed into the [`CircuitId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDescriptor {
    pub version: u16,
    pub relation: Relation,
    pub field: FieldId,
    pub trace_width: usize,
    pub trace_height: usize,
    pub num_public_values: usize,
    pub preprocessed_width: usize,
    pub preprocessed_digest: Option<[u8; 32]>,
    pub hash: Option<HashParameters>,
    pub schema: Option<AttributeSchema>,
    pub schema_digest: Option<[u8; 32]>,
    pub parameters: ProofParameters,
}

/// A compiled circuit: immutable and shareable across threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintSystem {
    descriptor: CircuitDescriptor,
    id: CircuitId,
}

impl ConstraintSystem {
    pub fn id(&self) -> CircuitId {
        self.id
    }

    pub fn descriptor(&self) -> &CircuitDescriptor {
        &self.descriptor
    }

    pub fn relation(&self) -> Relation {
        self.descriptor.relation
    }

    pub fn field(&self) -> FieldId {
        self.descriptor.field
    }

    pub fn num_public_values(&self) -> usize {
        self.descriptor.num_public_values
    }

    pub fn parameters(&self) -> &ProofParameters {
        &self.descriptor.parameters
    }

    pub fn schema(&self) -> Option<&AttributeSchema> {
        self.descriptor.schema.as_ref()
    }

    pub(crate) fn expect_relation(&self, relation: Relation) -> IdentityResult<()> {
        if self.relation() != relation {
            return Err(IdentityError::mismatch(format!(
                "circuit {} proves {}, not {relation}",
                self.id.short(),
                self.relation()
            )));
        }
        Ok(())
    }
}

/// Compiles `declaration`. Compiling the same declaration twice yields equal
/// systems with equal identities.
pub fn compile(declaration: &CircuitDeclaration) -> IdentityResult<ConstraintSystem> {
    declaration.parameters.validate()?;

    let native = declaration.relation.native_field();
    if declaration.field != native {
        return Err(IdentityError::FieldMismatch(format!(
            "{} circuits are arithmetized over {native}, not {}",
            declaration.relation, declaration.field
        )));
    }

    let descriptor = match declaration.relation {
        Relation::AttributeCommitment => commitment_descriptor(declaration)?,
        Relation::SignaturePossession => signature_descriptor(declaration),
    };
    let id = circuit_id(&descriptor)?;

    info!(
        circuit = %id.short(),
        relation = %descriptor.relation,
        width = descriptor.trace_width,
        height = descriptor.trace_height,
        "compiled constraint system"
    );

    Ok(ConstraintSystem { descriptor, id })
}

fn commitment_descriptor(declaration: &CircuitDeclaration) -> IdentityResult<CircuitDescriptor> {
    let schema = declaration.schema.as_ref().ok_or_else(|| {
        IdentityError::InvalidAttribute("attribute commitment declared without a schema".into())
    })?;
    if schema.len() != IDENTITY_SLOT_COUNT {
        return Err(IdentityError::arity(IDENTITY_SLOT_COUNT, schema.len()));
    }

    let air = AttributeCommitmentAir::new();
    Ok(CircuitDescriptor {
        version: DESCRIPTOR_VERSION,
        relation: Relation::AttributeCommitment,
        field: FieldId::BabyBear,
        trace_width: BaseAir::<BabyBear>::width(&air),
        trace_height: COMMITMENT_TRACE_ROWS,
        num_public_values: COMMITMENT_WIDTH,
        preprocessed_width: 0,
        preprocessed_digest: None,
        hash: Some(HashParameters {
            width: POSEIDON2_WIDTH,
            rate: POSEIDON2_RATE,
            digest_len: COMMITMENT_WIDTH,
            sbox_degree: POSEIDON2_SBOX_DEGREE,
            half_full_rounds: POSEIDON2_HALF_FULL_ROUNDS,
            partial_rounds: POSEIDON2_PARTIAL_ROUNDS,
            input_len: COMMITMENT_INPUT_LEN,
            num_permutations: COMMITMENT_NUM_PERMS,
        }),
        schema_digest: Some(schema.digest()),
        schema: Some(schema.clone()),
        parameters: declaration.parameters,
    })
}

fn signature_descriptor(declaration: &CircuitDeclaration) -> CircuitDescriptor {
    let air = SignatureAir::new();
    let preprocessed = build_preprocessed_trace();
    let mut hasher = blake3::Hasher::new_derive_key(PREPROCESSED_CONTEXT);
    for value in &preprocessed.values {
        hasher.update(&value.as_canonical_u32().to_le_bytes());
    }
    debug!(
        rows = preprocessed.height(),
        cols = preprocessed.width(),
        "hashed preprocessed generator table"
    );

    CircuitDescriptor {
        version: DESCRIPTOR_VERSION,
        relation: Relation::SignaturePossession,
        field: FieldId::KoalaBear,
        trace_width: BaseAir::<KoalaBear>::width(&air),
        trace_height: SIGNATURE_TRACE_ROWS,
        num_public_values: SIGNATURE_PUBLIC_VALUES,
        preprocessed_width: preprocessed.width(),
        preprocessed_digest: Some(*hasher.finalize().as_bytes()),
        hash: None,
        schema: None,
        schema_digest: None,
        parameters: declaration.parameters,
    }
}

fn circuit_id(descriptor: &CircuitDescriptor) -> IdentityResult<CircuitId> {
    let encoded = postcard::to_allocvec(descriptor).map_err(|err| IdentityError::ArtifactEncode {
        kind: "circuit descriptor",
        message: err.to_string(),
    })?;
    let mut hasher = blake3::Hasher::new_derive_key(CIRCUIT_ID_CONTEXT);
    hasher.update(&encoded);
    Ok(CircuitId(*hasher.finalize().as_bytes()))
}

impl Artifact for ConstraintSystem {
    const KIND: &'static str = "constraint system";

    fn to_bytes(&self) -> IdentityResult<Vec<u8>> {
        seal(Self::KIND, &self.descriptor)
    }

    /// Recompiles from the decoded descriptor; a descriptor that does not
    /// match what its own declaration compiles to is rejected.
    fn from_bytes(bytes: &[u8]) -> IdentityResult<Self> {
        let descriptor: CircuitDescriptor = unseal_artifact(Self::KIND, bytes)?;
        let declaration = CircuitDeclaration {
            relation: descriptor.relation,
            schema: descriptor.schema.clone(),
            field: descriptor.field,
            parameters: descriptor.parameters,
        };
        let compiled = compile(&declaration).map_err(|err| IdentityError::ArtifactDecode {
            kind: Self::KIND,
            message: err.to_string(),
        })?;
        if compiled.descriptor != descriptor {
            return Err(IdentityError::ArtifactDecode {
                kind: Self::KIND,
                message: "descriptor does not match its declaration".into(),
            });
        }
        Ok(compiled)
    }
}
