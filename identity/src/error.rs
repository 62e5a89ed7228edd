use schnorr::SchnorrError;
use thiserror::Error;

/// Errors surfaced by the identity proving lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("expected {expected} values, found {actual}")]
    InvalidArity { expected: usize, actual: usize },

    #[error("field mismatch: {0}")]
    FieldMismatch(String),

    #[error("claimed commitment does not match the attribute hash")]
    CommitmentMismatch,

    #[error("constraint unsatisfied: {0}")]
    ConstraintUnsatisfied(String),

    #[error("key/circuit mismatch: {0}")]
    KeyCircuitMismatch(String),

    #[error("malformed proof: {0}")]
    ProofDecode(String),

    #[error("malformed {kind}: {message}")]
    ArtifactDecode { kind: &'static str, message: String },

    #[error("failed to encode {kind}: {message}")]
    ArtifactEncode { kind: &'static str, message: String },

    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error(transparent)]
    Signature(#[from] SchnorrError),

    #[error("invalid proof parameters: {0}")]
    Config(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    pub(crate) fn arity(expected: usize, actual: usize) -> Self {
        Self::InvalidArity { expected, actual }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::KeyCircuitMismatch(message.into())
    }

    pub(crate) fn unsatisfied(message: impl Into<String>) -> Self {
        Self::ConstraintUnsatisfied(message.into())
    }
}
