//! Error types for the Schnorr signature scheme.

use thiserror::Error;

/// Errors that can occur while signing, verifying or decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchnorrError {
    /// The point at infinity appeared where a finite curve point is required
    /// (verifying key, nonce commitment `R`).
    #[error("point at infinity where a curve point was expected")]
    InvalidPoint,
    /// Decoded coordinates do not satisfy the curve equation.
    #[error("decoded point is not on the curve")]
    NotOnCurve,
    /// Byte encoding could not be parsed.
    #[error("malformed {kind} encoding: {message}")]
    Encoding { kind: &'static str, message: String },
}
