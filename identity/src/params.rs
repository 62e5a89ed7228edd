//! FRI and blinding knobs shared by prover and verifier.

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, IdentityResult};

const DEFAULT_LOG_BLOWUP: usize = 3;
const DEFAULT_LOG_FINAL_POLY_LEN: usize = 0;
const DEFAULT_NUM_QUERIES: usize = 84;
const DEFAULT_COMMIT_POW_BITS: usize = 0;
const DEFAULT_QUERY_POW_BITS: usize = 16;
const DEFAULT_NUM_RANDOM_CODEWORDS: usize = 4;

/// The signature circuit reaches constraint degree 6; its quotient needs a blowup of 8.
const MIN_LOG_BLOWUP: usize = 3;
const MAX_LOG_BLOWUP: usize = 8;
const MAX_POW_BITS: usize = 30;

/// Proof-system parameters. Part of the circuit identity, so both keys of a
/// pair always agree on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofParameters {
    pub log_blowup: usize,
    pub log_final_poly_len: usize,
    pub num_queries: usize,
    pub commit_proof_of_work_bits: usize,
    pub query_proof_of_work_bits: usize,
    /// Extra random codewords mixed into the hiding commitment PCS.
    pub num_random_codewords: usize,
}

impl Default for ProofParameters {
    fn default() -> Self {
        Self {
            log_blowup: DEFAULT_LOG_BLOWUP,
            log_final_poly_len: DEFAULT_LOG_FINAL_POLY_LEN,
            num_queries: DEFAULT_NUM_QUERIES,
            commit_proof_of_work_bits: DEFAULT_COMMIT_POW_BITS,
            query_proof_of_work_bits: DEFAULT_QUERY_POW_BITS,
            num_random_codewords: DEFAULT_NUM_RANDOM_CODEWORDS,
        }
    }
}

impl ProofParameters {
    /// Cheap parameters for tests and demos. Not sound for production.
    pub fn testing() -> Self {
        Self {
            num_queries: 8,
            query_proof_of_work_bits: 1,
            ..Self::default()
        }
    }

    /// Parses JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> IdentityResult<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|err| IdentityError::Config(format!("unreadable parameters: {err}")))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> IdentityResult<()> {
        if !(MIN_LOG_BLOWUP..=MAX_LOG_BLOWUP).contains(&self.log_blowup) {
            return Err(IdentityError::Config(format!(
                "log_blowup must lie in {MIN_LOG_BLOWUP}..={MAX_LOG_BLOWUP}, got {}",
                self.log_blowup
            )));
        }
        if self.num_queries == 0 {
            return Err(IdentityError::Config("num_queries must be positive".into()));
        }
        if self.commit_proof_of_work_bits > MAX_POW_BITS
            || self.query_proof_of_work_bits > MAX_POW_BITS
        {
            return Err(IdentityError::Config(format!(
                "proof-of-work bits are capped at {MAX_POW_BITS}"
            )));
        }
        if self.num_random_codewords == 0 {
            return Err(IdentityError::Config(
                "num_random_codewords must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Rough conjectured soundness in bits.
    pub fn conjectured_security_bits(&self) -> usize {
        self.log_blowup * self.num_queries + self.query_proof_of_work_bits
    }
}
