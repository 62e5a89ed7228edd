use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use p3_uni_stark::{setup_preprocessed, verify_with_preprocessed};
use p3_util::log2_strict_usize;
use tracing::{debug, info};

use crate::commitment_air::AttributeCommitmentAir;
use crate::compiler::Relation;
use crate::error::{IdentityError, IdentityResult};
use crate::keys::VerifyingKey;
use crate::proof::{decode_stark, Proof};
use crate::signature_air::{SignatureAir, SIGNATURE_TRACE_ROWS};
use crate::stark_config::{
    commitment_verifier_config, signature_config, CommitmentStarkProof, SignatureStarkConfig,
    SignatureStarkProof,
};
use crate::witness::PublicInputs;

/// Checks `proof` against `vk` and `public`.
///
/// `Ok(false)` for a well-formed proof that does not verify, including one
/// produced under another circuit or key pair. Errors are reserved for
/// public inputs that cannot belong to `vk` and for undecodable proofs.
pub fn verify(proof: &Proof, vk: &VerifyingKey, public: &PublicInputs) -> IdentityResult<bool> {
    if public.relation() != vk.relation() || public.field() != vk.field() {
        return Err(IdentityError::mismatch(format!(
            "{} inputs over {} given to a {} key over {}",
            public.relation(),
            public.field(),
            vk.relation(),
            vk.field()
        )));
    }
    if public.num_wires() != vk.num_public_values() {
        return Err(IdentityError::mismatch(format!(
            "key expects {} public values, found {}",
            vk.num_public_values(),
            public.num_wires()
        )));
    }

    if proof.relation() != vk.relation()
        || proof.circuit_id() != vk.circuit_id()
        || proof.key_id() != vk.key_id()
    {
        debug!(
            proof_circuit = %proof.circuit_id().short(),
            key_circuit = %vk.circuit_id().short(),
            proof_key = %proof.key_id().short(),
            key = %vk.key_id().short(),
            "proof was produced under another circuit or key pair"
        );
        return Ok(false);
    }

    let start = Instant::now();
    // A proof that decodes but has the wrong shape can trip assertions in the backend.
    let checked = catch_unwind(AssertUnwindSafe(|| -> IdentityResult<Result<(), String>> {
        match vk.relation() {
            Relation::AttributeCommitment => {
                let stark: CommitmentStarkProof = decode_stark(proof.stark_proof())?;
                let config =
                    commitment_verifier_config(vk.parameters(), &vk.circuit_id(), &vk.key_id());
                let values = public.baby_bear_values()?;
                Ok(
                    p3_uni_stark::verify(&config, &AttributeCommitmentAir::new(), &stark, &values)
                        .map_err(|err| format!("{err:?}")),
                )
            }
            Relation::SignaturePossession => {
                let stark: SignatureStarkProof = decode_stark(proof.stark_proof())?;
                let config = signature_config(vk.parameters(), &vk.circuit_id(), &vk.key_id());
                let air = SignatureAir::new();
                let values = public.koala_bear_values()?;
                let degree_bits = log2_strict_usize(SIGNATURE_TRACE_ROWS);
                let (_, preprocessed) =
                    setup_preprocessed::<SignatureStarkConfig, _>(&config, &air, degree_bits)
                        .ok_or_else(|| {
                            IdentityError::mismatch("signature circuit has no preprocessed columns")
                        })?;
                Ok(
                    verify_with_preprocessed(&config, &air, &stark, &values, Some(&preprocessed))
                        .map_err(|err| format!("{err:?}")),
                )
            }
        }
    }));
    let outcome = checked.unwrap_or_else(|_| Ok(Err("backend panicked on the proof".into())))?;

    match outcome {
        Ok(()) => {
            info!(
                circuit = %vk.circuit_id().short(),
                key = %vk.key_id().short(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "proof verified"
            );
            Ok(true)
        }
        Err(reason) => {
            debug!(circuit = %vk.circuit_id().short(), %reason, "proof rejected");
            Ok(false)
        }
    }
}
