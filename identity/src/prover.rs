use std::time::Instant;

use p3_matrix::Matrix;
use p3_uni_stark::{prove_with_preprocessed, setup_preprocessed};
use p3_util::log2_strict_usize;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use tracing::{debug, info};

use crate::commitment_air::AttributeCommitmentAir;
use crate::compiler::{ConstraintSystem, Relation};
use crate::error::{IdentityError, IdentityResult};
use crate::keys::ProvingKey;
use crate::proof::{encode_stark, Proof};
use crate::signature_air::SignatureAir;
use crate::stark_config::{commitment_config, signature_config, SignatureStarkConfig};
use crate::witness::{Witness, WitnessTrace};

/// Proves `witness` under `pk`, drawing blinding from the thread RNG.
pub fn prove(cs: &ConstraintSystem, pk: &ProvingKey, witness: Witness) -> IdentityResult<Proof> {
    prove_with_rng(cs, pk, witness, &mut rand::rng())
}

/// Proves `witness` under `pk`.
///
/// The key and the witness must both belong to `cs`; anything else is a
/// [`IdentityError::KeyCircuitMismatch`]. Two calls on the same inputs yield
/// different proofs because the commitment relation is blinded from `rng`.
pub fn prove_with_rng<R: RngCore + CryptoRng>(
    cs: &ConstraintSystem,
    pk: &ProvingKey,
    mut witness: Witness,
    rng: &mut R,
) -> IdentityResult<Proof> {
    pk.ensure_circuit(cs)?;
    if witness.circuit_id() != cs.id() {
        return Err(IdentityError::mismatch(format!(
            "witness was built for circuit {}, not {}",
            witness.circuit_id().short(),
            cs.id().short()
        )));
    }
    let public = witness.public_inputs().clone();
    if public.relation() != cs.relation() || public.num_wires() != cs.num_public_values() {
        return Err(IdentityError::mismatch("public inputs do not fit the circuit"));
    }
    let trace = witness
        .take_trace()
        .ok_or_else(|| IdentityError::unsatisfied("witness has already been proven"))?;

    let start = Instant::now();
    let stark_proof = match (cs.relation(), trace) {
        (Relation::AttributeCommitment, WitnessTrace::BabyBear(trace)) => {
            let config = commitment_config(
                cs.parameters(),
                &cs.id(),
                &pk.key_id(),
                StdRng::from_rng(rng),
            );
            let values = public.baby_bear_values()?;
            debug!(rows = trace.height(), columns = trace.width(), "proving commitment trace");
            let proof = p3_uni_stark::prove(&config, &AttributeCommitmentAir::new(), trace, &values);
            encode_stark(&proof)?
        }
        (Relation::SignaturePossession, WitnessTrace::KoalaBear(trace)) => {
            let config = signature_config(cs.parameters(), &cs.id(), &pk.key_id());
            let air = SignatureAir::new();
            let values = public.koala_bear_values()?;
            let degree_bits = log2_strict_usize(trace.height());
            let (preprocessed, _) =
                setup_preprocessed::<SignatureStarkConfig, _>(&config, &air, degree_bits)
                    .ok_or_else(|| {
                        IdentityError::unsatisfied("signature circuit has no preprocessed columns")
                    })?;
            debug!(rows = trace.height(), columns = trace.width(), "proving signature trace");
            let proof = prove_with_preprocessed(&config, &air, trace, &values, Some(&preprocessed));
            encode_stark(&proof)?
        }
        (relation, _) => {
            return Err(IdentityError::FieldMismatch(format!(
                "witness trace is not over the {} field of {relation}",
                relation.native_field()
            )))
        }
    };

    info!(
        circuit = %cs.id().short(),
        key = %pk.key_id().short(),
        relation = %cs.relation(),
        bytes = stark_proof.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generated proof"
    );

    Ok(Proof::new(cs.relation(), cs.id(), pk.key_id(), stark_proof))
}
