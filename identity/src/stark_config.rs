//! Plonky3 STARK configurations for the two relations.
//!
//! The commitment relation commits with a hiding Merkle MMCS over Poseidon2
//! and a hiding FRI PCS, so proofs leak nothing about the attribute limbs.
//! The signature relation has no secret wires and uses the Keccak MMCS.
//! Both transcripts are seeded with the circuit and key identities.

use p3_baby_bear::{
    default_babybear_poseidon2_16, default_babybear_poseidon2_24, BabyBear, Poseidon2BabyBear,
};
use p3_challenger::{CanObserve, DuplexChallenger, HashChallenger, SerializingChallenger32};
use p3_commit::ExtensionMmcs;
use p3_dft::Radix2DitParallel;
use p3_field::extension::BinomialExtensionField;
use p3_field::{Field, PrimeCharacteristicRing};
use p3_fri::{FriParameters, HidingFriPcs, TwoAdicFriPcs};
use p3_keccak::{Keccak256Hash, KeccakF};
use p3_koala_bear::KoalaBear;
use p3_merkle_tree::{MerkleTreeHidingMmcs, MerkleTreeMmcs};
use p3_symmetric::{
    CompressionFunctionFromHasher, PaddingFreeSponge, SerializingHasher, TruncatedPermutation,
};
use p3_uni_stark::StarkConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::compiler::CircuitId;
use crate::keys::KeyId;
use crate::params::ProofParameters;

const CHALLENGE_EXTENSION_DEGREE: usize = 4;
const TRANSCRIPT_DOMAIN: &[u8] = b"identity-zk/transcript/v1";

type CommitmentChallenge = BinomialExtensionField<BabyBear, CHALLENGE_EXTENSION_DEGREE>;
type CommitmentPacking = <BabyBear as Field>::Packing;
type CommitmentHash = PaddingFreeSponge<Poseidon2BabyBear<16>, 16, 8, 8>;
type CommitmentCompress = TruncatedPermutation<Poseidon2BabyBear<24>, 2, 8, 24>;
type CommitmentValMmcs = MerkleTreeHidingMmcs<
    CommitmentPacking,
    CommitmentPacking,
    CommitmentHash,
    CommitmentCompress,
    StdRng,
    8,
    4,
>;
type CommitmentChallengeMmcs =
    ExtensionMmcs<BabyBear, CommitmentChallenge, CommitmentValMmcs>;
type CommitmentPcs = HidingFriPcs<
    BabyBear,
    Radix2DitParallel<BabyBear>,
    CommitmentValMmcs,
    CommitmentChallengeMmcs,
    StdRng,
>;
type CommitmentChallenger = DuplexChallenger<BabyBear, Poseidon2BabyBear<24>, 24, 16>;

pub(crate) type CommitmentStarkConfig =
    StarkConfig<CommitmentPcs, CommitmentChallenge, CommitmentChallenger>;

type SignatureChallenge = BinomialExtensionField<KoalaBear, CHALLENGE_EXTENSION_DEGREE>;
type U64Hash = PaddingFreeSponge<KeccakF, 25, 17, 4>;
type FieldHash = SerializingHasher<U64Hash>;
type KeccakCompress = CompressionFunctionFromHasher<U64Hash, 2, 4>;
type SignatureValMmcs = MerkleTreeMmcs<
    [KoalaBear; p3_keccak::VECTOR_LEN],
    [u64; p3_keccak::VECTOR_LEN],
    FieldHash,
    KeccakCompress,
    4,
>;
type SignatureChallengeMmcs = ExtensionMmcs<KoalaBear, SignatureChallenge, SignatureValMmcs>;
type SignaturePcs = TwoAdicFriPcs<
    KoalaBear,
    Radix2DitParallel<KoalaBear>,
    SignatureValMmcs,
    SignatureChallengeMmcs,
>;
type SignatureChallenger = SerializingChallenger32<KoalaBear, HashChallenger<u8, Keccak256Hash, 32>>;

pub(crate) type SignatureStarkConfig =
    StarkConfig<SignaturePcs, SignatureChallenge, SignatureChallenger>;

pub(crate) type CommitmentStarkProof = p3_uni_stark::Proof<CommitmentStarkConfig>;
pub(crate) type SignatureStarkProof = p3_uni_stark::Proof<SignatureStarkConfig>;

/// `domain || circuit_id || key_id`
fn transcript_seed(circuit_id: &CircuitId, key_id: &KeyId) -> Vec<u8> {
    let mut seed = Vec::with_capacity(TRANSCRIPT_DOMAIN.len() + 64);
    seed.extend_from_slice(TRANSCRIPT_DOMAIN);
    seed.extend_from_slice(circuit_id.as_bytes());
    seed.extend_from_slice(key_id.as_bytes());
    seed
}

/// Builds the hiding configuration. `blinding` feeds the Merkle salts and the
/// random codewords; the verifier never draws from it.
pub(crate) fn commitment_config(
    params: &ProofParameters,
    circuit_id: &CircuitId,
    key_id: &KeyId,
    blinding: StdRng,
) -> CommitmentStarkConfig {
    let hash = CommitmentHash::new(default_babybear_poseidon2_16());
    let compress = CommitmentCompress::new(default_babybear_poseidon2_24());
    let val_mmcs = CommitmentValMmcs::new(hash, compress, blinding.clone());
    let challenge_mmcs = CommitmentChallengeMmcs::new(val_mmcs.clone());

    let fri_params = FriParameters {
        log_blowup: params.log_blowup,
        log_final_poly_len: params.log_final_poly_len,
        num_queries: params.num_queries,
        commit_proof_of_work_bits: params.commit_proof_of_work_bits,
        query_proof_of_work_bits: params.query_proof_of_work_bits,
        mmcs: challenge_mmcs,
    };
    let pcs = CommitmentPcs::new(
        Radix2DitParallel::default(),
        val_mmcs,
        fri_params,
        params.num_random_codewords,
        blinding,
    );

    // Two bytes per element keeps the seed embedding injective.
    let seed: Vec<BabyBear> = transcript_seed(circuit_id, key_id)
        .chunks(2)
        .map(|pair| {
            let hi = pair.get(1).copied().unwrap_or_default();
            BabyBear::from_u32(u32::from(pair[0]) | (u32::from(hi) << 8))
        })
        .collect();
    let mut challenger = CommitmentChallenger::new(default_babybear_poseidon2_24());
    challenger.observe_slice(&seed);

    CommitmentStarkConfig::new(pcs, challenger)
}

/// Verifier-side hiding configuration; the blinding source is never used.
pub(crate) fn commitment_verifier_config(
    params: &ProofParameters,
    circuit_id: &CircuitId,
    key_id: &KeyId,
) -> CommitmentStarkConfig {
    commitment_config(params, circuit_id, key_id, StdRng::seed_from_u64(0))
}

pub(crate) fn signature_config(
    params: &ProofParameters,
    circuit_id: &CircuitId,
    key_id: &KeyId,
) -> SignatureStarkConfig {
    let u64_hash = U64Hash::new(KeccakF {});
    let field_hash = FieldHash::new(u64_hash);
    let compress = KeccakCompress::new(u64_hash);
    let val_mmcs = SignatureValMmcs::new(field_hash, compress);
    let challenge_mmcs = SignatureChallengeMmcs::new(val_mmcs.clone());

    let fri_params = FriParameters {
        log_blowup: params.log_blowup,
        log_final_poly_len: params.log_final_poly_len,
        num_queries: params.num_queries,
        commit_proof_of_work_bits: params.commit_proof_of_work_bits,
        query_proof_of_work_bits: params.query_proof_of_work_bits,
        mmcs: challenge_mmcs,
    };
    let pcs = SignaturePcs::new(Radix2DitParallel::default(), val_mmcs, fri_params);
    let challenger =
        SignatureChallenger::from_hasher(transcript_seed(circuit_id, key_id), Keccak256Hash {});

    SignatureStarkConfig::new(pcs, challenger)
}
