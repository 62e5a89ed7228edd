//! Commits to an identity record, proves knowledge of its opening and checks
//! the proof. Pass a JSON record path as the first argument to use your own.
//!
//! ```text
//! RUST_LOG=identity_zk=debug cargo run --release --example prove_identity
//! ```

use std::time::Instant;

use identity_zk::{
    compile, prove, setup, verify, Artifact, AttributeSchema, CircuitDeclaration,
    CommitmentHasher, IdentityRecord, Proof, ProofParameters, WitnessBuilder,
};
use tracing_subscriber::EnvFilter;

const SAMPLE_RECORD: &str = r#"{
    "owner": "0x52908400098527886e0f7030069857d2e4169ee7",
    "is_github": true,
    "github_stars": 203,
    "is_twitter": true,
    "twitter_followers": 300400,
    "total_staked": 100000,
    "balance": 1000,
    "txn_frequency": 100,
    "last_updated": 1739983740
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_RECORD.to_owned(),
    };
    let record: IdentityRecord = serde_json::from_str(&json)?;

    let schema = AttributeSchema::identity();
    let cs = compile(
        &CircuitDeclaration::attribute_commitment(schema.clone())
            .with_parameters(ProofParameters::default()),
    )?;
    let (pk, vk) = setup(&cs, &mut rand::rng())?;

    let attributes = record.to_attributes(&schema)?;
    let commitment = CommitmentHasher::new().hash_attributes(&attributes)?;
    println!("Circuit: {}", cs.id());
    println!("Commitment: {commitment}");

    let prove_start = Instant::now();
    let witness = WitnessBuilder::new(&cs).build(&attributes, &commitment)?;
    let public = witness.public_inputs().clone();
    let proof = prove(&cs, &pk, witness)?;
    let bytes = proof.to_bytes()?;
    let prove_time = prove_start.elapsed();

    let verify_start = Instant::now();
    let valid = verify(&Proof::from_bytes(&bytes)?, &vk, &public)?;
    let verify_time = verify_start.elapsed();

    println!("Proving time: {prove_time:?}");
    println!("Proof size (bytes): {}", bytes.len());
    println!("Verification time: {verify_time:?}");
    println!("Valid: {valid}");
    Ok(())
}
