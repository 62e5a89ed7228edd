//! # Zero-knowledge identity attestation
//!
//! Proves that the prover knows a nine-attribute identity tuple whose
//! Poseidon2 commitment equals a public value, without revealing any of the
//! attributes. A second relation proves possession of a valid Schnorr
//! signature from the `schnorr` crate on a public message.
//!
//! ## Lifecycle
//!
//! 1. declare a circuit and [`compile`] it into a [`ConstraintSystem`]
//! 2. run [`setup`] once to obtain a [`ProvingKey`] and [`VerifyingKey`]
//! 3. build a [`Witness`] with [`WitnessBuilder`]
//! 4. [`prove`], ship the [`Proof`] bytes, and [`verify`] on the other side
//!
//! ```
//! use identity_zk::{
//!     compile, prove, setup, verify, AttributeSchema, CircuitDeclaration, CommitmentHasher,
//!     IdentityRecord, ProofParameters, WitnessBuilder,
//! };
//!
//! let declaration = CircuitDeclaration::attribute_commitment(AttributeSchema::identity())
//!     .with_parameters(ProofParameters::testing());
//! let cs = compile(&declaration)?;
//! let (pk, vk) = setup(&cs, &mut rand::rng())?;
//!
//! let record = IdentityRecord {
//!     owner: "0x52908400098527886e0f7030069857d2e4169ee7".into(),
//!     is_github: true,
//!     github_stars: 203,
//!     is_twitter: true,
//!     twitter_followers: 300400,
//!     total_staked: 100000,
//!     balance: 1000,
//!     txn_frequency: 100,
//!     last_updated: 1739983740,
//! };
//! let attributes = record.to_attributes(&AttributeSchema::identity())?;
//! let commitment = CommitmentHasher::new().hash_attributes(&attributes)?;
//!
//! let witness = WitnessBuilder::new(&cs).build(&attributes, &commitment)?;
//! let public = witness.public_inputs().clone();
//! let proof = prove(&cs, &pk, witness)?;
//! assert!(verify(&proof, &vk, &public)?);
//! # Ok::<(), identity_zk::IdentityError>(())
//! ```
//!
//! ## Fields
//!
//! Attribute values are elements of the 248-bit curve scalar field, carried
//! as nine 28-bit limbs. The commitment circuit runs over BabyBear and the
//! signature circuit over KoalaBear, the base field of the curve.
//!
//! ## Artifacts
//!
//! Constraint systems, keys, public inputs and proofs implement [`Artifact`].
//! Every artifact carries the identity of the circuit it belongs to, and
//! loading checks a kind tag and a checksum before anything else.

mod artifact;
pub mod commitment_air;
mod compiler;
mod error;
mod field;
mod fp8;
mod hasher;
mod keys;
mod params;
mod proof;
mod prover;
mod record;
mod schema;
pub mod signature_air;
mod stark_config;
mod verifier;
mod witness;

pub use artifact::Artifact;
pub use commitment_air::{AttributeCommitmentAir, CommitmentTrace};
pub use compiler::{
    compile, CircuitDeclaration, CircuitDescriptor, CircuitId, ConstraintSystem, HashParameters,
    Relation,
};
pub use error::{IdentityError, IdentityResult};
pub use field::{Felt, FieldId, FELT_LIMBS, LIMB_BITS};
pub use hasher::{flatten_attributes, Commitment, CommitmentHasher, COMMITMENT_WIDTH};
pub use keys::{setup, KeyId, ProvingKey, VerifyingKey};
pub use params::ProofParameters;
pub use proof::Proof;
pub use prover::{prove, prove_with_rng};
pub use record::IdentityRecord;
pub use schema::{
    AttributeSchema, AttributeTuple, AttributeTupleBuilder, IDENTITY_SLOTS, IDENTITY_SLOT_COUNT,
};
pub use signature_air::SignatureAir;
pub use verifier::verify;
pub use witness::{PublicInputs, SignatureMaterial, Witness, WitnessBuilder};

pub use schnorr::{Signature, SigningKey, VerifyingKey as PublicKey};
