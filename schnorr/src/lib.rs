//! Schnorr signatures over the KoalaBear Fp8 curve.
//!
//! - keys and nonces are scalars of the 248-bit prime-order group
//! - the Fiat-Shamir challenge is a Poseidon2-BabyBear sponge over `R || pk || msg`
//! - messages are sequences of BabyBear field elements
//!
//! ```
//! use schnorr::{SigningKey, VerifyingKey};
//! use p3_baby_bear::BabyBear;
//! use p3_field::PrimeCharacteristicRing;
//!
//! let mut rng = rand::rng();
//! let signing_key = SigningKey::random(&mut rng);
//! let verifying_key = VerifyingKey::from(&signing_key);
//!
//! let message = [BabyBear::from_u32(1), BabyBear::from_u32(2), BabyBear::from_u32(3)];
//! let signature = signing_key.sign(&mut rng, &message).expect("signing failed");
//! assert!(verifying_key.verify(&message, &signature).expect("verification failed"));
//! ```
//!
//! Every signature must use a fresh nonce; always pass a cryptographically
//! secure RNG.

mod constants;
mod errors;
mod keys;
mod signatures;

#[cfg(test)]
mod tests;

pub use constants::POINT_ENCODING_LEN;
pub use errors::SchnorrError;
pub use keys::{SigningKey, VerifyingKey};
pub use signatures::{Signature, encode_point, hash_challenge};
