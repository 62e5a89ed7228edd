//! Signing and verifying keys for the Schnorr signature scheme.

use curve::{Affine, Group, ScalarField};
use p3_baby_bear::BabyBear;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::SchnorrError;
use crate::signatures::{Signature, hash_challenge};

/// A secret signing key: a non-zero scalar, wiped from memory on drop.
///
/// # Example
///
/// ```
/// use schnorr::SigningKey;
///
/// let mut rng = rand::rng();
/// let signing_key = SigningKey::random(&mut rng);
/// let _verifying_key = signing_key.verifying_key();
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    scalar: ScalarField,
}

/// A public verifying key `pk = sk * G`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    point: Affine,
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

impl SigningKey {
    /// Samples a fresh non-zero key.
    pub fn random<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let scalar = ScalarField::random(rng);
            if !scalar.is_zero() {
                return Self { scalar };
            }
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            point: <Affine as Group>::mul_generator(&self.scalar),
        }
    }

    /// Signs `msg`:
    /// 1. sample a nonce `k` and commit `R = k * G`
    /// 2. `e = H(R || pk || msg)`
    /// 3. `s = k + e * sk`
    ///
    /// ```
    /// use schnorr::SigningKey;
    /// use p3_baby_bear::BabyBear;
    /// use p3_field::PrimeCharacteristicRing;
    ///
    /// let mut rng = rand::rng();
    /// let signing_key = SigningKey::random(&mut rng);
    /// let message = [BabyBear::from_u32(1), BabyBear::from_u32(2)];
    /// let signature = signing_key.sign(&mut rng, &message).expect("signing failed");
    /// assert!(signing_key.verifying_key().verify(&message, &signature).expect("verify"));
    /// ```
    pub fn sign<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        msg: &[BabyBear],
    ) -> Result<Signature, SchnorrError> {
        let mut nonce = ScalarField::random(rng);
        let r = <Affine as Group>::mul_generator(&nonce);
        let pk = self.verifying_key();

        let e = hash_challenge(&r, &pk.point, msg)?;
        let s = nonce + e * self.scalar;
        nonce.zeroize();

        Ok(Signature { r, s })
    }
}

impl VerifyingKey {
    /// Wraps a curve point, rejecting infinity and off-curve coordinates.
    pub fn from_affine(point: Affine) -> Result<Self, SchnorrError> {
        if point.is_infinity() {
            return Err(SchnorrError::InvalidPoint);
        }
        if !point.is_on_curve() {
            return Err(SchnorrError::NotOnCurve);
        }
        Ok(Self { point })
    }

    pub fn as_affine(&self) -> Affine {
        self.point
    }

    /// Checks `s * G - e * pk == R`.
    ///
    /// `Ok(false)` for a well-formed but invalid signature;
    /// [`SchnorrError::InvalidPoint`] if `pk` or `R` is the point at infinity.
    pub fn verify(&self, msg: &[BabyBear], sig: &Signature) -> Result<bool, SchnorrError> {
        if self.point.is_infinity() || sig.r.is_infinity() {
            return Err(SchnorrError::InvalidPoint);
        }

        let e = hash_challenge(&sig.r, &self.point, msg)?;
        let lhs = Affine::generator().double_scalar_mul(&sig.s, &self.point, &-e);

        Ok(lhs == sig.r)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SchnorrError> {
        bincode::serialize(&self.point).map_err(|err| SchnorrError::Encoding {
            kind: "verifying key",
            message: err.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SchnorrError> {
        let point: Affine = bincode::deserialize(bytes).map_err(|err| SchnorrError::Encoding {
            kind: "verifying key",
            message: err.to_string(),
        })?;
        Self::from_affine(point)
    }
}

impl From<&SigningKey> for VerifyingKey {
    fn from(sk: &SigningKey) -> Self {
        sk.verifying_key()
    }
}
