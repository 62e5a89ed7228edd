//! Constants used by the Schnorr challenge hash and encodings.

/// Width of the Poseidon2 permutation behind the challenge sponge.
pub(crate) const POSEIDON2_WIDTH: usize = 16;

/// Elements absorbed per permutation call.
pub(crate) const POSEIDON2_RATE: usize = 8;

/// Digest length in BabyBear elements.
pub(crate) const POSEIDON2_OUT: usize = 8;

/// Bits taken from every digest element when packing the challenge.
pub(crate) const DIGEST_ELEMENT_BITS: usize = 31;

/// A KoalaBear coefficient does not fit BabyBear injectively, so it is
/// absorbed as two 16-bit halves.
pub(crate) const HALF_BITS: u32 = 16;

/// BabyBear elements used to absorb one curve point (2 coordinates x 8 coefficients x 2 halves).
pub const POINT_ENCODING_LEN: usize = 32;
