//! Prime-order elliptic curve over the KoalaBear degree-8 extension field.
//!
//! The curve `y^2 = x^3 + 3u*x + 42639` has prime order
//! `q = 0xf06e44682c2aa440f5f26a5ae1748ff85ccc2efc3068faf2154ff8a2e94d81`
//! (248 bits) and cofactor 1. Points are kept in affine form; the scalar
//! field doubles as the protocol field of the identity circuits.

mod affine;
mod basefield;
mod group;
mod scalarfield;

pub use affine::Affine;
pub use basefield::{from_coeffs, to_coeffs, BaseField, COORD_LIMBS};
pub use group::{Group, ScalarBits};
pub use p3_koala_bear::KoalaBear;
pub use scalarfield::{ScalarField, SCALAR_BITS};
