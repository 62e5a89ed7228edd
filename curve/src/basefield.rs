use p3_field::extension::BinomialExtensionField;
use p3_field::BasedVectorSpace;
use p3_koala_bear::KoalaBear;

/// KoalaBear degree-8 extension field
pub type BaseField = BinomialExtensionField<KoalaBear, 8>;

/// Number of KoalaBear coefficients in one coordinate.
pub const COORD_LIMBS: usize = 8;

/// Builds an extension element from its coefficients, lowest power first.
#[inline]
pub fn from_coeffs(coeffs: [KoalaBear; COORD_LIMBS]) -> BaseField {
    BaseField::from_basis_coefficients_fn(|i| coeffs[i])
}

/// Splits an extension element into its coefficients, lowest power first.
#[inline]
pub fn to_coeffs(value: &BaseField) -> [KoalaBear; COORD_LIMBS] {
    let slice = value.as_basis_coefficients_slice();
    core::array::from_fn(|i| slice[i])
}
