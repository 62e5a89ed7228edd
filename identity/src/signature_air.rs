//! Signature-possession AIR.
//!
//! Recomputes `s * G + (-e) * pk` with one shared double-and-add chain: row
//! `i` consumes bit `i` of `s` and of `-e`, adding `2^i G` (preprocessed),
//! `2^i pk` (doubled in-trace) or their sum. The final accumulator must be
//! the public nonce commitment `R`. Bit columns are folded back into 28-bit
//! limbs and matched against the public limbs of `s` and `-e`.
//!
//! Public values: `pk (16) | R (16) | s limbs (9) | -e limbs (9)`.

use curve::{to_coeffs, Affine, BaseField, KoalaBear, ScalarField, COORD_LIMBS};
use p3_air::{
    Air, AirBuilder, AirBuilderWithPublicValues, BaseAir, BaseAirWithPublicValues, PairBuilder,
};
use p3_field::{Field, PrimeCharacteristicRing};
use p3_matrix::{dense::RowMajorMatrix, Matrix};

use crate::field::{Felt, FELT_LIMBS, LIMB_BITS};
use crate::fp8::{assert_fp8_eq, enforce_add, enforce_double, enforce_on_curve, read_fp8, SlopeCols};

pub const SIGNATURE_TRACE_ROWS: usize = 256;
pub const SCALAR_BIT_ROWS: usize = FELT_LIMBS * LIMB_BITS;

pub const PUB_PK_START: usize = 0;
pub const PUB_R_START: usize = PUB_PK_START + 2 * COORD_LIMBS;
pub const PUB_S_LIMBS_START: usize = PUB_R_START + 2 * COORD_LIMBS;
pub const PUB_NEG_E_LIMBS_START: usize = PUB_S_LIMBS_START + FELT_LIMBS;
pub const SIGNATURE_PUBLIC_VALUES: usize = PUB_NEG_E_LIMBS_START + FELT_LIMBS;

pub const DS_ACC_X_START: usize = 0;
pub const DS_ACC_Y_START: usize = DS_ACC_X_START + COORD_LIMBS;
pub const DS_PK_X_START: usize = DS_ACC_Y_START + COORD_LIMBS;
pub const DS_PK_Y_START: usize = DS_PK_X_START + COORD_LIMBS;
pub const DS_PK_DOUBLE_X_START: usize = DS_PK_Y_START + COORD_LIMBS;
pub const DS_PK_DOUBLE_Y_START: usize = DS_PK_DOUBLE_X_START + COORD_LIMBS;
pub const DS_PK_DOUBLE_STEP_START: usize = DS_PK_DOUBLE_Y_START + COORD_LIMBS;
pub const DS_SUM_X_START: usize = DS_PK_DOUBLE_STEP_START + 4 * COORD_LIMBS;
pub const DS_SUM_Y_START: usize = DS_SUM_X_START + COORD_LIMBS;
pub const DS_SUM_STEP_START: usize = DS_SUM_Y_START + COORD_LIMBS;
pub const DS_ADDEND_X_START: usize = DS_SUM_STEP_START + 4 * COORD_LIMBS;
pub const DS_ADDEND_Y_START: usize = DS_ADDEND_X_START + COORD_LIMBS;
pub const DS_ADD_X_START: usize = DS_ADDEND_Y_START + COORD_LIMBS;
pub const DS_ADD_Y_START: usize = DS_ADD_X_START + COORD_LIMBS;
pub const DS_ADD_STEP_START: usize = DS_ADD_Y_START + COORD_LIMBS;
pub const DS_S_BIT_COL: usize = DS_ADD_STEP_START + 4 * COORD_LIMBS;
pub const DS_E_BIT_COL: usize = DS_S_BIT_COL + 1;
pub const DS_ACC_INF_COL: usize = DS_E_BIT_COL + 1;
pub const DS_S_ACC_COL: usize = DS_ACC_INF_COL + 1;
pub const DS_E_ACC_COL: usize = DS_S_ACC_COL + 1;
pub const SIGNATURE_COLUMNS: usize = DS_E_ACC_COL + 1;

pub const PREP_G_X_START: usize = 0;
pub const PREP_G_Y_START: usize = PREP_G_X_START + COORD_LIMBS;
pub const PREP_LIMB_START_COL: usize = PREP_G_Y_START + COORD_LIMBS;
pub const PREP_LIMB_WEIGHT_COL: usize = PREP_LIMB_START_COL + 1;
pub const PREP_ACTIVE_COL: usize = PREP_LIMB_WEIGHT_COL + 1;
pub const PREP_LIMB_SEL_START: usize = PREP_ACTIVE_COL + 1;
pub const SIGNATURE_PREP_COLS: usize = PREP_LIMB_SEL_START + FELT_LIMBS;

#[derive(Clone, Debug)]
pub struct SignatureTrace {
    pub trace: RowMajorMatrix<KoalaBear>,
    /// Accumulator after the last row, i.e. `s * G + (-e) * pk`.
    pub result: Affine,
    /// First chord or tangent step whose denominator vanished, if any.
    pub degenerate_row: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct SignatureAir;

impl SignatureAir {
    pub fn new() -> Self {
        Self
    }
}

impl BaseAir<KoalaBear> for SignatureAir {
    fn width(&self) -> usize {
        SIGNATURE_COLUMNS
    }

    fn preprocessed_trace(&self) -> Option<RowMajorMatrix<KoalaBear>> {
        Some(build_preprocessed_trace())
    }
}

impl BaseAirWithPublicValues<KoalaBear> for SignatureAir {
    fn num_public_values(&self) -> usize {
        SIGNATURE_PUBLIC_VALUES
    }
}

impl<AB> Air<AB> for SignatureAir
where
    AB: AirBuilder<F = KoalaBear> + AirBuilderWithPublicValues + PairBuilder,
{
    fn eval(&self, builder: &mut AB) {
        let main = builder.main();
        let local = main.row_slice(0).expect("signature trace is empty");
        let row = (*local).as_ref();
        let next = main.row_slice(1).expect("signature next row missing");
        let next_row = (*next).as_ref();
        let preprocessed = builder.preprocessed();
        let prep_local = preprocessed
            .row_slice(0)
            .expect("signature preprocessed trace is empty");
        let prep_row = (*prep_local).as_ref();
        let prep_next = preprocessed
            .row_slice(1)
            .expect("signature preprocessed next row missing");
        let prep_next_row = (*prep_next).as_ref();

        let public = builder.public_values().to_vec();
        let pk_public = &public[PUB_PK_START..PUB_R_START];
        let r_public = &public[PUB_R_START..PUB_S_LIMBS_START];
        let s_public = &public[PUB_S_LIMBS_START..PUB_NEG_E_LIMBS_START];
        let neg_e_public = &public[PUB_NEG_E_LIMBS_START..SIGNATURE_PUBLIC_VALUES];

        eval_double_scalar_core(builder, row, next_row, prep_row);

        let limbs = LimbCols {
            bit: DS_S_BIT_COL,
            acc: DS_S_ACC_COL,
        };
        eval_scalar_limbs(builder, row, next_row, prep_row, prep_next_row, limbs, s_public);
        let limbs = LimbCols {
            bit: DS_E_BIT_COL,
            acc: DS_E_ACC_COL,
        };
        eval_scalar_limbs(builder, row, next_row, prep_row, prep_next_row, limbs, neg_e_public);

        let generator = Affine::generator();
        let (g_x, g_y) = (generator.x_coeffs(), generator.y_coeffs());
        let mut first = builder.when_first_row();
        first.assert_one(row[DS_ACC_INF_COL].clone());
        for i in 0..COORD_LIMBS {
            first.assert_eq(row[DS_PK_X_START + i].clone(), pk_public[i]);
            first.assert_eq(row[DS_PK_Y_START + i].clone(), pk_public[COORD_LIMBS + i]);
            first.assert_eq(prep_row[PREP_G_X_START + i].clone(), g_x[i]);
            first.assert_eq(prep_row[PREP_G_Y_START + i].clone(), g_y[i]);
        }

        let mut last = builder.when_last_row();
        last.assert_zero(row[DS_ACC_INF_COL].clone());
        for i in 0..COORD_LIMBS {
            last.assert_eq(row[DS_ACC_X_START + i].clone(), r_public[i]);
            last.assert_eq(row[DS_ACC_Y_START + i].clone(), r_public[COORD_LIMBS + i]);
        }
    }
}

#[derive(Clone, Copy)]
struct LimbCols {
    bit: usize,
    acc: usize,
}

/// Folds a bit column into running 28-bit limbs and checks each completed
/// limb against its public value.
fn eval_scalar_limbs<AB>(
    builder: &mut AB,
    row: &[AB::Var],
    next_row: &[AB::Var],
    prep_row: &[AB::Var],
    prep_next_row: &[AB::Var],
    cols: LimbCols,
    public_limbs: &[AB::PublicVar],
) where
    AB: AirBuilder<F = KoalaBear> + AirBuilderWithPublicValues,
{
    let bit: AB::Expr = row[cols.bit].clone().into();
    let acc: AB::Expr = row[cols.acc].clone().into();
    let weight: AB::Expr = prep_row[PREP_LIMB_WEIGHT_COL].clone().into();
    let active: AB::Expr = prep_row[PREP_ACTIVE_COL].clone().into();

    builder.assert_zero((AB::Expr::ONE - active) * bit.clone());
    builder
        .when_first_row()
        .assert_eq(acc.clone(), weight * bit);

    let next_bit: AB::Expr = next_row[cols.bit].clone().into();
    let next_acc: AB::Expr = next_row[cols.acc].clone().into();
    let next_start: AB::Expr = prep_next_row[PREP_LIMB_START_COL].clone().into();
    let next_weight: AB::Expr = prep_next_row[PREP_LIMB_WEIGHT_COL].clone().into();
    builder.when_transition().assert_eq(
        next_acc,
        (AB::Expr::ONE - next_start) * acc.clone() + next_weight * next_bit,
    );

    for (k, limb) in public_limbs.iter().enumerate() {
        let sel: AB::Expr = prep_row[PREP_LIMB_SEL_START + k].clone().into();
        let target: AB::Expr = (*limb).into();
        builder.assert_zero(sel * (acc.clone() - target));
    }
}

pub(crate) fn eval_double_scalar_core<AB: AirBuilder<F = KoalaBear>>(
    builder: &mut AB,
    row: &[AB::Var],
    next_row: &[AB::Var],
    prep_row: &[AB::Var],
) {
    let s_bit = row[DS_S_BIT_COL].clone();
    let e_bit = row[DS_E_BIT_COL].clone();
    builder.assert_bool(s_bit.clone());
    builder.assert_bool(e_bit.clone());
    builder.assert_bool(row[DS_ACC_INF_COL].clone());

    let s_expr: AB::Expr = s_bit.into();
    let e_expr: AB::Expr = e_bit.into();
    let addend_inf_expr = (AB::Expr::ONE - s_expr.clone()) * (AB::Expr::ONE - e_expr.clone());
    let add_sel = AB::Expr::ONE - addend_inf_expr.clone();

    let mut next = builder.when_transition();
    for i in 0..COORD_LIMBS {
        for (acc_col, add_col) in [
            (DS_ACC_X_START + i, DS_ADD_X_START + i),
            (DS_ACC_Y_START + i, DS_ADD_Y_START + i),
        ] {
            let acc = row[acc_col].clone();
            let acc_add = row[add_col].clone();
            next.assert_eq(
                next_row[acc_col].clone(),
                acc.clone() + add_sel.clone() * (acc_add - acc),
            );
        }
        next.assert_eq(
            next_row[DS_PK_X_START + i].clone(),
            row[DS_PK_DOUBLE_X_START + i].clone(),
        );
        next.assert_eq(
            next_row[DS_PK_Y_START + i].clone(),
            row[DS_PK_DOUBLE_Y_START + i].clone(),
        );
    }

    let acc_inf_expr: AB::Expr = row[DS_ACC_INF_COL].clone().into();
    next.assert_eq(
        next_row[DS_ACC_INF_COL].clone(),
        acc_inf_expr.clone() * addend_inf_expr,
    );

    let g_x = read_fp8::<AB>(prep_row, PREP_G_X_START);
    let g_y = read_fp8::<AB>(prep_row, PREP_G_Y_START);
    let pk_x = read_fp8::<AB>(row, DS_PK_X_START);
    let pk_y = read_fp8::<AB>(row, DS_PK_Y_START);

    let pk_double_x = read_fp8::<AB>(row, DS_PK_DOUBLE_X_START);
    let pk_double_y = read_fp8::<AB>(row, DS_PK_DOUBLE_Y_START);
    enforce_double(
        builder,
        (&pk_x, &pk_y),
        &SlopeCols::read(row, DS_PK_DOUBLE_STEP_START),
        (&pk_double_x, &pk_double_y),
    );

    let sel10 = s_expr.clone() * (AB::Expr::ONE - e_expr.clone());
    let sel01 = (AB::Expr::ONE - s_expr.clone()) * e_expr.clone();
    let sel11 = s_expr * e_expr;

    // Only rows that add both points need pk_i + G_i.
    let sum_x = read_fp8::<AB>(row, DS_SUM_X_START);
    let sum_y = read_fp8::<AB>(row, DS_SUM_Y_START);
    let mut sum_builder = builder.when(sel11.clone());
    enforce_add(
        &mut sum_builder,
        (&pk_x, &pk_y),
        (&g_x, &g_y),
        &SlopeCols::read(row, DS_SUM_STEP_START),
        (&sum_x, &sum_y),
    );

    // addend = [O, G_i, pk_i, G_i + pk_i][s_bit + 2 * e_bit]
    let addend_x = read_fp8::<AB>(row, DS_ADDEND_X_START);
    let addend_y = read_fp8::<AB>(row, DS_ADDEND_Y_START);
    for i in 0..COORD_LIMBS {
        builder.assert_eq(
            addend_x[i].clone(),
            sel10.clone() * g_x[i].clone()
                + sel01.clone() * pk_x[i].clone()
                + sel11.clone() * sum_x[i].clone(),
        );
        builder.assert_eq(
            addend_y[i].clone(),
            sel10.clone() * g_y[i].clone()
                + sel01.clone() * pk_y[i].clone()
                + sel11.clone() * sum_y[i].clone(),
        );
    }

    let acc_x = read_fp8::<AB>(row, DS_ACC_X_START);
    let acc_y = read_fp8::<AB>(row, DS_ACC_Y_START);
    let add_x = read_fp8::<AB>(row, DS_ADD_X_START);
    let add_y = read_fp8::<AB>(row, DS_ADD_Y_START);
    let mut add_builder = builder.when((AB::Expr::ONE - acc_inf_expr.clone()) * add_sel.clone());
    enforce_add(
        &mut add_builder,
        (&acc_x, &acc_y),
        (&addend_x, &addend_y),
        &SlopeCols::read(row, DS_ADD_STEP_START),
        (&add_x, &add_y),
    );

    let mut init_builder = builder.when(acc_inf_expr.clone() * add_sel.clone());
    assert_fp8_eq(&mut init_builder, &add_x, &addend_x);
    assert_fp8_eq(&mut init_builder, &add_y, &addend_y);

    let mut acc_curve_builder = builder.when(AB::Expr::ONE - acc_inf_expr);
    enforce_on_curve(&mut acc_curve_builder, row, DS_ACC_X_START, DS_ACC_Y_START);
    let mut addend_curve_builder = builder.when(add_sel);
    enforce_on_curve(
        &mut addend_curve_builder,
        row,
        DS_ADDEND_X_START,
        DS_ADDEND_Y_START,
    );
    enforce_on_curve(builder, row, DS_PK_X_START, DS_PK_Y_START);
}

/// Generator powers `2^i G` plus the limb bookkeeping selectors.
pub(crate) fn build_preprocessed_trace() -> RowMajorMatrix<KoalaBear> {
    let powers = Affine::generator_powers();
    let mut values = KoalaBear::zero_vec(SIGNATURE_TRACE_ROWS * SIGNATURE_PREP_COLS);

    for (row_idx, row) in values.chunks_exact_mut(SIGNATURE_PREP_COLS).enumerate() {
        write_point(row, PREP_G_X_START, &powers[row_idx]);
        if row_idx < SCALAR_BIT_ROWS {
            let bit_in_limb = row_idx % LIMB_BITS;
            row[PREP_LIMB_START_COL] = KoalaBear::from_bool(bit_in_limb == 0);
            row[PREP_LIMB_WEIGHT_COL] = KoalaBear::from_u32(1 << bit_in_limb);
            row[PREP_ACTIVE_COL] = KoalaBear::ONE;
            if bit_in_limb == LIMB_BITS - 1 {
                row[PREP_LIMB_SEL_START + row_idx / LIMB_BITS] = KoalaBear::ONE;
            }
        }
    }

    RowMajorMatrix::new(values, SIGNATURE_PREP_COLS)
}

/// Lays out the double-scalar chain for `s * G + neg_e * pk`.
pub fn build_signature_trace(pk: &Affine, s: &Felt, neg_e: &Felt) -> SignatureTrace {
    let generators = Affine::generator_powers();
    let (s, neg_e) = (s.as_scalar(), neg_e.as_scalar());
    let mut values = KoalaBear::zero_vec(SIGNATURE_TRACE_ROWS * SIGNATURE_COLUMNS);
    let mut acc = Affine::INFINITY;
    let mut pk_current = *pk;
    let mut s_acc = KoalaBear::ZERO;
    let mut e_acc = KoalaBear::ZERO;
    let mut degenerate_row = None;

    for (row_idx, row) in values.chunks_exact_mut(SIGNATURE_COLUMNS).enumerate() {
        let g_current = generators[row_idx];
        let s_bit = scalar_bit(s, row_idx);
        let e_bit = scalar_bit(neg_e, row_idx);

        write_point(row, DS_ACC_X_START, &acc);
        write_point(row, DS_PK_X_START, &pk_current);

        let pk_double = pk_current.double();
        write_point(row, DS_PK_DOUBLE_X_START, &pk_double);
        let mut ok = fill_double_step(row, DS_PK_DOUBLE_STEP_START, &pk_current);

        let addend = match (s_bit, e_bit) {
            (false, false) => Affine::INFINITY,
            (true, false) => g_current,
            (false, true) => pk_current,
            (true, true) => {
                let sum = pk_current + g_current;
                write_point(row, DS_SUM_X_START, &sum);
                ok &= fill_add_step(row, DS_SUM_STEP_START, &pk_current, &g_current);
                sum
            }
        };
        write_point(row, DS_ADDEND_X_START, &addend);

        let next_acc = acc + addend;
        if !acc.is_infinity() && !addend.is_infinity() {
            write_point(row, DS_ADD_X_START, &next_acc);
            ok &= fill_add_step(row, DS_ADD_STEP_START, &acc, &addend);
        } else if acc.is_infinity() && !addend.is_infinity() {
            write_point(row, DS_ADD_X_START, &addend);
        } else {
            write_point(row, DS_ADD_X_START, &acc);
        }

        // Past the last limb the accumulators hold their final value.
        if row_idx < SCALAR_BIT_ROWS {
            let bit_in_limb = row_idx % LIMB_BITS;
            if bit_in_limb == 0 {
                s_acc = KoalaBear::ZERO;
                e_acc = KoalaBear::ZERO;
            }
            let weight = KoalaBear::from_u32(1 << bit_in_limb);
            s_acc += weight * KoalaBear::from_bool(s_bit);
            e_acc += weight * KoalaBear::from_bool(e_bit);
        }

        row[DS_S_BIT_COL] = KoalaBear::from_bool(s_bit);
        row[DS_E_BIT_COL] = KoalaBear::from_bool(e_bit);
        row[DS_ACC_INF_COL] = KoalaBear::from_bool(acc.is_infinity());
        row[DS_S_ACC_COL] = s_acc;
        row[DS_E_ACC_COL] = e_acc;

        if !ok && degenerate_row.is_none() {
            degenerate_row = Some(row_idx);
        }
        acc = next_acc;
        pk_current = pk_double;
    }

    SignatureTrace {
        trace: RowMajorMatrix::new(values, SIGNATURE_COLUMNS),
        result: acc,
        degenerate_row,
    }
}

/// Lowers `(pk, R, s, -e)` into the public-value layout of [`SignatureAir`].
pub fn signature_public_values(
    pk: &Affine,
    r: &Affine,
    s: &Felt,
    neg_e: &Felt,
) -> Vec<KoalaBear> {
    let mut out = Vec::with_capacity(SIGNATURE_PUBLIC_VALUES);
    out.extend(pk.x_coeffs());
    out.extend(pk.y_coeffs());
    out.extend(r.x_coeffs());
    out.extend(r.y_coeffs());
    out.extend(s.to_limbs::<KoalaBear>());
    out.extend(neg_e.to_limbs::<KoalaBear>());
    out
}

/// Re-reads the trace cells that the boundary and limb constraints touch.
pub(crate) fn check_signature_trace(
    trace: &SignatureTrace,
    public: &[KoalaBear],
) -> Result<(), String> {
    if public.len() != SIGNATURE_PUBLIC_VALUES {
        return Err(format!(
            "expected {SIGNATURE_PUBLIC_VALUES} public values, found {}",
            public.len()
        ));
    }
    if let Some(row) = trace.degenerate_row {
        return Err(format!("point addition degenerates at row {row}"));
    }
    if trace.result.is_infinity() {
        return Err("double scalar multiplication ends at infinity".into());
    }
    let r = [trace.result.x_coeffs(), trace.result.y_coeffs()].concat();
    if r[..] != public[PUB_R_START..PUB_S_LIMBS_START] {
        return Err("s * G - e * pk does not reach the nonce commitment".into());
    }

    let rows: Vec<&[KoalaBear]> = trace.trace.values.chunks_exact(SIGNATURE_COLUMNS).collect();
    if rows.len() != SIGNATURE_TRACE_ROWS {
        return Err(format!("signature trace has {} rows", rows.len()));
    }
    if rows[0][DS_PK_X_START..DS_PK_X_START + 2 * COORD_LIMBS] != public[PUB_PK_START..PUB_R_START] {
        return Err("first row does not hold the public key".into());
    }
    let last = rows[SIGNATURE_TRACE_ROWS - 1];
    if last[DS_ACC_X_START..DS_ACC_X_START + 2 * COORD_LIMBS] != public[PUB_R_START..PUB_S_LIMBS_START] {
        return Err("last row accumulator is not the nonce commitment".into());
    }
    for k in 0..FELT_LIMBS {
        let row = rows[k * LIMB_BITS + LIMB_BITS - 1];
        if row[DS_S_ACC_COL] != public[PUB_S_LIMBS_START + k] {
            return Err(format!("bits of s do not reproduce limb {k}"));
        }
        if row[DS_E_ACC_COL] != public[PUB_NEG_E_LIMBS_START + k] {
            return Err(format!("bits of -e do not reproduce limb {k}"));
        }
    }
    Ok(())
}

fn scalar_bit(scalar: &ScalarField, index: usize) -> bool {
    index < SCALAR_BIT_ROWS && scalar.bit(index)
}

fn write_point(row: &mut [KoalaBear], start: usize, point: &Affine) {
    if point.is_infinity() {
        return;
    }
    row[start..start + COORD_LIMBS].copy_from_slice(&point.x_coeffs());
    row[start + COORD_LIMBS..start + 2 * COORD_LIMBS].copy_from_slice(&point.y_coeffs());
}

fn write_base(row: &mut [KoalaBear], start: usize, value: BaseField) {
    row[start..start + COORD_LIMBS].copy_from_slice(&to_coeffs(&value));
}

/// Writes num/den/inv/slope; `false` if the denominator is zero.
fn write_step(row: &mut [KoalaBear], start: usize, num: BaseField, den: BaseField) -> bool {
    let inv = den.try_inverse();
    let ok = inv.is_some();
    let inv = inv.unwrap_or_default();
    write_base(row, start, num);
    write_base(row, start + COORD_LIMBS, den);
    write_base(row, start + 2 * COORD_LIMBS, inv);
    write_base(row, start + 3 * COORD_LIMBS, num * inv);
    ok
}

fn fill_add_step(row: &mut [KoalaBear], start: usize, lhs: &Affine, rhs: &Affine) -> bool {
    write_step(row, start, rhs.y - lhs.y, rhs.x - lhs.x)
}

fn fill_double_step(row: &mut [KoalaBear], start: usize, point: &Affine) -> bool {
    let num = point.x.square() * BaseField::from(KoalaBear::from_u32(3)) + curve_a();
    write_step(row, start, num, point.y.double())
}

fn curve_a() -> BaseField {
    let mut coeffs = [KoalaBear::ZERO; COORD_LIMBS];
    coeffs[1] = KoalaBear::from_u32(3);
    curve::from_coeffs(coeffs)
}
