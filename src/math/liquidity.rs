use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::{Rounding, div_round, ensure_non_negative};
use crate::error::{DatumError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityOutcome {
    pub issued_lp: BigInt,
    pub next_total_lp: BigInt,
    /// Portion of `deposit_a` the pool does not take.
    pub refund_a: BigInt,
    /// Portion of `deposit_b` the pool does not take.
    pub refund_b: BigInt,
    /// Share of the pool the depositor holds afterwards.
    pub pool_share_after: BigRational,
}

/// Initial LP supply of a new pool: `⌊√(a · b)⌋`.
pub fn first_issuance(a: &BigInt, b: &BigInt) -> Result<BigInt> {
    ensure_non_negative("first deposit a", a)?;
    ensure_non_negative("first deposit b", b)?;
    Ok((a * b).sqrt())
}

/// LP tokens issued for a proportional deposit.
///
/// The side with the smaller `deposit / reserve` ratio limits the deposit.
/// The other side is charged the rounded-up amount matching that ratio and
/// the remainder is refunded. A pool with no LP supply issues through
/// [`first_issuance`] instead.
pub fn liquidity_issuance(
    deposit_a: &BigInt,
    deposit_b: &BigInt,
    reserve_a: &BigInt,
    reserve_b: &BigInt,
    total_lp: &BigInt,
) -> Result<LiquidityOutcome> {
    ensure_non_negative("deposit a", deposit_a)?;
    ensure_non_negative("deposit b", deposit_b)?;
    ensure_non_negative("reserve a", reserve_a)?;
    ensure_non_negative("reserve b", reserve_b)?;
    ensure_non_negative("total lp", total_lp)?;

    if total_lp.is_zero() {
        let issued_lp = first_issuance(deposit_a, deposit_b)?;
        if issued_lp.is_zero() {
            return Err(DatumError::domain("initial deposit issues no liquidity"));
        }
        return Ok(LiquidityOutcome {
            next_total_lp: issued_lp.clone(),
            issued_lp,
            refund_a: BigInt::zero(),
            refund_b: BigInt::zero(),
            pool_share_after: BigRational::one(),
        });
    }
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(DatumError::domain("pool with LP supply has an empty reserve"));
    }

    // deposit_a / reserve_a <= deposit_b / reserve_b, cross-multiplied
    let a_limits = deposit_a * reserve_b <= deposit_b * reserve_a;
    let (issued_lp, refund_a, refund_b) = if a_limits {
        let issued = div_round(&(deposit_a * total_lp), reserve_a, Rounding::Down)?;
        let charged_b = div_round(&(deposit_a * reserve_b), reserve_a, Rounding::Up)?;
        (issued, BigInt::zero(), deposit_b - charged_b)
    } else {
        let issued = div_round(&(deposit_b * total_lp), reserve_b, Rounding::Down)?;
        let charged_a = div_round(&(deposit_b * reserve_a), reserve_b, Rounding::Up)?;
        (issued, deposit_a - charged_a, BigInt::zero())
    };

    if issued_lp.is_zero() {
        return Err(DatumError::domain(format!(
            "deposit of {deposit_a}/{deposit_b} contributes no liquidity"
        )));
    }

    let next_total_lp = total_lp + &issued_lp;
    let pool_share_after = BigRational::new(issued_lp.clone(), next_total_lp.clone());
    Ok(LiquidityOutcome {
        issued_lp,
        next_total_lp,
        refund_a,
        refund_b,
        pool_share_after,
    })
}
