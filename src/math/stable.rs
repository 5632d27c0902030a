//! Multi-asset stableswap invariant (Curve style).
//!
//! ```text
//! Ann · Σx + D = Ann · D + D^(n+1) / (n^n · Πx)        Ann = A · n
//! ```
//!
//! `D` and the post-swap balance `y` are both found by Newton iteration on
//! integers, stopping once consecutive iterates differ by at most one unit.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use super::{FeeFraction, Rounding, div_round, ensure_non_negative};
use crate::error::{DatumError, Result};

/// Iteration bound for both Newton solvers.
pub const MAX_ROUNDS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableSwapOutcome {
    pub output: BigInt,
    pub lp_fee: BigInt,
    pub next_balances: Vec<BigInt>,
    pub invariant: BigInt,
}

fn validate(amplification: &BigInt, balances: &[BigInt]) -> Result<()> {
    if balances.len() < 2 {
        return Err(DatumError::domain(format!(
            "stable pools hold at least two assets, got {}",
            balances.len()
        )));
    }
    if !amplification.is_positive() {
        return Err(DatumError::domain(format!(
            "amplification must be positive, got {amplification}"
        )));
    }
    for balance in balances {
        ensure_non_negative("stable balance", balance)?;
    }
    Ok(())
}

/// Computes `D` for the given balances.
pub fn stable_invariant(amplification: &BigInt, balances: &[BigInt]) -> Result<BigInt> {
    validate(amplification, balances)?;
    let n = BigInt::from(balances.len());
    let sum: BigInt = balances.iter().sum();
    if sum.is_zero() {
        return Ok(BigInt::zero());
    }
    if balances.iter().any(Zero::is_zero) {
        return Err(DatumError::domain("stable invariant of a partially empty pool"));
    }

    let ann = amplification * &n;
    let mut d = sum.clone();
    for round in 0..MAX_ROUNDS {
        let mut d_p = d.clone();
        for x in balances {
            d_p = &d_p * &d / (x * &n);
        }
        let previous = d.clone();
        let numerator = (&ann * &sum + &d_p * &n) * &d;
        let denominator = (&ann - BigInt::one()) * &d + (&n + BigInt::one()) * &d_p;
        d = div_round(&numerator, &denominator, Rounding::Down)?;
        if (&d - &previous).abs() <= BigInt::one() {
            tracing::trace!(rounds = round + 1, "stable invariant converged");
            return Ok(d);
        }
    }
    Err(DatumError::domain(format!(
        "stable invariant did not converge within {MAX_ROUNDS} rounds"
    )))
}

/// Balance of asset `j` that keeps `D` fixed once asset `i` holds `x_i`.
fn solve_balance(
    amplification: &BigInt,
    balances: &[BigInt],
    i: usize,
    j: usize,
    x_i: &BigInt,
    d: &BigInt,
) -> Result<BigInt> {
    let n = BigInt::from(balances.len());
    let ann = amplification * &n;
    let mut c = d.clone();
    let mut sum = BigInt::zero();
    for (k, balance) in balances.iter().enumerate() {
        let x = if k == i {
            x_i
        } else if k == j {
            continue;
        } else {
            balance
        };
        if x.is_zero() {
            return Err(DatumError::domain("stable swap against an empty balance"));
        }
        sum += x;
        c = c * d / (x * &n);
    }
    c = c * d / (&ann * &n);
    let b = sum + d / &ann;

    let mut y = d.clone();
    for round in 0..MAX_ROUNDS {
        let previous = y.clone();
        let denominator = BigInt::from(2u8) * &y + &b - d;
        y = div_round(&(&y * &y + &c), &denominator, Rounding::Down)?;
        if (&y - &previous).abs() <= BigInt::one() {
            tracing::trace!(rounds = round + 1, "stable balance converged");
            return Ok(y);
        }
    }
    Err(DatumError::domain(format!(
        "stable balance did not converge within {MAX_ROUNDS} rounds"
    )))
}

/// Swaps `input` of asset `i` for asset `j` at constant invariant.
///
/// The fee is taken from the input and the result is reduced by one unit
/// so integer truncation in the solver can only favour the pool.
pub fn stable_output(
    amplification: &BigInt,
    balances: &[BigInt],
    i: usize,
    j: usize,
    input: &BigInt,
    fee: &FeeFraction,
) -> Result<StableSwapOutcome> {
    validate(amplification, balances)?;
    ensure_non_negative("input", input)?;
    if i == j || i >= balances.len() || j >= balances.len() {
        return Err(DatumError::domain(format!(
            "invalid asset indices {i} -> {j} for {} balances",
            balances.len()
        )));
    }

    let invariant = stable_invariant(amplification, balances)?;
    let lp_fee = div_round(&(input * fee.numer()), fee.denom(), Rounding::Up)?;
    let net = input - &lp_fee;
    let x_i = &balances[i] + &net;
    let y = solve_balance(amplification, balances, i, j, &x_i, &invariant)?;

    let mut output = &balances[j] - &y - BigInt::one();
    if output.is_negative() {
        output = BigInt::zero();
    }
    let mut next_balances = balances.to_vec();
    next_balances[i] = &balances[i] + input;
    next_balances[j] = &balances[j] - &output;

    Ok(StableSwapOutcome {
        output,
        lp_fee,
        next_balances,
        invariant,
    })
}
