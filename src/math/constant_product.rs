//! Constant-product (`x · y = k`) swaps.
//!
//! The fee is taken from the input before pricing and stays in the pool:
//!
//! ```text
//! net    = input · (1 − f)
//! output = reserve_out · net / (reserve_in + net)
//! ```
//!
//! With `f = p/q` both sides are multiplied by `q`, so the whole
//! computation is one exact integer division.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::{FeeFraction, Rounding, div_round, ensure_non_negative};
use crate::error::{DatumError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub input: BigInt,
    pub output: BigInt,
    pub next_input_reserve: BigInt,
    pub next_output_reserve: BigInt,
    /// Fee charged on the input, rounded up.
    pub lp_fee: BigInt,
    /// `1 − (output/input) / (reserve_out/reserve_in)` against the no-fee
    /// marginal rate. Zero for an empty swap.
    pub price_impact: BigRational,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapInput {
    pub input: BigInt,
    pub outcome: SwapOutcome,
}

pub fn swap_output(
    input: &BigInt,
    reserve_in: &BigInt,
    reserve_out: &BigInt,
    fee: &FeeFraction,
    rounding: Rounding,
) -> Result<SwapOutcome> {
    ensure_non_negative("input", input)?;
    ensure_non_negative("input reserve", reserve_in)?;
    ensure_non_negative("output reserve", reserve_out)?;

    let net = input * fee.retained();
    let denominator = reserve_in * fee.denom() + &net;
    if denominator.is_zero() {
        return Err(DatumError::domain("swap into an empty pool with zero input"));
    }
    let output = div_round(&(reserve_out * &net), &denominator, rounding)?;
    let lp_fee = div_round(&(input * fee.numer()), fee.denom(), Rounding::Up)?;

    let price_impact = if input.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        BigRational::zero()
    } else {
        BigRational::one()
            - BigRational::new(&output * reserve_in, input * reserve_out)
    };

    Ok(SwapOutcome {
        input: input.clone(),
        next_input_reserve: reserve_in + input,
        next_output_reserve: reserve_out - &output,
        output,
        lp_fee,
        price_impact,
    })
}

/// Smallest input whose rounded-down [`swap_output`] reaches `desired_output`.
///
/// For any output actually produced by `swap_output`, feeding the returned
/// input back yields exactly that output.
pub fn swap_input(
    desired_output: &BigInt,
    reserve_in: &BigInt,
    reserve_out: &BigInt,
    fee: &FeeFraction,
) -> Result<SwapInput> {
    ensure_non_negative("desired output", desired_output)?;
    ensure_non_negative("input reserve", reserve_in)?;
    ensure_non_negative("output reserve", reserve_out)?;
    if reserve_in.is_zero() && !desired_output.is_zero() {
        return Err(DatumError::domain(
            "an empty input reserve cannot price a non-zero output",
        ));
    }
    if desired_output >= reserve_out {
        return Err(DatumError::domain(format!(
            "desired output {desired_output} must be below the output reserve {reserve_out}"
        )));
    }

    // input ≥ o · reserve_in · q / ((q − p) · (reserve_out − o))
    let numerator = desired_output * reserve_in * fee.denom();
    let denominator = fee.retained() * (reserve_out - desired_output);
    let input = div_round(&numerator, &denominator, Rounding::Up)?;

    let outcome = swap_output(&input, reserve_in, reserve_out, fee, Rounding::Down)?;
    if &outcome.output < desired_output {
        return Err(DatumError::domain(format!(
            "input {input} yields {} which is short of {desired_output}",
            outcome.output
        )));
    }
    Ok(SwapInput { input, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> BigInt {
        BigInt::from(n)
    }

    fn fee_30() -> FeeFraction {
        FeeFraction::from_basis_points(30).unwrap()
    }

    #[test]
    fn reference_vector_rounds_both_ways() {
        let down = swap_output(&int(83), &int(10_000), &int(500), &fee_30(), Rounding::Down).unwrap();
        assert_eq!(down.output, int(4));
        let up = swap_output(&int(83), &int(10_000), &int(500), &fee_30(), Rounding::Up).unwrap();
        assert_eq!(up.output, int(5));
    }

    #[test]
    fn reference_vector_reserves_and_fee() {
        let out = swap_output(&int(83), &int(10_000), &int(500), &fee_30(), Rounding::Down).unwrap();
        assert_eq!(out.next_input_reserve, int(10_083));
        assert_eq!(out.next_output_reserve, int(496));
        // 83 · 0.003 = 0.249, rounded up
        assert_eq!(out.lp_fee, int(1));
        assert_eq!(out.price_impact, BigRational::new(int(3), int(83)));
    }

    #[test]
    fn zero_fee_matches_plain_formula() {
        let out = swap_output(
            &int(1_000),
            &int(1_000_000),
            &int(1_000_000),
            &FeeFraction::zero(),
            Rounding::Down,
        )
        .unwrap();
        // 1e6 · 1000 / 1_001_000 = 999.000999…
        assert_eq!(out.output, int(999));
        assert_eq!(out.lp_fee, int(0));
    }

    #[test]
    fn rejects_negative_arguments() {
        for (i, a, b) in [(-1, 10, 10), (1, -10, 10), (1, 10, -10)] {
            assert!(matches!(
                swap_output(&int(i), &int(a), &int(b), &fee_30(), Rounding::Down),
                Err(DatumError::Domain(_))
            ));
        }
    }

    #[test]
    fn empty_pool_and_empty_input_is_domain_error() {
        assert!(swap_output(&int(0), &int(0), &int(10), &fee_30(), Rounding::Down).is_err());
    }

    #[test]
    fn zero_input_is_a_no_op() {
        let out = swap_output(&int(0), &int(10), &int(10), &fee_30(), Rounding::Down).unwrap();
        assert_eq!(out.output, int(0));
        assert_eq!(out.price_impact, BigRational::zero());
    }

    #[test]
    fn swap_input_inverts_reference_vector() {
        let inv = swap_input(&int(4), &int(10_000), &int(500), &fee_30()).unwrap();
        assert_eq!(inv.outcome.output, int(4));
        // one unit less must fall short
        let short = swap_output(&(&inv.input - BigInt::one()), &int(10_000), &int(500), &fee_30(), Rounding::Down)
            .unwrap();
        assert!(short.output < int(4));
    }

    #[test]
    fn swap_input_rejects_draining_the_pool() {
        assert!(matches!(
            swap_input(&int(500), &int(10_000), &int(500), &fee_30()),
            Err(DatumError::Domain(_))
        ));
        assert!(swap_input(&int(501), &int(10_000), &int(500), &fee_30()).is_err());
    }

    #[test]
    fn swap_input_of_zero_is_zero() {
        let inv = swap_input(&int(0), &int(10), &int(10), &fee_30()).unwrap();
        assert_eq!(inv.input, int(0));
    }

    #[test]
    fn swap_input_into_empty_reserve_is_domain_error() {
        assert!(matches!(
            swap_input(&int(3), &int(0), &int(10), &fee_30()),
            Err(DatumError::Domain(_))
        ));
        // nothing asked, nothing owed
        let inv = swap_input(&int(0), &int(0), &int(10), &fee_30()).unwrap();
        assert_eq!(inv.input, int(0));
    }
}
