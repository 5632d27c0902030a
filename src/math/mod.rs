//! Exact integer AMM math.
//!
//! Every function is pure and works on unbounded integers. All division
//! names its [`Rounding`] direction, because the validators round in a
//! specific direction and an off-by-one here rejects the order on chain.
//! Arguments are signed so that negative inputs surface as
//! [`DatumError::Domain`] instead of wrapping.

mod constant_product;
mod fee;
mod liquidity;
mod stable;

pub use constant_product::{SwapInput, SwapOutcome, swap_input, swap_output};
pub use fee::FeeFraction;
pub use liquidity::{LiquidityOutcome, first_issuance, liquidity_issuance};
pub use stable::{MAX_ROUNDS, StableSwapOutcome, stable_invariant, stable_output};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::{DatumError, Result};

/// Rounding direction for integer division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rounding {
    /// Towards positive infinity.
    Up,
    /// Towards negative infinity.
    #[default]
    Down,
}

impl Rounding {
    pub const fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

/// `numerator / denominator` rounded as requested.
pub(crate) fn div_round(numerator: &BigInt, denominator: &BigInt, rounding: Rounding) -> Result<BigInt> {
    if denominator.is_zero() {
        return Err(DatumError::domain("division by zero"));
    }
    let (q, r) = numerator.div_mod_floor(denominator);
    if rounding.is_up() && !r.is_zero() {
        Ok(q + BigInt::one())
    } else {
        Ok(q)
    }
}

pub(crate) fn ensure_non_negative(name: &str, value: &BigInt) -> Result<()> {
    if value.is_negative() {
        return Err(DatumError::domain(format!("{name} must not be negative, got {value}")));
    }
    Ok(())
}
