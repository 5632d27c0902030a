use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::{DatumError, Result};

/// Basis-point denominator (10 000 = 100%).
pub const BASIS_POINTS: u64 = 10_000;

/// An exact fee rate in `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeeFraction(BigRational);

impl FeeFraction {
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Result<Self> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(DatumError::domain("fee denominator is zero"));
        }
        Self::from_ratio(BigRational::new(numerator.into(), denominator))
    }

    pub fn from_ratio(ratio: BigRational) -> Result<Self> {
        if ratio.is_negative() || ratio >= BigRational::one() {
            return Err(DatumError::domain(format!("fee {ratio} is outside [0, 1)")));
        }
        Ok(Self(ratio))
    }

    /// `bps / 10 000`; 30 bps is 0.3%.
    pub fn from_basis_points(bps: u64) -> Result<Self> {
        Self::new(bps, BASIS_POINTS)
    }

    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    /// Reduced numerator.
    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    /// Reduced denominator, always positive.
    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// `1 − fee` scaled by the denominator.
    pub(crate) fn retained(&self) -> BigInt {
        self.denom() - self.numer()
    }
}
