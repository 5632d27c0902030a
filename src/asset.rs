//! Asset classes, quantities and canonical pair ordering.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use pallas_primitives::PlutusData;
use plutus_parser::{AsPlutus, DecodeError};

use crate::codec::Natural;
use crate::error::{DatumError, Result};

/// Policy ids are blake2b-224 script hashes.
pub const POLICY_ID_LENGTH: usize = 28;

/// Ledger limit on asset name length.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

/// A `(policy id, asset name)` pair. ADA is the empty pair.
///
/// The derived ordering compares the policy id first and then the asset
/// name, byte by byte. The empty policy therefore sorts ADA ahead of every
/// native token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetClass {
    policy: Vec<u8>,
    name: Vec<u8>,
}

impl AssetClass {
    pub fn ada() -> Self {
        Self::default()
    }

    /// Builds a native token class, checking ledger length limits.
    pub fn new(policy: impl Into<Vec<u8>>, name: impl Into<Vec<u8>>) -> Result<Self> {
        let policy = policy.into();
        let name = name.into();
        if policy.is_empty() {
            if !name.is_empty() {
                return Err(DatumError::domain("ADA has no asset name"));
            }
            return Ok(Self::ada());
        }
        if policy.len() != POLICY_ID_LENGTH {
            return Err(DatumError::domain(format!(
                "policy id must be {POLICY_ID_LENGTH} bytes, got {}",
                policy.len()
            )));
        }
        if name.len() > MAX_ASSET_NAME_LENGTH {
            return Err(DatumError::domain(format!(
                "asset name must be at most {MAX_ASSET_NAME_LENGTH} bytes, got {}",
                name.len()
            )));
        }
        Ok(Self { policy, name })
    }

    pub fn policy(&self) -> &[u8] {
        &self.policy
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn is_ada(&self) -> bool {
        self.policy.is_empty()
    }
}

/// Parses `ada.lovelace`, an empty string, or `<policy hex>.<name hex>`.
impl FromStr for AssetClass {
    type Err = DatumError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "ada.lovelace" || s == "lovelace" {
            return Ok(Self::ada());
        }
        let (policy, name) = s.split_once('.').unwrap_or((s, ""));
        let policy = hex::decode(policy)
            .map_err(|e| DatumError::domain(format!("policy id is not hex: {e}")))?;
        let name = hex::decode(name)
            .map_err(|e| DatumError::domain(format!("asset name is not hex: {e}")))?;
        Self::new(policy, name)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ada() {
            return f.write_str("ada.lovelace");
        }
        write!(f, "{}.{}", hex::encode(&self.policy), hex::encode(&self.name))
    }
}

/// Datums carry an asset class as the list `[policy, name]`.
impl AsPlutus for AssetClass {
    fn from_plutus(data: PlutusData) -> Result<Self, DecodeError> {
        let (policy, name) = <(Vec<u8>, Vec<u8>)>::from_plutus(data)?;
        Self::new(policy, name).map_err(|e| DecodeError::Custom(e.to_string()))
    }

    fn to_plutus(self) -> PlutusData {
        (self.policy, self.name).to_plutus()
    }
}

/// A non-negative quantity of one asset class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetAmount {
    pub asset: AssetClass,
    pub quantity: BigUint,
}

impl AssetAmount {
    pub fn new(asset: AssetClass, quantity: impl Into<BigUint>) -> Self {
        Self {
            asset,
            quantity: quantity.into(),
        }
    }

    pub fn lovelace(quantity: impl Into<BigUint>) -> Self {
        Self::new(AssetClass::ada(), quantity)
    }
}

/// Datums carry an amount as the list `[policy, name, quantity]`.
impl AsPlutus for AssetAmount {
    fn from_plutus(data: PlutusData) -> Result<Self, DecodeError> {
        let (policy, name, quantity) = <(Vec<u8>, Vec<u8>, Natural)>::from_plutus(data)?;
        let asset = AssetClass::new(policy, name).map_err(|e| DecodeError::Custom(e.to_string()))?;
        Ok(Self::new(asset, quantity.into_inner()))
    }

    fn to_plutus(self) -> PlutusData {
        let AssetClass { policy, name } = self.asset;
        (policy, name, Natural::from(self.quantity)).to_plutus()
    }
}

/// Returns the pair in canonical order, so `(a, b)` and `(b, a)` agree.
pub fn lexicographic_asset_pair(a: &AssetClass, b: &AssetClass) -> (AssetClass, AssetClass) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Canonical ordering of two amounts by their asset class.
pub fn sort_amounts(a: AssetAmount, b: AssetAmount) -> Result<(AssetAmount, AssetAmount)> {
    if a.asset == b.asset {
        return Err(DatumError::domain(format!(
            "pool assets must differ, both are {}",
            a.asset
        )));
    }
    if a.asset < b.asset { Ok((a, b)) } else { Ok((b, a)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(policy_byte: u8, name: &[u8]) -> AssetClass {
        AssetClass::new(vec![policy_byte; POLICY_ID_LENGTH], name.to_vec()).unwrap()
    }

    #[test]
    fn ada_sorts_first() {
        let t = token(0x00, b"");
        assert!(AssetClass::ada() < t);
        assert_eq!(
            lexicographic_asset_pair(&t, &AssetClass::ada()),
            (AssetClass::ada(), t.clone())
        );
    }

    #[test]
    fn policy_before_name() {
        let a = token(0x01, b"zzz");
        let b = token(0x02, b"aaa");
        assert!(a < b);
        let c = token(0x01, b"zz");
        assert!(c < a);
    }

    #[test]
    fn pair_ordering_is_symmetric() {
        let a = token(0x10, b"SUNDAE");
        let b = token(0x0f, b"INDY");
        assert_eq!(lexicographic_asset_pair(&a, &b), lexicographic_asset_pair(&b, &a));
    }

    #[test]
    fn parses_identifiers() {
        assert_eq!("ada.lovelace".parse::<AssetClass>().unwrap(), AssetClass::ada());
        let policy = "99b071ce8580d6a3a11b4902145adb8bfd0d2a03935af8cf66403e15";
        let parsed: AssetClass = format!("{policy}.534245525259").parse().unwrap();
        assert_eq!(hex::encode(parsed.policy()), policy);
        assert_eq!(parsed.name(), b"SBERRY");
        assert_eq!(parsed.to_string(), format!("{policy}.534245525259"));
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(AssetClass::new(vec![1; 27], vec![]).is_err());
        assert!(AssetClass::new(vec![1; 28], vec![0; 33]).is_err());
        assert!(AssetClass::new(vec![], vec![1]).is_err());
        assert!("zz.00".parse::<AssetClass>().is_err());
    }

    #[test]
    fn amounts_are_policy_name_quantity_lists() {
        let ada = AssetAmount::lovelace(5u8);
        let bytes = crate::codec::encode(&ada.clone().to_plutus()).unwrap();
        assert_eq!(hex::encode(bytes), "83404005");
        let t = AssetAmount::new(token(7, b"x"), 1u8);
        assert_eq!(AssetAmount::from_plutus(t.clone().to_plutus()).unwrap(), t);
        let short_policy = (vec![7u8; 27], Vec::<u8>::new(), Natural::from(1u8)).to_plutus();
        assert!(AssetAmount::from_plutus(short_policy).is_err());
    }

    #[test]
    fn sort_amounts_rejects_identical_assets() {
        let a = AssetAmount::lovelace(1u8);
        let b = AssetAmount::lovelace(2u8);
        assert!(sort_amounts(a, b).is_err());
        let t = AssetAmount::new(token(3, b"x"), 5u8);
        let (first, second) = sort_amounts(t.clone(), AssetAmount::lovelace(9u8)).unwrap();
        assert!(first.asset.is_ada());
        assert_eq!(second, t);
    }
}
