//! Leaf types the schema layouts are assembled from.
//!
//! `plutus-parser` covers machine integers, byte strings, options, tuples
//! and maps. Unbounded quantities, fixed-size hashes and opaque data need
//! local types.

use std::fmt;
use std::ops::Deref;

use num_bigint::{BigInt as Integer, BigUint, Sign};
use num_traits::One;
use pallas_crypto::hash::Hash;
use pallas_primitives::{BigInt, BoundedBytes, Int, PlutusData};
use plutus_parser::{AsPlutus, DecodeError};

use super::{Framing, canonicalize, decode, write};
use crate::error::Result;

/// Integer leaf in its canonical representation.
pub fn integer(value: impl Into<Integer>) -> PlutusData {
    PlutusData::BigInt(to_ledger_int(&value.into()))
}

/// Value of an integer leaf, whatever representation it was written in.
pub fn integer_value(data: &PlutusData) -> Option<Integer> {
    match data {
        PlutusData::BigInt(n) => Some(from_ledger_int(n)),
        _ => None,
    }
}

// Tag 3 carries `-1 - n`.
pub(crate) fn from_ledger_int(n: &BigInt) -> Integer {
    match n {
        BigInt::Int(i) => Integer::from(i128::from(*i)),
        BigInt::BigUInt(bytes) => Integer::from_bytes_be(Sign::Plus, bytes),
        BigInt::BigNInt(bytes) => -Integer::from_bytes_be(Sign::Plus, bytes) - Integer::one(),
    }
}

pub(crate) fn to_ledger_int(n: &Integer) -> BigInt {
    if let Some(small) = i128::try_from(n).ok().and_then(|v| Int::try_from(v).ok()) {
        return BigInt::Int(small);
    }
    match n.sign() {
        Sign::Minus => {
            let (_, magnitude) = (-n - Integer::one()).to_bytes_be();
            BigInt::BigNInt(BoundedBytes::from(magnitude))
        }
        _ => BigInt::BigUInt(BoundedBytes::from(n.magnitude().to_bytes_be())),
    }
}

/// A non-negative integer of any size: quantities, fees, LP supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Natural(BigUint);

impl Natural {
    pub fn into_inner(self) -> BigUint {
        self.0
    }
}

impl Deref for Natural {
    type Target = BigUint;

    fn deref(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Display for Natural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

macro_rules! natural_from {
    ($($t:ty),*) => {$(
        impl From<$t> for Natural {
            fn from(value: $t) -> Self {
                Self(BigUint::from(value))
            }
        }
    )*};
}

natural_from!(u8, u16, u32, u64, u128, BigUint);

impl From<&BigUint> for Natural {
    fn from(value: &BigUint) -> Self {
        Self(value.clone())
    }
}

impl From<Natural> for BigUint {
    fn from(value: Natural) -> Self {
        value.0
    }
}

impl PartialEq<BigUint> for Natural {
    fn eq(&self, other: &BigUint) -> bool {
        &self.0 == other
    }
}

impl AsPlutus for Natural {
    fn from_plutus(data: PlutusData) -> Result<Self, DecodeError> {
        let PlutusData::BigInt(n) = data else {
            return Err(DecodeError::UnexpectedType {
                expected: "BigInt".into(),
                actual: kind(&data).into(),
            });
        };
        let value = from_ledger_int(&n);
        value
            .to_biguint()
            .map(Self)
            .ok_or_else(|| DecodeError::Custom(format!("negative quantity {value}")))
    }

    fn to_plutus(self) -> PlutusData {
        integer(self.0)
    }
}

/// A hash embedded in a datum as a byte string of exactly `N` bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashBytes<const N: usize>(pub Hash<N>);

impl<const N: usize> HashBytes<N> {
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(Hash::new(bytes))
    }
}

impl<const N: usize> From<Hash<N>> for HashBytes<N> {
    fn from(hash: Hash<N>) -> Self {
        Self(hash)
    }
}

impl<const N: usize> Deref for HashBytes<N> {
    type Target = Hash<N>;

    fn deref(&self) -> &Hash<N> {
        &self.0
    }
}

impl<const N: usize> fmt::Debug for HashBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashBytes({})", self.0)
    }
}

impl<const N: usize> fmt::Display for HashBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<const N: usize> AsPlutus for HashBytes<N> {
    fn from_plutus(data: PlutusData) -> Result<Self, DecodeError> {
        let bytes = Vec::<u8>::from_plutus(data)?;
        let array: [u8; N] = bytes.try_into().map_err(|b: Vec<u8>| {
            DecodeError::Custom(format!("expected a {N}-byte hash, found {} bytes", b.len()))
        })?;
        Ok(Self::new(array))
    }

    fn to_plutus(self) -> PlutusData {
        PlutusData::BoundedBytes(BoundedBytes::from(self.0.to_vec()))
    }
}

/// Data the validator carries without interpreting: extensions, inline
/// datums on a destination, condition payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyData(PlutusData);

impl AnyData {
    pub fn from_data(data: PlutusData) -> Self {
        Self(data)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(decode(bytes)?))
    }

    /// `Constr 0 []`, the unit value Plutus uses for "nothing here".
    pub fn void() -> Self {
        Self(plutus_parser::create_constr(0, vec![]))
    }

    pub fn data(&self) -> &PlutusData {
        &self.0
    }

    pub fn into_data(self) -> PlutusData {
        self.0
    }

    /// Canonical definite-length encoding of the carried value.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(write(&canonicalize(self.0.clone(), Framing::Definite)?)?)
    }

    /// Reads the carried value as a typed layout.
    pub fn decode<T: AsPlutus>(&self) -> Result<T> {
        super::from_data(self.0.clone())
    }

    pub fn is_void(&self) -> bool {
        self.0 == plutus_parser::create_constr(0, vec![])
    }
}

impl Default for AnyData {
    fn default() -> Self {
        Self::void()
    }
}

impl AsPlutus for AnyData {
    fn from_plutus(data: PlutusData) -> Result<Self, DecodeError> {
        Ok(Self(data))
    }

    fn to_plutus(self) -> PlutusData {
        self.0
    }
}

pub(crate) fn kind(data: &PlutusData) -> &'static str {
    match data {
        PlutusData::Constr(_) => "Constr",
        PlutusData::Map(_) => "Map",
        PlutusData::Array(_) => "Array",
        PlutusData::BigInt(_) => "BigInt",
        PlutusData::BoundedBytes(_) => "BoundedBytes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn hex_of(data: &PlutusData) -> String {
        hex::encode(encode(data).unwrap())
    }

    #[test]
    fn small_integers_use_shortest_head() {
        assert_eq!(hex_of(&integer(0)), "00");
        assert_eq!(hex_of(&integer(23)), "17");
        assert_eq!(hex_of(&integer(24)), "1818");
        assert_eq!(hex_of(&integer(256)), "190100");
        assert_eq!(hex_of(&integer(4_294_967_296u64)), "1b0000000100000000");
        assert_eq!(hex_of(&integer(-1)), "20");
        assert_eq!(hex_of(&integer(-25)), "3818");
    }

    #[test]
    fn u64_boundaries() {
        assert_eq!(hex_of(&integer(u64::MAX)), "1bffffffffffffffff");
        let below = -Integer::from(u64::MAX) - Integer::one();
        assert_eq!(hex_of(&integer(below)), "3bffffffffffffffff");
    }

    #[test]
    fn bignums_use_tags_two_and_three() {
        let big = Integer::from(u64::MAX) + Integer::one();
        assert_eq!(hex_of(&integer(big.clone())), "c249010000000000000000");
        let neg = -big - Integer::one();
        assert_eq!(hex_of(&integer(neg.clone())), "c349010000000000000000");
        assert_eq!(integer_value(&integer(neg.clone())), Some(neg));
    }

    #[test]
    fn natural_rejects_negative() {
        assert!(Natural::from_plutus(integer(-1)).is_err());
        assert_eq!(Natural::from_plutus(integer(9)).unwrap(), BigUint::from(9u8));
        let huge = Natural::from(u128::MAX);
        assert_eq!(Natural::from_plutus(huge.clone().to_plutus()).unwrap(), huge);
    }

    #[test]
    fn hash_length_is_checked() {
        let short = PlutusData::BoundedBytes(BoundedBytes::from(vec![0; 27]));
        assert!(HashBytes::<28>::from_plutus(short).is_err());
        let exact = HashBytes::<28>::new([7; 28]);
        assert_eq!(HashBytes::<28>::from_plutus(exact.to_plutus()).unwrap(), exact);
    }

    #[test]
    fn any_data_defaults_to_void() {
        let void = AnyData::default();
        assert!(void.is_void());
        assert_eq!(hex::encode(void.to_bytes().unwrap()), "d87980");
        assert_eq!(AnyData::from_bytes(&[0xd8, 0x79, 0x80]).unwrap(), void);
    }
}
