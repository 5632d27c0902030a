//! Building blocks shared by the v3-family layouts.

use num_bigint::{BigInt, BigUint, Sign};
use num_rational::BigRational;
use num_traits::One;
use pallas_addresses::Address;
use pallas_crypto::hash::Hash;
use plutus_parser::AsPlutus;

use super::multisig::MultiSigScript;
use crate::address::{
    PlutusAddress, authorization_for, validate_destination_datum_policy, validate_network,
};
use crate::asset::{AssetAmount, AssetClass};
use crate::codec::{AnyData, HashBytes};
use crate::config::{Network, ProtocolParams};
use crate::error::{DatumError, Result};
use crate::math::{FeeFraction, Rounding, swap_output};

/// What the destination output carries alongside the funds.
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq)]
pub enum DatumPolicy {
    None,
    Hash(HashBytes<32>),
    Inline(AnyData),
}

/// Where the settled funds go.
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// `Constr 0 [address, datum]`
    Fixed {
        address: PlutusAddress,
        datum: DatumPolicy,
    },
    /// `Constr 1 []`: back to the script the order came from.
    SelfRef,
}

impl Destination {
    /// Resolves a ledger address on `network` into a destination.
    pub fn fixed(address: &Address, datum: DatumPolicy, network: Network) -> Result<Self> {
        validate_network(address, network)?;
        validate_destination_datum_policy(address, &datum)?;
        Ok(Self::Fixed {
            address: PlutusAddress::from_address(address)?,
            datum,
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Fixed {
                address,
                datum: DatumPolicy::None,
            } if address.is_script() => Err(DatumError::MissingScriptDatum),
            _ => Ok(()),
        }
    }
}

/// Refuses destinations that would pay settled funds into the pool
/// validator of the deployment.
pub(crate) fn check_destination(destination: &Destination, params: &ProtocolParams) -> Result<()> {
    destination.validate()?;
    match destination {
        Destination::Fixed { address, .. } => check_not_pool_script(address, params),
        Destination::SelfRef => Ok(()),
    }
}

pub(crate) fn check_not_pool_script(address: &PlutusAddress, params: &ProtocolParams) -> Result<()> {
    if address.is_script() && params.is_pool_script(&address.payment.hash()) {
        return Err(DatumError::domain(format!(
            "destination pays into the {} pool validator",
            params.version
        )));
    }
    Ok(())
}

/// Opaque data slot carried through a datum without interpretation.
///
/// Consumers that know the payload call [`AnyData::decode`] with their own
/// layout type.
pub type Extension = AnyData;

/// Pool assets must be distinct and in canonical order.
pub(crate) fn check_pool_assets(assets: &(AssetClass, AssetClass)) -> Result<()> {
    if assets.0 >= assets.1 {
        return Err(DatumError::domain(format!(
            "pool assets {} and {} are not in canonical order",
            assets.0, assets.1
        )));
    }
    Ok(())
}

pub(crate) fn check_basis_points(name: &str, bps: u64) -> Result<()> {
    FeeFraction::from_basis_points(bps)
        .map(|_| ())
        .map_err(|_| DatumError::domain(format!("{name} of {bps} bps is not below 100%")))
}

pub(crate) fn check_ident(ident: &[u8]) -> Result<()> {
    crate::ident::check_pool_ident(ident)
}

/// Swaps must trade two different assets.
pub(crate) fn check_swap(offer: &AssetAmount, min_received: &AssetAmount) -> Result<()> {
    if offer.asset == min_received.asset {
        return Err(DatumError::domain(format!(
            "swap offers and receives {}",
            offer.asset
        )));
    }
    Ok(())
}

/// Checks the fields every v3-family order carries around its action.
pub(crate) fn check_order_fields(
    params: &ProtocolParams,
    pool_ident: Option<&[u8]>,
    owner: &MultiSigScript,
    destination: &Destination,
) -> Result<()> {
    if let Some(ident) = pool_ident {
        check_ident(ident)?;
    }
    owner.validate()?;
    check_destination(destination, params)
}

/// Checks the fields every v3-family pool starts with.
pub(crate) fn check_pool_fields(
    ident: &[u8],
    assets: &(AssetClass, AssetClass),
    bid_fees_per_10_thousand: u64,
    ask_fees_per_10_thousand: u64,
    fee_manager: Option<&MultiSigScript>,
) -> Result<()> {
    check_ident(ident)?;
    check_pool_assets(assets)?;
    check_basis_points("bid fee", bid_fees_per_10_thousand)?;
    check_basis_points("ask fee", ask_fees_per_10_thousand)?;
    match fee_manager {
        Some(manager) => manager.validate(),
        None => Ok(()),
    }
}

/// Resolves a manager address on the deployment's network.
pub(crate) fn manager_for(
    params: &ProtocolParams,
    address: Option<&Address>,
) -> Result<Option<MultiSigScript>> {
    if let Some(address) = address {
        validate_network(address, params.network)?;
    }
    authorization_for(address)
}

pub(crate) fn to_signed(value: &BigUint) -> BigInt {
    BigInt::from_biguint(Sign::Plus, value.clone())
}

pub(crate) fn to_natural(value: &BigInt, name: &str) -> Result<BigUint> {
    value
        .to_biguint()
        .ok_or_else(|| DatumError::domain(format!("{name} is negative: {value}")))
}

/// Reserves and fee of the pool an order targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolQuote {
    pub reserve_in: BigUint,
    pub reserve_out: BigUint,
    pub fee: FeeFraction,
}

/// `⌊expected · (1 − tolerance)⌋`
pub fn apply_slippage(expected: &BigUint, tolerance: &FeeFraction) -> BigUint {
    let kept = BigRational::one() - tolerance.as_ratio();
    let scaled = BigRational::from_integer(to_signed(expected)) * kept;
    // tolerance < 1, so the product is never negative
    scaled.floor().to_integer().to_biguint().unwrap_or_default()
}

/// Smallest output an order should accept for `offer` against `quote`.
pub fn minimum_received(
    offer: &BigUint,
    quote: &PoolQuote,
    tolerance: &FeeFraction,
) -> Result<BigUint> {
    let outcome = swap_output(
        &to_signed(offer),
        &to_signed(&quote.reserve_in),
        &to_signed(&quote.reserve_out),
        &quote.fee,
        Rounding::Down,
    )?;
    let expected = to_natural(&outcome.output, "swap output")?;
    Ok(apply_slippage(&expected, tolerance))
}

/// Hash of a payment key, for legacy alternate-address fields.
pub(crate) fn payment_key_hash(address: &Address) -> Result<Hash<28>> {
    Ok(crate::address::credential_hashes(address)?.payment.hash())
}

#[cfg(test)]
mod tests {
    use plutus_parser::create_constr;

    use super::*;
    use crate::address::Credential;
    use crate::codec::{Framing, PlutusData, encode, encode_with, integer};
    use crate::config::ProtocolRegistry;
    use crate::schema::SchemaVersion;

    fn token(b: u8, name: &[u8]) -> AssetClass {
        AssetClass::new(vec![b; 28], name.to_vec()).unwrap()
    }

    fn script_destination(hash: Hash<28>) -> Destination {
        Destination::Fixed {
            address: PlutusAddress {
                payment: Credential::script(hash),
                staking: None,
            },
            datum: DatumPolicy::Inline(AnyData::void()),
        }
    }

    #[test]
    fn datum_policy_tags() {
        assert_eq!(encode(&DatumPolicy::None.to_plutus()).unwrap(), vec![0xd8, 0x79, 0x80]);
        let hash = DatumPolicy::Hash(HashBytes::new([7; 32]));
        assert_eq!(DatumPolicy::from_plutus(hash.clone().to_plutus()).unwrap(), hash);
        let inline = DatumPolicy::Inline(AnyData::from_data(integer(3)));
        assert_eq!(inline.to_plutus(), create_constr(2, vec![integer(3)]));
        assert!(DatumPolicy::from_plutus(create_constr(3, vec![])).is_err());
    }

    #[test]
    fn self_ref_destination() {
        let data = Destination::SelfRef.to_plutus();
        assert_eq!(hex::encode(encode_with(&data, Framing::Indefinite).unwrap()), "d87a80");
    }

    #[test]
    fn script_destination_without_datum_fails_validation() {
        let dest = Destination::Fixed {
            address: PlutusAddress {
                payment: Credential::script(Hash::new([1; 28])),
                staking: None,
            },
            datum: DatumPolicy::None,
        };
        assert_eq!(dest.validate(), Err(DatumError::MissingScriptDatum));
    }

    #[test]
    fn destinations_may_not_pay_the_pool_validator() {
        let params = ProtocolRegistry::builtin()
            .unwrap()
            .params(SchemaVersion::V3, Network::Mainnet)
            .unwrap();
        let pool_script = params.pool_script_hash.unwrap();
        assert!(matches!(
            check_destination(&script_destination(pool_script), params),
            Err(DatumError::Domain(_))
        ));
        let order_script = params.order_script_hash.unwrap();
        assert!(check_destination(&script_destination(order_script), params).is_ok());
        assert!(check_destination(&Destination::SelfRef, params).is_ok());
    }

    #[test]
    fn managers_must_be_on_the_deployment_network() {
        use pallas_addresses::{
            Network as LedgerNetwork, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart,
        };

        let params = ProtocolRegistry::builtin()
            .unwrap()
            .params(SchemaVersion::V3, Network::Mainnet)
            .unwrap();
        let on = |network| {
            Address::Shelley(ShelleyAddress::new(
                network,
                ShelleyPaymentPart::Key(Hash::new([0x11; 28])),
                ShelleyDelegationPart::Null,
            ))
        };
        assert_eq!(
            manager_for(params, Some(&on(LedgerNetwork::Mainnet))).unwrap(),
            Some(MultiSigScript::Signature(HashBytes::new([0x11; 28])))
        );
        assert_eq!(
            manager_for(params, Some(&on(LedgerNetwork::Testnet))),
            Err(DatumError::NetworkMismatch {
                embedded: 0,
                expected: 1
            })
        );
        assert_eq!(manager_for(params, None), Ok(None));
    }

    #[test]
    fn extension_defaults_to_void() {
        let ext = Extension::default();
        assert_eq!(ext.to_bytes().unwrap(), vec![0xd8, 0x79, 0x80]);
        assert_eq!(ext.data(), &create_constr(0, vec![]));
    }

    #[test]
    fn extension_normalises_bytes() {
        // indefinite list of one integer
        let ext = Extension::from_bytes(&[0x9f, 0x01, 0xff]).unwrap();
        assert_eq!(ext.to_bytes().unwrap(), vec![0x81, 0x01]);
        assert!(Extension::from_bytes(&[0x9f, 0x01]).is_err());
        let n: u64 = Extension::from_data(integer(9)).decode().unwrap();
        assert_eq!(n, 9);
        assert!(matches!(
            Extension::from_data(PlutusData::BoundedBytes(vec![1].into())).decode::<u64>(),
            Err(DatumError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn pool_assets_must_be_ordered() {
        let a = token(1, b"");
        assert!(check_pool_assets(&(AssetClass::ada(), a.clone())).is_ok());
        assert!(check_pool_assets(&(a.clone(), AssetClass::ada())).is_err());
        assert!(check_pool_assets(&(a.clone(), a)).is_err());
    }

    #[test]
    fn slippage_floors() {
        let tol = FeeFraction::new(1, 100).unwrap();
        assert_eq!(apply_slippage(&BigUint::from(1_000u32), &tol), BigUint::from(990u32));
        assert_eq!(apply_slippage(&BigUint::from(99u32), &tol), BigUint::from(98u32));
        assert_eq!(apply_slippage(&BigUint::from(7u32), &FeeFraction::zero()), BigUint::from(7u32));
    }

    #[test]
    fn minimum_received_uses_pool_math() {
        let quote = PoolQuote {
            reserve_in: BigUint::from(10_000u32),
            reserve_out: BigUint::from(500u32),
            fee: FeeFraction::from_basis_points(30).unwrap(),
        };
        assert_eq!(
            minimum_received(&BigUint::from(83u32), &quote, &FeeFraction::zero()).unwrap(),
            BigUint::from(4u32)
        );
    }
}
