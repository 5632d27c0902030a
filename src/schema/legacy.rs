//! First-generation (v1) order and pool layouts.
//!
//! ```text
//! OrderDatum     = Constr 0 [ident, OrderAddresses, scooper_fee, action]
//! OrderAddresses = Constr 0 [Constr 0 [address, Option<datum_hash>], Option<alternate>]
//! PoolDatum      = Constr 0 [Constr 0 [coin_a, coin_b], ident, circulating_lp,
//!                            Constr 0 [fee_numerator, fee_denominator]]
//! ```

use num_bigint::BigUint;
use num_traits::Zero;
use pallas_addresses::Address;
use plutus_parser::AsPlutus;

use super::common::{
    DatumPolicy, PoolQuote, check_not_pool_script, check_pool_assets, minimum_received,
    payment_key_hash,
};
use super::{Built, SchemaVersion, ensure_version, seal};
use crate::address::{PlutusAddress, validate_destination_datum_policy, validate_network};
use crate::asset::AssetClass;
use crate::codec::{DatumHash, Hash28, HashBytes, Natural, decode_typed};
use crate::config::{Network, ProtocolParams};
use crate::error::{DatumError, Result};
use crate::ident::check_ident_length;
use crate::math::FeeFraction;

/// Pool idents are the factory's counter, at most four bytes.
pub const MAX_IDENT_LENGTH: usize = 4;

fn check_ident(ident: &[u8]) -> Result<()> {
    check_ident_length(ident, 1, MAX_IDENT_LENGTH)
}

#[derive(AsPlutus, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapDirection {
    /// Offer coin A, receive coin B.
    AToB,
    BToA,
}

/// `Constr 0 [a, b]`
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepositAmounts {
    pub a: Natural,
    pub b: Natural,
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepositKind {
    /// Single-sided deposit: half is swapped before depositing.
    Zap {
        direction: SwapDirection,
        amount: Natural,
    },
    Pair(DepositAmounts),
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Swap {
        direction: SwapDirection,
        amount: Natural,
        minimum: Option<Natural>,
    },
    Withdraw {
        lp: Natural,
    },
    Deposit(DepositKind),
}

impl Action {
    pub fn deposit(a: impl Into<Natural>, b: impl Into<Natural>) -> Self {
        Self::Deposit(DepositKind::Pair(DepositAmounts {
            a: a.into(),
            b: b.into(),
        }))
    }

    pub fn zap(direction: SwapDirection, amount: impl Into<Natural>) -> Self {
        Self::Deposit(DepositKind::Zap {
            direction,
            amount: amount.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Swap { .. } => "swap",
            Self::Withdraw { .. } => "withdraw",
            Self::Deposit(DepositKind::Pair(_)) => "deposit",
            Self::Deposit(DepositKind::Zap { .. }) => "zap",
        }
    }

    fn validate(&self) -> Result<()> {
        let empty = match self {
            Self::Swap { amount, .. } | Self::Deposit(DepositKind::Zap { amount, .. }) => {
                amount.is_zero()
            }
            Self::Withdraw { lp } => lp.is_zero(),
            Self::Deposit(DepositKind::Pair(DepositAmounts { a, b })) => a.is_zero() || b.is_zero(),
        };
        if empty {
            return Err(DatumError::domain(format!("{} of nothing", self.kind())));
        }
        Ok(())
    }
}

/// The deposit action as the v1 validator declares it.
///
/// Tags 0 and 1 are two identical unit placeholders that only reserve the
/// positions of the swap and withdraw actions. Deposits live at tag 2.
/// Both placeholders decode, so the positions are never renumbered.
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepositPairSchema {
    VoidAtZero,
    VoidAtOne,
    Deposit(DepositKind),
}

/// Only the pair arm of the schema carries amounts.
impl TryFrom<DepositPairSchema> for DepositAmounts {
    type Error = DatumError;

    fn try_from(schema: DepositPairSchema) -> Result<Self> {
        match schema {
            DepositPairSchema::Deposit(DepositKind::Pair(amounts)) => Ok(amounts),
            DepositPairSchema::Deposit(DepositKind::Zap { .. }) => {
                Err(DatumError::mismatch("deposit pair", "single-sided deposit"))
            }
            DepositPairSchema::VoidAtZero | DepositPairSchema::VoidAtOne => {
                Err(DatumError::mismatch("deposit pair", "placeholder variant"))
            }
        }
    }
}

/// `Constr 0 [address, Option<datum_hash>]`
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationAddress {
    pub address: PlutusAddress,
    pub datum_hash: Option<HashBytes<32>>,
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderAddresses {
    pub destination: DestinationAddress,
    /// Payment key that may cancel the order instead of the owner.
    pub alternate: Option<Hash28>,
}

impl OrderAddresses {
    pub fn new(
        destination: &Address,
        datum_hash: Option<DatumHash>,
        alternate: Option<&Address>,
        network: Network,
    ) -> Result<Self> {
        validate_network(destination, network)?;
        let datum_hash = datum_hash.map(HashBytes::from);
        let policy = datum_hash.map_or(DatumPolicy::None, DatumPolicy::Hash);
        validate_destination_datum_policy(destination, &policy)?;
        let alternate = match alternate {
            Some(address) => {
                validate_network(address, network)?;
                Some(payment_key_hash(address)?.into())
            }
            None => None,
        };
        Ok(Self {
            destination: DestinationAddress {
                address: PlutusAddress::from_address(destination)?,
                datum_hash,
            },
            alternate,
        })
    }
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderDatum {
    pub ident: Vec<u8>,
    pub addresses: OrderAddresses,
    pub scooper_fee: Natural,
    pub action: Action,
}

pub fn build_order(params: &ProtocolParams, datum: OrderDatum) -> Result<Built<OrderDatum>> {
    ensure_version(params, SchemaVersion::Legacy)?;
    check_ident(&datum.ident)?;
    let destination = &datum.addresses.destination;
    if destination.address.is_script() && destination.datum_hash.is_none() {
        return Err(DatumError::MissingScriptDatum);
    }
    check_not_pool_script(&destination.address, params)?;
    datum.action.validate()?;
    let kind = datum.action.kind();
    seal(SchemaVersion::Legacy, kind, datum, params.framing)
}

pub fn decode_order(bytes: &[u8]) -> Result<OrderDatum> {
    decode_typed(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub ident: Vec<u8>,
    pub addresses: OrderAddresses,
    /// Defaults to the deployment's scooper fee.
    pub scooper_fee: Option<Natural>,
    pub direction: SwapDirection,
    pub amount: BigUint,
    pub quote: PoolQuote,
    pub slippage: FeeFraction,
}

pub fn swap_with_slippage(params: &ProtocolParams, request: SwapRequest) -> Result<Built<OrderDatum>> {
    let minimum = minimum_received(&request.amount, &request.quote, &request.slippage)?;
    build_order(
        params,
        OrderDatum {
            ident: request.ident,
            addresses: request.addresses,
            scooper_fee: request
                .scooper_fee
                .unwrap_or_else(|| Natural::from(params.default_scooper_fee)),
            action: Action::Swap {
                direction: request.direction,
                amount: request.amount.into(),
                minimum: Some(minimum.into()),
            },
        },
    )
}

/// `Constr 0 [policy, name]`
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coin {
    pub policy: Vec<u8>,
    pub name: Vec<u8>,
}

impl Coin {
    pub fn asset(&self) -> Result<AssetClass> {
        AssetClass::new(self.policy.clone(), self.name.clone())
    }
}

impl From<&AssetClass> for Coin {
    fn from(asset: &AssetClass) -> Self {
        Self {
            policy: asset.policy().to_vec(),
            name: asset.name().to_vec(),
        }
    }
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoinPair {
    pub a: Coin,
    pub b: Coin,
}

/// Kept unreduced: `30/10000` and `3/1000` encode differently.
#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolFee {
    pub numerator: Natural,
    pub denominator: Natural,
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolDatum {
    pub coins: CoinPair,
    pub ident: Vec<u8>,
    pub circulating_lp: Natural,
    pub fee: PoolFee,
}

impl PoolDatum {
    pub fn new(
        coins: (&AssetClass, &AssetClass),
        ident: Vec<u8>,
        circulating_lp: impl Into<Natural>,
        fee: PoolFee,
    ) -> Self {
        Self {
            coins: CoinPair {
                a: coins.0.into(),
                b: coins.1.into(),
            },
            ident,
            circulating_lp: circulating_lp.into(),
            fee,
        }
    }

    pub fn assets(&self) -> Result<(AssetClass, AssetClass)> {
        Ok((self.coins.a.asset()?, self.coins.b.asset()?))
    }

    pub fn fee_fraction(&self) -> Result<FeeFraction> {
        FeeFraction::new(
            self.fee.numerator.clone().into_inner(),
            self.fee.denominator.clone().into_inner(),
        )
    }
}

pub fn build_pool(params: &ProtocolParams, datum: PoolDatum) -> Result<Built<PoolDatum>> {
    ensure_version(params, SchemaVersion::Legacy)?;
    check_ident(&datum.ident)?;
    check_pool_assets(&datum.assets()?)?;
    datum.fee_fraction()?;
    seal(SchemaVersion::Legacy, "pool", datum, params.framing)
}

pub fn decode_pool(bytes: &[u8]) -> Result<PoolDatum> {
    let datum: PoolDatum = decode_typed(bytes)?;
    datum
        .assets()
        .map_err(|e| DatumError::mismatch("legacy pool coins", e.to_string()))?;
    Ok(datum)
}
