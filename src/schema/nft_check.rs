//! Asset-gated pools: a condition pool whose payload lists the tokens a
//! trader must hold.
//!
//! ```text
//! condition_datum = Constr 0 [Map policy (Map name quantity), check]
//! check           = All: Constr 0 [] | Any: Constr 1 []
//! ```

use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::Zero;
use pallas_primitives::PlutusData;
use plutus_parser::{AsPlutus, DecodeError};

use super::common::{Destination, Extension, check_order_fields, check_pool_fields, check_swap};
use super::condition;
use super::multisig::MultiSigScript;
use super::{Built, SchemaVersion, ensure_version, seal};
use crate::asset::{AssetAmount, AssetClass, sort_amounts};
use crate::codec::{Hash28, Natural, decode_typed};
use crate::config::ProtocolParams;
use crate::error::{DatumError, Result};

#[derive(AsPlutus, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyAuthorization {
    Signature(Hash28),
    Script(Hash28),
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Order {
    Strategy(StrategyAuthorization),
    Swap {
        offer: AssetAmount,
        min_received: AssetAmount,
    },
    Deposit {
        assets: (AssetAmount, AssetAmount),
    },
    Withdrawal {
        lp: AssetAmount,
    },
    Donation {
        assets: (AssetAmount, AssetAmount),
    },
    Record {
        asset: AssetClass,
    },
}

impl Order {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Strategy(_) => "strategy",
            Self::Swap { .. } => "swap",
            Self::Deposit { .. } => "deposit",
            Self::Withdrawal { .. } => "withdrawal",
            Self::Donation { .. } => "donation",
            Self::Record { .. } => "record",
        }
    }

    pub(crate) fn normalise(self) -> Result<Self> {
        Ok(match self {
            Self::Swap {
                offer,
                min_received,
            } => {
                check_swap(&offer, &min_received)?;
                Self::Swap {
                    offer,
                    min_received,
                }
            }
            Self::Deposit { assets } => Self::Deposit {
                assets: sort_amounts(assets.0, assets.1)?,
            },
            Self::Donation { assets } => Self::Donation {
                assets: sort_amounts(assets.0, assets.1)?,
            },
            other => other,
        })
    }
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq)]
pub struct OrderDatum {
    pub pool_ident: Option<Vec<u8>>,
    pub owner: MultiSigScript,
    pub max_protocol_fee: Natural,
    pub destination: Destination,
    pub order: Order,
    pub extension: Extension,
}

#[derive(AsPlutus, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckKind {
    /// Every listed token must be held.
    #[default]
    All,
    /// Holding any one listed token is enough.
    Any,
}

/// Wire shape of the payload: a ledger value map and the check kind.
#[derive(AsPlutus)]
struct CheckLayout {
    value: BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Natural>>,
    check: CheckKind,
}

/// Tokens a trader must present to use the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NftCheckDatum {
    required: BTreeMap<AssetClass, BigUint>,
    pub check: CheckKind,
}

impl NftCheckDatum {
    pub fn new(check: CheckKind, required: impl IntoIterator<Item = AssetAmount>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for amount in required {
            if map.insert(amount.asset.clone(), amount.quantity).is_some() {
                return Err(DatumError::domain(format!(
                    "{} is listed twice",
                    amount.asset
                )));
            }
        }
        Ok(Self {
            required: map,
            check,
        })
    }

    pub fn required(&self) -> impl Iterator<Item = (&AssetClass, &BigUint)> {
        self.required.iter()
    }

    /// Whether `held` passes the check the validator will apply.
    pub fn is_satisfied_by(&self, held: &[AssetAmount]) -> bool {
        let holds = |asset: &AssetClass, quantity: &BigUint| {
            held.iter()
                .filter(|h| &h.asset == asset)
                .fold(BigUint::zero(), |acc, h| acc + &h.quantity)
                >= *quantity
        };
        match self.check {
            CheckKind::All => self.required.iter().all(|(a, q)| holds(a, q)),
            CheckKind::Any => self.required.iter().any(|(a, q)| holds(a, q)),
        }
    }
}

impl AsPlutus for NftCheckDatum {
    fn from_plutus(data: PlutusData) -> Result<Self, DecodeError> {
        let layout = CheckLayout::from_plutus(data)?;
        let mut required = BTreeMap::new();
        for (policy, names) in layout.value {
            for (name, quantity) in names {
                let asset = AssetClass::new(policy.clone(), name)
                    .map_err(|e| DecodeError::Custom(e.to_string()))?;
                required.insert(asset, quantity.into_inner());
            }
        }
        Ok(Self {
            required,
            check: layout.check,
        })
    }

    fn to_plutus(self) -> PlutusData {
        let mut value: BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Natural>> = BTreeMap::new();
        for (asset, quantity) in self.required {
            value
                .entry(asset.policy().to_vec())
                .or_default()
                .insert(asset.name().to_vec(), Natural::from(quantity));
        }
        CheckLayout {
            value,
            check: self.check,
        }
        .to_plutus()
    }
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolDatum {
    pub ident: Vec<u8>,
    pub assets: (AssetClass, AssetClass),
    pub circulating_lp: Natural,
    pub bid_fees_per_10_thousand: u64,
    pub ask_fees_per_10_thousand: u64,
    pub fee_manager: Option<MultiSigScript>,
    pub market_open: u64,
    pub protocol_fees: Natural,
    pub condition: Option<Hash28>,
    pub check: NftCheckDatum,
}

impl PoolDatum {
    /// The same pool with its payload left opaque.
    pub fn to_condition_pool(&self) -> condition::PoolDatum {
        condition::PoolDatum {
            ident: self.ident.clone(),
            assets: self.assets.clone(),
            circulating_lp: self.circulating_lp.clone(),
            bid_fees_per_10_thousand: self.bid_fees_per_10_thousand,
            ask_fees_per_10_thousand: self.ask_fees_per_10_thousand,
            fee_manager: self.fee_manager.clone(),
            market_open: self.market_open,
            protocol_fees: self.protocol_fees.clone(),
            condition: self.condition,
            condition_datum: Extension::from_data(self.check.clone().to_plutus()),
        }
    }

    /// Reads the payload of a condition pool as an asset check.
    pub fn from_condition_pool(pool: condition::PoolDatum) -> Result<Self> {
        let check = pool.condition_datum.decode::<NftCheckDatum>()?;
        Ok(Self {
            ident: pool.ident,
            assets: pool.assets,
            circulating_lp: pool.circulating_lp,
            bid_fees_per_10_thousand: pool.bid_fees_per_10_thousand,
            ask_fees_per_10_thousand: pool.ask_fees_per_10_thousand,
            fee_manager: pool.fee_manager,
            market_open: pool.market_open,
            protocol_fees: pool.protocol_fees,
            condition: pool.condition,
            check,
        })
    }
}

pub fn build_order(params: &ProtocolParams, datum: OrderDatum) -> Result<Built<OrderDatum>> {
    ensure_version(params, SchemaVersion::NftCheck)?;
    check_order_fields(
        params,
        datum.pool_ident.as_deref(),
        &datum.owner,
        &datum.destination,
    )?;
    let datum = OrderDatum {
        order: datum.order.normalise()?,
        ..datum
    };
    let kind = datum.order.kind();
    seal(SchemaVersion::NftCheck, kind, datum, params.framing)
}

pub fn decode_order(bytes: &[u8]) -> Result<OrderDatum> {
    decode_typed(bytes)
}

pub fn build_pool(params: &ProtocolParams, datum: PoolDatum) -> Result<Built<PoolDatum>> {
    ensure_version(params, SchemaVersion::NftCheck)?;
    if datum.condition.is_none() {
        return Err(DatumError::domain("asset-gated pool has no condition script"));
    }
    check_pool_fields(
        &datum.ident,
        &datum.assets,
        datum.bid_fees_per_10_thousand,
        datum.ask_fees_per_10_thousand,
        datum.fee_manager.as_ref(),
    )?;
    seal(SchemaVersion::NftCheck, "pool", datum, params.framing)
}

pub fn decode_pool(bytes: &[u8]) -> Result<PoolDatum> {
    decode_typed(bytes)
}
