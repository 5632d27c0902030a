//! Condition-gated pools.
//!
//! Orders follow the v3 field order under their own types. Pools carry an
//! extra script hash that must approve every scoop, plus an opaque payload
//! that script reads.
//!
//! ```text
//! OrderDatum = Constr 0 [Option<ident>, owner, max_protocol_fee, destination, order, extension]
//! PoolDatum  = Constr 0 [ident, assets, circulating_lp, bid_fees, ask_fees,
//!                        Option<fee_manager>, market_open, protocol_fees,
//!                        Option<condition>, condition_datum]
//! ```

use plutus_parser::AsPlutus;

use super::common::{Destination, Extension, check_order_fields, check_pool_fields, check_swap};
use super::multisig::MultiSigScript;
use super::{Built, SchemaVersion, ensure_version, seal};
use crate::asset::{AssetAmount, AssetClass, sort_amounts};
use crate::codec::{Hash28, Natural, decode_typed};
use crate::config::ProtocolParams;
use crate::error::Result;

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

pub fn build_order(params: &ProtocolParams, datum: OrderDatum) -> Result<Built<OrderDatum>> {
    ensure_version(params, SchemaVersion::Condition)?;
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
    seal(SchemaVersion::Condition, kind, datum, params.framing)
}

pub fn decode_order(bytes: &[u8]) -> Result<OrderDatum> {
    decode_typed(bytes)
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq)]
pub struct PoolDatum {
    pub ident: Vec<u8>,
    pub assets: (AssetClass, AssetClass),
    pub circulating_lp: Natural,
    pub bid_fees_per_10_thousand: u64,
    pub ask_fees_per_10_thousand: u64,
    pub fee_manager: Option<MultiSigScript>,
    pub market_open: u64,
    pub protocol_fees: Natural,
    /// Withdrawal script that must run alongside every scoop.
    pub condition: Option<Hash28>,
    pub condition_datum: Extension,
}

pub fn build_pool(params: &ProtocolParams, datum: PoolDatum) -> Result<Built<PoolDatum>> {
    ensure_version(params, SchemaVersion::Condition)?;
    check_pool_fields(
        &datum.ident,
        &datum.assets,
        datum.bid_fees_per_10_thousand,
        datum.ask_fees_per_10_thousand,
        datum.fee_manager.as_ref(),
    )?;
    seal(SchemaVersion::Condition, "pool", datum, params.framing)
}

pub fn decode_pool(bytes: &[u8]) -> Result<PoolDatum> {
    decode_typed(bytes)
}
