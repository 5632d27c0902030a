//! Stableswap pools and their orders.
//!
//! The order kinds are renumbered against v3 and there is no record order.
//!
//! ```text
//! Order    = Swap 0 | Deposit 1 | Withdrawal 2 | Strategy 3 | Donation 4
//! PoolDatum = Constr 0 [ident, assets, circulating_lp, [bid, ask], [protocol_bid, protocol_ask],
//!                       Option<fee_manager>, market_open, protocol_fees,
//!                       amplification, sum_invariant, Option<amplification_manager>]
//! ```

use num_bigint::{BigInt, BigUint};
use pallas_addresses::Address;
use plutus_parser::AsPlutus;

use super::common::{
    Destination, Extension, apply_slippage, check_basis_points, check_ident, check_order_fields,
    check_pool_assets, check_swap, manager_for, to_natural, to_signed,
};
use super::multisig::MultiSigScript;
use super::v3::{self, StrategyAuthorization};
use super::{Built, SchemaVersion, ensure_version, seal};
use crate::asset::{AssetAmount, AssetClass, sort_amounts};
use crate::codec::{Natural, decode_typed};
use crate::config::ProtocolParams;
use crate::error::{DatumError, Result};
use crate::math::{FeeFraction, stable_invariant, stable_output};

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Order {
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
    Strategy(StrategyAuthorization),
    Donation {
        assets: (AssetAmount, AssetAmount),
    },
}

impl Order {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Swap { .. } => "swap",
            Self::Deposit { .. } => "deposit",
            Self::Withdrawal { .. } => "withdrawal",
            Self::Strategy(_) => "strategy",
            Self::Donation { .. } => "donation",
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

/// Re-targets a v3 order at a stable pool.
impl TryFrom<v3::Order> for Order {
    type Error = DatumError;

    fn try_from(order: v3::Order) -> Result<Self> {
        Ok(match order {
            v3::Order::Swap {
                offer,
                min_received,
            } => Self::Swap {
                offer,
                min_received,
            },
            v3::Order::Deposit { assets } => Self::Deposit { assets },
            v3::Order::Withdrawal { lp } => Self::Withdrawal { lp },
            v3::Order::Strategy(auth) => Self::Strategy(auth),
            v3::Order::Donation { assets } => Self::Donation { assets },
            v3::Order::Record { .. } => {
                return Err(DatumError::Unsupported {
                    version: SchemaVersion::Stableswap,
                    feature: "record orders",
                });
            }
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
    ensure_version(params, SchemaVersion::Stableswap)?;
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
    seal(SchemaVersion::Stableswap, kind, datum, params.framing)
}

pub fn decode_order(bytes: &[u8]) -> Result<OrderDatum> {
    decode_typed(bytes)
}

/// A stable swap whose minimum is priced on the invariant curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub pool_ident: Option<Vec<u8>>,
    pub owner: MultiSigScript,
    pub max_protocol_fee: Option<Natural>,
    pub destination: Destination,
    pub offer: AssetAmount,
    pub receive: AssetClass,
    pub reserve_in: BigUint,
    pub reserve_out: BigUint,
    pub amplification: u64,
    pub fee: FeeFraction,
    pub slippage: FeeFraction,
}

pub fn swap_with_slippage(params: &ProtocolParams, request: SwapRequest) -> Result<Built<OrderDatum>> {
    let outcome = stable_output(
        &BigInt::from(request.amplification),
        &[to_signed(&request.reserve_in), to_signed(&request.reserve_out)],
        0,
        1,
        &to_signed(&request.offer.quantity),
        &request.fee,
    )?;
    let expected = to_natural(&outcome.output, "stable swap output")?;
    let minimum = apply_slippage(&expected, &request.slippage);
    build_order(
        params,
        OrderDatum {
            pool_ident: request.pool_ident,
            owner: request.owner,
            max_protocol_fee: request
                .max_protocol_fee
                .unwrap_or_else(|| Natural::from(params.default_scooper_fee)),
            destination: request.destination,
            order: Order::Swap {
                offer: request.offer,
                min_received: AssetAmount::new(request.receive, minimum),
            },
            extension: Extension::default(),
        },
    )
}

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolDatum {
    pub ident: Vec<u8>,
    pub assets: (AssetClass, AssetClass),
    pub circulating_lp: Natural,
    /// `(bid, ask)` in basis points.
    pub lp_fees: (u64, u64),
    /// `(bid, ask)` in basis points.
    pub protocol_fee_rates: (u64, u64),
    pub fee_manager: Option<MultiSigScript>,
    pub market_open: u64,
    pub protocol_fees: Natural,
    pub amplification: u64,
    /// Invariant `D` of the reserves this datum was built for.
    pub sum_invariant: Natural,
    pub amplification_manager: Option<MultiSigScript>,
}

/// Pool state before the invariant is derived.
#[derive(Debug, Clone)]
pub struct PoolArgs {
    pub ident: Vec<u8>,
    pub reserves: (AssetAmount, AssetAmount),
    pub circulating_lp: Natural,
    pub lp_fees: (u64, u64),
    pub protocol_fee_rates: (u64, u64),
    pub fee_manager: Option<Address>,
    pub market_open: u64,
    pub protocol_fees: Natural,
    pub amplification: u64,
    pub amplification_manager: Option<Address>,
}

/// Sorts the reserves, derives `sum_invariant` and seals the pool.
pub fn build_pool(params: &ProtocolParams, args: PoolArgs) -> Result<Built<PoolDatum>> {
    ensure_version(params, SchemaVersion::Stableswap)?;
    check_ident(&args.ident)?;
    for bps in [args.lp_fees.0, args.lp_fees.1] {
        check_basis_points("lp fee", bps)?;
    }
    for bps in [args.protocol_fee_rates.0, args.protocol_fee_rates.1] {
        check_basis_points("protocol fee", bps)?;
    }
    let fee_manager = manager_for(params, args.fee_manager.as_ref())?;
    let amplification_manager = manager_for(params, args.amplification_manager.as_ref())?;
    let (a, b) = sort_amounts(args.reserves.0, args.reserves.1)?;
    let assets = (a.asset, b.asset);
    check_pool_assets(&assets)?;

    let invariant = stable_invariant(
        &BigInt::from(args.amplification),
        &[to_signed(&a.quantity), to_signed(&b.quantity)],
    )?;
    let datum = PoolDatum {
        ident: args.ident,
        assets,
        circulating_lp: args.circulating_lp,
        lp_fees: args.lp_fees,
        protocol_fee_rates: args.protocol_fee_rates,
        fee_manager,
        market_open: args.market_open,
        protocol_fees: args.protocol_fees,
        amplification: args.amplification,
        sum_invariant: to_natural(&invariant, "sum invariant")?.into(),
        amplification_manager,
    };
    seal(SchemaVersion::Stableswap, "pool", datum, params.framing)
}

pub fn decode_pool(bytes: &[u8]) -> Result<PoolDatum> {
    decode_typed(bytes)
}
