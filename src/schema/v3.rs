//! Base v3 order and pool layouts.
//!
//! ```text
//! OrderDatum = Constr 0 [Option<ident>, owner, max_protocol_fee, destination, order, extension]
//! PoolDatum  = Constr 0 [ident, [[p, n], [p, n]], circulating_lp, bid_fees, ask_fees,
//!                        Option<fee_manager>, market_open, protocol_fees]
//! ```

use num_traits::Zero;
use pallas_addresses::Address;
use pallas_traverse::OutputRef;
use plutus_parser::AsPlutus;

use super::common::{
    Destination, Extension, PoolQuote, check_order_fields, check_pool_fields, check_swap,
    manager_for, minimum_received, to_natural, to_signed,
};
use super::multisig::MultiSigScript;
use super::{Built, SchemaVersion, ensure_version, seal};
use crate::asset::{AssetAmount, AssetClass, sort_amounts};
use crate::codec::{Hash28, Natural, decode_typed};
use crate::config::ProtocolParams;
use crate::error::{DatumError, Result};
use crate::ident::pool_ident;
use crate::math::{FeeFraction, first_issuance};

/// Who may execute a strategy order.
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
    /// Mints a receipt proving the pool's state for `asset`.
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

    /// Puts asset pairs in canonical order and rejects degenerate orders.
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
    /// `None` lets a scooper route the order to any pool holding the pair.
    pub pool_ident: Option<Vec<u8>>,
    pub owner: MultiSigScript,
    pub max_protocol_fee: Natural,
    pub destination: Destination,
    pub order: Order,
    pub extension: Extension,
}

pub fn build_order(params: &ProtocolParams, datum: OrderDatum) -> Result<Built<OrderDatum>> {
    ensure_version(params, SchemaVersion::V3)?;
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
    seal(SchemaVersion::V3, kind, datum, params.framing)
}

pub fn decode_order(bytes: &[u8]) -> Result<OrderDatum> {
    decode_typed(bytes)
}

/// A swap whose minimum is derived from the pool's current reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub pool_ident: Option<Vec<u8>>,
    pub owner: MultiSigScript,
    /// Defaults to the deployment's scooper fee.
    pub max_protocol_fee: Option<Natural>,
    pub destination: Destination,
    pub offer: AssetAmount,
    pub receive: AssetClass,
    pub quote: PoolQuote,
    pub slippage: FeeFraction,
}

pub fn swap_with_slippage(params: &ProtocolParams, request: SwapRequest) -> Result<Built<OrderDatum>> {
    let minimum = minimum_received(&request.offer.quantity, &request.quote, &request.slippage)?;
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
    pub bid_fees_per_10_thousand: u64,
    pub ask_fees_per_10_thousand: u64,
    pub fee_manager: Option<MultiSigScript>,
    /// POSIX milliseconds before which only the manager may trade.
    pub market_open: u64,
    pub protocol_fees: Natural,
}

pub fn build_pool(params: &ProtocolParams, datum: PoolDatum) -> Result<Built<PoolDatum>> {
    ensure_version(params, SchemaVersion::V3)?;
    check_pool_fields(
        &datum.ident,
        &datum.assets,
        datum.bid_fees_per_10_thousand,
        datum.ask_fees_per_10_thousand,
        datum.fee_manager.as_ref(),
    )?;
    seal(SchemaVersion::V3, "pool", datum, params.framing)
}

pub fn decode_pool(bytes: &[u8]) -> Result<PoolDatum> {
    decode_typed(bytes)
}

/// Arguments for a new pool.
#[derive(Debug, Clone)]
pub struct MintPool {
    /// Output spent by the minting transaction.
    pub seed: OutputRef,
    pub deposits: (AssetAmount, AssetAmount),
    pub bid_fees_per_10_thousand: u64,
    pub ask_fees_per_10_thousand: u64,
    pub fee_manager: Option<Address>,
    pub market_open: u64,
    pub protocol_fees: Natural,
}

/// Derives the identifier and initial LP supply of a new pool.
pub fn mint_pool(params: &ProtocolParams, request: MintPool) -> Result<Built<PoolDatum>> {
    let fee_manager = manager_for(params, request.fee_manager.as_ref())?;
    let (a, b) = sort_amounts(request.deposits.0, request.deposits.1)?;
    let lp = first_issuance(&to_signed(&a.quantity), &to_signed(&b.quantity))?;
    let circulating_lp = to_natural(&lp, "initial liquidity")?;
    if circulating_lp.is_zero() {
        return Err(DatumError::domain("initial deposit issues no liquidity"));
    }
    build_pool(
        params,
        PoolDatum {
            ident: pool_ident(&request.seed),
            assets: (a.asset, b.asset),
            circulating_lp: circulating_lp.into(),
            bid_fees_per_10_thousand: request.bid_fees_per_10_thousand,
            ask_fees_per_10_thousand: request.ask_fees_per_10_thousand,
            fee_manager,
            market_open: request.market_open,
            protocol_fees: request.protocol_fees,
        },
    )
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use pallas_addresses::{
        Network as LedgerNetwork, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart,
    };
    use pallas_crypto::hash::Hash;
    use plutus_parser::{create_array, create_constr, parse_constr};

    use super::*;
    use crate::address::{Credential, PlutusAddress};
    use crate::codec::{HashBytes, PlutusData, decode, encode_with, from_data, integer};
    use crate::config::{Network, ProtocolRegistry};
    use crate::schema::common::DatumPolicy;

    fn params() -> &'static ProtocolParams {
        ProtocolRegistry::builtin()
            .unwrap()
            .params(SchemaVersion::V3, Network::Preview)
            .unwrap()
    }

    fn mainnet() -> &'static ProtocolParams {
        ProtocolRegistry::builtin()
            .unwrap()
            .params(SchemaVersion::V3, Network::Mainnet)
            .unwrap()
    }

    fn token(b: u8) -> AssetClass {
        AssetClass::new(vec![b; 28], b"TOKEN".to_vec()).unwrap()
    }

    fn bytes(b: Vec<u8>) -> PlutusData {
        PlutusData::BoundedBytes(b.into())
    }

    fn destination() -> Destination {
        Destination::Fixed {
            address: PlutusAddress {
                payment: Credential::key(Hash::new([0x11; 28])),
                staking: None,
            },
            datum: DatumPolicy::None,
        }
    }

    fn swap_datum() -> OrderDatum {
        OrderDatum {
            pool_ident: Some(vec![0x42; 28]),
            owner: MultiSigScript::Signature(HashBytes::new([0x11; 28])),
            max_protocol_fee: Natural::from(1_000_000u32),
            destination: destination(),
            order: Order::Swap {
                offer: AssetAmount::lovelace(10_000_000u32),
                min_received: AssetAmount::new(token(7), 9_000u32),
            },
            extension: Extension::default(),
        }
    }

    fn pool_datum() -> PoolDatum {
        PoolDatum {
            ident: vec![0x42; 28],
            assets: (AssetClass::ada(), token(5)),
            circulating_lp: Natural::from(1_000u32),
            bid_fees_per_10_thousand: 30,
            ask_fees_per_10_thousand: 50,
            fee_manager: None,
            market_open: 0,
            protocol_fees: Natural::from(2_000_000u32),
        }
    }

    fn mint_request(fee_manager: Option<Address>) -> MintPool {
        MintPool {
            seed: OutputRef::new(Hash::new([0xcd; 32]), 2),
            deposits: (
                AssetAmount::new(token(8), 5_000_000u32),
                AssetAmount::lovelace(20_000_000u32),
            ),
            bid_fees_per_10_thousand: 30,
            ask_fees_per_10_thousand: 30,
            fee_manager,
            market_open: 0,
            protocol_fees: Natural::from(3_000_000u32),
        }
    }

    #[test]
    fn order_field_layout() {
        let built = build_order(params(), swap_datum()).unwrap();
        let (tag, fields) = parse_constr(built.data.clone()).unwrap();
        assert_eq!(tag, 0);
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], create_constr(0, vec![bytes(vec![0x42; 28])]));
        assert_eq!(fields[2], integer(1_000_000));
        assert_eq!(parse_constr(fields[4].clone()).unwrap().0, 1);
        assert_eq!(fields[5], create_constr(0, vec![]));
        assert_eq!(built.bytes, encode_with(&built.data, params().framing).unwrap());
    }

    #[test]
    fn order_round_trips() {
        let built = build_order(params(), swap_datum()).unwrap();
        assert_eq!(decode_order(&built.bytes).unwrap(), built.datum);
    }

    #[test]
    fn deposit_pair_is_sorted() {
        let datum = OrderDatum {
            order: Order::Deposit {
                assets: (AssetAmount::new(token(9), 5u8), AssetAmount::lovelace(7u8)),
            },
            ..swap_datum()
        };
        let built = build_order(params(), datum).unwrap();
        let Order::Deposit { assets } = &built.datum.order else {
            panic!("deposit changed kind");
        };
        assert!(assets.0.asset.is_ada());
    }

    #[test]
    fn degenerate_orders_are_rejected() {
        let swap_to_self = OrderDatum {
            order: Order::Swap {
                offer: AssetAmount::lovelace(1u8),
                min_received: AssetAmount::lovelace(1u8),
            },
            ..swap_datum()
        };
        assert!(build_order(params(), swap_to_self).is_err());
        let too_long = OrderDatum {
            pool_ident: Some(vec![0; 29]),
            ..swap_datum()
        };
        assert!(matches!(
            build_order(params(), too_long),
            Err(DatumError::InvalidPoolIdent { length: 29, min: 28, max: 28 })
        ));
    }

    #[test]
    fn short_idents_are_rejected() {
        let short = OrderDatum {
            pool_ident: Some(vec![0x42; 27]),
            ..swap_datum()
        };
        assert!(matches!(
            build_order(params(), short),
            Err(DatumError::InvalidPoolIdent { length: 27, .. })
        ));
        let pool = PoolDatum {
            ident: vec![1, 2, 3],
            ..pool_datum()
        };
        assert!(matches!(
            build_pool(params(), pool),
            Err(DatumError::InvalidPoolIdent { length: 3, .. })
        ));
    }

    #[test]
    fn destination_into_the_pool_validator_is_rejected() {
        let pool_script = mainnet().pool_script_hash.unwrap();
        let datum = OrderDatum {
            destination: Destination::Fixed {
                address: PlutusAddress {
                    payment: Credential::script(pool_script),
                    staking: None,
                },
                datum: DatumPolicy::Inline(Extension::default()),
            },
            ..swap_datum()
        };
        assert!(matches!(
            build_order(mainnet(), datum.clone()),
            Err(DatumError::Domain(_))
        ));
        // preview has no pool validator pinned
        assert!(build_order(params(), datum).is_ok());
    }

    #[test]
    fn every_order_kind_round_trips() {
        let orders = [
            Order::Strategy(StrategyAuthorization::Script(HashBytes::new([3; 28]))),
            Order::Withdrawal {
                lp: AssetAmount::new(token(1), 10u8),
            },
            Order::Donation {
                assets: (AssetAmount::lovelace(1u8), AssetAmount::new(token(2), 2u8)),
            },
            Order::Record { asset: token(4) },
        ];
        for (tag, order) in [0, 3, 4, 5].into_iter().zip(orders) {
            let data = order.clone().to_plutus();
            assert_eq!(parse_constr(data.clone()).unwrap().0, tag);
            assert_eq!(from_data::<Order>(data).unwrap(), order);
        }
    }

    #[test]
    fn pool_layout_and_round_trip() {
        let built = build_pool(params(), pool_datum()).unwrap();
        let (_, fields) = parse_constr(built.data.clone()).unwrap();
        assert_eq!(fields.len(), 8);
        assert_eq!(
            fields[1],
            create_array(vec![
                create_array(vec![bytes(vec![]), bytes(vec![])]),
                create_array(vec![bytes(vec![5; 28]), bytes(b"TOKEN".to_vec())]),
            ])
        );
        assert_eq!(fields[5], create_constr(1, vec![]));
        assert_eq!(decode_pool(&built.bytes).unwrap(), built.datum);
        assert_eq!(decode(&built.bytes).unwrap(), built.data);
    }

    #[test]
    fn unsorted_pool_is_rejected() {
        let datum = PoolDatum {
            assets: (token(5), AssetClass::ada()),
            ..pool_datum()
        };
        assert!(build_pool(params(), datum).is_err());
    }

    #[test]
    fn mint_pool_derives_ident_and_lp() {
        let request = mint_request(None);
        let seed = request.seed.clone();
        let built = mint_pool(params(), request).unwrap();
        assert_eq!(built.datum.ident, pool_ident(&seed));
        assert_eq!(built.datum.circulating_lp, BigUint::from(10_000_000u32));
        assert!(built.datum.assets.0.is_ada());
    }

    #[test]
    fn mint_pool_checks_the_fee_manager_network() {
        let manager = |network| {
            Address::Shelley(ShelleyAddress::new(
                network,
                ShelleyPaymentPart::Key(Hash::new([0x77; 28])),
                ShelleyDelegationPart::Null,
            ))
        };
        assert!(matches!(
            mint_pool(mainnet(), mint_request(Some(manager(LedgerNetwork::Testnet)))),
            Err(DatumError::NetworkMismatch {
                embedded: 0,
                expected: 1
            })
        ));
        let built = mint_pool(mainnet(), mint_request(Some(manager(LedgerNetwork::Mainnet))))
            .unwrap();
        assert_eq!(
            built.datum.fee_manager,
            Some(MultiSigScript::Signature(HashBytes::new([0x77; 28])))
        );
    }

    #[test]
    fn swap_with_slippage_sets_minimum() {
        let built = swap_with_slippage(
            params(),
            SwapRequest {
                pool_ident: None,
                owner: MultiSigScript::Signature(HashBytes::new([0x11; 28])),
                max_protocol_fee: None,
                destination: Destination::SelfRef,
                offer: AssetAmount::lovelace(83u8),
                receive: token(1),
                quote: PoolQuote {
                    reserve_in: BigUint::from(10_000u32),
                    reserve_out: BigUint::from(500u32),
                    fee: FeeFraction::from_basis_points(30).unwrap(),
                },
                slippage: FeeFraction::zero(),
            },
        )
        .unwrap();
        let Order::Swap { min_received, .. } = &built.datum.order else {
            panic!("not a swap");
        };
        assert_eq!(min_received.quantity, BigUint::from(4u8));
        assert_eq!(
            built.datum.max_protocol_fee,
            Natural::from(params().default_scooper_fee)
        );
    }

    #[test]
    fn legacy_params_are_refused() {
        let legacy = ProtocolRegistry::builtin()
            .unwrap()
            .params(SchemaVersion::Legacy, Network::Preview)
            .unwrap();
        assert!(matches!(
            build_order(legacy, swap_datum()),
            Err(DatumError::Config(_))
        ));
    }
}
