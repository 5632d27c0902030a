//! Construction of SundaeSwap order and pool datums.
//!
//! Builders in [`schema`] take typed arguments, validate them against the
//! deployment in [`config`], derive the values validators expect to be
//! precomputed (minimum received, pool identifiers, initial liquidity,
//! stableswap invariants) and return the canonical Plutus-data encoding
//! together with its hash.

pub mod address;
pub mod asset;
pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod ident;
pub mod math;
pub mod schema;

pub use asset::{AssetAmount, AssetClass};
pub use codec::{AnyData, DatumHash, Framing, HashBytes, Natural, PlutusData};
pub use config::{Network, ProtocolParams, ProtocolRegistry};
pub use error::{DatumError, FormatError, Result};
pub use schema::{Built, SchemaVersion};
