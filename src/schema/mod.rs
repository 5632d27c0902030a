//! Per-version datum layouts and their builders.
//!
//! Every builder validates its arguments, derives whatever the validator
//! expects to be precomputed, and seals the result into a [`Built`]: the
//! typed datum, its Plutus data tree, the canonical bytes and their hash.
//! Versions share building blocks from [`common`] and [`multisig`] but each
//! owns its top-level layout and constructor tags.

pub mod common;
pub mod condition;
pub mod legacy;
pub mod multisig;
pub mod nft_check;
pub mod stableswap;
pub mod v3;

use std::fmt;

use serde::Deserialize;

use plutus_parser::AsPlutus;

use crate::codec::{DatumHash, Framing, PlutusData, encode_typed};
use crate::config::ProtocolParams;
use crate::error::{DatumError, Result};

/// A deployed validator release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    Legacy,
    V3,
    Condition,
    NftCheck,
    Stableswap,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 5] = [
        Self::Legacy,
        Self::V3,
        Self::Condition,
        Self::NftCheck,
        Self::Stableswap,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::V3 => "v3",
            Self::Condition => "condition",
            Self::NftCheck => "nft_check",
            Self::Stableswap => "stableswap",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of every builder.
///
/// `bytes` go into an output as an inline datum, or `hash` goes in as a
/// datum reference with `bytes` in the witness set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built<T> {
    pub hash: DatumHash,
    pub bytes: Vec<u8>,
    pub datum: T,
    pub data: PlutusData,
}

impl<T> Built<T> {
    pub fn hash_hex(&self) -> String {
        self.hash.to_string()
    }

    pub fn bytes_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

pub(crate) fn seal<T: AsPlutus + Clone>(
    version: SchemaVersion,
    kind: &'static str,
    datum: T,
    framing: Framing,
) -> Result<Built<T>> {
    let (data, bytes, hash) = encode_typed(&datum, framing)?;
    tracing::debug!(%version, kind, %hash, len = bytes.len(), "built datum");
    Ok(Built {
        hash,
        bytes,
        datum,
        data,
    })
}

/// Refuses parameters loaded for another release.
pub(crate) fn ensure_version(params: &ProtocolParams, expected: SchemaVersion) -> Result<()> {
    if params.version != expected {
        return Err(DatumError::Config(format!(
            "{} parameters passed to the {expected} builder",
            params.version
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Network, ProtocolRegistry};

    #[test]
    fn versions_parse_from_config_names() {
        #[derive(Deserialize)]
        struct Row {
            version: SchemaVersion,
        }
        for version in SchemaVersion::ALL {
            let row: Row = toml::from_str(&format!("version = \"{version}\"")).unwrap();
            assert_eq!(row.version, version);
        }
    }

    #[test]
    fn params_for_other_version_are_rejected() {
        let registry = ProtocolRegistry::builtin().unwrap();
        let legacy = registry
            .params(SchemaVersion::Legacy, Network::Mainnet)
            .unwrap();
        assert!(ensure_version(legacy, SchemaVersion::Legacy).is_ok());
        assert!(matches!(
            ensure_version(legacy, SchemaVersion::V3),
            Err(DatumError::Config(_))
        ));
    }

    #[test]
    fn seal_hashes_the_encoded_bytes() {
        let built = seal(
            SchemaVersion::V3,
            "test",
            crate::codec::Natural::from(42u8),
            Framing::Definite,
        )
        .unwrap();
        assert_eq!(built.bytes, vec![0x18, 0x2a]);
        assert_eq!(built.hash, crate::codec::hash(&built.bytes));
        assert_eq!(built.bytes_hex(), "182a");
    }
}
