//! Immutable per-version, per-network protocol parameters.
//!
//! The built-in table ships inside the crate (`protocol.toml`) and is parsed
//! once on first use. Deployments with their own parameters build a
//! registry with [`ProtocolRegistry::from_toml_str`] and pass it by reference.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::OnceCell;
use pallas_addresses::{
    Address, Network as LedgerNetwork, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart,
};
use pallas_crypto::hash::Hash;
use serde::{Deserialize, Deserializer};

use crate::codec::Framing;
use crate::error::{DatumError, Result};
use crate::schema::SchemaVersion;

const BUILTIN_TOML: &str = include_str!("protocol.toml");

static BUILTIN: OnceCell<ProtocolRegistry> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Preview,
    Preprod,
}

impl Network {
    /// Network id embedded in Shelley address headers.
    pub const fn id(self) -> u8 {
        match self {
            Self::Mainnet => 1,
            Self::Preview | Self::Preprod => 0,
        }
    }

    pub(crate) fn ledger(self) -> LedgerNetwork {
        match self {
            Self::Mainnet => LedgerNetwork::Mainnet,
            Self::Preview | Self::Preprod => LedgerNetwork::Testnet,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mainnet => "mainnet",
            Self::Preview => "preview",
            Self::Preprod => "preprod",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProtocolParams {
    pub version: SchemaVersion,
    pub network: Network,
    pub network_id: u8,
    pub framing: Framing,
    pub default_scooper_fee: u64,
    /// Validator that holds orders until a scooper executes them.
    #[serde(default, deserialize_with = "script_hash")]
    pub order_script_hash: Option<Hash<28>>,
    /// Validator that holds pool reserves.
    #[serde(default, deserialize_with = "script_hash")]
    pub pool_script_hash: Option<Hash<28>>,
}

fn script_hash<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Hash<28>>, D::Error> {
    let text: Option<String> = Option::deserialize(deserializer)?;
    text.map(|value| {
        value
            .parse::<Hash<28>>()
            .map_err(|e| serde::de::Error::custom(format!("script hash {value}: {e}")))
    })
    .transpose()
}

impl ProtocolParams {
    /// Address an order output must be sent to: the order validator as
    /// payment credential, delegating like `owner` when it carries a stake
    /// credential.
    pub fn order_address(&self, owner: Option<&Address>) -> Result<Address> {
        let script = self.order_script_hash.ok_or_else(|| {
            DatumError::Config(format!(
                "no order validator pinned for {} on {}",
                self.version, self.network
            ))
        })?;
        let delegation = match owner {
            Some(Address::Shelley(shelley)) => shelley.delegation().clone(),
            Some(Address::Stake(_) | Address::Byron(_)) => {
                return Err(DatumError::InvalidAddress(
                    "order owner must be a shelley address".into(),
                ));
            }
            None => ShelleyDelegationPart::Null,
        };
        Ok(Address::Shelley(ShelleyAddress::new(
            self.network.ledger(),
            ShelleyPaymentPart::Script(script),
            delegation,
        )))
    }

    /// True when `hash` is this deployment's pool validator.
    pub fn is_pool_script(&self, hash: &Hash<28>) -> bool {
        self.pool_script_hash.as_ref() == Some(hash)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    deployment: Vec<ProtocolParams>,
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolRegistry {
    params: HashMap<(SchemaVersion, Network), ProtocolParams>,
}

impl ProtocolRegistry {
    /// The table bundled with the crate.
    pub fn builtin() -> Result<&'static ProtocolRegistry> {
        BUILTIN.get_or_try_init(|| Self::from_toml_str(BUILTIN_TOML))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: RegistryFile =
            toml::from_str(source).map_err(|e| DatumError::Config(e.to_string()))?;
        let mut params = HashMap::with_capacity(file.deployment.len());
        for entry in file.deployment {
            if entry.network_id != entry.network.id() {
                return Err(DatumError::Config(format!(
                    "{} {}: network_id {} does not match network {}",
                    entry.version,
                    entry.network,
                    entry.network_id,
                    entry.network.id()
                )));
            }
            let key = (entry.version, entry.network);
            if params.insert(key, entry).is_some() {
                return Err(DatumError::Config(format!(
                    "duplicate deployment for {} {}",
                    key.0, key.1
                )));
            }
        }
        tracing::debug!(deployments = params.len(), "loaded protocol registry");
        Ok(Self { params })
    }

    pub fn params(&self, version: SchemaVersion, network: Network) -> Result<&ProtocolParams> {
        self.params.get(&(version, network)).ok_or_else(|| {
            DatumError::Config(format!("no {version} deployment on {network}"))
        })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
