//! Ledger address resolution.
//!
//! Shelley addresses carry a payment credential, an optional stake part and
//! a network id. Byron and reward addresses have no payment credential and
//! cannot be used as order destinations or owners.

use pallas_addresses::{
    Address, Network as LedgerNetwork, Pointer, ShelleyAddress, ShelleyDelegationPart,
    ShelleyPaymentPart,
};
use pallas_crypto::hash::Hash;
use pallas_primitives::PlutusData;
use plutus_parser::AsPlutus;

use crate::codec::{Hash28, from_data};
use crate::config::Network;
use crate::error::{DatumError, Result};
use crate::schema::common::DatumPolicy;
use crate::schema::multisig::MultiSigScript;

/// A key or script hash that authorizes spending.
///
/// `PubKeyCredential h = Constr 0 [h]`, `ScriptCredential h = Constr 1 [h]`.
#[derive(AsPlutus, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    Key(Hash28),
    Script(Hash28),
}

impl Credential {
    pub fn key(hash: Hash<28>) -> Self {
        Self::Key(hash.into())
    }

    pub fn script(hash: Hash<28>) -> Self {
        Self::Script(hash.into())
    }

    pub fn hash(&self) -> Hash<28> {
        match self {
            Self::Key(h) | Self::Script(h) => h.0,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Self::Script(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialHashes {
    pub payment: Credential,
    /// Absent for enterprise addresses and pointer addresses.
    pub stake: Option<Credential>,
}

/// Parses a bech32 (`addr1…`, `addr_test1…`) or hex-encoded address.
pub fn parse_address(text: &str) -> Result<Address> {
    let text = text.trim();
    let parsed = if text.starts_with("addr") || text.starts_with("stake") {
        Address::from_bech32(text)
    } else {
        Address::from_hex(text)
    };
    parsed.map_err(|e| DatumError::InvalidAddress(format!("{text}: {e}")))
}

fn shelley(address: &Address) -> Result<&ShelleyAddress> {
    match address {
        Address::Shelley(s) => Ok(s),
        Address::Byron(_) => Err(DatumError::InvalidAddress(
            "byron address has no payment credential".into(),
        )),
        Address::Stake(_) => Err(DatumError::InvalidAddress(
            "reward address has no payment credential".into(),
        )),
    }
}

fn payment_credential(part: &ShelleyPaymentPart) -> Credential {
    match part {
        ShelleyPaymentPart::Key(h) => Credential::key(*h),
        ShelleyPaymentPart::Script(h) => Credential::script(*h),
    }
}

pub fn credential_hashes(address: &Address) -> Result<CredentialHashes> {
    let s = shelley(address)?;
    let stake = match s.delegation() {
        ShelleyDelegationPart::Key(h) => Some(Credential::key(*h)),
        ShelleyDelegationPart::Script(h) => Some(Credential::script(*h)),
        ShelleyDelegationPart::Pointer(_) | ShelleyDelegationPart::Null => None,
    };
    Ok(CredentialHashes {
        payment: payment_credential(s.payment()),
        stake,
    })
}

/// Whether the payment credential is a script hash.
pub fn is_script_credential(address: &Address) -> Result<bool> {
    Ok(credential_hashes(address)?.payment.is_script())
}

fn ledger_network_id(network: LedgerNetwork) -> u8 {
    match network {
        LedgerNetwork::Testnet => 0,
        LedgerNetwork::Mainnet => 1,
        LedgerNetwork::Other(id) => id,
    }
}

pub fn validate_network(address: &Address, expected: Network) -> Result<()> {
    let embedded = address
        .network()
        .map(ledger_network_id)
        .ok_or_else(|| DatumError::InvalidAddress("address has no network id".into()))?;
    if embedded != expected.id() {
        return Err(DatumError::NetworkMismatch {
            embedded,
            expected: expected.id(),
        });
    }
    Ok(())
}

/// Rejects script destinations that would receive funds without a datum.
///
/// A key-locked destination may take any policy.
pub fn validate_destination_datum_policy(address: &Address, datum: &DatumPolicy) -> Result<()> {
    if is_script_credential(address)? && matches!(datum, DatumPolicy::None) {
        return Err(DatumError::MissingScriptDatum);
    }
    Ok(())
}

/// Resolves an authorization target to a multisig leaf.
///
/// Key credentials become [`MultiSigScript::Signature`] and script credentials
/// become [`MultiSigScript::Script`]. No address means no authority at all.
pub fn authorization_for(address: Option<&Address>) -> Result<Option<MultiSigScript>> {
    let Some(address) = address else {
        return Ok(None);
    };
    Ok(Some(match credential_hashes(address)?.payment {
        Credential::Key(hash) => MultiSigScript::Signature(hash),
        Credential::Script(hash) => MultiSigScript::Script(hash),
    }))
}

/// Staking part of a Plutus address.
#[derive(AsPlutus, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakingPart {
    Inline(Credential),
    Pointer { slot: u64, tx_idx: u64, cert_idx: u64 },
}

/// A Shelley address as validators see it: no network id, no header byte.
///
/// ```text
/// Address = Constr 0 [credential, Option<StakingCredential>]
/// StakingCredential = Inline: Constr 0 [credential]
///                   | Pointer: Constr 1 [slot, tx_index, cert_index]
/// ```
#[derive(AsPlutus, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlutusAddress {
    pub payment: Credential,
    pub staking: Option<StakingPart>,
}

impl PlutusAddress {
    pub fn from_address(address: &Address) -> Result<Self> {
        let s = shelley(address)?;
        let staking = match s.delegation() {
            ShelleyDelegationPart::Key(h) => Some(StakingPart::Inline(Credential::key(*h))),
            ShelleyDelegationPart::Script(h) => Some(StakingPart::Inline(Credential::script(*h))),
            ShelleyDelegationPart::Pointer(p) => Some(StakingPart::Pointer {
                slot: p.slot(),
                tx_idx: p.tx_idx(),
                cert_idx: p.cert_idx(),
            }),
            ShelleyDelegationPart::Null => None,
        };
        Ok(Self {
            payment: payment_credential(s.payment()),
            staking,
        })
    }

    /// Rebuilds the ledger address. Plutus addresses do not carry a network
    /// id, so the caller supplies it.
    pub fn to_address(&self, network: Network) -> Address {
        let payment = match self.payment {
            Credential::Key(hash) => ShelleyPaymentPart::Key(hash.0),
            Credential::Script(hash) => ShelleyPaymentPart::Script(hash.0),
        };
        let delegation = match self.staking {
            None => ShelleyDelegationPart::Null,
            Some(StakingPart::Inline(Credential::Key(hash))) => ShelleyDelegationPart::Key(hash.0),
            Some(StakingPart::Inline(Credential::Script(hash))) => {
                ShelleyDelegationPart::Script(hash.0)
            }
            Some(StakingPart::Pointer {
                slot,
                tx_idx,
                cert_idx,
            }) => ShelleyDelegationPart::Pointer(Pointer::new(slot, tx_idx, cert_idx)),
        };
        Address::Shelley(ShelleyAddress::new(network.ledger(), payment, delegation))
    }

    pub fn is_script(&self) -> bool {
        self.payment.is_script()
    }
}

/// Converts a Shelley address into the Plutus `Address` data shape.
pub fn address_to_data(address: &Address) -> Result<PlutusData> {
    Ok(PlutusAddress::from_address(address)?.to_plutus())
}

/// Rebuilds a ledger address from its Plutus data shape on `network`.
pub fn address_from_data(data: PlutusData, network: Network) -> Result<Address> {
    Ok(from_data::<PlutusAddress>(data)?.to_address(network))
}
