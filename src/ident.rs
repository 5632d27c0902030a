//! Pool identifiers and the token names derived from them.

use pallas_traverse::OutputRef;

use crate::codec::hash;
use crate::error::{DatumError, Result};

/// Length of a v3-family pool identifier.
pub const POOL_IDENT_LENGTH: usize = 28;

const IDENT_SEPARATOR: u8 = 0x23;

/// CIP-68 label 100 (reference token).
pub const REFERENCE_PREFIX: [u8; 4] = [0x00, 0x06, 0x43, 0xb0];
/// CIP-68 label 222 (pool NFT).
pub const NFT_PREFIX: [u8; 4] = [0x00, 0x0d, 0xe1, 0x40];
/// CIP-68 label 333 (LP token).
pub const LP_PREFIX: [u8; 4] = [0x00, 0x14, 0xdf, 0x10];

/// Big-endian bytes with leading zeros dropped; zero is a single `0x00`.
fn minimal_be(n: u64) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
    bytes[skip..].to_vec()
}

/// Identifier of the pool minted by spending `seed`.
///
/// `blake2b_256(tx_hash ‖ 0x23 ‖ index)` with the first four bytes dropped.
/// An output can be spent once, so every pool gets a distinct identifier.
pub fn pool_ident(seed: &OutputRef) -> Vec<u8> {
    let mut preimage = Vec::with_capacity(32 + 1 + 8);
    preimage.extend_from_slice(seed.hash().as_ref());
    preimage.push(IDENT_SEPARATOR);
    preimage.extend_from_slice(&minimal_be(seed.index()));
    let digest = hash(&preimage);
    digest.as_ref()[32 - POOL_IDENT_LENGTH..].to_vec()
}

/// Legacy pools are numbered by the factory's counter.
pub fn pool_ident_from_counter(counter: u64) -> Vec<u8> {
    minimal_be(counter)
}

/// Refuses idents outside `min..=max` bytes.
pub fn check_ident_length(ident: &[u8], min: usize, max: usize) -> Result<()> {
    if ident.len() < min || ident.len() > max {
        return Err(DatumError::InvalidPoolIdent {
            length: ident.len(),
            min,
            max,
        });
    }
    Ok(())
}

/// v3-family idents are always a full [`pool_ident`] digest.
pub fn check_pool_ident(ident: &[u8]) -> Result<()> {
    check_ident_length(ident, POOL_IDENT_LENGTH, POOL_IDENT_LENGTH)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolTokenNames {
    pub reference: Vec<u8>,
    pub nft: Vec<u8>,
    pub lp: Vec<u8>,
}

fn prefixed(prefix: [u8; 4], ident: &[u8]) -> Vec<u8> {
    let mut name = Vec::with_capacity(prefix.len() + ident.len());
    name.extend_from_slice(&prefix);
    name.extend_from_slice(ident);
    name
}

pub fn pool_token_names(ident: &[u8]) -> PoolTokenNames {
    PoolTokenNames {
        reference: prefixed(REFERENCE_PREFIX, ident),
        nft: prefixed(NFT_PREFIX, ident),
        lp: prefixed(LP_PREFIX, ident),
    }
}

/// Recovers the pool ident from any of the three pool token names.
pub fn ident_from_token_name(name: &[u8]) -> Option<&[u8]> {
    [REFERENCE_PREFIX, NFT_PREFIX, LP_PREFIX]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix.as_slice()))
        .filter(|ident| ident.len() == POOL_IDENT_LENGTH)
}
