//! Plutus data on the wire.
//!
//! Datums are [`PlutusData`] trees from `pallas-primitives`, converted to
//! and from typed schema values with [`plutus_parser::AsPlutus`]. Bytes are
//! written by pallas' own minicbor encoder after [`canonicalize`] has fixed
//! the representation:
//!
//! - integers use the shortest head, and values outside 64 bits become tag 2/3
//!   bignums
//! - byte strings over 64 bytes are split into 64-byte chunks (pallas)
//! - constructors use tags 121..=127, 1280..=1400 or the general tag 102
//! - maps are definite-length, duplicate-free and sorted by encoded key
//! - lists and constructor fields follow the caller's [`Framing`]
//!
//! [`decode`] accepts either framing and refuses anything else, so it is a
//! total function from bytes to `Result<PlutusData, FormatError>`.

mod canonical;
mod decode;
mod primitives;

use pallas_codec::minicbor;
use pallas_crypto::hash::{Hash, Hasher};
use plutus_parser::AsPlutus;
use serde::Deserialize;

pub use canonical::canonicalize;
pub use decode::{MAX_DEPTH, decode};
pub use pallas_primitives::PlutusData;
pub use primitives::{AnyData, HashBytes, Natural, integer, integer_value};

use crate::error::{DatumError, FormatError, Result};

/// blake2b-256 digest of a datum's canonical encoding.
pub type DatumHash = Hash<32>;

/// Key, script and policy hashes as they sit inside a datum.
pub type Hash28 = HashBytes<28>;

/// Content hash over already-encoded bytes.
pub fn hash(bytes: &[u8]) -> DatumHash {
    Hasher::<256>::hash(bytes)
}

/// Array framing used for lists and constructor fields.
///
/// Empty arrays are always written definite (`0x80`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    #[default]
    Definite,
    Indefinite,
}

/// Canonical bytes with definite framing.
pub fn encode(data: &PlutusData) -> Result<Vec<u8>, FormatError> {
    encode_with(data, Framing::Definite)
}

pub fn encode_with(data: &PlutusData, framing: Framing) -> Result<Vec<u8>, FormatError> {
    let canonical = canonicalize(data.clone(), framing)?;
    write(&canonical)
}

/// Canonical tree form, independent of the framing the bytes will use.
///
/// Non-empty arrays are held indefinite, the shape `plutus_parser`'s
/// constructors produce, so decoded trees compare equal to built ones.
pub fn tree(data: PlutusData) -> Result<PlutusData, FormatError> {
    canonicalize(data, Framing::Indefinite)
}

/// Writes an already canonical tree.
pub(crate) fn write(data: &PlutusData) -> Result<Vec<u8>, FormatError> {
    minicbor::to_vec(data).map_err(|e| FormatError::Encode(e.to_string()))
}

/// Converts a typed value into its canonical tree, bytes and hash.
pub fn encode_typed<T: AsPlutus + Clone>(
    value: &T,
    framing: Framing,
) -> Result<(PlutusData, Vec<u8>, DatumHash)> {
    let data = tree(value.clone().to_plutus())?;
    let bytes = encode_with(&data, framing)?;
    let digest = hash(&bytes);
    Ok((data, bytes, digest))
}

/// Decodes bytes and converts them into a typed schema value.
pub fn decode_typed<T: AsPlutus>(bytes: &[u8]) -> Result<T> {
    from_data(decode(bytes)?)
}

/// Converts a decoded tree into `T`, naming `T` in the error.
pub fn from_data<T: AsPlutus>(data: PlutusData) -> Result<T> {
    T::from_plutus(data).map_err(|e| DatumError::SchemaMismatch {
        context: std::any::type_name::<T>(),
        reason: e.to_string(),
    })
}
