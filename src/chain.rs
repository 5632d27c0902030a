//! Reading datums back off transaction outputs.
//!
//! An output either inlines its datum or commits to a hash whose preimage
//! must appear in the witness set of the same transaction.

use pallas_primitives::conway::MintedDatumOption;
use pallas_traverse::{MultiEraOutput, MultiEraTx};
use plutus_parser::AsPlutus;

use crate::codec::{DatumHash, decode_typed, hash};
use crate::error::Result;

/// The first candidate whose bytes hash to `expected`.
pub fn datum_by_hash<'a>(
    expected: &DatumHash,
    candidates: impl IntoIterator<Item = &'a [u8]>,
) -> Option<&'a [u8]> {
    candidates
        .into_iter()
        .find(|bytes| hash(bytes) == *expected)
}

/// Raw datum bytes attached to `output`, as they were written on chain.
pub fn stored_datum_bytes(output: &MultiEraOutput, tx: &MultiEraTx) -> Option<Vec<u8>> {
    match output.datum()? {
        MintedDatumOption::Data(d) => Some(d.0.raw_cbor().to_vec()),
        MintedDatumOption::Hash(h) => {
            let witnesses = tx.plutus_data();
            let found = datum_by_hash(&h, witnesses.iter().map(|d| d.raw_cbor()));
            if found.is_none() {
                tracing::trace!(%h, "datum hash has no witness");
            }
            found.map(<[u8]>::to_vec)
        }
    }
}

/// Decodes the datum on `output` as `T`.
///
/// `Ok(None)` when the output has no resolvable datum; an error when it has
/// one that is not a `T`.
pub fn parse_datum<T: AsPlutus>(output: &MultiEraOutput, tx: &MultiEraTx) -> Result<Option<T>> {
    stored_datum_bytes(output, tx)
        .map(|bytes| decode_typed(&bytes))
        .transpose()
}
