use pallas_primitives::{Constr, KeyValuePairs, MaybeIndefArray, PlutusData};

use super::primitives::{from_ledger_int, to_ledger_int};
use super::{Framing, MAX_DEPTH, write};
use crate::error::FormatError;

/// Rewrites `data` into the one representation the encoder emits.
///
/// Integers take their shortest form, constructor tags their compact form,
/// non-empty arrays the requested framing, and maps become definite with
/// entries sorted by the bytes of their encoded keys. Two keys that encode
/// identically are rejected.
pub fn canonicalize(data: PlutusData, framing: Framing) -> Result<PlutusData, FormatError> {
    canonical(data, framing, 0)
}

fn canonical(data: PlutusData, framing: Framing, depth: usize) -> Result<PlutusData, FormatError> {
    if depth > MAX_DEPTH {
        return Err(FormatError::TooDeep { max: MAX_DEPTH });
    }
    Ok(match data {
        PlutusData::BigInt(n) => PlutusData::BigInt(to_ledger_int(&from_ledger_int(&n))),
        PlutusData::BoundedBytes(b) => PlutusData::BoundedBytes(b),
        PlutusData::Array(items) => {
            PlutusData::Array(frame(children(items.to_vec(), framing, depth)?, framing))
        }
        PlutusData::Constr(c) => {
            let index = constructor_index(&c)?;
            let fields = children(c.fields.to_vec(), framing, depth)?;
            let (tag, any_constructor) = match index {
                0..=6 => (121 + index, None),
                7..=127 => (1280 + index - 7, None),
                _ => (102, Some(index)),
            };
            PlutusData::Constr(Constr {
                tag,
                any_constructor,
                fields: frame(fields, framing),
            })
        }
        PlutusData::Map(entries) => {
            let mut keyed = Vec::with_capacity(entries.len());
            for (key, value) in entries.to_vec() {
                let key = canonical(key, framing, depth + 1)?;
                let value = canonical(value, framing, depth + 1)?;
                keyed.push((write(&key)?, key, value));
            }
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            if let Some(pair) = keyed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
                return Err(FormatError::DuplicateMapKey {
                    key: hex::encode(&pair[0].0),
                });
            }
            PlutusData::Map(KeyValuePairs::Def(
                keyed.into_iter().map(|(_, k, v)| (k, v)).collect(),
            ))
        }
    })
}

fn children(
    items: Vec<PlutusData>,
    framing: Framing,
    depth: usize,
) -> Result<Vec<PlutusData>, FormatError> {
    items
        .into_iter()
        .map(|item| canonical(item, framing, depth + 1))
        .collect()
}

fn frame(items: Vec<PlutusData>, framing: Framing) -> MaybeIndefArray<PlutusData> {
    match framing {
        Framing::Indefinite if !items.is_empty() => MaybeIndefArray::Indef(items),
        _ => MaybeIndefArray::Def(items),
    }
}

fn constructor_index(c: &Constr<PlutusData>) -> Result<u64, FormatError> {
    match (c.tag, c.any_constructor) {
        (121..=127, _) => Ok(c.tag - 121),
        (1280..=1400, _) => Ok(c.tag - 1280 + 7),
        (102, Some(index)) => Ok(index),
        (tag, _) => Err(FormatError::Malformed {
            offset: None,
            reason: format!("constructor tag {tag}"),
        }),
    }
}
