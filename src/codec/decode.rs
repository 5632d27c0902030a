use pallas_codec::minicbor::data::Token;
use pallas_codec::minicbor::decode::{Error as CborError, Tokenizer};
use pallas_codec::minicbor::Decoder;
use pallas_primitives::PlutusData;

use crate::error::FormatError;

/// Nesting bound; datums are shallow, anything deeper is hostile input.
pub const MAX_DEPTH: usize = 128;

/// Decodes one complete Plutus-data value.
///
/// Definite and indefinite framing are both accepted. Text strings, floats,
/// simple values, unknown tags, duplicate map keys and trailing bytes are
/// rejected. The result is in canonical tree form (see [`tree`]), so equal
/// values decode to equal trees whatever framing they were written with.
///
/// [`tree`]: super::tree
pub fn decode(bytes: &[u8]) -> Result<PlutusData, FormatError> {
    check_depth(bytes)?;
    let mut decoder = Decoder::new(bytes);
    let data: PlutusData = decoder.decode().map_err(|e| from_cbor(e, bytes.len()))?;
    let end = decoder.position();
    if end != bytes.len() {
        return Err(FormatError::TrailingBytes {
            remaining: bytes.len() - end,
        });
    }
    super::tree(data)
}

fn from_cbor(e: CborError, len: usize) -> FormatError {
    if e.is_end_of_input() {
        FormatError::UnexpectedEof {
            offset: e.position().unwrap_or(len),
        }
    } else {
        FormatError::Malformed {
            offset: e.position(),
            reason: e.to_string(),
        }
    }
}

/// Walks the token stream of the first item and refuses nesting beyond
/// [`MAX_DEPTH`] before the recursive decoder sees it.
fn check_depth(bytes: &[u8]) -> Result<(), FormatError> {
    // items still expected by each open container; `None` until a break
    let mut open: Vec<Option<u64>> = Vec::new();
    for token in Tokenizer::new(bytes) {
        let token = token.map_err(|e| from_cbor(e, bytes.len()))?;
        let opened = match token {
            Token::Array(n) => Some(Some(n)),
            Token::Map(n) => Some(Some(n.saturating_mul(2))),
            Token::BeginArray | Token::BeginMap | Token::BeginBytes | Token::BeginString => {
                Some(None)
            }
            Token::Tag(_) => continue,
            Token::Break => {
                open.pop();
                None
            }
            _ => None,
        };
        if let Some(expected) = opened {
            if expected != Some(0) {
                open.push(expected);
                if open.len() > MAX_DEPTH {
                    return Err(FormatError::TooDeep { max: MAX_DEPTH });
                }
                continue;
            }
        }
        // one item finished; close every definite container it completes
        loop {
            match open.last_mut() {
                None => return Ok(()),
                Some(None) => break,
                Some(Some(left)) => {
                    *left -= 1;
                    if *left > 0 {
                        break;
                    }
                    open.pop();
                }
            }
        }
    }
    Ok(())
}
