//! Error types shared by every module in the crate.
//!
//! All failures are local and synchronous. Builders either return a complete
//! [`Built`](crate::schema::Built) value or one of these errors; nothing is
//! partially applied.

use thiserror::Error;

use crate::schema::SchemaVersion;

/// Failure to read or write canonical Plutus data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("{remaining} trailing bytes after a complete value")]
    TrailingBytes { remaining: usize },

    #[error("not plutus data (offset {offset:?}): {reason}")]
    Malformed {
        offset: Option<usize>,
        reason: String,
    },

    #[error("duplicate map key {key}")]
    DuplicateMapKey { key: String },

    #[error("nesting deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("cbor encoder: {0}")]
    Encode(String),
}

/// Unified error for address resolution, AMM math and datum construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatumError {
    #[error("malformed datum: {0}")]
    Format(#[from] FormatError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address belongs to network {embedded}, expected network {expected}")]
    NetworkMismatch { embedded: u8, expected: u8 },

    /// An output locked by a script without a datum can never be spent.
    #[error("script destination requires a datum hash or inline datum; funds would be locked")]
    MissingScriptDatum,

    #[error("argument out of domain: {0}")]
    Domain(String),

    #[error("pool ident is {length} bytes, expected {min}..={max}")]
    InvalidPoolIdent { length: usize, min: usize, max: usize },

    #[error("{context} does not match its schema: {reason}")]
    SchemaMismatch {
        context: &'static str,
        reason: String,
    },

    #[error("{feature} is not supported by the {version} schema")]
    Unsupported {
        version: SchemaVersion,
        feature: &'static str,
    },

    #[error("protocol configuration: {0}")]
    Config(String),
}

impl DatumError {
    pub(crate) fn domain(reason: impl Into<String>) -> Self {
        Self::Domain(reason.into())
    }

    pub(crate) fn mismatch(context: &'static str, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            context,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DatumError> = std::result::Result<T, E>;
