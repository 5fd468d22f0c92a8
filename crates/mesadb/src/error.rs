use derive_more::Display;
use mesadb_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers and wire payloads.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced row or user does not exist.
    NotFound,

    /// Concurrent or state conflict.
    Conflict,

    /// Persisted data could not be decoded.
    Corruption,

    /// An internal precondition did not hold (duplicate id).
    InvariantViolation,

    /// The request is well-formed but not supported.
    Unsupported,

    /// Credentials were rejected.
    Unauthorized,

    /// The request itself is malformed.
    Invalid,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::Corruption => Self::Corruption,
            ErrorClass::InvariantViolation => Self::InvariantViolation,
            ErrorClass::Unsupported => Self::Unsupported,
            ErrorClass::Unauthorized => Self::Unauthorized,
            ErrorClass::Invalid => Self::Invalid,
            ErrorClass::Internal => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers and wire payloads.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    Auth,
    Codec,
    Config,
    Index,
    Query,
    Rpc,
    Schema,
    Storage,
    Table,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Auth => Self::Auth,
            CoreErrorOrigin::Codec => Self::Codec,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Index => Self::Index,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Rpc => Self::Rpc,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Storage => Self::Storage,
            CoreErrorOrigin::Table => Self::Table,
        }
    }
}

///
/// TESTS
///
