use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every fallible entry point of the store returns this; nothing in the
/// core panics or unwinds past its own boundary.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a storage-origin internal error.
    pub(crate) fn storage_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Storage, message)
    }

    /// Construct a codec-origin corruption error.
    pub(crate) fn codec_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Codec, message)
    }

    /// Construct a table-origin invariant violation.
    pub(crate) fn table_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Table, message)
    }

    /// Construct a table-origin unsupported error.
    pub(crate) fn table_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Table, message)
    }

    /// Construct an rpc-origin not-found error.
    pub(crate) fn rpc_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, ErrorOrigin::Rpc, message)
    }

    /// Construct an rpc-origin invalid-argument error.
    pub(crate) fn rpc_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::Rpc, message)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Corruption,
    Internal,
    Invalid,
    InvariantViolation,
    NotFound,
    Unauthorized,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
            Self::Invalid => "invalid",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which layer of the store raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
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

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Auth => "auth",
            Self::Codec => "codec",
            Self::Config => "config",
            Self::Index => "index",
            Self::Query => "query",
            Self::Rpc => "rpc",
            Self::Schema => "schema",
            Self::Storage => "storage",
            Self::Table => "table",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
