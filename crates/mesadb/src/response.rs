use crate::error::Error;
use mesadb_core::error::InternalError;
use serde::{Deserialize, Serialize};

///
/// Response
///
/// The `{data, error}` pair every client call resolves to. At most one
/// side is populated; both empty means "nothing matched", which is not a
/// failure.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Response<T> {
    pub data: Option<T>,
    pub error: Option<Error>,
}

impl<T> Response<T> {
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Success with no row.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn fail(error: Error) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Back to a `Result`; `Ok(None)` is the empty success.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }

    /// Lift a core result whose success may carry no row.
    pub fn from_optional(result: Result<Option<T>, InternalError>) -> Self {
        match result {
            Ok(Some(data)) => Self::ok(data),
            Ok(None) => Self::empty(),
            Err(err) => Self::from(Err::<T, _>(err)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: self.data.map(f),
            error: self.error,
        }
    }
}

impl<T> From<Result<T, InternalError>> for Response<T> {
    fn from(result: Result<T, InternalError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                tracing::debug!(error = %err.display_with_class(), "call failed");
                Self::fail(err.into())
            }
        }
    }
}
