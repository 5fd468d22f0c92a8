//! ## Crate layout
//! - `client`: awaitable table, auth and rpc entry points over one store.
//! - `error`: the public, serializable error taxonomy.
//! - `response`: the `{data, error}` pair every call resolves to.
//!
//! The storage core is re-exported as [`core`] for callers that want the
//! synchronous API directly.

pub use mesadb_core as core;

pub mod client;
pub mod error;
pub mod response;

pub use client::{Client, Credentials};
pub use error::{Error, ErrorKind, ErrorOrigin};
pub use response::Response;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        client::{Client, Credentials},
        core::{
            db::{
                query::FilterExt as _,
                record::{Collection, Record},
            },
            record,
            value::Value,
        },
        error::Error,
        response::Response,
    };
}
