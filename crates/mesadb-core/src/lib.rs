//! Core runtime for MesaDB: an embedded, schema-light document store with
//! chainable query builders, lazily rebuilt equality indexes, a session
//! store and named procedures, all over a synchronous blob store.
#![warn(unreachable_pub)]

#[macro_use]
mod macros;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod obs;
pub mod rpc;
pub mod storage;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Vocabulary for writing queries: the store, records, values and the
/// filter methods.
///

pub mod prelude {
    pub use crate::{
        db::{
            Store,
            query::FilterExt as _,
            record::{Collection, Record},
        },
        record,
        value::Value,
    };
}
