//! Query builders.
//!
//! Builders accumulate a query spec through chained calls and run it
//! only on `execute()`. Executing twice replays the same query spec
//! against whatever the table holds at that moment.

mod executor;
pub mod predicate;
mod select;
mod write;

pub use predicate::{CompareOp, Filter, FilterExt, Predicate};
pub use select::{
    CountQuery, OrderDirection, OrderTerm, Projection, QuerySpec, SelectQuery, SingleQuery,
};
pub use write::{DeleteQuery, InsertQuery, InsertRows, UpdateQuery};
