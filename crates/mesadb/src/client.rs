//! Remote-style adapter over the synchronous store.
//!
//! Every builder here can be `.await`ed like a network call. Awaiting runs
//! the query on the spot and resolves immediately to a [`Response`]; there
//! is no I/O suspension, so there is nothing to cancel.

use crate::{error::Error, response::Response};
use mesadb_core::{
    auth::Session,
    config::StoreConfig,
    db::{
        Store,
        query::{
            CountQuery, DeleteQuery, Filter, FilterExt, InsertQuery, InsertRows, SelectQuery,
            SingleQuery, UpdateQuery,
        },
        record::Record,
        table::Table,
    },
    error::InternalError,
    storage::{BlobStore, MemoryBlobStore},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::future::{IntoFuture, Ready, ready};

///
/// Client
/// Owns one store and hands out table, auth and rpc entry points.
///

pub struct Client {
    store: Store,
}

impl Client {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn open(config: StoreConfig, blobs: impl BlobStore + 'static) -> Result<Self, Error> {
        Ok(Self::new(Store::open(config, blobs)?))
    }

    pub fn in_memory() -> Result<Self, Error> {
        Self::open(StoreConfig::default(), MemoryBlobStore::new())
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access, for registering procedures.
    pub const fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    #[must_use]
    pub fn from(&self, table: impl Into<String>) -> TableClient<'_> {
        TableClient {
            table: self.store.from(table),
        }
    }

    #[must_use]
    pub const fn auth(&self) -> AuthClient<'_> {
        AuthClient { store: &self.store }
    }

    /// Call a named procedure with a map (or null) of parameters.
    #[must_use]
    pub fn rpc(&self, name: impl Into<String>, params: impl Into<Value>) -> RpcCall<'_> {
        RpcCall {
            store: &self.store,
            name: name.into(),
            params: params.into(),
        }
    }
}

///
/// Execute
/// Runs one core builder and wraps its result.
///

pub trait Execute {
    type Output;

    fn run(&self) -> Response<Self::Output>;
}

impl Execute for SelectQuery<'_> {
    type Output = Vec<Record>;

    fn run(&self) -> Response<Self::Output> {
        self.execute().into()
    }
}

impl Execute for SingleQuery<'_> {
    type Output = Record;

    fn run(&self) -> Response<Self::Output> {
        Response::from_optional(self.execute())
    }
}

impl Execute for CountQuery<'_> {
    type Output = usize;

    fn run(&self) -> Response<Self::Output> {
        self.execute().into()
    }
}

impl Execute for InsertQuery<'_> {
    type Output = Vec<Record>;

    fn run(&self) -> Response<Self::Output> {
        self.execute().into()
    }
}

impl Execute for UpdateQuery<'_> {
    type Output = Vec<Record>;

    fn run(&self) -> Response<Self::Output> {
        self.execute().into()
    }
}

impl Execute for DeleteQuery<'_> {
    type Output = usize;

    fn run(&self) -> Response<Self::Output> {
        self.execute().into()
    }
}

///
/// Query
///
/// Awaitable wrapper around a core builder. Filter methods chain as on
/// the core builder. Awaiting `&query` runs it again without consuming.
///

#[derive(Clone)]
pub struct Query<Q> {
    inner: Q,
}

impl<Q: Execute> Query<Q> {
    const fn new(inner: Q) -> Self {
        Self { inner }
    }

    #[must_use]
    pub const fn inner(&self) -> &Q {
        &self.inner
    }

    /// Run synchronously.
    pub fn execute(&self) -> Response<Q::Output> {
        self.inner.run()
    }

    fn map(self, f: impl FnOnce(Q) -> Q) -> Self {
        Self::new(f(self.inner))
    }
}

impl<Q: FilterExt> FilterExt for Query<Q> {
    fn filter_mut(&mut self) -> &mut Filter {
        self.inner.filter_mut()
    }
}

impl<Q: Execute> IntoFuture for Query<Q> {
    type Output = Response<Q::Output>;
    type IntoFuture = Ready<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        ready(self.execute())
    }
}

impl<Q: Execute> IntoFuture for &Query<Q> {
    type Output = Response<Q::Output>;
    type IntoFuture = Ready<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        ready(self.execute())
    }
}

impl<'a> Query<SelectQuery<'a>> {
    #[must_use]
    pub fn order(self, column: impl Into<String>, ascending: bool) -> Self {
        self.map(|q| q.order(column, ascending))
    }

    #[must_use]
    pub fn order_by(self, column: impl Into<String>) -> Self {
        self.map(|q| q.order_by(column))
    }

    #[must_use]
    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.map(|q| q.order_by_desc(column))
    }

    #[must_use]
    pub fn limit(self, n: usize) -> Self {
        self.map(|q| q.limit(n))
    }

    #[must_use]
    pub fn range(self, from: usize, to: usize) -> Self {
        self.map(|q| q.range(from, to))
    }

    #[must_use]
    pub fn single(self) -> Query<SingleQuery<'a>> {
        Query::new(self.inner.single())
    }

    #[must_use]
    pub fn count(self) -> Query<CountQuery<'a>> {
        Query::new(self.inner.count())
    }
}

///
/// TableClient
///

pub struct TableClient<'a> {
    table: Table<'a>,
}

impl<'a> TableClient<'a> {
    /// `columns` is `*` or a comma-separated list.
    #[must_use]
    pub fn select(self, columns: &str) -> Query<SelectQuery<'a>> {
        Query::new(self.table.select(columns))
    }

    #[must_use]
    pub fn insert(self, rows: impl Into<InsertRows>) -> Query<InsertQuery<'a>> {
        Query::new(self.table.insert(rows))
    }

    #[must_use]
    pub fn update(self, patch: Record) -> Query<UpdateQuery<'a>> {
        Query::new(self.table.update(patch))
    }

    #[must_use]
    pub fn delete(self) -> Query<DeleteQuery<'a>> {
        Query::new(self.table.delete())
    }
}

///
/// Credentials
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

///
/// AuthClient
/// Auth calls run when made and return an already-resolved future.
///

pub struct AuthClient<'a> {
    store: &'a Store,
}

impl AuthClient<'_> {
    pub fn sign_in_with_password(&self, credentials: &Credentials) -> Ready<Response<Session>> {
        ready(
            self.store
                .auth()
                .sign_in_with_password(&credentials.email, &credentials.password)
                .into(),
        )
    }

    pub fn sign_out(&self) -> Ready<Response<()>> {
        ready(self.store.auth().sign_out().into())
    }

    /// Never an error: no session is `data: None`.
    pub fn get_session(&self) -> Ready<Response<Session>> {
        ready(Response::from_optional(Ok(self.store.auth().get_session())))
    }
}

///
/// RpcCall
/// Deferred procedure call; runs on await.
///

#[derive(Clone)]
pub struct RpcCall<'a> {
    store: &'a Store,
    name: String,
    params: Value,
}

impl RpcCall<'_> {
    pub fn execute(&self) -> Response<Value> {
        let result: Result<Value, InternalError> = self.store.rpc(&self.name, &self.params);

        result.into()
    }
}

impl IntoFuture for RpcCall<'_> {
    type Output = Response<Value>;
    type IntoFuture = Ready<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        ready(self.execute())
    }
}
