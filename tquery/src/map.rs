//!
//! Transformations over queries.
//!
//! `Query` is contravariant in its input and covariant in its output;
//! `Query0` is covariant only. The wrappers here hold the inner query and
//! the function, and delegate diagnostics unchanged, so a derived query
//! always reports the same statement and source location as its origin.
//!

use std::marker::PhantomData;

use crate::diagnostics::Diagnostics;
use crate::query::Query;
use crate::query0::Query0;
use crate::value::{Params, Row};
use crate::QueryResult;

/// Output mapped through `F`. Works over both `Query` and `Query0`.
///
/// `F` runs once per decoded row, never for rows that are not pulled.
#[derive(Clone)]
pub struct Map<Q, F> {
    query: Q,
    func: F,
}

impl<Q, F> Map<Q, F> {
    pub(crate) fn new(query: Q, func: F) -> Self {
        Self { query, func }
    }
}

impl<Q, F, B> Query for Map<Q, F>
where
    Q: Query,
    F: Fn(Q::Output) -> B + Send + Sync,
    B: Send,
{
    type Input = Q::Input;
    type Output = B;

    fn diagnostics(&self) -> &Diagnostics {
        self.query.diagnostics()
    }

    fn encode(&self, input: Q::Input) -> QueryResult<Params> {
        self.query.encode(input)
    }

    fn decode(&self, row: Row) -> QueryResult<B> {
        self.query.decode(row).map(&self.func)
    }
}

impl<Q, F, B> Query0 for Map<Q, F>
where
    Q: Query0,
    F: Fn(Q::Output) -> B + Send + Sync,
    B: Send,
{
    type Output = B;

    fn diagnostics(&self) -> &Diagnostics {
        self.query.diagnostics()
    }

    fn params(&self) -> QueryResult<Params> {
        self.query.params()
    }

    fn decode(&self, row: Row) -> QueryResult<B> {
        self.query.decode(row).map(&self.func)
    }
}

/// Input adapted through `F`, which runs once per invocation.
pub struct Contramap<Q, F, C> {
    query: Q,
    func: F,
    input: PhantomData<fn(C)>,
}

impl<Q, F, C> Contramap<Q, F, C> {
    pub(crate) fn new(query: Q, func: F) -> Self {
        Self {
            query,
            func,
            input: PhantomData,
        }
    }
}

impl<Q, F, C> Query for Contramap<Q, F, C>
where
    Q: Query,
    F: Fn(C) -> Q::Input + Send + Sync,
    C: Send,
{
    type Input = C;
    type Output = Q::Output;

    fn diagnostics(&self) -> &Diagnostics {
        self.query.diagnostics()
    }

    fn encode(&self, input: C) -> QueryResult<Params> {
        self.query.encode((self.func)(input))
    }

    fn decode(&self, row: Row) -> QueryResult<Q::Output> {
        self.query.decode(row)
    }
}

impl<Q: Clone, F: Clone, C> Clone for Contramap<Q, F, C> {
    fn clone(&self) -> Self {
        Self::new(self.query.clone(), self.func.clone())
    }
}

/// A `Query` with its input fixed, seen as a `Query0`.
///
/// The input is re-encoded on every execution.
pub struct Fixed<Q: Query> {
    query: Q,
    input: Q::Input,
}

impl<Q: Query> Fixed<Q> {
    pub(crate) fn new(query: Q, input: Q::Input) -> Self {
        Self { query, input }
    }

    pub fn input(&self) -> &Q::Input {
        &self.input
    }
}

impl<Q> Clone for Fixed<Q>
where
    Q: Query + Clone,
    Q::Input: Clone,
{
    fn clone(&self) -> Self {
        Self::new(self.query.clone(), self.input.clone())
    }
}

impl<Q> Query0 for Fixed<Q>
where
    Q: Query,
    Q::Input: Clone + Sync,
{
    type Output = Q::Output;

    fn diagnostics(&self) -> &Diagnostics {
        self.query.diagnostics()
    }

    fn params(&self) -> QueryResult<Params> {
        self.query.encode(self.input.clone())
    }

    fn decode(&self, row: Row) -> QueryResult<Q::Output> {
        self.query.decode(row)
    }
}
