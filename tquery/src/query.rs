//!
//! Parameterized queries.
//!

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::FutureExt;

use crate::analysis::Analysis;
use crate::codec::{Decode, Encode, RowDecoder};
use crate::database::Database;
use crate::diagnostics::{Diagnostics, SourceLocation};
use crate::exec;
use crate::map::{Contramap, Fixed, Map};
use crate::optional::Optional;
use crate::value::{Params, Row};
use crate::QueryResult;

///
/// A statement taking an `Input` and producing rows of `Output`.
///
/// A `Query` is an immutable description. Every execution-shape method
/// (`stream`, `list`, `vector`, `unique`, `option`, `optional`, `sink`)
/// returns a suspended computation: the database is not contacted until it
/// is polled, and each returned computation executes the statement at most
/// once. Dropping it early cancels the execution and releases the cursor.
///
/// `map`, `contramap` and `to_query0` derive new queries that share this
/// query's [`Diagnostics`].
///
pub trait Query: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn diagnostics(&self) -> &Diagnostics;

    /// Turn an input value into statement parameters.
    fn encode(&self, input: Self::Input) -> QueryResult<Params>;

    /// Turn one fetched row into an output value.
    fn decode(&self, row: Row) -> QueryResult<Self::Output>;

    fn sql(&self) -> &str {
        self.diagnostics().sql()
    }

    fn location(&self) -> Option<&SourceLocation> {
        self.diagnostics().location()
    }

    /// Rows as a lazy stream.
    ///
    /// The input is encoded right away; the statement runs when the stream is
    /// first polled, and rows (and their decode errors) are produced one at a
    /// time as the stream is consumed.
    fn stream<'a, D: Database>(
        &'a self,
        db: &'a D,
        input: Self::Input,
    ) -> BoxStream<'a, QueryResult<Self::Output>> {
        exec::stream(db, self.diagnostics(), self.encode(input), move |row| {
            self.decode(row)
        })
    }

    /// All rows, in statement order.
    fn list<'a, D: Database>(
        &'a self,
        db: &'a D,
        input: Self::Input,
    ) -> BoxFuture<'a, QueryResult<Vec<Self::Output>>> {
        exec::list(db, self.diagnostics(), self.encode(input), move |row| {
            self.decode(row)
        })
        .boxed()
    }

    /// All rows as a fixed-size slice. Same as `list`.
    fn vector<'a, D: Database>(
        &'a self,
        db: &'a D,
        input: Self::Input,
    ) -> BoxFuture<'a, QueryResult<Box<[Self::Output]>>> {
        self.list(db, input)
            .map(|result| result.map(Vec::into_boxed_slice))
            .boxed()
    }

    /// Exactly one row, otherwise a cardinality error.
    fn unique<'a, D: Database>(
        &'a self,
        db: &'a D,
        input: Self::Input,
    ) -> BoxFuture<'a, QueryResult<Self::Output>> {
        exec::unique(db, self.diagnostics(), self.encode(input), move |row| {
            self.decode(row)
        })
        .boxed()
    }

    /// Zero or one row; more is a cardinality error.
    fn option<'a, D: Database>(
        &'a self,
        db: &'a D,
        input: Self::Input,
    ) -> BoxFuture<'a, QueryResult<Option<Self::Output>>> {
        exec::option(db, self.diagnostics(), self.encode(input), move |row| {
            self.decode(row)
        })
        .boxed()
    }

    /// Like `option`, as a chainable [`Optional`].
    fn optional<'a, D: Database>(&'a self, db: &'a D, input: Self::Input) -> Optional<'a, Self::Output> {
        Optional::new(self.option(db, input))
    }

    /// Run `func` on every row as it is streamed.
    fn sink<'a, D, F, Fut>(
        &'a self,
        db: &'a D,
        input: Self::Input,
        func: F,
    ) -> BoxFuture<'a, QueryResult<()>>
    where
        D: Database,
        F: FnMut(Self::Output) -> Fut + Send + 'a,
        Fut: Future<Output = QueryResult<()>> + Send + 'a,
    {
        exec::sink(self.stream(db, input), func).boxed()
    }

    /// Check the statement against the database's own description of it.
    fn analysis<'a, D: Database>(&'a self, db: &'a D) -> BoxFuture<'a, QueryResult<Analysis>> {
        self.diagnostics().analyze(db)
    }

    /// Transform every output value.
    fn map<B, F>(self, func: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> B + Send + Sync,
        B: Send,
    {
        Map::new(self, func)
    }

    /// Adapt the input type.
    fn contramap<C, F>(self, func: F) -> Contramap<Self, F, C>
    where
        Self: Sized,
        F: Fn(C) -> Self::Input + Send + Sync,
        C: Send,
    {
        Contramap::new(self, func)
    }

    /// `contramap(before)` followed by `map(after)`.
    fn dimap<C, B, F, G>(self, before: F, after: G) -> Map<Contramap<Self, F, C>, G>
    where
        Self: Sized,
        F: Fn(C) -> Self::Input + Send + Sync,
        G: Fn(Self::Output) -> B + Send + Sync,
        C: Send,
        B: Send,
    {
        self.contramap(before).map(after)
    }

    /// Fix the input, producing a zero-parameter query.
    fn to_query0(self, input: Self::Input) -> Fixed<Self>
    where
        Self: Sized,
        Self::Input: Clone + Sync,
    {
        Fixed::new(self, input)
    }
}

/// A query built from statement text, with `I` and `O` codecs.
pub struct TypedQuery<I, O> {
    diagnostics: Arc<Diagnostics>,
    types: PhantomData<fn(I) -> O>,
}

impl<I, O> TypedQuery<I, O>
where
    I: Encode,
    O: Decode,
{
    /// New query, recording the caller as its source location.
    #[track_caller]
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_location(sql, Some(SourceLocation::caller()))
    }

    pub fn with_location(sql: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            diagnostics: Arc::new(Diagnostics::new(
                sql.into(),
                location,
                I::columns(),
                O::columns(),
            )),
            types: PhantomData,
        }
    }
}

impl<I, O> Query for TypedQuery<I, O>
where
    I: Encode + Send,
    O: Decode + Send,
{
    type Input = I;
    type Output = O;

    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn encode(&self, input: I) -> QueryResult<Params> {
        let mut params = Params::new();
        input.encode(&mut params)?;
        Ok(params)
    }

    fn decode(&self, row: Row) -> QueryResult<O> {
        RowDecoder::decode_row(row)
    }
}

impl<I, O> Clone for TypedQuery<I, O> {
    fn clone(&self) -> Self {
        Self {
            diagnostics: self.diagnostics.clone(),
            types: PhantomData,
        }
    }
}

impl<I, O> std::fmt::Debug for TypedQuery<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TypedQuery")
            .field("sql", &self.diagnostics.sql())
            .field("location", &self.diagnostics.location())
            .finish()
    }
}

/// Shorthand for [`TypedQuery::new`].
#[track_caller]
pub fn query<I, O>(sql: impl Into<String>) -> TypedQuery<I, O>
where
    I: Encode,
    O: Decode,
{
    TypedQuery::new(sql)
}
