//!
//! Queries without parameters.
//!

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::FutureExt;

use crate::analysis::Analysis;
use crate::codec::{Decode, RowDecoder};
use crate::database::Database;
use crate::diagnostics::{Diagnostics, SourceLocation};
use crate::exec;
use crate::map::Map;
use crate::optional::Optional;
use crate::value::{Params, Row};
use crate::QueryResult;

///
/// A statement producing rows of `Output` with no variable input.
///
/// Same contract as [`Query`](crate::Query) with the input erased. Either
/// the statement takes no parameters at all ([`TypedQuery0`]), or its input
/// was fixed up front ([`Fixed`](crate::map::Fixed)).
///
pub trait Query0: Send + Sync {
    type Output: Send;

    fn diagnostics(&self) -> &Diagnostics;

    /// The parameters to bind on every execution.
    fn params(&self) -> QueryResult<Params>;

    fn decode(&self, row: Row) -> QueryResult<Self::Output>;

    fn sql(&self) -> &str {
        self.diagnostics().sql()
    }

    fn location(&self) -> Option<&SourceLocation> {
        self.diagnostics().location()
    }

    fn stream<'a, D: Database>(&'a self, db: &'a D) -> BoxStream<'a, QueryResult<Self::Output>> {
        exec::stream(db, self.diagnostics(), self.params(), move |row| {
            self.decode(row)
        })
    }

    fn list<'a, D: Database>(&'a self, db: &'a D) -> BoxFuture<'a, QueryResult<Vec<Self::Output>>> {
        exec::list(db, self.diagnostics(), self.params(), move |row| {
            self.decode(row)
        })
        .boxed()
    }

    fn vector<'a, D: Database>(
        &'a self,
        db: &'a D,
    ) -> BoxFuture<'a, QueryResult<Box<[Self::Output]>>> {
        self.list(db)
            .map(|result| result.map(Vec::into_boxed_slice))
            .boxed()
    }

    fn unique<'a, D: Database>(&'a self, db: &'a D) -> BoxFuture<'a, QueryResult<Self::Output>> {
        exec::unique(db, self.diagnostics(), self.params(), move |row| {
            self.decode(row)
        })
        .boxed()
    }

    fn option<'a, D: Database>(
        &'a self,
        db: &'a D,
    ) -> BoxFuture<'a, QueryResult<Option<Self::Output>>> {
        exec::option(db, self.diagnostics(), self.params(), move |row| {
            self.decode(row)
        })
        .boxed()
    }

    fn optional<'a, D: Database>(&'a self, db: &'a D) -> Optional<'a, Self::Output> {
        Optional::new(self.option(db))
    }

    fn sink<'a, D, F, Fut>(&'a self, db: &'a D, func: F) -> BoxFuture<'a, QueryResult<()>>
    where
        D: Database,
        F: FnMut(Self::Output) -> Fut + Send + 'a,
        Fut: Future<Output = QueryResult<()>> + Send + 'a,
    {
        exec::sink(self.stream(db), func).boxed()
    }

    fn analysis<'a, D: Database>(&'a self, db: &'a D) -> BoxFuture<'a, QueryResult<Analysis>> {
        self.diagnostics().analyze(db)
    }

    fn map<B, F>(self, func: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> B + Send + Sync,
        B: Send,
    {
        Map::new(self, func)
    }
}

/// A parameterless query built from statement text and an `O` decoder.
pub struct TypedQuery0<O> {
    diagnostics: Arc<Diagnostics>,
    output: PhantomData<fn() -> O>,
}

impl<O: Decode> TypedQuery0<O> {
    #[track_caller]
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_location(sql, Some(SourceLocation::caller()))
    }

    pub fn with_location(sql: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            diagnostics: Arc::new(Diagnostics::new(
                sql.into(),
                location,
                vec![],
                O::columns(),
            )),
            output: PhantomData,
        }
    }
}

impl<O> Query0 for TypedQuery0<O>
where
    O: Decode + Send,
{
    type Output = O;

    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn params(&self) -> QueryResult<Params> {
        Ok(Params::new())
    }

    fn decode(&self, row: Row) -> QueryResult<O> {
        RowDecoder::decode_row(row)
    }
}

impl<O> Clone for TypedQuery0<O> {
    fn clone(&self) -> Self {
        Self {
            diagnostics: self.diagnostics.clone(),
            output: PhantomData,
        }
    }
}

impl<O> std::fmt::Debug for TypedQuery0<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TypedQuery0")
            .field("sql", &self.diagnostics.sql())
            .field("location", &self.diagnostics.location())
            .finish()
    }
}

/// Shorthand for [`TypedQuery0::new`].
#[track_caller]
pub fn query0<O: Decode>(sql: impl Into<String>) -> TypedQuery0<O> {
    TypedQuery0::new(sql)
}
