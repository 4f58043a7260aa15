//!
//! The execution backend a query runs against.
//!

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::value::{Params, Row, SqlType};
use crate::QueryResult;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

///
/// A statement execution backend.
///
/// A `Database` prepares statements (for analysis) and executes them with
/// bound parameters. Every call to `execute` must produce a fresh cursor;
/// the cursor's rows borrow the database for at most the cursor's lifetime.
///
#[async_trait]
pub trait Database: std::fmt::Debug + Send + Sync {
    /// Describe `sql` without running it.
    async fn prepare(&self, sql: &str) -> QueryResult<StatementInfo>;

    /// Bind `params` to `sql` and start executing it.
    async fn execute<'c>(&'c self, sql: &'c str, params: Params) -> QueryResult<Cursor<'c>>;
}

///
/// Rows of one statement execution, in backend order.
///
/// Rows are produced on demand. Dropping the cursor before it is exhausted
/// abandons the execution and releases whatever the backend held for it.
///
pub struct Cursor<'c> {
    rows: BoxStream<'c, QueryResult<Row>>,
}

impl<'c> Cursor<'c> {
    pub fn new<S>(rows: S) -> Self
    where
        S: Stream<Item = QueryResult<Row>> + Send + 'c,
    {
        Self { rows: rows.boxed() }
    }

    /// A cursor over rows that are already in memory.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(stream::iter(rows.into_iter().map(Ok)))
    }

    /// Pull the next row, or `None` at the end of the result set.
    pub async fn pull_one(&mut self) -> QueryResult<Option<Row>> {
        self.rows.try_next().await
    }

    /// Pull every remaining row.
    pub async fn pull_all(self) -> QueryResult<Vec<Row>> {
        self.rows.try_collect().await
    }

    pub fn into_stream(self) -> BoxStream<'c, QueryResult<Row>> {
        self.rows
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Cursor").finish_non_exhaustive()
    }
}

/// What the backend knows about a prepared statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementInfo {
    pub parameters: Vec<ParameterInfo>,
    pub columns: Vec<ColumnInfo>,
}

impl StatementInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(mut self, ty: SqlType) -> Self {
        self.parameters.push(ParameterInfo::new(ty));
        self
    }

    pub fn column(mut self, name: &str, ty: SqlType, nullable: bool) -> Self {
        self.columns.push(ColumnInfo::new(name, ty).with_nullable(Some(nullable)));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterInfo {
    /// The backend's own name for the type.
    pub type_name: String,
    /// `None` when the backend type has no codec counterpart.
    pub ty: Option<SqlType>,
}

impl ParameterInfo {
    pub fn new(ty: SqlType) -> Self {
        Self {
            type_name: ty.name().to_owned(),
            ty: Some(ty),
        }
    }

    pub fn from_type_name(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            ty: SqlType::from_name(type_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub ty: Option<SqlType>,
    /// `None` when the backend cannot tell.
    pub nullable: Option<bool>,
}

impl ColumnInfo {
    pub fn new(name: &str, ty: SqlType) -> Self {
        Self {
            name: name.to_owned(),
            type_name: ty.name().to_owned(),
            ty: Some(ty),
            nullable: None,
        }
    }

    pub fn from_type_name(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_owned(),
            type_name: type_name.to_owned(),
            ty: SqlType::from_name(type_name),
            nullable: None,
        }
    }

    pub fn with_nullable(self, nullable: Option<bool>) -> Self {
        Self { nullable, ..self }
    }
}
