//!
//! Statement identity shared by a query and everything derived from it.
//!

use std::fmt;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::analysis::Analysis;
use crate::codec::ColumnShape;
use crate::database::Database;
use crate::QueryResult;

/// Where a query was defined.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Location of the caller, propagated through `#[track_caller]` frames.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(std::panic::Location::caller())
    }
}

impl From<&'static std::panic::Location<'static>> for SourceLocation {
    fn from(location: &'static std::panic::Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// # Diagnostics
///
/// The statement text, its definition site, and the parameter/column shapes
/// the codecs expect. Created once per constructed query and shared by
/// reference (through an `Arc`) with every `map`, `contramap` and `to_query0`
/// derivative, so none of them can drift from the original.
#[derive(Debug)]
pub struct Diagnostics {
    sql: String,
    location: Option<SourceLocation>,
    parameters: Vec<ColumnShape>,
    columns: Vec<ColumnShape>,
}

impl Diagnostics {
    pub fn new(
        sql: String,
        location: Option<SourceLocation>,
        parameters: Vec<ColumnShape>,
        columns: Vec<ColumnShape>,
    ) -> Self {
        Self {
            sql,
            location,
            parameters,
            columns,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Shape of the parameters the input encoder writes.
    pub fn parameters(&self) -> &[ColumnShape] {
        &self.parameters
    }

    /// Shape of the columns the output decoder reads.
    pub fn columns(&self) -> &[ColumnShape] {
        &self.columns
    }

    /// Ask the database to describe the statement and compare it with
    /// the expected shapes. Nothing happens until the future is polled.
    pub fn analyze<'a, D: Database>(&'a self, db: &'a D) -> BoxFuture<'a, QueryResult<Analysis>> {
        async move {
            let info = db.prepare(&self.sql).await?;
            Ok(Analysis::new(self, &info))
        }
        .boxed()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "`{}` (defined at {})", self.sql, location),
            None => write!(f, "`{}`", self.sql),
        }
    }
}
