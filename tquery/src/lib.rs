//!
//! Typed, composable SQL queries.
//!
//! A query is a value: statement text plus an input encoder and an output
//! decoder. It runs against any [`Database`] in several shapes
//!
//! ```text
//! stream   lazy rows, pulled on demand
//! list     every row, in order
//! vector   every row, as a boxed slice
//! unique   exactly one row
//! option   zero or one row
//! sink     an effect per row
//! ```
//!
//! and can be transformed with `map` and `contramap` without touching the
//! statement. Every shape returns a suspended computation; nothing reaches
//! the database until it is polled.
//!
//! ```ignore
//! use tquery::prelude::*;
//!
//! let by_id = query::<i32, (i32, String)>("SELECT id, name FROM users WHERE id = $1");
//! let name = by_id.map(|(_, name)| name);
//!
//! let ann: String = name.unique(&db, 42).await?;
//! ```
//!

use std::sync::Arc;

pub use tquery_macros::*;

// Lets the derive macros refer to `::tquery` from inside this crate's tests.
extern crate self as tquery;

pub mod analysis;
pub mod codec;
pub mod database;
pub mod diagnostics;
pub mod map;
pub mod optional;
pub mod prelude;
pub mod query;
pub mod query0;
pub mod value;

mod exec;

pub use analysis::{Analysis, Mismatch};
pub use codec::{DecodeError, EncodeError};
pub use database::Database;
pub use diagnostics::{Diagnostics, SourceLocation};
pub use exec::CardinalityError;
pub use optional::Optional;
pub use query::{query, Query, TypedQuery};
pub use query0::{query0, Query0, TypedQuery0};

#[derive(thiserror::Error, Debug, Clone)]
pub enum QueryError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Cardinality(#[from] CardinalityError),

    /// Anything the backend reported. Passed through untouched.
    #[error("backend error: {0}")]
    Backend(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Arc::new(error))
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
