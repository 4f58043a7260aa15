//!
//! Execution shapes shared by `Query` and `Query0`.
//!
//! Each function performs exactly one `Database::execute` when its future
//! or stream is first polled, and nothing before that.
//!

use std::future::Future;

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::database::{Cursor, Database};
use crate::diagnostics::Diagnostics;
use crate::value::{Params, Row};
use crate::QueryResult;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityError {
    #[error("expected 1, got 0")]
    Empty,

    #[error("expected {expected}, got more than 1")]
    TooMany { expected: &'static str },
}

async fn execute<'a, D: Database>(
    db: &'a D,
    diagnostics: &'a Diagnostics,
    params: QueryResult<Params>,
) -> QueryResult<Cursor<'a>> {
    let params = params?;
    debug!("executing {}", diagnostics);
    db.execute(diagnostics.sql(), params).await
}

pub(crate) fn stream<'a, D, T, F>(
    db: &'a D,
    diagnostics: &'a Diagnostics,
    params: QueryResult<Params>,
    decode: F,
) -> BoxStream<'a, QueryResult<T>>
where
    D: Database,
    T: Send + 'a,
    F: Fn(Row) -> QueryResult<T> + Send + 'a,
{
    stream::once(execute(db, diagnostics, params))
        .map_ok(Cursor::into_stream)
        .try_flatten()
        .map(move |row| row.and_then(&decode))
        .boxed()
}

pub(crate) async fn list<D, T, F>(
    db: &D,
    diagnostics: &Diagnostics,
    params: QueryResult<Params>,
    decode: F,
) -> QueryResult<Vec<T>>
where
    D: Database,
    F: Fn(Row) -> QueryResult<T>,
{
    let rows = execute(db, diagnostics, params).await?.pull_all().await?;
    rows.into_iter().map(decode).collect()
}

/// Reads at most two rows. Cardinality is settled before the row is decoded.
pub(crate) async fn unique<D, T, F>(
    db: &D,
    diagnostics: &Diagnostics,
    params: QueryResult<Params>,
    decode: F,
) -> QueryResult<T>
where
    D: Database,
    F: Fn(Row) -> QueryResult<T>,
{
    let mut cursor = execute(db, diagnostics, params).await?;

    let first = cursor.pull_one().await?;
    let second = match first {
        Some(_) => cursor.pull_one().await?,
        None => None,
    };
    drop(cursor);

    match (first, second) {
        (Some(row), None) => decode(row),
        (None, _) => {
            debug!("no rows from {}", diagnostics);
            Err(CardinalityError::Empty.into())
        }
        (Some(_), Some(_)) => {
            debug!("too many rows from {}", diagnostics);
            Err(CardinalityError::TooMany { expected: "1" }.into())
        }
    }
}

/// Reads at most two rows. Cardinality is settled before the row is decoded.
pub(crate) async fn option<D, T, F>(
    db: &D,
    diagnostics: &Diagnostics,
    params: QueryResult<Params>,
    decode: F,
) -> QueryResult<Option<T>>
where
    D: Database,
    F: Fn(Row) -> QueryResult<T>,
{
    let mut cursor = execute(db, diagnostics, params).await?;

    let first = cursor.pull_one().await?;
    let second = match first {
        Some(_) => cursor.pull_one().await?,
        None => None,
    };
    drop(cursor);

    match (first, second) {
        (None, _) => Ok(None),
        (Some(row), None) => decode(row).map(Some),
        (Some(_), Some(_)) => {
            debug!("too many rows from {}", diagnostics);
            Err(CardinalityError::TooMany {
                expected: "0 or 1",
            }
            .into())
        }
    }
}

pub(crate) async fn sink<'a, T, F, Fut>(rows: BoxStream<'a, QueryResult<T>>, f: F) -> QueryResult<()>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = QueryResult<()>>,
{
    rows.try_for_each(f).await
}
