//!
//! A scripted, in-process database.
//!
//! Each known statement is registered with the metadata `prepare` reports
//! and a handler that turns bound parameters into a row iterator. Rows are
//! pulled from the iterator only as the cursor is consumed, so handlers may
//! return unbounded iterators.
//!

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use tracing::{trace, warn};

use super::{Cursor, Database, StatementInfo};
use crate::value::{Params, Row};
use crate::{QueryError, QueryResult};

type Rows = Box<dyn Iterator<Item = QueryResult<Row>> + Send>;
type Handler = Arc<dyn Fn(&Params) -> QueryResult<Rows> + Send + Sync>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("unknown statement: {0}")]
    UnknownStatement(String),

    #[error("{0}")]
    Failed(String),
}

impl MemoryError {
    /// Convenience for handlers that want to fail like a real backend would.
    pub fn failed(message: impl Into<String>) -> QueryError {
        QueryError::backend(Self::Failed(message.into()))
    }
}

struct Statement {
    info: StatementInfo,
    handler: Handler,
}

/// One recorded call to `execute`.
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    pub sql: String,
    pub params: Params,
}

#[derive(Default)]
pub struct Memory {
    statements: HashMap<String, Statement>,
    executions: Mutex<Vec<Execution>>,
    rows_pulled: AtomicUsize,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sql` as always returning `rows`, regardless of parameters.
    pub fn with_rows(self, sql: &str, info: StatementInfo, rows: Vec<Row>) -> Self {
        self.with_handler(sql, info, move |_| Ok(rows.clone().into_iter().map(Ok)))
    }

    /// Register `sql` with a handler computing its rows from the parameters.
    pub fn with_handler<F, I>(mut self, sql: &str, info: StatementInfo, handler: F) -> Self
    where
        F: Fn(&Params) -> QueryResult<I> + Send + Sync + 'static,
        I: IntoIterator<Item = QueryResult<Row>>,
        I::IntoIter: Send + 'static,
    {
        let rows = move |params: &Params| -> QueryResult<Rows> {
            Ok(Box::new(handler(params)?.into_iter()))
        };
        self.statements.insert(
            sql.to_owned(),
            Statement {
                info,
                handler: Arc::new(rows),
            },
        );
        self
    }

    /// Every execution so far, oldest first.
    pub fn executions(&self) -> Vec<Execution> {
        self.executions.lock().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.lock().len()
    }

    /// Total number of rows handed out by all cursors.
    pub fn rows_pulled(&self) -> usize {
        self.rows_pulled.load(Ordering::SeqCst)
    }

    fn statement(&self, sql: &str) -> QueryResult<&Statement> {
        self.statements.get(sql).ok_or_else(|| {
            warn!("unknown statement: {}", sql);
            QueryError::backend(MemoryError::UnknownStatement(sql.to_owned()))
        })
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("statements", &self.statements.keys().collect::<Vec<_>>())
            .field("executions", &self.execution_count())
            .field("rows_pulled", &self.rows_pulled())
            .finish()
    }
}

#[async_trait]
impl Database for Memory {
    async fn prepare(&self, sql: &str) -> QueryResult<StatementInfo> {
        Ok(self.statement(sql)?.info.clone())
    }

    async fn execute<'c>(&'c self, sql: &'c str, params: Params) -> QueryResult<Cursor<'c>> {
        let statement = self.statement(sql)?;

        self.executions.lock().push(Execution {
            sql: sql.to_owned(),
            params: params.clone(),
        });

        let rows = (statement.handler)(&params)?;
        let rows_pulled = &self.rows_pulled;

        Ok(Cursor::new(stream::iter(rows).inspect(move |row| {
            if row.is_ok() {
                let n = rows_pulled.fetch_add(1, Ordering::SeqCst) + 1;
                trace!("pulled row {} of `{}`", n, sql);
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::value::SqlType;

    fn users() -> Memory {
        Memory::new().with_rows(
            "SELECT id FROM users",
            StatementInfo::new().column("id", SqlType::Int4, false),
            vec![row![1], row![2], row![3]],
        )
    }

    #[tokio::test]
    async fn cursor_pulls_lazily() -> QueryResult<()> {
        let db = users();
        let mut cursor = db.execute("SELECT id FROM users", Params::new()).await?;
        assert_eq!(db.rows_pulled(), 0);

        assert_eq!(cursor.pull_one().await?, Some(row![1]));
        assert_eq!(db.rows_pulled(), 1);

        assert_eq!(cursor.pull_all().await?, vec![row![2], row![3]]);
        assert_eq!(db.rows_pulled(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn every_execute_is_recorded() -> QueryResult<()> {
        let db = users();
        db.execute("SELECT id FROM users", Params::new()).await?;
        db.execute("SELECT id FROM users", Params::new()).await?;
        assert_eq!(db.execution_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_statement_is_a_backend_error() {
        let db = users();
        let err = db.prepare("SELECT nope").await.unwrap_err();
        assert!(matches!(err, QueryError::Backend(_)));
        assert_eq!(err.to_string(), "backend error: unknown statement: SELECT nope");
    }
}
