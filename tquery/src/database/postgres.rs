use async_trait::async_trait;
use futures_util::stream::StreamExt;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as _, Executor as _, Row as _, Statement as _, TypeInfo as _};
use tracing::debug;

use super::{ColumnInfo, Cursor, Database, ParameterInfo, StatementInfo};
use crate::codec::{DecodeError, EncodeError};
use crate::value::{Param, Params, Row, SqlType, Value};
use crate::{QueryError, QueryResult};

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

/// PostgreSQL through an sqlx connection pool.
#[derive(Clone, Debug)]
pub struct Postgres {
    pool: PgPool,
}

impl Postgres {
    pub async fn connect(url: &str) -> QueryResult<Self> {
        Self::connect_with(PgPoolOptions::new(), url).await
    }

    pub async fn connect_with(options: PgPoolOptions, url: &str) -> QueryResult<Self> {
        let pool = options.connect(url).await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        QueryError::backend(err)
    }
}

#[async_trait]
impl Database for Postgres {
    async fn prepare(&self, sql: &str) -> QueryResult<StatementInfo> {
        let statement = self.pool.prepare(sql).await?;

        let parameters = match statement.parameters() {
            Some(sqlx::Either::Left(types)) => types
                .iter()
                .map(|ty| ParameterInfo::from_type_name(ty.name()))
                .collect(),
            // Only a count is known; report the types as unknown.
            Some(sqlx::Either::Right(count)) => (0..count)
                .map(|_| ParameterInfo::from_type_name("UNKNOWN"))
                .collect(),
            None => vec![],
        };

        let columns = statement
            .columns()
            .iter()
            .map(|column| ColumnInfo::from_type_name(column.name(), column.type_info().name()))
            .collect();

        Ok(StatementInfo {
            parameters,
            columns,
        })
    }

    async fn execute<'c>(&'c self, sql: &'c str, params: Params) -> QueryResult<Cursor<'c>> {
        debug!("postgres: executing `{}` with {} parameters", sql, params.len());

        let mut query = sqlx::query(sql);
        for (index, param) in params.into_iter().enumerate() {
            query = bind(query, index, param)?;
        }

        let rows = query
            .fetch(&self.pool)
            .map(|row| row.map_err(QueryError::from).and_then(decode_row));

        Ok(Cursor::new(rows))
    }
}

fn bind(query: PgQuery<'_>, index: usize, param: Param) -> QueryResult<PgQuery<'_>> {
    let ty = param.ty;
    let out_of_range = |value: i64| EncodeError::OutOfRange {
        index,
        value: value.to_string(),
        target: ty,
    };

    let query = match (ty, param.value) {
        (SqlType::Bool, Value::Null) => query.bind(None::<bool>),
        (SqlType::Int2, Value::Null) => query.bind(None::<i16>),
        (SqlType::Int4, Value::Null) => query.bind(None::<i32>),
        (SqlType::Int8, Value::Null) => query.bind(None::<i64>),
        (SqlType::Float4, Value::Null) => query.bind(None::<f32>),
        (SqlType::Float8, Value::Null) => query.bind(None::<f64>),
        (SqlType::Text, Value::Null) => query.bind(None::<String>),
        (SqlType::Bytes, Value::Null) => query.bind(None::<Vec<u8>>),
        (_, Value::Bool(v)) => query.bind(v),
        (SqlType::Int2, Value::Int(v)) => {
            query.bind(i16::try_from(v).map_err(|_| out_of_range(v))?)
        }
        (SqlType::Int4, Value::Int(v)) => {
            query.bind(i32::try_from(v).map_err(|_| out_of_range(v))?)
        }
        (_, Value::Int(v)) => query.bind(v),
        (SqlType::Float4, Value::Float(v)) => query.bind(narrow_f32(index, v)?),
        (_, Value::Float(v)) => query.bind(v),
        (_, Value::Text(v)) => query.bind(v),
        (_, Value::Bytes(v)) => query.bind(v),
    };

    Ok(query)
}

fn narrow_f32(index: usize, value: f64) -> Result<f32, EncodeError> {
    let narrowed = value as f32;
    if value.is_finite() && !narrowed.is_finite() {
        return Err(EncodeError::OutOfRange {
            index,
            value: value.to_string(),
            target: SqlType::Float4,
        });
    }
    Ok(narrowed)
}

fn decode_row(row: PgRow) -> QueryResult<Row> {
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = match SqlType::from_name(type_name) {
            Some(SqlType::Bool) => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
            Some(SqlType::Int2) => row
                .try_get::<Option<i16>, _>(index)?
                .map(|v| Value::Int(v.into())),
            Some(SqlType::Int4) => row
                .try_get::<Option<i32>, _>(index)?
                .map(|v| Value::Int(v.into())),
            Some(SqlType::Int8) => row.try_get::<Option<i64>, _>(index)?.map(Value::Int),
            Some(SqlType::Float4) => row
                .try_get::<Option<f32>, _>(index)?
                .map(|v| Value::Float(v.into())),
            Some(SqlType::Float8) => row.try_get::<Option<f64>, _>(index)?.map(Value::Float),
            Some(SqlType::Text) => row.try_get::<Option<String>, _>(index)?.map(Value::Text),
            Some(SqlType::Bytes) => row.try_get::<Option<Vec<u8>>, _>(index)?.map(Value::Bytes),
            None => {
                return Err(DecodeError::UnsupportedType {
                    index,
                    type_name: type_name.to_owned(),
                }
                .into())
            }
        };
        values.push(value.unwrap_or(Value::Null));
    }

    Ok(Row::new(values))
}
