#![allow(dead_code)]

use tquery::database::memory::{Memory, MemoryError};
use tquery::database::StatementInfo;
use tquery::row;
use tquery::value::{Params, SqlType, Value};

pub const USER_BY_ID: &str = "SELECT id, name FROM users WHERE id = ?";
pub const USERS: &str = "SELECT id, name FROM users ORDER BY id";
pub const NUMBERS: &str = "SELECT n FROM generate_series(0, 'infinity')";
pub const MIXED: &str = "SELECT id FROM mixed";
pub const BROKEN: &str = "SELECT id FROM broken";

pub fn user_info() -> StatementInfo {
    StatementInfo::new()
        .column("id", SqlType::Int4, false)
        .column("name", SqlType::Text, false)
}

/// Users 42 ("ann") and 7 (twice, "bob" and "bobby"); nobody else.
pub fn database() -> Memory {
    Memory::new()
        .with_handler(
            USER_BY_ID,
            user_info().parameter(SqlType::Int4),
            |params: &Params| {
                let rows = match params.get(0).map(|param| &param.value) {
                    Some(Value::Int(42)) => vec![row![42, "ann"]],
                    Some(Value::Int(7)) => vec![row![7, "bob"], row![7, "bobby"]],
                    _ => vec![],
                };
                Ok(rows.into_iter().map(Ok))
            },
        )
        .with_rows(
            USERS,
            user_info(),
            vec![row![1, "ann"], row![2, "bob"], row![3, "cid"]],
        )
        .with_handler(
            NUMBERS,
            StatementInfo::new().column("n", SqlType::Int8, false),
            |_: &Params| Ok((0i64..).map(|n| Ok(row![n]))),
        )
        .with_rows(
            MIXED,
            StatementInfo::new().column("id", SqlType::Int4, false),
            vec![row![1], row!["two"], row![3]],
        )
        .with_handler(
            BROKEN,
            StatementInfo::new().column("id", SqlType::Int4, false),
            |_: &Params| {
                Ok(vec![Ok(row![1]), Err(MemoryError::failed("connection reset"))].into_iter())
            },
        )
}
