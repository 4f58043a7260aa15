//!
//! Static comparison of a statement against the shapes its codecs expect.
//!
//! The database describes the prepared statement (`StatementInfo`), the
//! query knows what its encoder writes and its decoder reads
//! (`Diagnostics`); an [`Analysis`] lines the two up position by position.
//!

use std::fmt;

use crate::codec::ColumnShape;
use crate::database::{ColumnInfo, ParameterInfo, StatementInfo};
use crate::diagnostics::{Diagnostics, SourceLocation};
use crate::value::SqlType;

/// One disagreement between the statement and the codecs.
#[derive(Clone, Debug, PartialEq)]
pub enum Mismatch {
    /// The encoder writes a parameter the statement does not take.
    ExtraParameter { index: usize, expected: SqlType },

    /// The statement takes a parameter the encoder does not write.
    MissingParameter { index: usize, type_name: String },

    ParameterType {
        index: usize,
        expected: SqlType,
        actual: String,
    },

    /// The decoder reads a column the statement does not return.
    MissingColumn { index: usize, expected: SqlType },

    /// The statement returns a column the decoder does not read.
    UnreadColumn {
        index: usize,
        name: String,
        type_name: String,
    },

    ColumnType {
        index: usize,
        name: String,
        expected: SqlType,
        actual: String,
    },

    /// The column may be NULL but is decoded into a non-optional type.
    ColumnNullability { index: usize, name: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ExtraParameter { index, expected } => write!(
                f,
                "parameter {}: {} is written but the statement takes no such parameter",
                index, expected
            ),
            Self::MissingParameter { index, type_name } => write!(
                f,
                "parameter {}: statement expects {} but nothing is written",
                index, type_name
            ),
            Self::ParameterType {
                index,
                expected,
                actual,
            } => write!(
                f,
                "parameter {}: {} is written but the statement expects {}",
                index, expected, actual
            ),
            Self::MissingColumn { index, expected } => write!(
                f,
                "column {}: {} is read but the statement returns no such column",
                index, expected
            ),
            Self::UnreadColumn {
                index,
                name,
                type_name,
            } => write!(
                f,
                "column {} ({}): {} is returned but never read",
                index, name, type_name
            ),
            Self::ColumnType {
                index,
                name,
                expected,
                actual,
            } => write!(
                f,
                "column {} ({}): {} cannot be read as {}",
                index, name, actual, expected
            ),
            Self::ColumnNullability { index, name } => write!(
                f,
                "column {} ({}): nullable column read into a non-nullable type",
                index, name
            ),
        }
    }
}

/// The outcome of analysing one query.
#[derive(Clone, Debug)]
pub struct Analysis {
    sql: String,
    location: Option<SourceLocation>,
    mismatches: Vec<Mismatch>,
}

impl Analysis {
    pub fn new(diagnostics: &Diagnostics, info: &StatementInfo) -> Self {
        let mut mismatches = Vec::new();
        check_parameters(diagnostics.parameters(), &info.parameters, &mut mismatches);
        check_columns(diagnostics.columns(), &info.columns, &mut mismatches);

        Self {
            sql: diagnostics.sql().to_owned(),
            location: diagnostics.location().copied(),
            mismatches,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if let Some(location) = &self.location {
            write!(f, "\n  defined at {}", location)?;
        }

        if self.mismatches.is_empty() {
            write!(f, "\n  ok")?;
        }
        for mismatch in &self.mismatches {
            write!(f, "\n  - {}", mismatch)?;
        }
        Ok(())
    }
}

fn check_parameters(
    expected: &[ColumnShape],
    actual: &[ParameterInfo],
    mismatches: &mut Vec<Mismatch>,
) {
    for index in 0..expected.len().max(actual.len()) {
        match (expected.get(index), actual.get(index)) {
            (Some(shape), Some(param)) => match param.ty {
                Some(ty) if shape.ty.widens_to(ty) => {}
                _ => mismatches.push(Mismatch::ParameterType {
                    index,
                    expected: shape.ty,
                    actual: param.type_name.clone(),
                }),
            },
            (Some(shape), None) => mismatches.push(Mismatch::ExtraParameter {
                index,
                expected: shape.ty,
            }),
            (None, Some(param)) => mismatches.push(Mismatch::MissingParameter {
                index,
                type_name: param.type_name.clone(),
            }),
            (None, None) => {}
        }
    }
}

fn check_columns(expected: &[ColumnShape], actual: &[ColumnInfo], mismatches: &mut Vec<Mismatch>) {
    for index in 0..expected.len().max(actual.len()) {
        match (expected.get(index), actual.get(index)) {
            (Some(shape), Some(column)) => {
                match column.ty {
                    Some(ty) if ty.widens_to(shape.ty) => {}
                    _ => mismatches.push(Mismatch::ColumnType {
                        index,
                        name: column.name.clone(),
                        expected: shape.ty,
                        actual: column.type_name.clone(),
                    }),
                }
                if column.nullable == Some(true) && !shape.nullable {
                    mismatches.push(Mismatch::ColumnNullability {
                        index,
                        name: column.name.clone(),
                    });
                }
            }
            (Some(shape), None) => mismatches.push(Mismatch::MissingColumn {
                index,
                expected: shape.ty,
            }),
            (None, Some(column)) => mismatches.push(Mismatch::UnreadColumn {
                index,
                name: column.name.clone(),
                type_name: column.type_name.clone(),
            }),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Decode;

    fn diagnostics(parameters: Vec<ColumnShape>, columns: Vec<ColumnShape>) -> Diagnostics {
        Diagnostics::new(
            "SELECT id, name FROM users WHERE id = ?".to_owned(),
            None,
            parameters,
            columns,
        )
    }

    fn users_info() -> StatementInfo {
        StatementInfo::new()
            .parameter(SqlType::Int4)
            .column("id", SqlType::Int4, false)
            .column("name", SqlType::Text, true)
    }

    #[test]
    fn matching_shapes_are_ok() {
        let analysis = Analysis::new(
            &diagnostics(
                vec![ColumnShape::new(SqlType::Int4)],
                <(i64, Option<String>) as Decode>::columns(),
            ),
            &users_info(),
        );
        assert!(analysis.is_ok(), "{}", analysis);
    }

    #[test]
    fn narrowing_and_nullability_are_reported() {
        let analysis = Analysis::new(
            &diagnostics(
                vec![ColumnShape::new(SqlType::Int8)],
                <(i16, String) as Decode>::columns(),
            ),
            &users_info(),
        );

        assert_eq!(
            analysis.mismatches(),
            &[
                Mismatch::ParameterType {
                    index: 0,
                    expected: SqlType::Int8,
                    actual: "INT4".to_owned(),
                },
                Mismatch::ColumnType {
                    index: 0,
                    name: "id".to_owned(),
                    expected: SqlType::Int2,
                    actual: "INT4".to_owned(),
                },
                Mismatch::ColumnNullability {
                    index: 1,
                    name: "name".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn count_mismatches_are_reported() {
        let analysis = Analysis::new(&diagnostics(vec![], <(i32, String, bool) as Decode>::columns()), &users_info());

        assert_eq!(
            analysis.mismatches(),
            &[
                Mismatch::MissingParameter {
                    index: 0,
                    type_name: "INT4".to_owned(),
                },
                Mismatch::ColumnNullability {
                    index: 1,
                    name: "name".to_owned(),
                },
                Mismatch::MissingColumn {
                    index: 2,
                    expected: SqlType::Bool,
                },
            ]
        );
        assert!(analysis.to_string().contains("column 2: BOOL is read"));
    }

    #[test]
    fn unknown_backend_types_never_match() {
        let info = StatementInfo {
            parameters: vec![],
            columns: vec![ColumnInfo::from_type_name("doc", "JSONB")],
        };
        let analysis = Analysis::new(&diagnostics(vec![], <String as Decode>::columns()), &info);

        assert_eq!(
            analysis.mismatches(),
            &[Mismatch::ColumnType {
                index: 0,
                name: "doc".to_owned(),
                expected: SqlType::Text,
                actual: "JSONB".to_owned(),
            }]
        );
    }
}
