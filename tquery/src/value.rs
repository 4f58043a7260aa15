//!
//! The backend-neutral value model that parameters and rows are made of.
//!

use std::fmt;

/// Column/parameter type as understood by the codec layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SqlType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Bytes,
}

impl SqlType {
    /// Map a backend type name to a `SqlType`, if it is one we know about.
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name.to_ascii_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => Self::Bool,
            "INT2" | "SMALLINT" | "SMALLSERIAL" => Self::Int2,
            "INT4" | "INT" | "INTEGER" | "SERIAL" => Self::Int4,
            "INT8" | "BIGINT" | "BIGSERIAL" => Self::Int8,
            "FLOAT4" | "REAL" => Self::Float4,
            "FLOAT8" | "DOUBLE PRECISION" => Self::Float8,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHARACTER VARYING" => Self::Text,
            "BYTEA" | "BLOB" => Self::Bytes,
            _ => return None,
        };
        Some(ty)
    }

    /// Whether a value of type `self` can be stored in `target` without loss.
    pub fn widens_to(self, target: SqlType) -> bool {
        use SqlType::*;

        match (self, target) {
            (a, b) if a == b => true,
            (Int2, Int4) | (Int2, Int8) | (Int4, Int8) => true,
            (Float4, Float8) => true,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int2 => "INT2",
            Self::Int4 => "INT4",
            Self::Int8 => "INT8",
            Self::Float4 => "FLOAT4",
            Self::Float8 => "FLOAT8",
            Self::Text => "TEXT",
            Self::Bytes => "BYTEA",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single column or parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short description of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// A bound parameter: the value plus the type it was encoded as.
///
/// The type is kept even for `NULL`, so backends can bind typed nulls.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub ty: SqlType,
    pub value: Value,
}

impl Param {
    pub fn new(ty: SqlType, value: Value) -> Self {
        Self { ty, value }
    }

    pub fn null(ty: SqlType) -> Self {
        Self {
            ty,
            value: Value::Null,
        }
    }
}

/// Ordered set of parameters for one statement execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, param: Param) {
        self.0.push(param);
    }

    /// Index the next pushed parameter will get.
    pub fn next_index(&self) -> usize {
        self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Param> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.0.iter()
    }
}

impl IntoIterator for Params {
    type Item = Param;
    type IntoIter = std::vec::IntoIter<Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Param> for Params {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One row fetched from a cursor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a [`Row`] from a list of values convertible to [`Value`].
///
/// ```
/// let row = tquery::row![42, "ann"];
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::value::Row::new(vec![$($crate::value::Value::from($value)),*])
    };
}
