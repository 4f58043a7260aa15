//!
//! Conversion between application values and backend parameters/rows.
//!
//! Both directions are composite-aware: a type may span any number of
//! columns, and tuples, `Option` and `#[derive(Encode, Decode)]` structs
//! compose column by column.
//!

use crate::value::{Param, Params, Row, SqlType, Value};
use crate::QueryResult;

/// Expected type of one column (or parameter) in a composite shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnShape {
    pub ty: SqlType,
    pub nullable: bool,
}

impl ColumnShape {
    pub fn new(ty: SqlType) -> Self {
        Self {
            ty,
            nullable: false,
        }
    }

    pub fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }
}

/// Types that can be written as statement parameters.
pub trait Encode {
    /// The parameter columns this type occupies, in order.
    fn columns() -> Vec<ColumnShape>;

    fn encode(&self, params: &mut Params) -> QueryResult<()>;
}

/// Types that can be read from (a run of columns in) a row.
pub trait Decode: Sized {
    /// The row columns this type consumes, in order.
    fn columns() -> Vec<ColumnShape>;

    fn decode(row: &mut RowDecoder) -> QueryResult<Self>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("parameter {index}: value {value} does not fit in {target}")]
    OutOfRange {
        index: usize,
        value: String,
        target: SqlType,
    },

    #[error("parameter {index}: {message}")]
    Invalid { index: usize, message: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("column {index}: missing from row")]
    MissingColumn { index: usize },

    #[error("column {index}: unexpected NULL, expected {expected}")]
    UnexpectedNull { index: usize, expected: SqlType },

    #[error("column {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: SqlType,
        found: &'static str,
    },

    #[error("column {index}: value {value} does not fit in {target}")]
    OutOfRange {
        index: usize,
        value: String,
        target: &'static str,
    },

    #[error("column {index}: unsupported backend type {type_name}")]
    UnsupportedType { index: usize, type_name: String },

    #[error("expected {expected} columns, row has {actual}")]
    ColumnCount { expected: usize, actual: usize },
}

/// Reads a row left to right, one column at a time.
pub struct RowDecoder {
    values: std::vec::IntoIter<Value>,
    index: usize,
}

impl RowDecoder {
    pub fn new(row: Row) -> Self {
        Self {
            values: row.into_values().into_iter(),
            index: 0,
        }
    }

    /// Decode a whole row as `T`, rejecting rows that are wider or narrower
    /// than `T`'s shape.
    pub fn decode_row<T: Decode>(row: Row) -> QueryResult<T> {
        let actual = row.len();
        let mut decoder = Self::new(row);
        let value = T::decode(&mut decoder).map_err(|err| match err {
            crate::QueryError::Decode(DecodeError::MissingColumn { .. }) => {
                DecodeError::ColumnCount {
                    expected: T::columns().len(),
                    actual,
                }
                .into()
            }
            other => other,
        })?;

        if decoder.remaining() > 0 {
            return Err(DecodeError::ColumnCount {
                expected: decoder.index,
                actual,
            }
            .into());
        }

        Ok(value)
    }

    /// Index of the next column to be read.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Take the next column value, whatever it is.
    pub fn take(&mut self) -> Result<(usize, Value), DecodeError> {
        let index = self.index;
        let value = self
            .values
            .next()
            .ok_or(DecodeError::MissingColumn { index })?;
        self.index += 1;
        Ok((index, value))
    }

    /// Take the next column value, failing on `NULL`.
    pub fn take_non_null(&mut self, expected: SqlType) -> Result<(usize, Value), DecodeError> {
        match self.take()? {
            (index, Value::Null) => Err(DecodeError::UnexpectedNull { index, expected }),
            taken => Ok(taken),
        }
    }

    /// Whether the next `width` columns are all present and all `NULL`.
    pub fn peek_all_null(&self, width: usize) -> bool {
        let slice = self.values.as_slice();
        slice.len() >= width && slice[..width].iter().all(Value::is_null)
    }

    pub fn skip(&mut self, width: usize) -> Result<(), DecodeError> {
        for _ in 0..width {
            self.take()?;
        }
        Ok(())
    }
}

fn mismatch(index: usize, expected: SqlType, found: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}

impl Encode for bool {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Bool)]
    }

    fn encode(&self, params: &mut Params) -> QueryResult<()> {
        params.push(Param::new(SqlType::Bool, Value::Bool(*self)));
        Ok(())
    }
}

impl Decode for bool {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Bool)]
    }

    fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
        match row.take_non_null(SqlType::Bool)? {
            (_, Value::Bool(v)) => Ok(v),
            (index, other) => Err(mismatch(index, SqlType::Bool, &other).into()),
        }
    }
}

macro_rules! integer_codec {
    ($t:ty, $sql:ident) => {
        impl Encode for $t {
            fn columns() -> Vec<ColumnShape> {
                vec![ColumnShape::new(SqlType::$sql)]
            }

            fn encode(&self, params: &mut Params) -> QueryResult<()> {
                let index = params.next_index();
                let v = i64::try_from(*self).map_err(|_| EncodeError::OutOfRange {
                    index,
                    value: self.to_string(),
                    target: SqlType::$sql,
                })?;
                params.push(Param::new(SqlType::$sql, Value::Int(v)));
                Ok(())
            }
        }

        impl Decode for $t {
            fn columns() -> Vec<ColumnShape> {
                vec![ColumnShape::new(SqlType::$sql)]
            }

            fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
                match row.take_non_null(SqlType::$sql)? {
                    (index, Value::Int(v)) => <$t>::try_from(v).map_err(|_| {
                        DecodeError::OutOfRange {
                            index,
                            value: v.to_string(),
                            target: stringify!($t),
                        }
                        .into()
                    }),
                    (index, other) => Err(mismatch(index, SqlType::$sql, &other).into()),
                }
            }
        }
    };
}

integer_codec!(i16, Int2);
integer_codec!(i32, Int4);
integer_codec!(i64, Int8);
integer_codec!(u32, Int8);
integer_codec!(u64, Int8);

macro_rules! float_codec {
    ($t:ty, $sql:ident) => {
        impl Encode for $t {
            fn columns() -> Vec<ColumnShape> {
                vec![ColumnShape::new(SqlType::$sql)]
            }

            fn encode(&self, params: &mut Params) -> QueryResult<()> {
                params.push(Param::new(SqlType::$sql, Value::Float(f64::from(*self))));
                Ok(())
            }
        }

        impl Decode for $t {
            fn columns() -> Vec<ColumnShape> {
                vec![ColumnShape::new(SqlType::$sql)]
            }

            fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
                match row.take_non_null(SqlType::$sql)? {
                    (index, Value::Float(v)) => {
                        let narrowed = v as $t;
                        if v.is_finite() && !narrowed.is_finite() {
                            return Err(DecodeError::OutOfRange {
                                index,
                                value: v.to_string(),
                                target: stringify!($t),
                            }
                            .into());
                        }
                        Ok(narrowed)
                    }
                    (index, other) => Err(mismatch(index, SqlType::$sql, &other).into()),
                }
            }
        }
    };
}

float_codec!(f32, Float4);
float_codec!(f64, Float8);

impl Encode for String {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Text)]
    }

    fn encode(&self, params: &mut Params) -> QueryResult<()> {
        self.as_str().encode(params)
    }
}

impl Encode for &str {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Text)]
    }

    fn encode(&self, params: &mut Params) -> QueryResult<()> {
        params.push(Param::new(SqlType::Text, Value::Text((*self).to_owned())));
        Ok(())
    }
}

impl Decode for String {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Text)]
    }

    fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
        match row.take_non_null(SqlType::Text)? {
            (_, Value::Text(v)) => Ok(v),
            (index, other) => Err(mismatch(index, SqlType::Text, &other).into()),
        }
    }
}

impl Encode for Vec<u8> {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Bytes)]
    }

    fn encode(&self, params: &mut Params) -> QueryResult<()> {
        params.push(Param::new(SqlType::Bytes, Value::Bytes(self.clone())));
        Ok(())
    }
}

impl Decode for Vec<u8> {
    fn columns() -> Vec<ColumnShape> {
        vec![ColumnShape::new(SqlType::Bytes)]
    }

    fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
        match row.take_non_null(SqlType::Bytes)? {
            (_, Value::Bytes(v)) => Ok(v),
            (index, other) => Err(mismatch(index, SqlType::Bytes, &other).into()),
        }
    }
}

/// `None` is written as one typed `NULL` per column of `T`.
impl<T: Encode> Encode for Option<T> {
    fn columns() -> Vec<ColumnShape> {
        T::columns().into_iter().map(ColumnShape::nullable).collect()
    }

    fn encode(&self, params: &mut Params) -> QueryResult<()> {
        match self {
            Some(value) => value.encode(params),
            None => {
                for column in T::columns() {
                    params.push(Param::null(column.ty));
                }
                Ok(())
            }
        }
    }
}

/// Reads `None` when every column of `T` is `NULL`.
impl<T: Decode> Decode for Option<T> {
    fn columns() -> Vec<ColumnShape> {
        T::columns().into_iter().map(ColumnShape::nullable).collect()
    }

    fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
        let width = T::columns().len();
        if width > 0 && row.peek_all_null(width) {
            row.skip(width)?;
            Ok(None)
        } else {
            T::decode(row).map(Some)
        }
    }
}

impl Encode for () {
    fn columns() -> Vec<ColumnShape> {
        vec![]
    }

    fn encode(&self, _params: &mut Params) -> QueryResult<()> {
        Ok(())
    }
}

impl Decode for () {
    fn columns() -> Vec<ColumnShape> {
        vec![]
    }

    fn decode(_row: &mut RowDecoder) -> QueryResult<Self> {
        Ok(())
    }
}

macro_rules! tuple_codec {
    ($($t:ident . $idx:tt),+) => {
        impl<$($t: Encode),+> Encode for ($($t,)+) {
            fn columns() -> Vec<ColumnShape> {
                let mut columns = Vec::new();
                $(columns.extend($t::columns());)+
                columns
            }

            fn encode(&self, params: &mut Params) -> QueryResult<()> {
                $(self.$idx.encode(params)?;)+
                Ok(())
            }
        }

        impl<$($t: Decode),+> Decode for ($($t,)+) {
            fn columns() -> Vec<ColumnShape> {
                let mut columns = Vec::new();
                $(columns.extend($t::columns());)+
                columns
            }

            fn decode(row: &mut RowDecoder) -> QueryResult<Self> {
                Ok(($($t::decode(row)?,)+))
            }
        }
    };
}

tuple_codec!(A.0);
tuple_codec!(A.0, B.1);
tuple_codec!(A.0, B.1, C.2);
tuple_codec!(A.0, B.1, C.2, D.3);
tuple_codec!(A.0, B.1, C.2, D.3, E.4);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple_codec!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{row, QueryError};

    fn encode<T: Encode>(value: T) -> QueryResult<Params> {
        let mut params = Params::new();
        value.encode(&mut params)?;
        Ok(params)
    }

    #[test]
    fn composite_shape_is_flattened() {
        let columns = <(i32, Option<(String, f64)>) as Decode>::columns();
        assert_eq!(
            columns,
            vec![
                ColumnShape::new(SqlType::Int4),
                ColumnShape::new(SqlType::Text).nullable(),
                ColumnShape::new(SqlType::Float8).nullable(),
            ]
        );
    }

    #[test]
    fn none_encodes_typed_nulls() {
        let params = encode(None::<(i32, String)>).unwrap();
        assert_eq!(
            params.into_iter().collect::<Vec<_>>(),
            vec![Param::null(SqlType::Int4), Param::null(SqlType::Text)]
        );
    }

    #[test]
    fn u64_out_of_range_fails_to_encode() {
        let err = encode((1i32, u64::MAX)).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Encode(EncodeError::OutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn f32_out_of_range_fails_to_decode() {
        let err = RowDecoder::decode_row::<f32>(row![1e300]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Decode(DecodeError::OutOfRange {
                index: 0,
                target: "f32",
                ..
            })
        ));

        let small: f32 = RowDecoder::decode_row(row![1.5]).unwrap();
        assert_eq!(small, 1.5);
        let infinite: f32 = RowDecoder::decode_row(row![f64::INFINITY]).unwrap();
        assert!(infinite.is_infinite());
        let wide: f64 = RowDecoder::decode_row(row![1e300]).unwrap();
        assert_eq!(wide, 1e300);
    }

    #[test]
    fn decode_tuple() {
        let value: (i32, String) = RowDecoder::decode_row(row![42, "ann"]).unwrap();
        assert_eq!(value, (42, "ann".to_string()));
    }

    #[test]
    fn decode_all_null_composite_as_none() {
        let value: (i64, Option<(i32, String)>) =
            RowDecoder::decode_row(row![1, None::<i64>, None::<String>]).unwrap();
        assert_eq!(value, (1, None));
    }

    #[test]
    fn decode_partially_null_composite_fails() {
        let err = RowDecoder::decode_row::<Option<(i32, String)>>(row![1, None::<String>])
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Decode(DecodeError::UnexpectedNull { index: 1, .. })
        ));
    }

    #[test]
    fn decode_rejects_wrong_width() {
        let err = RowDecoder::decode_row::<(i32, String)>(row![1]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Decode(DecodeError::ColumnCount {
                expected: 2,
                actual: 1
            })
        ));

        let err = RowDecoder::decode_row::<i32>(row![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Decode(DecodeError::ColumnCount {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn decode_type_mismatch() {
        let err = RowDecoder::decode_row::<i32>(row!["x"]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Decode(DecodeError::TypeMismatch {
                index: 0,
                expected: SqlType::Int4,
                found: "text"
            })
        ));
    }

    #[test]
    fn decode_narrowing_checks_range() {
        let err = RowDecoder::decode_row::<i16>(row![100_000]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Decode(DecodeError::OutOfRange { index: 0, .. })
        ));
    }
}
