use tquery::codec::{ColumnShape, RowDecoder};
use tquery::database::memory::Memory;
use tquery::database::StatementInfo;
use tquery::prelude::*;
use tquery::value::{Param, Params, SqlType, Value};
use tquery::{row, DecodeError, QueryError, QueryResult};

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
struct Address {
    street: String,
    zip: Option<i32>,
}

#[derive(Debug, PartialEq, Decode)]
struct User {
    id: i64,
    name: String,
    address: Option<Address>,
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct UserId(i32);

#[derive(Debug, PartialEq, Encode, Decode)]
struct Empty;

#[derive(Debug, PartialEq, Encode, Decode)]
struct Tagged<T> {
    tag: String,
    value: T,
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Cached {
    id: i32,
    #[tquery(skip)]
    hits: u32,
}

#[test]
fn columns_follow_field_order() {
    assert_eq!(
        <User as Decode>::columns(),
        vec![
            ColumnShape::new(SqlType::Int8),
            ColumnShape::new(SqlType::Text),
            ColumnShape::new(SqlType::Text).nullable(),
            ColumnShape::new(SqlType::Int4).nullable(),
        ]
    );
    assert_eq!(<UserId as Encode>::columns(), vec![ColumnShape::new(SqlType::Int4)]);
    assert!(<Empty as Decode>::columns().is_empty());
    assert_eq!(<Cached as Decode>::columns(), vec![ColumnShape::new(SqlType::Int4)]);
}

#[test]
fn nested_struct_decodes_from_flat_row() -> QueryResult<()> {
    let user: User = RowDecoder::decode_row(row![1i64, "ann", "Main St", 1234])?;
    assert_eq!(
        user.address,
        Some(Address {
            street: "Main St".to_owned(),
            zip: Some(1234),
        })
    );

    let homeless: User = RowDecoder::decode_row(row![2i64, "bob", Value::Null, Value::Null])?;
    assert_eq!(homeless.address, None);
    Ok(())
}

#[test]
fn partially_null_composite_is_an_error() {
    let err = RowDecoder::decode_row::<User>(row![3i64, "cid", Value::Null, 99]).unwrap_err();

    assert!(matches!(
        err,
        QueryError::Decode(DecodeError::UnexpectedNull { index: 2, .. })
    ));
}

#[test]
fn encode_writes_fields_in_order() -> QueryResult<()> {
    let mut params = Params::new();
    Tagged {
        tag: "home".to_owned(),
        value: Address {
            street: "Main St".to_owned(),
            zip: None,
        },
    }
    .encode(&mut params)?;

    assert_eq!(
        params.iter().cloned().collect::<Vec<_>>(),
        vec![
            Param::new(SqlType::Text, Value::Text("home".to_owned())),
            Param::new(SqlType::Text, Value::Text("Main St".to_owned())),
            Param::null(SqlType::Int4),
        ]
    );
    Ok(())
}

#[test]
fn skipped_fields_take_their_default() -> QueryResult<()> {
    let cached: Cached = RowDecoder::decode_row(row![5])?;
    assert_eq!(cached, Cached { id: 5, hits: 0 });

    let mut params = Params::new();
    Cached { id: 5, hits: 9 }.encode(&mut params)?;
    assert_eq!(params.len(), 1);
    Ok(())
}

#[test]
fn unit_and_tuple_structs() -> QueryResult<()> {
    let empty: Empty = RowDecoder::decode_row(row![])?;
    assert_eq!(empty, Empty);

    let id: UserId = RowDecoder::decode_row(row![7])?;
    assert_eq!(id, UserId(7));
    Ok(())
}

#[tokio::test]
async fn derived_codecs_in_a_query() -> QueryResult<()> {
    const SQL: &str = "SELECT id, name, street, zip FROM users WHERE id = ?";

    let db = Memory::new().with_handler(
        SQL,
        StatementInfo::new()
            .parameter(SqlType::Int4)
            .column("id", SqlType::Int8, false)
            .column("name", SqlType::Text, false)
            .column("street", SqlType::Text, true)
            .column("zip", SqlType::Int4, true),
        |params: &Params| {
            let rows = match params.get(0).map(|param| &param.value) {
                Some(Value::Int(id)) => vec![row![*id, "ann", "Main St", Value::Null]],
                _ => vec![],
            };
            Ok(rows.into_iter().map(Ok))
        },
    );

    let user_by_id = query::<UserId, User>(SQL);

    let user = user_by_id.unique(&db, UserId(42)).await?;
    assert_eq!(user.id, 42);
    assert_eq!(user.address.and_then(|a| a.zip), None);

    let analysis = user_by_id.analysis(&db).await?;
    assert!(analysis.is_ok(), "{}", analysis);
    Ok(())
}
