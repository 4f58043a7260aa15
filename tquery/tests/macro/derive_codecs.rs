use tquery::prelude::*;

#[derive(Encode, Decode)]
pub struct Named {
    pub id: i32,
    pub label: Option<String>,
}

#[derive(Encode, Decode)]
pub struct Tuple(pub i64, pub bool);

#[derive(Encode, Decode)]
pub struct Unit;

#[derive(Encode, Decode)]
pub struct Generic<A, B> {
    pub first: A,
    pub second: Option<B>,
}

#[derive(Decode)]
pub struct WithSkip {
    pub id: i32,
    #[tquery(skip)]
    pub note: String,
}

fn main() {
    let _ = query::<Named, Tuple>("SELECT 1");
    let _ = query0::<Generic<Named, Unit>>("SELECT 1");
    let _ = query0::<WithSkip>("SELECT 1");
}
