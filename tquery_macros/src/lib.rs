#![forbid(unsafe_code)]

extern crate proc_macro;

mod codec_struct;
mod derive_codec;

mod attr {
    pub mod attr_util;
}

use proc_macro::TokenStream;

/// Derive `tquery::codec::Encode` for a struct, writing its fields as
/// parameters in declaration order. Fields marked `#[tquery(skip)]` are
/// left out.
#[proc_macro_derive(Encode, attributes(tquery))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let codec = syn::parse_macro_input!(input as codec_struct::CodecStruct);

    TokenStream::from(derive_codec::gen_encode(&codec))
}

/// Derive `tquery::codec::Decode` for a struct, reading its fields from
/// consecutive columns in declaration order. Fields marked
/// `#[tquery(skip)]` are filled with `Default::default()`.
#[proc_macro_derive(Decode, attributes(tquery))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let codec = syn::parse_macro_input!(input as codec_struct::CodecStruct);

    TokenStream::from(derive_codec::gen_decode(&codec))
}
