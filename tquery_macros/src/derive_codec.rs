use proc_macro2::TokenStream;
use quote::quote;

use crate::codec_struct::{CodecStruct, FieldStyle};

pub fn gen_encode(codec: &CodecStruct) -> TokenStream {
    let ident = &codec.ident;

    let mut generics = codec.generics.clone();
    {
        let where_clause = generics.make_where_clause();
        for field in codec.columns() {
            let ty = &field.ty;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ty: ::tquery::codec::Encode));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let tys = codec.columns().map(|field| &field.ty);
    let members = codec.columns().map(|field| &field.member);

    quote! {
        impl #impl_generics ::tquery::codec::Encode for #ident #ty_generics #where_clause {
            fn columns() -> ::std::vec::Vec<::tquery::codec::ColumnShape> {
                #[allow(unused_mut)]
                let mut columns = ::std::vec::Vec::new();
                #(columns.extend(<#tys as ::tquery::codec::Encode>::columns());)*
                columns
            }

            fn encode(&self, params: &mut ::tquery::value::Params) -> ::tquery::QueryResult<()> {
                #(::tquery::codec::Encode::encode(&self.#members, params)?;)*
                let _ = params;
                ::std::result::Result::Ok(())
            }
        }
    }
}

pub fn gen_decode(codec: &CodecStruct) -> TokenStream {
    let ident = &codec.ident;

    let mut generics = codec.generics.clone();
    {
        let where_clause = generics.make_where_clause();
        for field in &codec.fields {
            let ty = &field.ty;
            if field.skip {
                where_clause
                    .predicates
                    .push(syn::parse_quote!(#ty: ::std::default::Default));
            } else {
                where_clause
                    .predicates
                    .push(syn::parse_quote!(#ty: ::tquery::codec::Decode));
            }
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let tys = codec.columns().map(|field| &field.ty);

    let values = codec.fields.iter().map(|field| {
        let ty = &field.ty;
        if field.skip {
            quote! { <#ty as ::std::default::Default>::default() }
        } else {
            quote! { <#ty as ::tquery::codec::Decode>::decode(row)? }
        }
    });

    let construct = match codec.style {
        FieldStyle::Named => {
            let members = codec.fields.iter().map(|field| &field.member);
            quote! { Self { #(#members: #values,)* } }
        }
        FieldStyle::Unnamed => quote! { Self(#(#values,)*) },
        FieldStyle::Unit => quote! { Self },
    };

    quote! {
        impl #impl_generics ::tquery::codec::Decode for #ident #ty_generics #where_clause {
            fn columns() -> ::std::vec::Vec<::tquery::codec::ColumnShape> {
                #[allow(unused_mut)]
                let mut columns = ::std::vec::Vec::new();
                #(columns.extend(<#tys as ::tquery::codec::Decode>::columns());)*
                columns
            }

            fn decode(row: &mut ::tquery::codec::RowDecoder) -> ::tquery::QueryResult<Self> {
                let _ = &row;
                ::std::result::Result::Ok(#construct)
            }
        }
    }
}
