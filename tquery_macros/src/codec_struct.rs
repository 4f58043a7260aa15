use syn::parse::ParseStream;
use syn::spanned::Spanned;

use crate::attr::attr_util;

/// A struct a codec can be derived for.
pub struct CodecStruct {
    pub ident: syn::Ident,
    pub generics: syn::Generics,
    pub fields: Vec<CodecField>,
    pub style: FieldStyle,
}

pub struct CodecField {
    pub member: syn::Member,
    pub ty: syn::Type,
    pub skip: bool,
}

pub enum FieldStyle {
    Named,
    Unnamed,
    Unit,
}

impl syn::parse::Parse for CodecStruct {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let input: syn::DeriveInput = input.parse()?;

        let data = match input.data {
            syn::Data::Struct(data) => data,
            syn::Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span(),
                    "Codecs can only be derived for structs",
                ))
            }
            syn::Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span(),
                    "Codecs can only be derived for structs",
                ))
            }
        };

        let style = match &data.fields {
            syn::Fields::Named(_) => FieldStyle::Named,
            syn::Fields::Unnamed(_) => FieldStyle::Unnamed,
            syn::Fields::Unit => FieldStyle::Unit,
        };

        let fields = data
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let member = match &field.ident {
                    Some(ident) => syn::Member::Named(ident.clone()),
                    None => syn::Member::Unnamed(syn::Index {
                        index: index as u32,
                        span: field.ty.span(),
                    }),
                };

                Ok(CodecField {
                    member,
                    ty: field.ty.clone(),
                    skip: attr_util::has_skip(&field.attrs)?,
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            ident: input.ident,
            generics: input.generics,
            fields,
            style,
        })
    }
}

impl CodecStruct {
    /// Fields that occupy columns.
    pub fn columns(&self) -> impl Iterator<Item = &CodecField> {
        self.fields.iter().filter(|field| !field.skip)
    }
}
