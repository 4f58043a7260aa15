use syn::spanned::Spanned;

const ATTR: &str = "tquery";

fn attr_has_simple_ident(attr: &syn::Attribute, name: &str) -> bool {
    let path = &attr.path;
    if path.leading_colon.is_some() || path.segments.len() != 1 {
        return false;
    }

    match path.segments.last() {
        Some(segment) => segment.ident == name,
        None => false,
    }
}

/// Whether a field carries `#[tquery(skip)]`.
pub fn has_skip(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut skip = false;

    for attr in attrs.iter().filter(|attr| attr_has_simple_ident(attr, ATTR)) {
        let ident: syn::Ident = attr.parse_args()?;
        if ident != "skip" {
            return Err(syn::Error::new(
                ident.span(),
                "Unknown tquery attribute, expected `skip`",
            ));
        }
        if skip {
            return Err(syn::Error::new(attr.span(), "Duplicate `skip`"));
        }
        skip = true;
    }

    Ok(skip)
}
