use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Attribute, Error, Expr, Field, Ident, LitBool, LitStr, Result, Type};

/// Names of `Document` methods a generated getter would shadow.
const RESERVED_NAMES: &[&str] = &[
    "schema",
    "field",
    "new",
    "get_field",
    "set_field",
    "encode",
    "batch_encode",
    "batch_create",
    "to_json",
    "from_field_values",
];

pub(crate) struct ParsedField {
    pub(crate) ident: Ident,
    pub(crate) name: String,
    allow_none: bool,
    encoder: Option<Expr>,
}

impl ParsedField {
    pub(crate) fn from_field(field: &Field) -> Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "#[derive(Document)] requires named fields"))?;
        let name = ident.unraw().to_string();

        if name.starts_with('_') {
            return Err(Error::new(
                ident.span(),
                "document field names cannot start with `_`; that prefix is reserved for storage keys",
            ));
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(Error::new(
                ident.span(),
                format!("`{name}` clashes with a method generated for documents; rename the field"),
            ));
        }
        if !is_field_value(&field.ty) {
            return Err(Error::new(field.ty.span(), "document fields must have type `FieldValue`"));
        }

        let mut allow_none = false;
        let mut encoder = None;
        for attr in &field.attrs {
            if attr.path().is_ident("field") {
                Self::parse_field_attr(attr, &mut allow_none, &mut encoder)?;
            }
        }

        Ok(Self {
            ident,
            name,
            allow_none,
            encoder,
        })
    }

    fn parse_field_attr(attr: &Attribute, allow_none: &mut bool, encoder: &mut Option<Expr>) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("allow_none") {
                if meta.input.peek(syn::Token![=]) {
                    let value: LitBool = meta.value()?.parse()?;
                    *allow_none = value.value();
                } else {
                    *allow_none = true;
                }
                Ok(())
            } else if meta.path.is_ident("encoder") {
                if encoder.is_some() {
                    return Err(meta.error("encoder is already set for this field"));
                }
                *encoder = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown field attribute; expected `allow_none` or `encoder = ...`"))
            }
        })
    }

    pub(crate) fn name_lit(&self) -> LitStr {
        LitStr::new(&self.name, Span::call_site())
    }

    pub(crate) fn storage_key_lit(&self) -> LitStr {
        LitStr::new(&format!("_{}", self.name), Span::call_site())
    }

    /// `Field` constructor expression for the schema builder.
    pub(crate) fn to_field_tokens(&self) -> TokenStream2 {
        let allow_none = self.allow_none;
        let with_encoder = self.encoder.as_ref().map(|expr| quote! { .with_encoder(#expr) });
        quote! {
            ::encoded::Field::new().allow_none(#allow_none) #with_encoder
        }
    }

    /// Getter and validating setter.
    pub(crate) fn accessor_tokens(&self, vis: &syn::Visibility) -> TokenStream2 {
        let ident = &self.ident;
        let setter = format_ident!("set_{}", self.name);
        let name = self.name_lit();
        let getter_doc = LitStr::new(&format!("Current value of `{}`.", self.name), Span::call_site());
        let setter_doc = LitStr::new(
            &format!("Validates and stores a new value for `{}`.", self.name),
            Span::call_site(),
        );
        quote! {
            #[doc = #getter_doc]
            #vis fn #ident(&self) -> &::encoded::FieldValue {
                &self.#ident
            }

            #[doc = #setter_doc]
            #vis fn #setter(
                &mut self,
                value: impl ::std::convert::Into<::encoded::FieldWrite>,
            ) -> ::encoded::DocumentResult<()> {
                <Self as ::encoded::Document>::schema().set(self, #name, value)
            }
        }
    }
}

fn is_field_value(ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "FieldValue" && segment.arguments.is_none()),
        Type::Group(group) => is_field_value(&group.elem),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn named(input: syn::DeriveInput) -> Field {
        match input.data {
            syn::Data::Struct(data) => data.fields.into_iter().next().unwrap(),
            _ => unreachable!("test input is a struct"),
        }
    }

    #[test]
    fn defaults_to_not_nullable_without_encoder() {
        let parsed = ParsedField::from_field(&named(parse_quote!(struct S { text: FieldValue }))).unwrap();
        assert_eq!(parsed.name, "text");
        assert!(!parsed.allow_none);
        assert!(parsed.encoder.is_none());
        assert_eq!(parsed.storage_key_lit().value(), "_text");
    }

    #[test]
    fn parses_allow_none_and_encoder() {
        let parsed = ParsedField::from_field(&named(parse_quote!(struct S {
            #[field(allow_none, encoder = encoded::encoder::Identity)]
            text: ::encoded::FieldValue
        })))
        .unwrap();
        assert!(parsed.allow_none);
        assert!(parsed.encoder.is_some());

        let explicit = ParsedField::from_field(&named(parse_quote!(struct S {
            #[field(allow_none = false)]
            text: FieldValue
        })))
        .unwrap();
        assert!(!explicit.allow_none);
    }

    #[test]
    fn raw_identifiers_use_unraw_name() {
        let parsed = ParsedField::from_field(&named(parse_quote!(struct S { r#type: FieldValue }))).unwrap();
        assert_eq!(parsed.name, "type");
    }

    #[test]
    fn rejects_other_types() {
        let err = ParsedField::from_field(&named(parse_quote!(struct S { text: String })))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "document fields must have type `FieldValue`");
    }

    #[test]
    fn rejects_unknown_and_repeated_options() {
        let unknown = ParsedField::from_field(&named(parse_quote!(struct S {
            #[field(nullable)]
            text: FieldValue
        })))
        .err()
        .unwrap();
        assert!(unknown.to_string().starts_with("unknown field attribute"));

        let repeated = ParsedField::from_field(&named(parse_quote!(struct S {
            #[field(encoder = A, encoder = B)]
            text: FieldValue
        })))
        .err()
        .unwrap();
        assert_eq!(repeated.to_string(), "encoder is already set for this field");
    }

    #[test]
    fn accessors_are_documented() {
        let parsed = ParsedField::from_field(&named(parse_quote!(struct S { text: FieldValue }))).unwrap();
        let vis: syn::Visibility = parse_quote!(pub);
        let out = parsed.accessor_tokens(&vis).to_string();
        assert!(out.contains("Current value of `text`."));
        assert!(out.contains("Validates and stores a new value for `text`."));
    }

    #[test]
    fn rejects_reserved_prefix_and_method_names() {
        assert!(ParsedField::from_field(&named(parse_quote!(struct S { _text: FieldValue }))).is_err());

        let clash = ParsedField::from_field(&named(parse_quote!(struct S { encode: FieldValue })))
            .err()
            .unwrap();
        assert!(clash.to_string().contains("clashes"));
    }
}
