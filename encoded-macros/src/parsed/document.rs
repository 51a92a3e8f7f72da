use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Ident, LitStr, Result, Visibility};

use super::field::ParsedField;

pub(crate) struct ParsedDocument {
    ident: Ident,
    vis: Visibility,
    document_name: String,
    fields: Vec<ParsedField>,
}

impl ParsedDocument {
    pub(crate) fn from_input(input: &DeriveInput) -> Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(Error::new_spanned(
                &input.generics,
                "#[derive(Document)] does not support generic structs",
            ));
        }

        let mut document_name = None;
        for attr in &input.attrs {
            if attr.path().is_ident("document") {
                Self::parse_container_attr(attr, &mut document_name)?;
            }
        }

        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => {
                    let mut parsed = Vec::new();
                    for field in &named.named {
                        parsed.push(ParsedField::from_field(field)?);
                    }
                    parsed
                }
                _ => return Err(Error::new(input.ident.span(), "#[derive(Document)] requires named fields")),
            },
            _ => return Err(Error::new(input.ident.span(), "#[derive(Document)] can only be used on structs")),
        };

        Ok(Self {
            ident: input.ident.clone(),
            vis: input.vis.clone(),
            document_name: document_name.unwrap_or_else(|| input.ident.to_string()),
            fields,
        })
    }

    fn parse_container_attr(attr: &Attribute, document_name: &mut Option<String>) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(Error::new(value.span(), "document name cannot be empty"));
                }
                *document_name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown document attribute; expected `name = \"...\"`"))
            }
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let ident = &self.ident;
        let vis = &self.vis;
        let document_name = LitStr::new(&self.document_name, Span::call_site());
        let type_name = LitStr::new(&self.ident.to_string(), Span::call_site());

        let idents: Vec<&Ident> = self.fields.iter().map(|field| &field.ident).collect();
        let names: Vec<LitStr> = self.fields.iter().map(ParsedField::name_lit).collect();
        let keys: Vec<LitStr> = self.fields.iter().map(ParsedField::storage_key_lit).collect();
        let field_inits = self.fields.iter().map(ParsedField::to_field_tokens);
        let accessors = self.fields.iter().map(|field| field.accessor_tokens(vis));

        quote! {
            impl ::encoded::FieldStore for #ident {
                fn field_value(&self, key: &str) -> ::std::option::Option<&::encoded::FieldValue> {
                    match key {
                        #(#keys => ::std::option::Option::Some(&self.#idents),)*
                        _ => ::std::option::Option::None,
                    }
                }

                fn replace_field_value(
                    &mut self,
                    key: &str,
                    value: ::encoded::FieldValue,
                ) -> ::std::option::Option<::encoded::FieldValue> {
                    match key {
                        #(#keys => ::std::option::Option::Some(::std::mem::replace(&mut self.#idents, value)),)*
                        _ => {
                            let _ = value;
                            ::std::option::Option::None
                        }
                    }
                }
            }

            impl ::encoded::Document for #ident {
                fn schema() -> &'static ::encoded::Schema {
                    static SCHEMA: ::std::sync::OnceLock<::encoded::Schema> = ::std::sync::OnceLock::new();
                    SCHEMA.get_or_init(|| {
                        let builder = ::encoded::Schema::builder(#document_name)
                            #(.field(#names, #field_inits))*;
                        match builder.build() {
                            ::std::result::Result::Ok(schema) => schema,
                            ::std::result::Result::Err(err) => {
                                panic!("invalid document `{}`: {:?}", #document_name, err.issues)
                            }
                        }
                    })
                }

                fn from_field_values(values: ::std::vec::Vec<::encoded::FieldValue>) -> Self {
                    #[allow(unused_mut, unused_variables)]
                    let mut values = values.into_iter();
                    Self {
                        #(#idents: values.next().unwrap_or_default(),)*
                    }
                }
            }

            impl ::std::fmt::Debug for #ident {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    let schema = <Self as ::encoded::Document>::schema();
                    ::std::write!(f, "{}(fields={:?})", schema.name(), schema.field_names())
                }
            }

            #[allow(dead_code)]
            impl #ident {
                #(#accessors)*
            }

            ::encoded::inventory::submit! {
                ::encoded::DocumentRegistration {
                    type_id: ::std::any::TypeId::of::<#ident>,
                    type_name: #type_name,
                    document_name: #document_name,
                    schema_fn: <#ident as ::encoded::Document>::schema,
                }
            }
        }
    }
}
