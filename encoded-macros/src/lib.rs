use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod parsed;

use parsed::ParsedDocument;

/// Derives `encoded::Document` for a struct whose named fields are all
/// `FieldValue`.
///
/// Container attribute: `#[document(name = "...")]` overrides the record type
/// name (defaults to the struct name).
///
/// Field attribute: `#[field(allow_none, encoder = <expr>)]`. `allow_none`
/// also accepts `allow_none = true|false`; `encoder` takes any expression
/// evaluating to an `encoded::Encoder`, evaluated once when the schema is
/// first built.
///
/// Also generates a getter (`text()`) and a validating setter (`set_text(..)`)
/// per field, a `Debug` impl printing `Name(fields=[..])`, and registers the
/// type with `encoded::registry`. Do not combine with `#[derive(Debug)]`.
#[proc_macro_derive(Document, attributes(document, field))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedDocument::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
