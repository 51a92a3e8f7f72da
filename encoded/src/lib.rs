//! Documents with named fields whose raw values can be run through pluggable
//! encoders, one instance at a time or in batches.
//!
//! A record type is either a struct deriving [`Document`] or a runtime
//! [`Schema`] used with [`DynamicDocument`]. Each field stores a
//! [`FieldValue`]: the raw value plus, after encoding, the encoded value.
//!
//! ```
//! use encoded::{Document, EncodeError, FieldValue, encoder};
//! use serde_json::{Value, json};
//!
//! #[derive(Document)]
//! struct Article {
//!     text: FieldValue,
//! }
//!
//! Article::field("text").unwrap().set_encoder(encoder::from_fn(|v: &Value| {
//!     v.as_str()
//!         .map(|s| Value::from(s.to_uppercase()))
//!         .ok_or_else(|| EncodeError::unsupported("string", v))
//! }));
//!
//! let mut docs = Article::batch_create([("text", vec!["hello", "second item"])]).unwrap();
//! Article::batch_encode(&mut docs).unwrap();
//! assert_eq!(docs[1].text().encoded_value(), Some(&json!("SECOND ITEM")));
//! ```

extern crate self as encoded;

pub mod document;
pub mod dynamic;
pub mod encoder;
pub mod errors;
pub mod field;
pub mod registry;
pub mod schema;
pub mod store;
pub mod value;

pub use document::Document;
pub use dynamic::DynamicDocument;
pub use encoder::{Encoder, SharedEncoder};
pub use errors::*;
pub use field::Field;
pub use registry::{DocumentRegistration, get_document_by_name, is_document_registered, registered_documents};
pub use schema::{Contribute, Schema, SchemaBuilder};
pub use store::FieldStore;
pub use value::{EncoderInput, FieldValue, FieldWrite};

pub use encoded_macros::Document;

// Re-exported for the derive macro's generated code.
#[doc(hidden)]
pub use inventory;
pub use serde_json::Value;
