//! Document auto-registration via the inventory crate.
//!
//! Every `#[derive(Document)]` submits a [`DocumentRegistration`], so a
//! program can discover all record types linked into it without listing them.

use std::any::TypeId;

use crate::schema::Schema;

/// Metadata for an auto-discovered document type.
pub struct DocumentRegistration {
    /// Returns the TypeId of the document struct
    pub type_id: fn() -> TypeId,
    /// Rust type name (e.g., "Article")
    pub type_name: &'static str,
    /// Record type name used in the schema and error messages
    pub document_name: &'static str,
    /// Builds (on first call) and returns the field registry
    pub schema_fn: fn() -> &'static Schema,
}

impl DocumentRegistration {
    pub fn schema(&self) -> &'static Schema {
        (self.schema_fn)()
    }
}

inventory::collect!(DocumentRegistration);

pub fn registered_documents() -> impl Iterator<Item = &'static DocumentRegistration> {
    inventory::iter::<DocumentRegistration>()
}

/// Finds a registered document by its record type name.
pub fn get_document_by_name(document_name: &str) -> Option<&'static DocumentRegistration> {
    registered_documents().find(|d| d.document_name == document_name)
}

pub fn is_document_registered<T: 'static>() -> bool {
    let type_id = TypeId::of::<T>();
    registered_documents().any(|d| (d.type_id)() == type_id)
}
