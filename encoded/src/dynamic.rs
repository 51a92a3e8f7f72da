//! Documents whose record type is declared at runtime with a
//! [`SchemaBuilder`](crate::schema::SchemaBuilder).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::DocumentResult;
use crate::schema::Schema;
use crate::store::FieldStore;
use crate::value::{FieldValue, FieldWrite};

/// An instance of a runtime-declared record type: one container per field of
/// its schema, keyed by storage key.
#[derive(Clone)]
pub struct DynamicDocument {
    schema: Arc<Schema>,
    slots: BTreeMap<String, FieldValue>,
}

impl DynamicDocument {
    /// Builds an instance from named values. Absent fields are null.
    pub fn new<I, K, W>(schema: &Arc<Schema>, values: I) -> DocumentResult<Self>
    where
        I: IntoIterator<Item = (K, W)>,
        K: AsRef<str>,
        W: Into<FieldWrite>,
    {
        let row = schema.prepare_row(values)?;
        Ok(Self::from_row(schema, row))
    }

    fn from_row(schema: &Arc<Schema>, row: Vec<FieldValue>) -> Self {
        let slots = schema
            .fields()
            .map(|(_, field)| field.private_name().to_string())
            .zip(row)
            .collect();
        Self {
            schema: Arc::clone(schema),
            slots,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get_field(&self, name: &str) -> DocumentResult<&FieldValue> {
        self.schema.get(self, name)
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<FieldWrite>) -> DocumentResult<()> {
        let schema = Arc::clone(&self.schema);
        schema.set(self, name, value)
    }

    /// Runs every configured encoder on this instance. Not memoized.
    pub fn encode(&mut self) -> DocumentResult<&mut Self> {
        let schema = Arc::clone(&self.schema);
        schema.encode(self)?;
        Ok(self)
    }

    /// Encodes `docs` with one encoder call per field, using the schema of
    /// the first document. Every document must have that schema's fields.
    pub fn batch_encode(docs: &mut [DynamicDocument]) -> DocumentResult<&mut [DynamicDocument]> {
        if let Some(first) = docs.first() {
            let schema = Arc::clone(&first.schema);
            schema.batch_encode(docs)?;
        }
        Ok(docs)
    }

    /// Builds one instance per row of column-oriented input.
    pub fn batch_create<I, K, W>(schema: &Arc<Schema>, columns: I) -> DocumentResult<Vec<Self>>
    where
        I: IntoIterator<Item = (K, Vec<W>)>,
        K: AsRef<str>,
        W: Into<FieldWrite>,
    {
        let rows = schema.prepare_columns(columns)?;
        Ok(rows.into_iter().map(|row| Self::from_row(schema, row)).collect())
    }

    pub fn to_json(&self) -> Value {
        self.schema.to_json(self)
    }
}

impl FieldStore for DynamicDocument {
    fn field_value(&self, key: &str) -> Option<&FieldValue> {
        self.slots.get(key)
    }

    fn replace_field_value(&mut self, key: &str, value: FieldValue) -> Option<FieldValue> {
        self.slots.get_mut(key).map(|slot| std::mem::replace(slot, value))
    }
}

impl fmt::Debug for DynamicDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(fields={:?})", self.schema.name(), self.schema.field_names())
    }
}
