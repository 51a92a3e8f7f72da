//! Field registries and the record-level algorithms that run over them:
//! construction, single-instance encoding, batch encoding and column-wise
//! batch creation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{DeclarationError, DeclarationIssue, DocumentError, DocumentResult};
use crate::field::Field;
use crate::store::FieldStore;
use crate::value::{EncoderInput, FieldValue, FieldWrite};

/// An attribute that must learn its owning record type and declared name once
/// the record type's schema is finalized.
pub trait Contribute: Send + Sync {
    fn contribute(&self, schema: &Schema, name: &str) -> Result<(), DeclarationIssue>;
}

/// The immutable field registry of one record type.
///
/// Fields are kept in declaration order; every algorithm iterates them in
/// that order.
pub struct Schema {
    name: String,
    fields: Vec<(String, Arc<Field>)>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            base: Vec::new(),
            fields: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Name of the record type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Type-level handle on a field, used to configure it (e.g. `set_encoder`).
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| self.fields[i].1.as_ref())
    }

    pub fn require_field(&self, name: &str) -> DocumentResult<&Field> {
        self.field(name).ok_or_else(|| DocumentError::unknown_field(&self.name, name))
    }

    /// Shared handle on a field, for declaring it on an extending schema.
    pub fn shared_field(&self, name: &str) -> Option<Arc<Field>> {
        self.index.get(name).map(|&i| Arc::clone(&self.fields[i].1))
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field.as_ref()))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Validates one row of named values and returns one container per field,
    /// in declaration order.
    ///
    /// Missing names are treated as null. Names that are not fields of this
    /// schema, or that appear more than once, are rejected.
    pub fn prepare_row<I, K, W>(&self, values: I) -> DocumentResult<Vec<FieldValue>>
    where
        I: IntoIterator<Item = (K, W)>,
        K: AsRef<str>,
        W: Into<FieldWrite>,
    {
        let mut supplied: HashMap<String, FieldWrite> = HashMap::new();
        for (name, value) in values {
            let name = name.as_ref();
            if !self.contains(name) {
                return Err(DocumentError::unknown_field(&self.name, name));
            }
            if supplied.insert(name.to_string(), value.into()).is_some() {
                return Err(DocumentError::duplicate_field(&self.name, name));
            }
        }

        self.fields
            .iter()
            .map(|(name, field)| field.prepare(supplied.remove(name).unwrap_or_default()))
            .collect()
    }

    /// Splits column-oriented input into rows and prepares each of them.
    ///
    /// Column names are checked before anything else, so an unknown or
    /// repeated name fails even when the columns are empty. Every column must
    /// then have the same length; row `i` is built from the `i`-th element of
    /// each column.
    pub fn prepare_columns<I, K, W>(&self, columns: I) -> DocumentResult<Vec<Vec<FieldValue>>>
    where
        I: IntoIterator<Item = (K, Vec<W>)>,
        K: AsRef<str>,
        W: Into<FieldWrite>,
    {
        let mut named: Vec<(String, Vec<FieldWrite>)> = Vec::new();
        for (name, column) in columns {
            let name = name.as_ref();
            if !self.contains(name) {
                return Err(DocumentError::unknown_field(&self.name, name));
            }
            if named.iter().any(|(seen, _)| seen == name) {
                return Err(DocumentError::duplicate_field(&self.name, name));
            }
            let column: Vec<FieldWrite> = column.into_iter().map(Into::into).collect();
            named.push((name.to_string(), column));
        }

        let rows = named.first().map_or(0, |(_, column)| column.len());
        if let Some((column, values)) = named.iter().find(|(_, values)| values.len() != rows) {
            return Err(DocumentError::ColumnLengthMismatch {
                column: column.clone(),
                expected: rows,
                actual: values.len(),
            });
        }

        let mut iters: Vec<_> = named
            .into_iter()
            .map(|(name, column)| (name, column.into_iter()))
            .collect();
        (0..rows)
            .map(|_| {
                let row: Vec<(String, FieldWrite)> = iters
                    .iter_mut()
                    .map(|(name, column)| (name.clone(), column.next().unwrap_or_default()))
                    .collect();
                self.prepare_row(row)
            })
            .collect()
    }

    /// Reads the container of field `name` on `store`.
    pub fn get<'a, S: FieldStore + ?Sized>(&self, store: &'a S, name: &str) -> DocumentResult<&'a FieldValue> {
        self.require_field(name)?.read(store)
    }

    /// Writes field `name` on `store` through the field's write contract.
    pub fn set<S: FieldStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        value: impl Into<FieldWrite>,
    ) -> DocumentResult<()> {
        self.require_field(name)?.write(store, value)
    }

    /// Re-encodes every encodeable field of `store` from its current raw value.
    ///
    /// Encoders run before any container is replaced; if one fails the store
    /// is left as it was.
    pub fn encode<S: FieldStore + ?Sized>(&self, store: &mut S) -> DocumentResult<()> {
        let mut encoded = Vec::new();
        for (_, field) in &self.fields {
            if !field.is_encodeable() {
                continue;
            }
            let raw = field.read(&*store)?.value().clone();
            encoded.push((field, field.prepare(EncoderInput(raw))?));
        }
        for (field, container) in encoded {
            field.store(store, container)?;
        }
        Ok(())
    }

    /// Encodes every encodeable field across `stores` with one vectorized
    /// encoder call per field.
    ///
    /// All fields are encoded before any store is modified, so an encoder
    /// failure or a length mismatch leaves the whole batch untouched.
    pub fn batch_encode<S: FieldStore>(&self, stores: &mut [S]) -> DocumentResult<()> {
        if stores.is_empty() {
            return Ok(());
        }

        let mut plan = Vec::new();
        for (name, field) in &self.fields {
            let Some(encoder) = field.encoder() else {
                continue;
            };
            let raw: Vec<Value> = stores
                .iter()
                .map(|store| field.read(store).map(|fv| fv.value().clone()))
                .collect::<DocumentResult<_>>()?;

            log::debug!("batch encoding {} values for {}.{}", raw.len(), self.name, name);
            let encoded = encoder
                .encode_many(&raw)
                .map_err(|source| field.encoder_failed(source))?;
            if encoded.len() != raw.len() {
                return Err(DocumentError::ShapeMismatch {
                    field: name.clone(),
                    expected: raw.len(),
                    actual: encoded.len(),
                });
            }
            plan.push((field, raw, encoded));
        }

        for (field, raw, encoded) in plan {
            for ((store, value), encoded) in stores.iter_mut().zip(raw).zip(encoded) {
                field.store(store, FieldValue::with_encoded(value, encoded))?;
            }
        }
        Ok(())
    }

    /// JSON object of field name to container, in declaration order.
    pub fn to_json<S: FieldStore + ?Sized>(&self, store: &S) -> Value {
        let mut out = Map::new();
        for (name, field) in &self.fields {
            let mut entry = Map::new();
            if let Some(fv) = store.field_value(field.private_name()) {
                entry.insert("value".into(), fv.value().clone());
                entry.insert("encoded_value".into(), fv.encoded_value().cloned().unwrap_or(Value::Null));
            }
            out.insert(name.clone(), Value::Object(entry));
        }
        Value::Object(out)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(fields={:?})", self.name, self.field_names())
    }
}

/// Explicit registration step for a record type.
///
/// Collects the type's declarations, validates them, finalizes the
/// [`Schema`] and then binds every declaration to it. Inherited fields are
/// only included when [`SchemaBuilder::extends`] is called.
pub struct SchemaBuilder {
    name: String,
    base: Vec<(String, Arc<Field>)>,
    fields: Vec<(String, Arc<Field>)>,
    hooks: Vec<(String, Box<dyn Contribute>)>,
}

impl SchemaBuilder {
    /// Declares a new field.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), Arc::new(field)));
        self
    }

    /// Declares a field held elsewhere. It must not be bound yet.
    pub fn shared_field(mut self, name: impl Into<String>, field: Arc<Field>) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Declares a non-field attribute that is notified once the schema is built.
    pub fn contribute(mut self, name: impl Into<String>, hook: impl Contribute + 'static) -> Self {
        self.hooks.push((name.into(), Box::new(hook)));
        self
    }

    /// Inherits every field of `base`, ahead of this type's own fields.
    ///
    /// Inherited fields stay bound to `base` and share its encoder
    /// configuration. Declaring a field with an inherited name replaces the
    /// inherited field in place.
    pub fn extends(mut self, base: &Schema) -> Self {
        for (name, field) in &base.fields {
            match self.base.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = Arc::clone(field),
                None => self.base.push((name.clone(), Arc::clone(field))),
            }
        }
        self
    }

    pub fn build(self) -> Result<Schema, DeclarationError> {
        let SchemaBuilder { name, base, fields, hooks } = self;

        let mut issues = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for declared in fields.iter().map(|(n, _)| n).chain(hooks.iter().map(|(n, _)| n)) {
            if let Some(issue) = check_name(declared) {
                issues.push(issue);
            } else if seen.contains(&declared.as_str()) {
                issues.push(DeclarationIssue::new(
                    declared.as_str(),
                    "duplicate_field",
                    format!("`{declared}` is declared more than once"),
                ));
            } else {
                seen.push(declared.as_str());
            }
        }
        for (position, (field_name, field)) in fields.iter().enumerate() {
            if let Err(issue) = field.check_unbound(field_name) {
                issues.push(issue);
            } else if fields[..position].iter().any(|(_, earlier)| Arc::ptr_eq(earlier, field)) {
                issues.push(DeclarationIssue::new(
                    field_name.as_str(),
                    "already_bound",
                    format!("`{field_name}` reuses a field declared earlier on `{name}`"),
                ));
            }
        }
        if !issues.is_empty() {
            return Err(DeclarationError::new(name, issues));
        }

        let mut registry = base;
        for (field_name, field) in &fields {
            match registry.iter_mut().find(|(existing, _)| existing == field_name) {
                Some(slot) => slot.1 = Arc::clone(field),
                None => registry.push((field_name.clone(), Arc::clone(field))),
            }
        }
        let index = registry
            .iter()
            .enumerate()
            .map(|(i, (field_name, _))| (field_name.clone(), i))
            .collect();
        let schema = Schema {
            name,
            fields: registry,
            index,
        };

        let bound = fields
            .iter()
            .map(|(field_name, field)| field.contribute(&schema, field_name))
            .chain(hooks.iter().map(|(hook_name, hook)| hook.contribute(&schema, hook_name)));
        let issues: Vec<DeclarationIssue> = bound.filter_map(Result::err).collect();
        if !issues.is_empty() {
            return Err(DeclarationError::new(schema.name, issues));
        }

        log::debug!("declared {:?}", schema);
        Ok(schema)
    }
}

fn check_name(name: &str) -> Option<DeclarationIssue> {
    if name.is_empty() {
        return Some(DeclarationIssue::new(name, "invalid_name", "field names cannot be empty"));
    }
    if name.starts_with('_') {
        return Some(DeclarationIssue::new(
            name,
            "invalid_name",
            format!("`{name}` starts with an underscore, which is reserved for storage keys"),
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Some(DeclarationIssue::new(
            name,
            "invalid_name",
            format!("`{name}` contains whitespace"),
        ));
    }
    None
}
