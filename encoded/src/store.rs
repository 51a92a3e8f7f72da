use crate::value::FieldValue;

/// Per-instance storage for field containers, keyed by each field's private
/// storage key (see [`Field::private_name`](crate::field::Field::private_name)).
///
/// Implemented by `#[derive(Document)]` for structs and by
/// [`DynamicDocument`](crate::dynamic::DynamicDocument). Writes normally go
/// through [`Field::write`](crate::field::Field::write), which validates and
/// wraps values before calling [`FieldStore::replace_field_value`].
pub trait FieldStore {
    fn field_value(&self, key: &str) -> Option<&FieldValue>;

    /// Replaces the container stored under `key`, returning the previous one.
    /// Returns `None` without storing anything when the store has no slot for `key`.
    fn replace_field_value(&mut self, key: &str, value: FieldValue) -> Option<FieldValue>;
}
