use serde_json::Value;

use crate::errors::DocumentResult;
use crate::field::Field;
use crate::schema::Schema;
use crate::store::FieldStore;
use crate::value::{FieldValue, FieldWrite};

/// A record type with a static field registry.
///
/// This trait is implemented by `#[derive(Document)]`. The derive also
/// generates one getter and one setter per field (`text()` / `set_text(..)`).
///
/// ```
/// use encoded::{Document, FieldValue, encoder};
/// use serde_json::Value;
///
/// #[derive(Document)]
/// struct Note {
///     text: FieldValue,
///     #[field(allow_none)]
///     tag: FieldValue,
/// }
///
/// Note::field("text")
///     .unwrap()
///     .set_encoder(encoder::from_fn(|v: &Value| Ok(Value::from(v.to_string().len()))));
///
/// let mut note = Note::new([("text", "hi")]).unwrap();
/// note.encode().unwrap();
/// assert_eq!(note.text().encoded_value(), Some(&Value::from(4)));
/// assert!(note.tag().is_null());
/// ```
pub trait Document: FieldStore + Sized {
    /// The field registry of this record type, built once on first use.
    fn schema() -> &'static Schema;

    /// Assembles an instance from one container per field, in declaration
    /// order. Containers must already be validated.
    #[doc(hidden)]
    fn from_field_values(values: Vec<FieldValue>) -> Self;

    /// Type-level handle on a field, e.g. to configure its encoder.
    fn field(name: &str) -> DocumentResult<&'static Field> {
        Self::schema().require_field(name)
    }

    /// Builds an instance from named values. Absent fields are null.
    fn new<I, K, W>(values: I) -> DocumentResult<Self>
    where
        I: IntoIterator<Item = (K, W)>,
        K: AsRef<str>,
        W: Into<FieldWrite>,
    {
        Ok(Self::from_field_values(Self::schema().prepare_row(values)?))
    }

    fn get_field(&self, name: &str) -> DocumentResult<&FieldValue> {
        Self::schema().get(self, name)
    }

    fn set_field(&mut self, name: &str, value: impl Into<FieldWrite>) -> DocumentResult<()> {
        Self::schema().set(self, name, value)
    }

    /// Runs every configured encoder on this instance. Encoders are re-run on
    /// each call; results are not cached.
    fn encode(&mut self) -> DocumentResult<&mut Self> {
        Self::schema().encode(self)?;
        Ok(self)
    }

    /// Encodes `docs` with one encoder call per field for the whole slice.
    fn batch_encode(docs: &mut [Self]) -> DocumentResult<&mut [Self]> {
        Self::schema().batch_encode(docs)?;
        Ok(docs)
    }

    /// Builds one instance per row of column-oriented input.
    fn batch_create<I, K, W>(columns: I) -> DocumentResult<Vec<Self>>
    where
        I: IntoIterator<Item = (K, Vec<W>)>,
        K: AsRef<str>,
        W: Into<FieldWrite>,
    {
        let rows = Self::schema().prepare_columns(columns)?;
        Ok(rows.into_iter().map(Self::from_field_values).collect())
    }

    fn to_json(&self) -> Value {
        Self::schema().to_json(self)
    }
}
