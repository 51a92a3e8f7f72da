//! Per-field value containers and the shapes a field write accepts.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The state of one field on one document: the raw value and, once encoded,
/// the encoded value.
///
/// Containers are never mutated. Reassigning or encoding a field replaces its
/// container with a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoded_value: Option<Value>,
}

impl FieldValue {
    /// Wraps a raw value that has not been encoded.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            encoded_value: None,
        }
    }

    /// Builds a container carrying both the raw value and its encoding.
    ///
    /// A null encoding counts as no encoding: the container reports
    /// `is_encoded() == false` and serializes without `encoded_value`.
    pub fn with_encoded(value: impl Into<Value>, encoded_value: impl Into<Value>) -> Self {
        let encoded_value = encoded_value.into();
        Self {
            value: value.into(),
            encoded_value: (!encoded_value.is_null()).then_some(encoded_value),
        }
    }

    /// The raw, caller-supplied value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn encoded_value(&self) -> Option<&Value> {
        self.encoded_value.as_ref()
    }

    #[inline]
    pub fn is_encoded(&self) -> bool {
        self.encoded_value.is_some()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn into_parts(self) -> (Value, Option<Value>) {
        (self.value, self.encoded_value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.encoded_value {
            Some(encoded) => write!(f, "FieldValue(value={}, encoded_value={})", self.value, encoded),
            None => write!(f, "FieldValue(value={}, encoded_value=None)", self.value),
        }
    }
}

/// Marks a raw value that must go through the field's encoder when written.
///
/// Only lives for the duration of a single write.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderInput(pub Value);

impl EncoderInput {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Everything a field write accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    /// A plain raw value, wrapped into a fresh container.
    Raw(Value),
    /// A raw value to run through the field's encoder.
    Encode(EncoderInput),
    /// A prebuilt container, stored as-is.
    Container(FieldValue),
}

impl FieldWrite {
    /// The raw value this write would store.
    pub fn raw_value(&self) -> &Value {
        match self {
            FieldWrite::Raw(value) => value,
            FieldWrite::Encode(input) => &input.0,
            FieldWrite::Container(container) => container.value(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.raw_value().is_null()
    }
}

impl Default for FieldWrite {
    fn default() -> Self {
        FieldWrite::Raw(Value::Null)
    }
}

impl From<Value> for FieldWrite {
    fn from(value: Value) -> Self {
        FieldWrite::Raw(value)
    }
}

impl From<Option<Value>> for FieldWrite {
    fn from(value: Option<Value>) -> Self {
        FieldWrite::Raw(value.unwrap_or(Value::Null))
    }
}

impl From<FieldValue> for FieldWrite {
    fn from(value: FieldValue) -> Self {
        FieldWrite::Container(value)
    }
}

impl From<EncoderInput> for FieldWrite {
    fn from(value: EncoderInput) -> Self {
        FieldWrite::Encode(value)
    }
}

macro_rules! raw_write_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldWrite {
                fn from(value: $ty) -> Self {
                    FieldWrite::Raw(Value::from(value))
                }
            }
        )*
    };
}

raw_write_from!(&str, String, bool, i32, i64, u32, u64, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_container_is_not_encoded() {
        let fv = FieldValue::new("hello");
        assert_eq!(fv.value(), &json!("hello"));
        assert_eq!(fv.encoded_value(), None);
        assert!(!fv.is_encoded());
        assert!(!fv.is_null());
    }

    #[test]
    fn display_matches_repr_format() {
        assert_eq!(FieldValue::new(3).to_string(), "FieldValue(value=3, encoded_value=None)");
        assert_eq!(
            FieldValue::with_encoded("a", "A").to_string(),
            "FieldValue(value=\"a\", encoded_value=\"A\")"
        );
    }

    #[test]
    fn serde_skips_missing_encoding() {
        let raw = serde_json::to_value(FieldValue::new(1)).unwrap();
        assert_eq!(raw, json!({ "value": 1 }));

        let encoded: FieldValue = serde_json::from_value(json!({ "value": "x", "encoded_value": "X" })).unwrap();
        assert_eq!(encoded, FieldValue::with_encoded("x", "X"));
    }

    #[test]
    fn null_encoding_is_not_an_encoding() {
        let fv = FieldValue::with_encoded("a", Value::Null);
        assert!(!fv.is_encoded());
        assert_eq!(fv, FieldValue::new("a"));
        assert_eq!(fv.to_string(), "FieldValue(value=\"a\", encoded_value=None)");

        let raw = serde_json::to_value(&fv).unwrap();
        assert_eq!(raw, json!({ "value": "a" }));
        let back: FieldValue = serde_json::from_value(json!({ "value": "a", "encoded_value": null })).unwrap();
        assert_eq!(back, fv);
    }

    #[test]
    fn writes_convert_from_common_shapes() {
        assert_eq!(FieldWrite::from("a"), FieldWrite::Raw(json!("a")));
        assert_eq!(FieldWrite::from(7_i64), FieldWrite::Raw(json!(7)));
        assert_eq!(FieldWrite::from(None::<Value>), FieldWrite::Raw(Value::Null));
        assert!(FieldWrite::from(EncoderInput::new(Value::Null)).is_null());
        assert_eq!(
            FieldWrite::from(FieldValue::with_encoded(1, 2)).raw_value(),
            &json!(1)
        );
    }
}
