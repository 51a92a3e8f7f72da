//! The encoder capability: a caller-supplied transform applied to one raw
//! value at a time or to a whole batch in a single call.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::EncodeError;

/// Transforms raw field values into encoded values.
///
/// `encode_many` must return exactly one output per input, in input order.
/// The default implementation maps [`Encoder::encode_one`] over the slice;
/// encoders that amortize work across a batch should override it.
pub trait Encoder: Send + Sync {
    fn encode_one(&self, value: &Value) -> Result<Value, EncodeError>;

    fn encode_many(&self, values: &[Value]) -> Result<Vec<Value>, EncodeError> {
        values.iter().map(|value| self.encode_one(value)).collect()
    }
}

/// Encoder handle shared by a field and every operation that snapshots it.
pub type SharedEncoder = Arc<dyn Encoder>;

impl<E: Encoder + ?Sized> Encoder for Arc<E> {
    fn encode_one(&self, value: &Value) -> Result<Value, EncodeError> {
        (**self).encode_one(value)
    }

    fn encode_many(&self, values: &[Value]) -> Result<Vec<Value>, EncodeError> {
        (**self).encode_many(values)
    }
}

/// Returns every value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Encoder for Identity {
    fn encode_one(&self, value: &Value) -> Result<Value, EncodeError> {
        Ok(value.clone())
    }

    fn encode_many(&self, values: &[Value]) -> Result<Vec<Value>, EncodeError> {
        Ok(values.to_vec())
    }
}

/// Encoder backed by a single-value closure. See [`from_fn`].
pub struct FnEncoder<F> {
    f: F,
}

impl<F> Encoder for FnEncoder<F>
where
    F: Fn(&Value) -> Result<Value, EncodeError> + Send + Sync,
{
    fn encode_one(&self, value: &Value) -> Result<Value, EncodeError> {
        (self.f)(value)
    }
}

impl<F> fmt::Debug for FnEncoder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnEncoder")
    }
}

/// Encoder backed by a vectorized closure. See [`from_batch_fn`].
pub struct BatchFnEncoder<F> {
    f: F,
}

impl<F> Encoder for BatchFnEncoder<F>
where
    F: Fn(&[Value]) -> Result<Vec<Value>, EncodeError> + Send + Sync,
{
    fn encode_one(&self, value: &Value) -> Result<Value, EncodeError> {
        let mut encoded = (self.f)(std::slice::from_ref(value))?;
        if encoded.len() != 1 {
            return Err(EncodeError::other(format!(
                "batch encoder returned {} values for a single input",
                encoded.len()
            )));
        }
        Ok(encoded.swap_remove(0))
    }

    fn encode_many(&self, values: &[Value]) -> Result<Vec<Value>, EncodeError> {
        (self.f)(values)
    }
}

impl<F> fmt::Debug for BatchFnEncoder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BatchFnEncoder")
    }
}

/// Builds an encoder from a closure over one value. Batches call it once per element.
pub fn from_fn<F>(f: F) -> FnEncoder<F>
where
    F: Fn(&Value) -> Result<Value, EncodeError> + Send + Sync,
{
    FnEncoder { f }
}

/// Builds an encoder from a closure over a whole batch. Single values are
/// passed as a one-element slice.
pub fn from_batch_fn<F>(f: F) -> BatchFnEncoder<F>
where
    F: Fn(&[Value]) -> Result<Vec<Value>, EncodeError> + Send + Sync,
{
    BatchFnEncoder { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn upper(value: &Value) -> Result<Value, EncodeError> {
        value
            .as_str()
            .map(|s| Value::from(s.to_uppercase()))
            .ok_or_else(|| EncodeError::unsupported("string", value))
    }

    #[test]
    fn fn_encoder_maps_each_value() {
        let encoder = from_fn(upper);
        assert_eq!(encoder.encode_one(&json!("abc")).unwrap(), json!("ABC"));
        assert_eq!(
            encoder.encode_many(&[json!("a"), json!("b")]).unwrap(),
            vec![json!("A"), json!("B")]
        );
        assert!(matches!(
            encoder.encode_one(&json!(1)),
            Err(EncodeError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn batch_encoder_is_called_once_per_batch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let encoder = from_batch_fn(move |values: &[Value]| {
            counter.fetch_add(1, Ordering::SeqCst);
            values.iter().map(upper).collect()
        });

        let out = encoder.encode_many(&[json!("x"), json!("y"), json!("z")]).unwrap();
        assert_eq!(out, vec![json!("X"), json!("Y"), json!("Z")]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(encoder.encode_one(&json!("q")).unwrap(), json!("Q"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn batch_encoder_single_value_rejects_wrong_arity() {
        let encoder = from_batch_fn(|_: &[Value]| Ok(vec![]));
        assert!(matches!(encoder.encode_one(&json!(1)), Err(EncodeError::Other { .. })));
    }

    #[test]
    fn identity_and_shared_handles() {
        let shared: SharedEncoder = Arc::new(Identity);
        assert_eq!(shared.encode_one(&json!({"k": 1})).unwrap(), json!({"k": 1}));
        assert_eq!(shared.encode_many(&[json!(1), json!(2)]).unwrap(), vec![json!(1), json!(2)]);
    }
}
