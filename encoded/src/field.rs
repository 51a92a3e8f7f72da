//! Field descriptors: one per declared attribute of a record type, shared by
//! every instance of that type.

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;

use crate::encoder::{Encoder, SharedEncoder};
use crate::errors::{DeclarationIssue, DocumentError, DocumentResult, EncodeError};
use crate::schema::{Contribute, Schema};
use crate::store::FieldStore;
use crate::value::{EncoderInput, FieldValue, FieldWrite};

#[derive(Debug)]
struct Binding {
    owner: String,
    public_name: String,
    private_name: String,
}

/// Declaration of one named slot on a record type.
///
/// A field owns the null-ability policy and the optional encoder of its slot
/// and mediates every read and write of that slot on any instance. The
/// encoder is type-scoped configuration: replacing it affects every instance.
/// Reconfiguring an encoder while an encode of the same type is in progress
/// on another thread is unsupported.
pub struct Field {
    allow_none: bool,
    encoder: RwLock<Option<SharedEncoder>>,
    binding: OnceLock<Binding>,
}

impl Field {
    pub fn new() -> Self {
        Self {
            allow_none: false,
            encoder: RwLock::new(None),
            binding: OnceLock::new(),
        }
    }

    /// Allows (or forbids) null values in this slot. Fields reject nulls by default.
    pub fn allow_none(mut self, allow: bool) -> Self {
        self.allow_none = allow;
        self
    }

    pub fn with_encoder<E: Encoder + 'static>(self, encoder: E) -> Self {
        self.with_shared_encoder(Arc::new(encoder))
    }

    pub fn with_shared_encoder(self, encoder: SharedEncoder) -> Self {
        *self.encoder.write().unwrap_or_else(PoisonError::into_inner) = Some(encoder);
        self
    }

    pub fn allows_none(&self) -> bool {
        self.allow_none
    }

    /// Records the owning type and declared name. Happens once, when the
    /// owning schema is built.
    pub(crate) fn bind(&self, owner: &str, name: &str) -> Result<(), DeclarationIssue> {
        let binding = Binding {
            owner: owner.to_string(),
            public_name: name.to_string(),
            private_name: format!("_{name}"),
        };
        self.binding
            .set(binding)
            .map_err(|rejected| self.already_bound(&rejected.public_name))
    }

    /// Fails when this field already belongs to a record type. Checked for
    /// every declaration before any of them is bound.
    pub(crate) fn check_unbound(&self, name: &str) -> Result<(), DeclarationIssue> {
        if self.is_bound() {
            return Err(self.already_bound(name));
        }
        Ok(())
    }

    fn already_bound(&self, name: &str) -> DeclarationIssue {
        DeclarationIssue::new(
            name,
            "already_bound",
            format!(
                "field is already bound to `{}`; a field can only belong to one record type",
                self.owner()
            ),
        )
    }

    pub fn is_bound(&self) -> bool {
        self.binding.get().is_some()
    }

    /// Name of the record type that declared this field. Empty until bound.
    pub fn owner(&self) -> &str {
        self.binding.get().map_or("", |b| b.owner.as_str())
    }

    /// The declared attribute name. Empty until bound.
    pub fn public_name(&self) -> &str {
        self.binding.get().map_or("", |b| b.public_name.as_str())
    }

    /// Storage key of this field inside each instance. Empty until bound.
    pub fn private_name(&self) -> &str {
        self.binding.get().map_or("", |b| b.private_name.as_str())
    }

    pub fn is_encodeable(&self) -> bool {
        self.encoder.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Snapshot of the configured encoder.
    pub fn encoder(&self) -> Option<SharedEncoder> {
        self.encoder.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_encoder<E: Encoder + 'static>(&self, encoder: E) {
        self.set_shared_encoder(Arc::new(encoder));
    }

    pub fn set_shared_encoder(&self, encoder: SharedEncoder) {
        log::debug!("setting encoder for {}.{}", self.owner(), self.public_name());
        *self.encoder.write().unwrap_or_else(PoisonError::into_inner) = Some(encoder);
    }

    /// Removes the encoder, returning the previous one.
    pub fn clear_encoder(&self) -> Option<SharedEncoder> {
        self.encoder.write().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub(crate) fn require_encoder(&self) -> DocumentResult<SharedEncoder> {
        self.encoder().ok_or_else(|| DocumentError::EncoderNotConfigured {
            document: self.owner().to_string(),
            field: self.public_name().to_string(),
        })
    }

    /// Current container of this field on `store`.
    pub fn read<'a, S: FieldStore + ?Sized>(&self, store: &'a S) -> DocumentResult<&'a FieldValue> {
        store
            .field_value(self.private_name())
            .ok_or_else(|| DocumentError::unknown_field(self.owner(), self.public_name()))
    }

    /// Validates and normalizes a write into the container it would store.
    ///
    /// Nulls are rejected unless the field allows them. An [`EncoderInput`]
    /// runs the configured encoder on its value.
    pub fn prepare(&self, write: impl Into<FieldWrite>) -> DocumentResult<FieldValue> {
        let write = write.into();
        if write.is_null() && !self.allow_none {
            return Err(DocumentError::null_not_allowed(self.public_name()));
        }
        match write {
            FieldWrite::Raw(value) => Ok(FieldValue::new(value)),
            FieldWrite::Container(container) => Ok(container),
            FieldWrite::Encode(EncoderInput(value)) => {
                let encoder = self.require_encoder()?;
                self.encode_with(encoder.as_ref(), value)
            }
        }
    }

    /// Validates `write` and stores the resulting container on `store`.
    pub fn write<S: FieldStore + ?Sized>(&self, store: &mut S, write: impl Into<FieldWrite>) -> DocumentResult<()> {
        let container = self.prepare(write)?;
        self.store(store, container)
    }

    pub(crate) fn store<S: FieldStore + ?Sized>(&self, store: &mut S, container: FieldValue) -> DocumentResult<()> {
        match store.replace_field_value(self.private_name(), container) {
            Some(_) => Ok(()),
            None => Err(DocumentError::unknown_field(self.owner(), self.public_name())),
        }
    }

    pub(crate) fn encode_with(&self, encoder: &dyn Encoder, value: Value) -> DocumentResult<FieldValue> {
        log::trace!("encoding {}.{}", self.owner(), self.public_name());
        let encoded = encoder.encode_one(&value).map_err(|source| self.encoder_failed(source))?;
        Ok(FieldValue::with_encoded(value, encoded))
    }

    pub(crate) fn encoder_failed(&self, source: EncodeError) -> DocumentError {
        DocumentError::Encoder {
            document: self.owner().to_string(),
            field: self.public_name().to_string(),
            source,
        }
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl Contribute for Field {
    fn contribute(&self, schema: &Schema, name: &str) -> Result<(), DeclarationIssue> {
        self.bind(schema.name(), name)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field(name={}, allow_none={}, is_encodeable={})",
            self.public_name(),
            self.allow_none,
            self.is_encodeable()
        )
    }
}
