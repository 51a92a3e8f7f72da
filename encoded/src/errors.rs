use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A field declared with `allow_none = false` received a null value.
    #[error("{field} cannot be None since allow_none is set to False")]
    NullNotAllowed { field: String },

    /// An encode touched a field that has no encoder.
    #[error("encoder for {document}.{field} is not configured; call {document}.{field}.set_encoder(...) first")]
    EncoderNotConfigured { document: String, field: String },

    /// The record type could not be declared.
    #[error("declaration of `{}` failed", .0.document)]
    Declaration(#[from] DeclarationError),

    /// A vectorized encoder returned a different number of values than it was given.
    #[error("encoder for field `{field}` returned {actual} values for {expected} inputs")]
    ShapeMismatch { field: String, expected: usize, actual: usize },

    /// Columns passed to `batch_create` do not all have the same length.
    #[error("column `{column}` has {actual} values, expected {expected}")]
    ColumnLengthMismatch { column: String, expected: usize, actual: usize },

    /// The name does not match any field of the record type.
    #[error("`{document}` has no field named `{field}`")]
    UnknownField { document: String, field: String },

    /// The same field name was supplied more than once in one row or one set of columns.
    #[error("`{field}` is given more than once for `{document}`")]
    DuplicateField { document: String, field: String },

    /// The encoder itself failed.
    #[error("encoder for {document}.{field} failed: {source}")]
    Encoder {
        document: String,
        field: String,
        #[source]
        source: EncodeError,
    },
}

impl DocumentError {
    pub(crate) fn null_not_allowed(field: impl Into<String>) -> Self {
        Self::NullNotAllowed { field: field.into() }
    }

    pub(crate) fn unknown_field(document: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            document: document.into(),
            field: field.into(),
        }
    }

    pub(crate) fn duplicate_field(document: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            document: document.into(),
            field: field.into(),
        }
    }
}

/// Failure reported by an [`Encoder`](crate::encoder::Encoder).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncodeError {
    /// The encoder cannot handle the shape of the value it was given.
    #[error("unsupported value: expected {expected}, found {found}")]
    UnsupportedValue { expected: Cow<'static, str>, found: String },

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl EncodeError {
    pub fn unsupported(expected: impl Into<Cow<'static, str>>, found: &serde_json::Value) -> Self {
        Self::UnsupportedValue {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    pub fn other(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Other { message: message.into() }
    }
}

/// Collection of problems found while declaring a record type.
#[derive(Debug, Error)]
#[error("declaration errors for `{document}`: {issues:?}")]
pub struct DeclarationError {
    pub document: String,
    pub issues: Vec<DeclarationIssue>,
}

impl DeclarationError {
    pub fn new<I>(document: impl Into<String>, issues: I) -> Self
    where
        I: IntoIterator<Item = DeclarationIssue>,
    {
        Self {
            document: document.into(),
            issues: issues.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the first issue with the given code, if any.
    pub fn find(&self, code: &str) -> Option<&DeclarationIssue> {
        self.issues.iter().find(|issue| issue.code == code)
    }
}

/// A single declaration problem, tied to one declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl DeclarationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encoder_not_configured_names_document_and_field() {
        let err = DocumentError::EncoderNotConfigured {
            document: "Article".into(),
            field: "text".into(),
        };
        let message = err.to_string();
        assert!(message.contains("Article.text"));
        assert!(message.contains("set_encoder"));
    }

    #[test]
    fn declaration_error_lookup_by_code() {
        let err = DeclarationError::new(
            "Article",
            [
                DeclarationIssue::new("text", "duplicate_field", "declared twice"),
                DeclarationIssue::new("", "invalid_name", "empty"),
            ],
        );
        assert!(!err.is_empty());
        assert_eq!(err.find("invalid_name").map(|issue| issue.field.as_str()), Some(""));
        assert!(err.find("already_bound").is_none());

        let wrapped: DocumentError = err.into();
        assert_eq!(wrapped.to_string(), "declaration of `Article` failed");
    }

    #[test]
    fn unsupported_value_renders_json() {
        let err = EncodeError::unsupported("string", &json!([1, 2]));
        assert_eq!(err.to_string(), "unsupported value: expected string, found [1,2]");
    }
}
