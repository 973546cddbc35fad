use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    InvalidEmail,
    EmptyFile,
}

impl FieldErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldErrorKind::Required => "required",
            FieldErrorKind::InvalidEmail => "invalid_email",
            FieldErrorKind::EmptyFile => "empty_file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Per-field failures keyed by field name, so every offending field can be
/// highlighted at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. The first failure recorded for a field wins.
    pub fn insert(&mut self, field: &str, error: FieldError) {
        self.0.entry(field.to_string()).or_insert(error);
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields().collect();
        write!(f, "{} invalid field(s): {}", names.len(), names.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("gdeType is required")]
    MissingGdeType,

    #[error("unknown gdeType: {0}")]
    UnknownGdeType(String),

    #[error("documentType is required")]
    MissingDocumentType,

    #[error("unknown documentType: {0}")]
    UnknownDocumentType(String),

    #[error("{0}")]
    Fields(FieldErrors),
}

impl ValidationError {
    /// Field-level failures, if this is not a terminal selection error.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationError::Fields(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Stored attachment data that could not be decoded.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed payload json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a json object")]
    NotAnObject,

    #[error("payload has no {0}")]
    MissingKey(&'static str),

    #[error("payload has unknown {key}: {value}")]
    UnknownValue { key: &'static str, value: String },
}
