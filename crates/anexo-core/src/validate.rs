use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::DocumentType;
use crate::error::{FieldError, FieldErrorKind, FieldErrors, ValidationError};
use crate::gde::GdeType;
use crate::payload::{scalar_text, NormalizedPayload};
use crate::rules::{
    rules_for, FieldKind, FieldRule, FILE_EMPTY_MESSAGE, FILE_FIELD, FILE_REQUIRED_MESSAGE,
    INVALID_EMAIL_MESSAGE,
};

/// Metadata of an uploaded file. The bytes themselves never reach the
/// rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,
    pub size: u64,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Raw form state as collected by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    #[serde(default)]
    pub gde_type: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub file: Option<FileUpload>,
}

impl FormInput {
    pub fn new(gde_type: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            gde_type: Some(gde_type.into()),
            document_type: Some(document_type.into()),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_file(mut self, file: FileUpload) -> Self {
        self.file = Some(file);
        self
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(scalar_text)
    }
}

pub fn validate(input: &FormInput) -> Result<NormalizedPayload, ValidationError> {
    validate_at(input, Utc::now())
}

/// Validate `input` and build the payload to persist, stamping it with
/// `now`. Every failing field is reported, not just the first.
pub fn validate_at(
    input: &FormInput,
    now: DateTime<Utc>,
) -> Result<NormalizedPayload, ValidationError> {
    let raw_gde = trimmed(input.gde_type.as_deref()).ok_or(ValidationError::MissingGdeType)?;
    let gde_type = GdeType::parse_str(raw_gde)
        .ok_or_else(|| ValidationError::UnknownGdeType(raw_gde.to_string()))?;

    let raw_doc =
        trimmed(input.document_type.as_deref()).ok_or(ValidationError::MissingDocumentType)?;
    let document_type = DocumentType::parse_str(raw_doc)
        .ok_or_else(|| ValidationError::UnknownDocumentType(raw_doc.to_string()))?;

    let mut errors = FieldErrors::new();
    match gde_type {
        GdeType::Emissao => check_category(input, document_type, &mut errors),
        GdeType::Submissao => check_file(input.file.as_ref(), &mut errors),
        GdeType::Resumo => {}
    }

    if !errors.is_empty() {
        return Err(ValidationError::Fields(errors));
    }

    Ok(NormalizedPayload::build(
        gde_type,
        document_type,
        &input.fields,
        input.file.as_ref(),
        now,
    ))
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn check_category(input: &FormInput, document_type: DocumentType, errors: &mut FieldErrors) {
    let Some(rules) = rules_for(document_type) else {
        return;
    };
    check_fields(input, rules.fields, errors);
    for block in rules.conditional {
        if input.text(block.trigger_field).as_deref() == Some(block.trigger_value) {
            check_fields(input, block.fields, errors);
        }
    }
}

fn check_fields(input: &FormInput, rules: &[FieldRule], errors: &mut FieldErrors) {
    for rule in rules {
        match input.text(rule.name) {
            None => errors.insert(
                rule.name,
                FieldError::new(FieldErrorKind::Required, rule.message),
            ),
            Some(value) if rule.kind == FieldKind::Email && !is_email(&value) => errors.insert(
                rule.name,
                FieldError::new(FieldErrorKind::InvalidEmail, INVALID_EMAIL_MESSAGE),
            ),
            Some(_) => {}
        }
    }
}

fn check_file(file: Option<&FileUpload>, errors: &mut FieldErrors) {
    match file {
        None => errors.insert(
            FILE_FIELD,
            FieldError::new(FieldErrorKind::Required, FILE_REQUIRED_MESSAGE),
        ),
        Some(f) if f.size == 0 => errors.insert(
            FILE_FIELD,
            FieldError::new(FieldErrorKind::EmptyFile, FILE_EMPTY_MESSAGE),
        ),
        Some(_) => {}
    }
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside
/// the domain with text on both sides.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
