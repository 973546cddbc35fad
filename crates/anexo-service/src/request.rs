use std::collections::BTreeMap;

use anexo_core::{FileUpload, FormInput};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ServiceError;

/// Body of `POST /api/submissions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default)]
    pub gde_type: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub file: Option<FileContent>,
}

/// An uploaded file with base64-encoded content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub name: String,
    pub content: String,
}

impl FileContent {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            content: B64.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, ServiceError> {
        B64.decode(self.content.trim())
            .map_err(|e| ServiceError::InvalidInput(format!("file content is not base64: {e}")))
    }
}

impl SubmissionRequest {
    /// Build a request from collected form state plus the raw file bytes.
    /// The file metadata in `input` is replaced by what `file` describes.
    pub fn from_form(input: &FormInput, file: Option<(&str, &[u8])>) -> Self {
        Self {
            gde_type: input.gde_type.clone(),
            document_type: input.document_type.clone(),
            fields: input.fields.clone(),
            file: file.map(|(name, bytes)| FileContent::from_bytes(name, bytes)),
        }
    }

    /// Split into the form state the rules engine sees and the decoded
    /// file bytes.
    pub fn into_form(self) -> Result<(FormInput, Option<Vec<u8>>), ServiceError> {
        let (upload, bytes) = match self.file {
            Some(file) => {
                let bytes = file.decode()?;
                let upload = FileUpload::new(file.name, bytes.len() as u64);
                (Some(upload), Some(bytes))
            }
            None => (None, None),
        };
        let input = FormInput {
            gde_type: self.gde_type,
            document_type: self.document_type,
            fields: self.fields,
            file: upload,
        };
        Ok((input, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_content_becomes_upload_metadata() {
        let input = FormInput::new("submissao", "relatorio-estagio");
        let req = SubmissionRequest::from_form(&input, Some(("relatorio.pdf", &b"%PDF-1.7"[..])));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["gdeType"], "submissao");
        assert_eq!(json["file"]["name"], "relatorio.pdf");

        let (form, bytes) = req.into_form().unwrap();
        assert_eq!(form.file, Some(FileUpload::new("relatorio.pdf", 8)));
        assert_eq!(bytes.as_deref(), Some(&b"%PDF-1.7"[..]));
    }

    #[test]
    fn missing_file_stays_missing() {
        let req: SubmissionRequest = serde_json::from_str(
            r#"{"gdeType":"resumo","documentType":"parecer-orientador"}"#,
        )
        .unwrap();
        let (form, bytes) = req.into_form().unwrap();
        assert!(form.file.is_none());
        assert!(bytes.is_none());
        assert!(form.fields.is_empty());
    }

    #[test]
    fn bad_base64_is_invalid_input() {
        let req = SubmissionRequest {
            file: Some(FileContent {
                name: "x.pdf".into(),
                content: "not base64!!".into(),
            }),
            ..Default::default()
        };
        assert!(matches!(req.into_form(), Err(ServiceError::InvalidInput(_))));
    }
}
