use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::attachment::Attachment;
use crate::document::DocumentType;
use crate::gde::GdeType;
use crate::payload::{
    decode_payload, DocumentFields, DOCUMENT_TYPE_KEY, DOCUMENT_TYPE_LABEL_KEY, FILE_NAME_KEY,
    FILE_SIZE_KEY, GDE_TYPE_KEY, SUBMITTED_AT_KEY,
};

/// Read-side view of an attachment with its payload decoded.
///
/// Stored records are never migrated, so every accessor treats a missing
/// or ill-typed key as unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: String,
    pub owner: String,
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Decode leniently: malformed stored JSON yields an empty payload and
    /// a warning, never an error.
    pub fn from_attachment(attachment: Attachment) -> Self {
        let payload = match decode_payload(&attachment.data) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(id = %attachment.id, "unreadable attachment data: {e}");
                Map::new()
            }
        };
        Self {
            id: attachment.id,
            owner: attachment.owner,
            payload,
            created_at: attachment.created_at,
            updated_at: attachment.updated_at,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }

    pub fn gde_type(&self) -> Option<GdeType> {
        self.str_field(GDE_TYPE_KEY).and_then(GdeType::parse_str)
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        self.str_field(DOCUMENT_TYPE_KEY)
            .and_then(DocumentType::parse_str)
    }

    /// Stored label, falling back to the static label of the category.
    pub fn document_type_label(&self) -> Option<&str> {
        self.str_field(DOCUMENT_TYPE_LABEL_KEY)
            .or_else(|| self.document_type().map(|d| d.label()))
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.str_field(SUBMITTED_AT_KEY)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.str_field(FILE_NAME_KEY)
    }

    pub fn file_size(&self) -> Option<u64> {
        self.payload.get(FILE_SIZE_KEY).and_then(Value::as_u64)
    }

    /// Typed category fields, only for `emissao` records that decode.
    pub fn document_fields(&self) -> Option<DocumentFields> {
        if self.gde_type() != Some(GdeType::Emissao) {
            return None;
        }
        DocumentFields::from_map(&self.payload).ok()
    }
}

impl From<Attachment> for Submission {
    fn from(attachment: Attachment) -> Self {
        Submission::from_attachment(attachment)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn attachment(data: &str) -> Attachment {
        let ts = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        Attachment {
            id: "a1".into(),
            owner: "ana".into(),
            data: data.into(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn malformed_json_decodes_to_empty_payload() {
        let s = Submission::from_attachment(attachment("{\"gdeType\": "));
        assert!(s.payload.is_empty());
        assert_eq!(s.gde_type(), None);
        assert_eq!(s.document_type(), None);
        assert_eq!(s.submitted_at(), None);
    }

    #[test]
    fn non_object_json_decodes_to_empty_payload() {
        let s = Submission::from_attachment(attachment("[1, 2, 3]"));
        assert!(s.payload.is_empty());
    }

    #[test]
    fn accessors_read_payload() {
        let s = Submission::from_attachment(attachment(
            r#"{"gdeType":"submissao","documentType":"relatorio-estagio",
                "submittedAt":"2024-05-01T10:15:00.000Z","fileName":"r.pdf","fileSize":512}"#,
        ));
        assert_eq!(s.gde_type(), Some(GdeType::Submissao));
        assert_eq!(s.document_type(), Some(DocumentType::RelatorioEstagio));
        assert_eq!(s.document_type_label(), Some("Relatório de Estágio"));
        assert_eq!(
            s.submitted_at(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap())
        );
        assert_eq!(s.file_name(), Some("r.pdf"));
        assert_eq!(s.file_size(), Some(512));
        assert!(s.document_fields().is_none());
    }

    #[test]
    fn ill_typed_keys_are_unset() {
        let s = Submission::from_attachment(attachment(
            r#"{"gdeType":3,"submittedAt":"ontem","fileSize":"grande"}"#,
        ));
        assert_eq!(s.gde_type(), None);
        assert_eq!(s.submitted_at(), None);
        assert_eq!(s.file_size(), None);
    }

    #[test]
    fn emissao_records_expose_typed_fields() {
        let s = Submission::from_attachment(attachment(
            r#"{"gdeType":"emissao","documentType":"requerimento-adiamento-relatorio",
                "escolaAluno":"ESTG","motivosAdiamento":"doença","adiamentoAte":"2024-09-30"}"#,
        ));
        match s.document_fields() {
            Some(DocumentFields::RequerimentoAdiamentoRelatorio(r)) => {
                assert_eq!(r.adiamento_ate, "2024-09-30");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
