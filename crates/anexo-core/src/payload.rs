use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentType;
use crate::error::PayloadError;
use crate::gde::GdeType;
use crate::validate::FileUpload;

pub const GDE_TYPE_KEY: &str = "gdeType";
pub const DOCUMENT_TYPE_KEY: &str = "documentType";
pub const DOCUMENT_TYPE_LABEL_KEY: &str = "documentTypeLabel";
pub const SUBMITTED_AT_KEY: &str = "submittedAt";
pub const FILE_NAME_KEY: &str = "fileName";
pub const FILE_SIZE_KEY: &str = "fileSize";

/// Keys the engine writes itself. Input fields never override them.
pub const RESERVED_KEYS: &[&str] = &[
    GDE_TYPE_KEY,
    DOCUMENT_TYPE_KEY,
    DOCUMENT_TYPE_LABEL_KEY,
    SUBMITTED_AT_KEY,
    FILE_NAME_KEY,
    FILE_SIZE_KEY,
];

/// Text of a scalar field value after trimming, or `None` when the value
/// is null, empty, or not a scalar.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The flat JSON object persisted on `Attachment.data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPayload(Map<String, Value>);

impl NormalizedPayload {
    pub(crate) fn build(
        gde_type: GdeType,
        document_type: DocumentType,
        fields: &BTreeMap<String, Value>,
        file: Option<&FileUpload>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let mut map = Map::new();
        for (name, value) in fields {
            if RESERVED_KEYS.contains(&name.as_str()) {
                continue;
            }
            let kept = match value {
                Value::String(_) => scalar_text(value).map(Value::String),
                Value::Number(_) | Value::Bool(_) => Some(value.clone()),
                Value::Null | Value::Array(_) | Value::Object(_) => None,
            };
            if let Some(v) = kept {
                map.insert(name.clone(), v);
            }
        }

        map.insert(GDE_TYPE_KEY.into(), Value::from(gde_type.as_str()));
        map.insert(DOCUMENT_TYPE_KEY.into(), Value::from(document_type.as_str()));
        map.insert(
            DOCUMENT_TYPE_LABEL_KEY.into(),
            Value::from(document_type.label()),
        );
        map.insert(
            SUBMITTED_AT_KEY.into(),
            Value::from(submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        if let Some(file) = file {
            if !file.name.trim().is_empty() {
                map.insert(FILE_NAME_KEY.into(), Value::from(file.name.trim()));
            }
            map.insert(FILE_SIZE_KEY.into(), Value::from(file.size));
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Decode the stored `data` string of an attachment into a JSON object.
///
/// Accepts a JSON object, or a JSON string that itself holds a JSON
/// object (the hosted backend double-encodes some records).
pub fn decode_payload(raw: &str) -> Result<Map<String, Value>, PayloadError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        Value::String(inner) => match serde_json::from_str::<Value>(&inner)? {
            Value::Object(map) => Ok(map),
            _ => Err(PayloadError::NotAnObject),
        },
        _ => Err(PayloadError::NotAnObject),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropostaEstagio {
    pub telefone_aluno: String,
    pub temas_areas: String,
    pub orientador_docente: String,
    pub email_orientador: String,
    pub tem_local_estagio: String,
    #[serde(flatten)]
    pub entidade_acolhimento: Option<EntidadeAcolhimento>,
}

/// Host entity block of a proposal, present when `temLocalEstagio = sim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntidadeAcolhimento {
    pub nome_entidade_acolhimento: String,
    pub morada_entidade_acolhimento: String,
    pub codigo_postal_entidade_acolhimento: String,
    pub telefone_entidade_acolhimento: String,
    pub email_entidade_acolhimento: String,
    pub pessoa_contactada_entidade_acolhimento: String,
    pub cargo_pessoa_contactada_entidade_acolhimento: String,
    pub supervisor_entidade_acolhimento: String,
    pub email_supervisor_entidade_acolhimento: String,
    pub cargo_supervisor_entidade_acolhimento: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocoloEstagio {
    pub data_inicio_estagio: String,
    pub data_finalizacao_estagio: String,
    pub empresa_estagio: String,
    #[serde(flatten)]
    pub representante: Option<RepresentanteEntidade>,
}

/// Present when `empresaEstagio = outra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentanteEntidade {
    pub nome_representante_entidade_acolhimento: String,
    pub nipc_entidade_acolhimento: String,
    pub cae_entidade_acolhimento: String,
    pub local_estagio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequerimentoUcsAtraso {
    #[serde(rename = "telefoneAlunoArt14")]
    pub telefone_aluno: String,
    pub numero_ucs_atraso: String,
    pub nome_ucs_atraso: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanoEstagio {
    #[serde(rename = "temasAreasEA3")]
    pub temas_areas: String,
    pub objetivos_plano_trabalho: String,
    #[serde(rename = "nomeOrientadorEA3")]
    pub nome_orientador: String,
    #[serde(rename = "emailOrientadorEA3")]
    pub email_orientador: String,
    pub supervisor_entidade: String,
    pub email_supervisor: String,
    pub cargo_supervisor: String,
    pub hora_inicio: String,
    pub hora_fim: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtaOrientadorEstagiario {
    pub numero_ata: String,
    pub dia_reuniao: String,
    pub mes_reuniao: String,
    pub horas_reuniao: String,
    pub minutos_reuniao: String,
    pub horas_conclusao: String,
    pub local_reuniao: String,
    pub ordem_trabalhos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtaOrientadorSupervisorEstagiario {
    #[serde(rename = "numeroAtaEA5")]
    pub numero_ata: String,
    #[serde(rename = "diaReuniaoEA5")]
    pub dia_reuniao: String,
    #[serde(rename = "mesReuniaoEA5")]
    pub mes_reuniao: String,
    #[serde(rename = "horasReuniaoEA5")]
    pub horas_reuniao: String,
    #[serde(rename = "horasConclusaoEA5")]
    pub horas_conclusao: String,
    #[serde(rename = "escolaOrientador")]
    pub escola_orientador: String,
    #[serde(rename = "ordemTrabalhosEA5")]
    pub ordem_trabalhos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParecerSupervisor {
    pub atitude_desempenho: String,
    pub aplicacao_conceitos: String,
    pub grau_dificuldade: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequerimentoAdiamentoRelatorio {
    pub escola_aluno: String,
    pub motivos_adiamento: String,
    pub adiamento_ate: String,
}

/// Category-specific fields of an `emissao` payload, one variant per
/// document type. Values are kept as the text the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFields {
    PropostaEstagio(PropostaEstagio),
    ProtocoloEstagio(ProtocoloEstagio),
    RequerimentoUcsAtraso(RequerimentoUcsAtraso),
    PlanoEstagio(PlanoEstagio),
    AtaReuniaoOrientadorEstagiario(AtaOrientadorEstagiario),
    AtaReuniaoOrientadorSupervisorEstagiario(AtaOrientadorSupervisorEstagiario),
    RegistroPresencasDiarias,
    ParecerOrientador,
    ParecerSupervisor(ParecerSupervisor),
    RequerimentoAdiamentoRelatorio(RequerimentoAdiamentoRelatorio),
    RelatorioEstagio,
}

impl DocumentFields {
    pub fn document_type(&self) -> DocumentType {
        match self {
            DocumentFields::PropostaEstagio(_) => DocumentType::PropostaEstagio,
            DocumentFields::ProtocoloEstagio(_) => DocumentType::ProtocoloEstagio,
            DocumentFields::RequerimentoUcsAtraso(_) => DocumentType::RequerimentoUcsAtraso,
            DocumentFields::PlanoEstagio(_) => DocumentType::PlanoEstagio,
            DocumentFields::AtaReuniaoOrientadorEstagiario(_) => {
                DocumentType::AtaReuniaoOrientadorEstagiario
            }
            DocumentFields::AtaReuniaoOrientadorSupervisorEstagiario(_) => {
                DocumentType::AtaReuniaoOrientadorSupervisorEstagiario
            }
            DocumentFields::RegistroPresencasDiarias => DocumentType::RegistroPresencasDiarias,
            DocumentFields::ParecerOrientador => DocumentType::ParecerOrientador,
            DocumentFields::ParecerSupervisor(_) => DocumentType::ParecerSupervisor,
            DocumentFields::RequerimentoAdiamentoRelatorio(_) => {
                DocumentType::RequerimentoAdiamentoRelatorio
            }
            DocumentFields::RelatorioEstagio => DocumentType::RelatorioEstagio,
        }
    }

    pub fn from_payload(payload: &NormalizedPayload) -> Result<Self, PayloadError> {
        Self::from_map(payload.as_map())
    }

    /// Decode the category fields of a stored payload. The variant is
    /// chosen by its `documentType` key; a missing required key fails.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, PayloadError> {
        let raw = map
            .get(DOCUMENT_TYPE_KEY)
            .and_then(Value::as_str)
            .ok_or(PayloadError::MissingKey(DOCUMENT_TYPE_KEY))?;
        let document_type = DocumentType::parse_str(raw).ok_or_else(|| PayloadError::UnknownValue {
            key: DOCUMENT_TYPE_KEY,
            value: raw.to_string(),
        })?;

        let text: Map<String, Value> = map
            .iter()
            .filter_map(|(k, v)| scalar_text(v).map(|t| (k.clone(), Value::String(t))))
            .collect();
        let text = Value::Object(text);

        let fields = match document_type {
            DocumentType::PropostaEstagio => {
                DocumentFields::PropostaEstagio(serde_json::from_value(text)?)
            }
            DocumentType::ProtocoloEstagio => {
                DocumentFields::ProtocoloEstagio(serde_json::from_value(text)?)
            }
            DocumentType::RequerimentoUcsAtraso => {
                DocumentFields::RequerimentoUcsAtraso(serde_json::from_value(text)?)
            }
            DocumentType::PlanoEstagio => DocumentFields::PlanoEstagio(serde_json::from_value(text)?),
            DocumentType::AtaReuniaoOrientadorEstagiario => {
                DocumentFields::AtaReuniaoOrientadorEstagiario(serde_json::from_value(text)?)
            }
            DocumentType::AtaReuniaoOrientadorSupervisorEstagiario => {
                DocumentFields::AtaReuniaoOrientadorSupervisorEstagiario(serde_json::from_value(
                    text,
                )?)
            }
            DocumentType::RegistroPresencasDiarias => DocumentFields::RegistroPresencasDiarias,
            DocumentType::ParecerOrientador => DocumentFields::ParecerOrientador,
            DocumentType::ParecerSupervisor => {
                DocumentFields::ParecerSupervisor(serde_json::from_value(text)?)
            }
            DocumentType::RequerimentoAdiamentoRelatorio => {
                DocumentFields::RequerimentoAdiamentoRelatorio(serde_json::from_value(text)?)
            }
            DocumentType::RelatorioEstagio => DocumentFields::RelatorioEstagio,
        };
        Ok(fields)
    }
}
