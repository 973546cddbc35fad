//! Required-field table for every document category.
//!
//! Each category lists its base fields plus any number of conditional
//! blocks. A block's fields become required only when its trigger field
//! carries the trigger value. Adding a category means adding a table
//! entry; the validator never branches on a specific category.

use serde::Serialize;

use crate::document::DocumentType;

/// Scalar kind of a field. Kinds other than `Email` are rendering hints
/// and are not format-checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "options")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Date,
    Time,
    Integer,
    /// Decimal score in `0..=20`.
    Score,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Message reported when the field is missing.
    pub message: &'static str,
}

/// Fields required only when `trigger_field` equals `trigger_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionalBlock {
    pub trigger_field: &'static str,
    pub trigger_value: &'static str,
    pub fields: &'static [FieldRule],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryRules {
    pub document_type: DocumentType,
    pub fields: &'static [FieldRule],
    pub conditional: &'static [ConditionalBlock],
}

impl CategoryRules {
    /// Every field name the category knows about, base fields first.
    pub fn all_fields(&self) -> impl Iterator<Item = &'static FieldRule> {
        self.fields
            .iter()
            .chain(self.conditional.iter().flat_map(|b| b.fields.iter()))
    }
}

/// Name of the file field for `submissao`.
pub const FILE_FIELD: &str = "file";

pub const FILE_REQUIRED_MESSAGE: &str = "Arquivo é obrigatório";
pub const FILE_EMPTY_MESSAGE: &str = "Arquivo não pode estar vazio";
pub const INVALID_EMAIL_MESSAGE: &str = "Email inválido";

const fn field(name: &'static str, kind: FieldKind, message: &'static str) -> FieldRule {
    FieldRule {
        name,
        kind,
        message,
    }
}

use FieldKind::{Date, Email, Integer, Phone, Score, Text, Time};

const SIM_NAO: FieldKind = FieldKind::Choice(&["sim", "nao"]);
const EMPRESAS: FieldKind = FieldKind::Choice(&["bosch", "deloitte", "outra"]);

const PROPOSTA_ESTAGIO: &[FieldRule] = &[
    field("telefoneAluno", Phone, "Telefone do aluno é obrigatório"),
    field("temasAreas", Text, "Temas ou áreas é obrigatório"),
    field("orientadorDocente", Text, "Orientador docente é obrigatório"),
    field("emailOrientador", Email, "Email do orientador é obrigatório"),
    field("temLocalEstagio", SIM_NAO, "Seleção obrigatória"),
];

const ENTIDADE_ACOLHIMENTO: &[FieldRule] = &[
    field(
        "nomeEntidadeAcolhimento",
        Text,
        "Nome da entidade de acolhimento é obrigatório",
    ),
    field(
        "moradaEntidadeAcolhimento",
        Text,
        "Morada da entidade de acolhimento é obrigatória",
    ),
    field(
        "codigoPostalEntidadeAcolhimento",
        Text,
        "Código postal da entidade de acolhimento é obrigatório",
    ),
    field(
        "telefoneEntidadeAcolhimento",
        Phone,
        "Telefone da entidade de acolhimento é obrigatório",
    ),
    field(
        "emailEntidadeAcolhimento",
        Email,
        "Email da entidade de acolhimento é obrigatório",
    ),
    field(
        "pessoaContactadaEntidadeAcolhimento",
        Text,
        "Pessoa contactada na entidade de acolhimento é obrigatória",
    ),
    field(
        "cargoPessoaContactadaEntidadeAcolhimento",
        Text,
        "Cargo da pessoa contactada na entidade de acolhimento é obrigatório",
    ),
    field(
        "supervisorEntidadeAcolhimento",
        Text,
        "Supervisor na entidade de acolhimento é obrigatório",
    ),
    field(
        "emailSupervisorEntidadeAcolhimento",
        Email,
        "Email do supervisor na entidade de acolhimento é obrigatório",
    ),
    field(
        "cargoSupervisorEntidadeAcolhimento",
        Text,
        "Cargo do supervisor na entidade de acolhimento é obrigatório",
    ),
];

const PROTOCOLO_ESTAGIO: &[FieldRule] = &[
    field("dataInicioEstagio", Date, "Data de início é obrigatória"),
    field(
        "dataFinalizacaoEstagio",
        Date,
        "Data de finalização é obrigatória",
    ),
    field("empresaEstagio", EMPRESAS, "Empresa é obrigatória"),
];

const REPRESENTANTE_ENTIDADE: &[FieldRule] = &[
    field(
        "nomeRepresentanteEntidadeAcolhimento",
        Text,
        "Nome do representante é obrigatório",
    ),
    field("nipcEntidadeAcolhimento", Text, "NIPC é obrigatório"),
    field("caeEntidadeAcolhimento", Text, "CAE é obrigatório"),
    field("localEstagio", Text, "Local de estágio é obrigatório"),
];

const REQUERIMENTO_UCS_ATRASO: &[FieldRule] = &[
    field("telefoneAlunoArt14", Phone, "Telefone do aluno é obrigatório"),
    field(
        "numeroUcsAtraso",
        Integer,
        "Número de UCs em atraso é obrigatório",
    ),
    field("nomeUcsAtraso", Text, "Nome das UCs em atraso é obrigatório"),
];

const PLANO_ESTAGIO: &[FieldRule] = &[
    field("temasAreasEA3", Text, "Temas ou áreas é obrigatório"),
    field(
        "objetivosPlanoTrabalho",
        Text,
        "Objetivos e plano de trabalho é obrigatório",
    ),
    field("nomeOrientadorEA3", Text, "Nome do orientador é obrigatório"),
    field("emailOrientadorEA3", Email, "Email do orientador é obrigatório"),
    field(
        "supervisorEntidade",
        Text,
        "Supervisor na entidade é obrigatório",
    ),
    field("emailSupervisor", Email, "Email do supervisor é obrigatório"),
    field("cargoSupervisor", Text, "Cargo do supervisor é obrigatório"),
    field("horaInicio", Time, "Hora de início é obrigatória"),
    field("horaFim", Time, "Hora de fim é obrigatória"),
];

const ATA_ORIENTADOR_ESTAGIARIO: &[FieldRule] = &[
    field("numeroAta", Integer, "Número da ata é obrigatório"),
    field("diaReuniao", Text, "Dia da reunião é obrigatório"),
    field("mesReuniao", Text, "Mês da reunião é obrigatório"),
    field("horasReuniao", Text, "Horas da reunião é obrigatório"),
    field("minutosReuniao", Text, "Minutos da reunião é obrigatório"),
    field("horasConclusao", Text, "Horas de conclusão é obrigatório"),
    field("localReuniao", Text, "Local da reunião é obrigatório"),
    field("ordemTrabalhos", Text, "Ordem de trabalhos é obrigatório"),
];

const ATA_ORIENTADOR_SUPERVISOR_ESTAGIARIO: &[FieldRule] = &[
    field("numeroAtaEA5", Integer, "Número da ata é obrigatório"),
    field("diaReuniaoEA5", Text, "Dia da reunião é obrigatório"),
    field("mesReuniaoEA5", Text, "Mês da reunião é obrigatório"),
    field("horasReuniaoEA5", Text, "Horas da reunião é obrigatório"),
    field(
        "horasConclusaoEA5",
        Text,
        "Horas de conclusão é obrigatório",
    ),
    field("escolaOrientador", Text, "Escola do orientador é obrigatório"),
    field("ordemTrabalhosEA5", Text, "Ordem de trabalhos é obrigatório"),
];

const PARECER_SUPERVISOR: &[FieldRule] = &[
    field(
        "atitudeDesempenho",
        Score,
        "Atitude e desempenho é obrigatório",
    ),
    field(
        "aplicacaoConceitos",
        Score,
        "Aplicação de conceitos é obrigatório",
    ),
    field("grauDificuldade", Score, "Grau de dificuldade é obrigatório"),
];

const REQUERIMENTO_ADIAMENTO_RELATORIO: &[FieldRule] = &[
    field("escolaAluno", Text, "Escola do aluno é obrigatório"),
    field(
        "motivosAdiamento",
        Text,
        "Motivos de adiamento é obrigatório",
    ),
    field("adiamentoAte", Date, "Adiamento até é obrigatório"),
];

const NONE: &[FieldRule] = &[];

/// The rule table, one entry per `DocumentType`, in `DocumentType::ALL` order.
pub const CATEGORY_RULES: &[CategoryRules] = &[
    CategoryRules {
        document_type: DocumentType::PropostaEstagio,
        fields: PROPOSTA_ESTAGIO,
        conditional: &[ConditionalBlock {
            trigger_field: "temLocalEstagio",
            trigger_value: "sim",
            fields: ENTIDADE_ACOLHIMENTO,
        }],
    },
    CategoryRules {
        document_type: DocumentType::ProtocoloEstagio,
        fields: PROTOCOLO_ESTAGIO,
        conditional: &[ConditionalBlock {
            trigger_field: "empresaEstagio",
            trigger_value: "outra",
            fields: REPRESENTANTE_ENTIDADE,
        }],
    },
    CategoryRules {
        document_type: DocumentType::RequerimentoUcsAtraso,
        fields: REQUERIMENTO_UCS_ATRASO,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::PlanoEstagio,
        fields: PLANO_ESTAGIO,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::AtaReuniaoOrientadorEstagiario,
        fields: ATA_ORIENTADOR_ESTAGIARIO,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::AtaReuniaoOrientadorSupervisorEstagiario,
        fields: ATA_ORIENTADOR_SUPERVISOR_ESTAGIARIO,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::RegistroPresencasDiarias,
        fields: NONE,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::ParecerOrientador,
        fields: NONE,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::ParecerSupervisor,
        fields: PARECER_SUPERVISOR,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::RequerimentoAdiamentoRelatorio,
        fields: REQUERIMENTO_ADIAMENTO_RELATORIO,
        conditional: &[],
    },
    CategoryRules {
        document_type: DocumentType::RelatorioEstagio,
        fields: NONE,
        conditional: &[],
    },
];

/// Look up the rules for a category. Callers treat a missing entry as
/// "nothing required".
pub fn rules_for(document_type: DocumentType) -> Option<&'static CategoryRules> {
    CATEGORY_RULES
        .iter()
        .find(|r| r.document_type == document_type)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_category_has_exactly_one_entry() {
        for d in DocumentType::ALL {
            let count = CATEGORY_RULES
                .iter()
                .filter(|r| r.document_type == *d)
                .count();
            assert_eq!(count, 1, "{} should have one table entry", d.as_str());
        }
    }

    #[test]
    fn field_names_are_unique_within_a_category() {
        for rules in CATEGORY_RULES {
            let mut seen = HashSet::new();
            for f in rules.all_fields() {
                assert!(
                    seen.insert(f.name),
                    "duplicate field {} in {}",
                    f.name,
                    rules.document_type.as_str()
                );
            }
        }
    }

    #[test]
    fn triggers_refer_to_base_fields() {
        for rules in CATEGORY_RULES {
            for block in rules.conditional {
                assert!(
                    rules.fields.iter().any(|f| f.name == block.trigger_field),
                    "trigger {} missing from base fields",
                    block.trigger_field
                );
            }
        }
    }

    #[test]
    fn proposta_has_five_base_and_ten_host_fields() {
        let rules = rules_for(DocumentType::PropostaEstagio).unwrap();
        assert_eq!(rules.fields.len(), 5);
        assert_eq!(rules.conditional.len(), 1);
        assert_eq!(rules.conditional[0].trigger_field, "temLocalEstagio");
        assert_eq!(rules.conditional[0].trigger_value, "sim");
        assert_eq!(rules.conditional[0].fields.len(), 10);
    }

    #[test]
    fn protocolo_has_three_base_and_four_extra_fields() {
        let rules = rules_for(DocumentType::ProtocoloEstagio).unwrap();
        assert_eq!(rules.fields.len(), 3);
        assert_eq!(rules.conditional[0].fields.len(), 4);
    }

    #[test]
    fn categories_without_fields() {
        for d in [
            DocumentType::RegistroPresencasDiarias,
            DocumentType::ParecerOrientador,
            DocumentType::RelatorioEstagio,
        ] {
            assert_eq!(rules_for(d).unwrap().all_fields().count(), 0);
        }
    }

    #[test]
    fn field_kind_serializes_with_options() {
        let json = serde_json::to_value(EMPRESAS).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "choice", "options": ["bosch", "deloitte", "outra"] })
        );
        let json = serde_json::to_value(FieldKind::Email).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "email" }));
    }
}
