use std::fmt;

use serde::{Deserialize, Serialize};

/// Internship-document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    PropostaEstagio,
    ProtocoloEstagio,
    RequerimentoUcsAtraso,
    PlanoEstagio,
    AtaReuniaoOrientadorEstagiario,
    AtaReuniaoOrientadorSupervisorEstagiario,
    RegistroPresencasDiarias,
    ParecerOrientador,
    ParecerSupervisor,
    RequerimentoAdiamentoRelatorio,
    RelatorioEstagio,
}

impl DocumentType {
    pub const ALL: &[DocumentType] = &[
        DocumentType::PropostaEstagio,
        DocumentType::ProtocoloEstagio,
        DocumentType::RequerimentoUcsAtraso,
        DocumentType::PlanoEstagio,
        DocumentType::AtaReuniaoOrientadorEstagiario,
        DocumentType::AtaReuniaoOrientadorSupervisorEstagiario,
        DocumentType::RegistroPresencasDiarias,
        DocumentType::ParecerOrientador,
        DocumentType::ParecerSupervisor,
        DocumentType::RequerimentoAdiamentoRelatorio,
        DocumentType::RelatorioEstagio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::PropostaEstagio => "proposta-estagio",
            DocumentType::ProtocoloEstagio => "protocolo-estagio",
            DocumentType::RequerimentoUcsAtraso => "requerimento-ucs-atraso",
            DocumentType::PlanoEstagio => "plano-estagio",
            DocumentType::AtaReuniaoOrientadorEstagiario => "ata-reuniao-orientador-estagiario",
            DocumentType::AtaReuniaoOrientadorSupervisorEstagiario => {
                "ata-reuniao-orientador-supervisor-estagiario"
            }
            DocumentType::RegistroPresencasDiarias => "registro-presencas-diarias",
            DocumentType::ParecerOrientador => "parecer-orientador",
            DocumentType::ParecerSupervisor => "parecer-supervisor",
            DocumentType::RequerimentoAdiamentoRelatorio => "requerimento-adiamento-relatorio",
            DocumentType::RelatorioEstagio => "relatorio-estagio",
        }
    }

    /// Human-readable label stored as `documentTypeLabel`.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::PropostaEstagio => "Proposta de Estágio (Anexo I)",
            DocumentType::ProtocoloEstagio => "Protocolo de Estágio (Anexo II)",
            DocumentType::RequerimentoUcsAtraso => {
                "Requerimento a Estágio com UCs em Atraso (Art. 14)"
            }
            DocumentType::PlanoEstagio => "Plano de Estágio (Anexo III)",
            DocumentType::AtaReuniaoOrientadorEstagiario => {
                "Ata de Reunião Orientador e Estagiário (Anexo IV)"
            }
            DocumentType::AtaReuniaoOrientadorSupervisorEstagiario => {
                "Ata de Reunião Orientador, Supervisor e Estagiário (Anexo V)"
            }
            DocumentType::RegistroPresencasDiarias => "Registo de Presenças Diárias (Anexo VI)",
            DocumentType::ParecerOrientador => "Parecer do Orientador (Anexo VIII)",
            DocumentType::ParecerSupervisor => "Parecer do Supervisor (Anexo IX)",
            DocumentType::RequerimentoAdiamentoRelatorio => {
                "Requerimento de Adiamento de Entrega do Relatório de Estágio (Anexo X)"
            }
            DocumentType::RelatorioEstagio => "Relatório de Estágio",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
