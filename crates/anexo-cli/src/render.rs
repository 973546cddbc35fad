//! Plain-text rendering of submissions, the catalog and field errors.

use std::fmt::Write as _;

use anexo_core::payload::{scalar_text, RESERVED_KEYS};
use anexo_core::rules::{rules_for, CategoryRules, FieldKind, FieldRule};
use anexo_core::{DocumentType, FieldErrors, GdeType, Submission};
use anexo_service::EventKind;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn submitted(s: &Submission) -> String {
    s.submitted_at()
        .map(|t| t.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn submission_table(submissions: &[Submission]) -> String {
    if submissions.is_empty() {
        return "No submissions found.\n".into();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<10}  {:<16}  {:<48}  FILE",
        "ID", "GDE", "SUBMITTED", "DOCUMENT"
    );
    for s in submissions {
        let _ = writeln!(
            out,
            "{:<36}  {:<10}  {:<16}  {:<48}  {}",
            s.id,
            s.gde_type().map(|g| g.display_name()).unwrap_or("-"),
            submitted(s),
            s.document_type_label().unwrap_or("-"),
            s.file_name().unwrap_or("-"),
        );
    }
    out
}

pub fn submission_detail(s: &Submission) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:        {}", s.id);
    let _ = writeln!(
        out,
        "GDE:       {}",
        s.gde_type().map(|g| g.display_name()).unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "Document:  {}",
        s.document_type_label().unwrap_or("-")
    );
    let _ = writeln!(out, "Submitted: {}", submitted(s));
    if let Some(name) = s.file_name() {
        match s.file_size() {
            Some(size) => {
                let _ = writeln!(out, "File:      {name} ({size} bytes)");
            }
            None => {
                let _ = writeln!(out, "File:      {name}");
            }
        }
    }

    let fields: Vec<(&String, String)> = s
        .payload
        .iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .filter_map(|(k, v)| scalar_text(v).map(|text| (k, text)))
        .collect();
    if !fields.is_empty() {
        let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let _ = writeln!(out);
        for (name, value) in fields {
            let _ = writeln!(out, "  {name:<width$}  {value}");
        }
    }
    out
}

/// One line per change notification.
pub fn event_line(kind: EventKind, s: &Submission) -> String {
    format!(
        "{:<8} {}  {}\n",
        kind.as_str(),
        s.id,
        s.document_type_label().unwrap_or("-")
    )
}

pub fn field_errors(errors: &FieldErrors) -> String {
    let mut out = String::new();
    for (field, error) in errors.iter() {
        let _ = writeln!(out, "  {field}: {} ({})", error.message, error.kind.as_str());
    }
    out
}

fn kind_hint(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Text => String::new(),
        FieldKind::Email => " [email]".into(),
        FieldKind::Phone => " [phone]".into(),
        FieldKind::Date => " [date]".into(),
        FieldKind::Time => " [time]".into(),
        FieldKind::Integer => " [integer]".into(),
        FieldKind::Score => " [score 0-20]".into(),
        FieldKind::Choice(options) => format!(" [{}]", options.join("|")),
    }
}

fn write_rules(out: &mut String, indent: &str, rules: &[FieldRule]) {
    for rule in rules {
        let _ = writeln!(out, "{indent}{}{}", rule.name, kind_hint(&rule.kind));
    }
}

fn write_category(out: &mut String, doc: DocumentType, rules: Option<&CategoryRules>) {
    let _ = writeln!(out, "{}  ({})", doc.as_str(), doc.label());
    let Some(rules) = rules else {
        return;
    };
    write_rules(out, "    ", rules.fields);
    for block in rules.conditional {
        let _ = writeln!(
            out,
            "    when {} = {}:",
            block.trigger_field, block.trigger_value
        );
        write_rules(out, "      ", block.fields);
    }
}

/// Required fields per document type. With `only`, just that type.
pub fn catalog(only: Option<DocumentType>) -> String {
    let mut out = String::new();
    if only.is_none() {
        let _ = writeln!(out, "GDE types:");
        for g in GdeType::ALL {
            let _ = writeln!(out, "  {:<10} {}", g.as_str(), g.display_name());
        }
        let _ = writeln!(
            out,
            "\nemissao requires the fields below; submissao requires a file; resumo requires nothing.\n"
        );
        let _ = writeln!(out, "Document types:");
    }
    for doc in DocumentType::ALL {
        if only.is_some_and(|o| o != *doc) {
            continue;
        }
        write_category(&mut out, *doc, rules_for(*doc));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anexo_core::{Attachment, FieldError, FieldErrorKind};
    use chrono::Utc;

    fn submission(id: &str, data: &str) -> Submission {
        let now = Utc::now();
        Submission::from_attachment(Attachment {
            id: id.into(),
            owner: "ana".into(),
            data: data.into(),
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn table_shows_label_date_and_file() {
        let s = submission(
            "a1",
            r#"{"gdeType":"submissao","documentType":"relatorio-estagio","submittedAt":"2024-01-10T12:00:00.000Z","fileName":"r.pdf"}"#,
        );
        let table = submission_table(&[s]);
        let row = table.lines().nth(1).unwrap();
        assert!(row.starts_with("a1"));
        assert!(row.contains("Submissão"));
        assert!(row.contains("2024-01-10 12:00"));
        assert!(row.contains("Relatório de Estágio"));
        assert!(row.ends_with("r.pdf"));
        assert_eq!(submission_table(&[]), "No submissions found.\n");
    }

    #[test]
    fn malformed_payload_renders_placeholders() {
        let s = submission("bad", "{oops");
        let detail = submission_detail(&s);
        assert!(detail.contains("GDE:       -"));
        assert!(detail.contains("Submitted: -"));
    }

    #[test]
    fn detail_lists_user_fields_only() {
        let s = submission(
            "p1",
            r#"{"gdeType":"emissao","documentType":"protocolo-estagio","documentTypeLabel":"Protocolo de Estágio (Anexo II)","submittedAt":"2024-01-10T12:00:00.000Z","empresaEstagio":"bosch"}"#,
        );
        let detail = submission_detail(&s);
        assert!(detail.contains("Protocolo de Estágio (Anexo II)"));
        assert!(detail.contains("  empresaEstagio  bosch"));
        assert!(!detail.contains("  gdeType"));
    }

    #[test]
    fn event_lines_name_kind_and_document() {
        let s = submission("e1", r#"{"documentType":"plano-estagio"}"#);
        assert_eq!(
            event_line(EventKind::Deleted, &s),
            "deleted  e1  Plano de Estágio (Anexo III)\n"
        );
    }

    #[test]
    fn field_errors_one_per_line() {
        let mut errors = FieldErrors::new();
        errors.insert(
            "emailOrientador",
            FieldError::new(FieldErrorKind::InvalidEmail, "Email inválido"),
        );
        errors.insert(
            "file",
            FieldError::new(FieldErrorKind::Required, "Arquivo é obrigatório"),
        );
        let text = field_errors(&errors);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("emailOrientador: Email inválido (invalid_email)"));
    }

    #[test]
    fn catalog_shows_conditional_blocks() {
        let text = catalog(Some(DocumentType::ProtocoloEstagio));
        assert!(text.starts_with("protocolo-estagio"));
        assert!(text.contains("empresaEstagio [bosch|deloitte|outra]"));
        assert!(text.contains("when empresaEstagio = outra:"));
        assert!(!text.contains("GDE types"));

        let full = catalog(None);
        assert!(full.contains("GDE types"));
        assert!(full.contains("relatorio-estagio"));
    }
}
