use std::path::PathBuf;

use anexo_core::{DocumentType, GdeType, SubmissionFilter};
use anexo_service::EventKind;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "anexo", about = "Submit and browse internship documents")]
pub struct Cli {
    /// Server URL
    #[arg(
        long,
        env = "ANEXO_SERVER_URL",
        default_value = "http://127.0.0.1:3720",
        global = true
    )]
    pub server_url: String,

    /// API key for authenticating with the server
    #[arg(long, env = "ANEXO_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the owner the API key acts for
    Whoami,
    /// List GDE types and document types with their required fields
    Catalog {
        /// Only show this document type
        document_type: Option<String>,
    },
    /// Validate and submit a document
    Submit(SubmitArgs),
    /// List submissions, newest first
    List(ListArgs),
    /// Show one submission
    Show {
        id: String,
        /// Print the raw payload as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a submission and its stored file
    Delete { id: String },
    /// Save the file stored with a submission
    Download {
        id: String,
        /// Output path; defaults to the stored file name
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print submissions as they are created, updated or deleted
    Watch {
        /// created, updated or deleted; repeatable, all kinds by default
        #[arg(long = "kind", value_parser = parse_kind)]
        kinds: Vec<EventKind>,
        /// Exit after this many events
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// emissao, submissao or resumo
    #[arg(long = "gde")]
    pub gde_type: String,

    /// Document type, e.g. protocolo-estagio
    #[arg(long = "document")]
    pub document_type: String,

    /// Field value as name=value; repeatable
    #[arg(long = "field", short = 'f', value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// File to attach
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long = "gde", value_parser = parse_gde)]
    pub gde_type: Option<GdeType>,

    #[arg(long = "document", value_parser = parse_document)]
    pub document_type: Option<DocumentType>,

    /// First day, YYYY-MM-DD (inclusive)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD (inclusive)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Case-insensitive text in label, file name or id
    #[arg(long)]
    pub search: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn filter(&self) -> SubmissionFilter {
        SubmissionFilter {
            gde_type: self.gde_type,
            document_type: self.document_type,
            start_date: self.from,
            end_date: self.to,
            search: self.search.clone(),
        }
    }
}

pub fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{s}'")),
    }
}

fn parse_gde(s: &str) -> Result<GdeType, String> {
    GdeType::parse_str(s).ok_or_else(|| format!("unknown GDE type '{s}'"))
}

fn parse_document(s: &str) -> Result<DocumentType, String> {
    DocumentType::parse_str(s).ok_or_else(|| format!("unknown document type '{s}'"))
}

fn parse_kind(s: &str) -> Result<EventKind, String> {
    EventKind::parse_str(s).ok_or_else(|| format!("unknown event kind '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pairs() {
        assert_eq!(
            parse_field("emailOrientador=a@b.pt").unwrap(),
            ("emailOrientador".to_string(), "a@b.pt".to_string())
        );
        assert_eq!(parse_field("x=a=b").unwrap().1, "a=b");
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=v").is_err());
    }

    #[test]
    fn list_args_build_a_filter() {
        let cli = Cli::parse_from([
            "anexo",
            "list",
            "--gde",
            "resumo",
            "--from",
            "2024-01-01",
            "--search",
            "plano",
        ]);
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        let filter = args.filter();
        assert_eq!(filter.gde_type, Some(GdeType::Resumo));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.search.as_deref(), Some("plano"));
        assert!(filter.end_date.is_none());
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(Cli::try_parse_from(["anexo", "list", "--gde", "outro"]).is_err());
        assert!(Cli::try_parse_from(["anexo", "list", "--document", "nope"]).is_err());
        assert!(Cli::try_parse_from(["anexo", "list", "--from", "10/01/2024"]).is_err());
    }

    #[test]
    fn submit_collects_fields() {
        let cli = Cli::parse_from([
            "anexo",
            "submit",
            "--gde",
            "emissao",
            "--document",
            "protocolo-estagio",
            "-f",
            "empresaEstagio=bosch",
            "--field",
            "dataInicioEstagio=2024-01-15",
        ]);
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.fields.len(), 2);
        assert!(args.file.is_none());
    }

    #[test]
    fn watch_kinds() {
        let cli = Cli::parse_from(["anexo", "watch", "--kind", "created", "--kind", "deleted"]);
        let Command::Watch { kinds, count } = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(kinds, vec![EventKind::Created, EventKind::Deleted]);
        assert!(count.is_none());
        assert!(Cli::try_parse_from(["anexo", "watch", "--kind", "moved"]).is_err());
    }
}
