use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use anexo_core::{validate, Attachment, DocumentType, FileUpload, FormInput, Submission};
use anexo_service::{
    fetch_submission, fetch_submissions, AttachmentRepository, EventKind, HttpService,
    SubmissionRequest, SubmitError,
};
use tokio::sync::mpsc;

use crate::cli::{Command, SubmitArgs};
use crate::render;

pub async fn execute(svc: &HttpService, command: Command, out: &mut (dyn Write + Send)) -> Result<()> {
    match command {
        Command::Whoami => {
            let owner = svc.session().await?;
            writeln!(out, "{owner}")?;
        }
        Command::Catalog { document_type } => {
            let only = match document_type.as_deref() {
                None => None,
                Some(s) => Some(
                    DocumentType::parse_str(s)
                        .with_context(|| format!("unknown document type '{s}'"))?,
                ),
            };
            write!(out, "{}", render::catalog(only))?;
        }
        Command::Submit(args) => submit(svc, args, out).await?,
        Command::List(args) => {
            let submissions = fetch_submissions(svc, &args.filter()).await?;
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&submissions)?)?;
            } else {
                write!(out, "{}", render::submission_table(&submissions))?;
            }
        }
        Command::Show { id, json } => {
            let Some(submission) = fetch_submission(svc, &id).await? else {
                bail!("submission {id} not found");
            };
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&submission.payload)?)?;
            } else {
                write!(out, "{}", render::submission_detail(&submission))?;
            }
        }
        Command::Delete { id } => {
            if svc.delete_attachment(&id).await?.is_none() {
                bail!("submission {id} not found");
            }
            writeln!(out, "Deleted {id}")?;
        }
        Command::Download { id, output } => download(svc, &id, output, out).await?,
        Command::Watch { kinds, count } => watch(svc, kinds, count, out).await?,
    }
    Ok(())
}

async fn submit(svc: &HttpService, args: SubmitArgs, out: &mut (dyn Write + Send)) -> Result<()> {
    let mut input = FormInput::new(args.gde_type, args.document_type);
    for (name, value) in args.fields {
        input = input.with_field(name, value);
    }

    let file = match &args.file {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            let name = file_name_of(path)?;
            input = input.with_file(FileUpload::new(name.clone(), bytes.len() as u64));
            Some((name, bytes))
        }
        None => None,
    };

    // Catch field errors before anything is uploaded.
    if let Err(e) = validate(&input) {
        return Err(report(SubmitError::from(e), out));
    }

    let request = SubmissionRequest::from_form(
        &input,
        file.as_ref().map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
    );
    let attachment = svc
        .submit_form(&request)
        .await
        .map_err(|e| report(SubmitError::from(e), out))?;
    tracing::debug!(id = %attachment.id, "submitted");
    writeln!(out, "Submitted {}", attachment.id)?;
    Ok(())
}

/// Print per-field failures, if any, and turn the error into the command's
/// result.
fn report(err: SubmitError, out: &mut (dyn Write + Send)) -> anyhow::Error {
    match err.field_errors() {
        Some(fields) => {
            let _ = writeln!(out, "Submission rejected:");
            let _ = write!(out, "{}", render::field_errors(fields));
            anyhow::anyhow!("{} field(s) failed validation", fields.len())
        }
        None => err.into(),
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

async fn download(
    svc: &HttpService,
    id: &str,
    output: Option<PathBuf>,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let Some(submission) = fetch_submission(svc, id).await? else {
        bail!("submission {id} not found");
    };
    let Some(stored_name) = submission.file_name() else {
        bail!("submission {id} has no file");
    };
    let Some(bytes) = svc.file_bytes(id).await? else {
        bail!("file for submission {id} is missing on the server");
    };

    let path = match output {
        Some(path) => path,
        // Never let a stored name escape the working directory.
        None => PathBuf::from(file_name_of(Path::new(stored_name))?),
    };
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    writeln!(out, "Saved {} bytes to {}", bytes.len(), path.display())?;
    Ok(())
}

async fn watch(
    svc: &HttpService,
    kinds: Vec<EventKind>,
    count: Option<usize>,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let kinds = if kinds.is_empty() {
        vec![EventKind::Created, EventKind::Updated, EventKind::Deleted]
    } else {
        kinds
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<(EventKind, Attachment)>();
    let mut subscriptions = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let tx = tx.clone();
        let subscription = svc
            .subscribe(
                kind,
                Box::new(move |attachment| {
                    let _ = tx.send((kind, attachment));
                }),
            )
            .await?;
        subscriptions.push(subscription);
    }
    drop(tx);
    out.flush()?;

    let mut seen = 0;
    loop {
        tokio::select! {
            next = rx.recv() => {
                let Some((kind, attachment)) = next else {
                    bail!("event stream closed by the server");
                };
                write!(out, "{}", render::event_line(kind, &Submission::from(attachment)))?;
                out.flush()?;
                seen += 1;
                if count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
