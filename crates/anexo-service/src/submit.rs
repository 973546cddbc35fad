//! The new-submission and list/detail workflows on top of any repository.

use anexo_core::{
    validate, Attachment, FieldErrors, FormInput, Submission, SubmissionFilter, ValidationError,
};
use thiserror::Error;

use crate::{AttachmentRepository, ServiceError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SubmitError {
    /// Per-field failures, whether caught locally or reported by a server.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmitError::Validation(e) => e.field_errors(),
            SubmitError::Service(ServiceError::Validation(errors)) => Some(errors),
            SubmitError::Service(_) => None,
        }
    }
}

/// Validate `input` and persist the normalized payload.
///
/// Nothing reaches the repository unless validation succeeds.
pub async fn submit(
    repo: &dyn AttachmentRepository,
    input: &FormInput,
) -> Result<Attachment, SubmitError> {
    let payload = validate(input)?;
    tracing::debug!(keys = payload.len(), "submitting normalized payload");
    let attachment = repo.create_attachment(&payload.into_value()).await?;
    Ok(attachment)
}

/// All of the owner's submissions matching `filter`, newest submission first.
pub async fn fetch_submissions(
    repo: &dyn AttachmentRepository,
    filter: &SubmissionFilter,
) -> Result<Vec<Submission>, ServiceError> {
    let submissions = repo
        .list_attachments()
        .await?
        .into_iter()
        .map(Submission::from)
        .collect();
    Ok(filter.apply(submissions))
}

pub async fn fetch_submission(
    repo: &dyn AttachmentRepository,
    id: &str,
) -> Result<Option<Submission>, ServiceError> {
    Ok(repo.get_attachment(id).await?.map(Submission::from))
}
