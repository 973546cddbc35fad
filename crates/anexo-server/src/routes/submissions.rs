use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};

use anexo_core::{validate, ValidationError};
use anexo_service::{AttachmentRepository, ServiceError, SubmissionRequest};
use anexo_store::{attachment_file_key, sanitize_file_name};

use super::{to_error, ApiError, AppState};
use crate::auth::Owner;

/// Room for the form fields and JSON framing around the file content.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body size that fits a file of `max_upload_bytes` once it is
/// base64 encoded inside the JSON request.
pub(crate) fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(FORM_OVERHEAD_BYTES)
}

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/submissions", post(create_submission))
        .layer(DefaultBodyLimit::max(body_limit(max_upload_bytes)))
}

fn rejection_error(rejection: JsonRejection, max_upload_bytes: usize) -> ApiError {
    let status = rejection.status();
    let msg = if status == StatusCode::PAYLOAD_TOO_LARGE {
        format!("request too large: files up to {max_upload_bytes} bytes are accepted")
    } else {
        rejection.body_text()
    };
    (status, Json(json!({ "error": msg })))
}

fn validation_error(e: ValidationError) -> ApiError {
    match e {
        ValidationError::Fields(errors) => to_error(ServiceError::Validation(errors)),
        terminal => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": terminal.to_string() })),
        ),
    }
}

/// Validate a raw form, store its file, persist the normalized payload.
async fn create_submission(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    request: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = request.map_err(|r| rejection_error(r, state.max_upload_bytes))?;
    let (mut input, file_bytes) = request.into_form().map_err(to_error)?;
    // The payload's fileName must match the stored object's name.
    if let Some(file) = input.file.as_mut() {
        file.name = sanitize_file_name(&file.name);
    }
    let payload = validate(&input).map_err(validation_error)?;

    let repo = state.repository(&owner);
    let attachment = repo
        .create_attachment(&payload.clone().into_value())
        .await
        .map_err(to_error)?;

    if let (Some(bytes), Some(name)) = (file_bytes, payload.get_str("fileName")) {
        let key = attachment_file_key(owner.as_str(), &attachment.id, name);
        if let Err(e) = state.store.put(&key, Bytes::from(bytes)).await {
            tracing::error!(error = %e, id = %attachment.id, "storing upload failed");
            if let Err(rollback) = repo.delete_attachment(&attachment.id).await {
                tracing::error!(error = %rollback, id = %attachment.id, "rollback failed");
            }
            return Err(to_error(ServiceError::Internal(format!("store file: {e}"))));
        }
    }

    Ok((StatusCode::CREATED, Json(json!(attachment))))
}
