use std::cmp::Reverse;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use anexo_core::{Attachment, DocumentType, GdeType, Submission, SubmissionFilter};
use anexo_service::{AttachmentRepository, ServiceError};
use anexo_store::{attachment_file_key, attachment_prefix};

use super::{not_found, to_error, ApiError, AppState};
use crate::auth::Owner;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/attachments",
            get(list_attachments).post(create_attachment),
        )
        .route(
            "/api/attachments/{id}",
            get(get_attachment)
                .put(update_attachment)
                .delete(delete_attachment),
        )
        .route("/api/attachments/{id}/file", get(download_file))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    gde_type: Option<String>,
    document_type: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    search: Option<String>,
}

fn invalid(msg: String) -> ApiError {
    to_error(ServiceError::InvalidInput(msg))
}

fn parse_date(name: &str, raw: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(format!("{name} must be YYYY-MM-DD, got {s}"))),
    }
}

impl ListQuery {
    fn into_filter(self) -> Result<SubmissionFilter, ApiError> {
        let gde_type = match self.gde_type.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(s) => Some(
                GdeType::parse_str(s).ok_or_else(|| invalid(format!("unknown gdeType: {s}")))?,
            ),
        };
        let document_type = match self.document_type.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(s) => Some(
                DocumentType::parse_str(s)
                    .ok_or_else(|| invalid(format!("unknown documentType: {s}")))?,
            ),
        };
        Ok(SubmissionFilter {
            gde_type,
            document_type,
            start_date: parse_date("startDate", self.start_date)?,
            end_date: parse_date("endDate", self.end_date)?,
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Keep the attachments whose decoded payload matches, newest submission
/// first.
fn filter_attachments(attachments: Vec<Attachment>, filter: &SubmissionFilter) -> Vec<Attachment> {
    let mut matched: Vec<(Submission, Attachment)> = attachments
        .into_iter()
        .map(|a| (Submission::from_attachment(a.clone()), a))
        .filter(|(s, _)| filter.matches(s))
        .collect();
    matched.sort_by_key(|(s, _)| Reverse(s.submitted_at()));
    matched.into_iter().map(|(_, a)| a).collect()
}

async fn list_attachments(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = q.into_filter()?;
    let attachments = state
        .repository(&owner)
        .list_attachments()
        .await
        .map_err(to_error)?;
    let attachments = if filter.is_empty() {
        attachments
    } else {
        filter_attachments(attachments, &filter)
    };
    Ok(Json(json!(attachments)))
}

async fn create_attachment(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Json(data): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state
        .repository(&owner)
        .create_attachment(&data)
        .await
        .map(|a| (StatusCode::CREATED, Json(json!(a))))
        .map_err(to_error)
}

async fn get_attachment(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state
        .repository(&owner)
        .get_attachment(&id)
        .await
        .map_err(to_error)?
    {
        Some(a) => Ok(Json(json!(a))),
        None => Err(not_found("attachment", &id)),
    }
}

async fn update_attachment(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    match state
        .repository(&owner)
        .update_attachment(&id, &data)
        .await
        .map_err(to_error)?
    {
        Some(a) => Ok(Json(json!(a))),
        None => Err(not_found("attachment", &id)),
    }
}

async fn delete_attachment(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .repository(&owner)
        .delete_attachment(&id)
        .await
        .map_err(to_error)?
        .ok_or_else(|| not_found("attachment", &id))?;

    let prefix = attachment_prefix(owner.as_str(), &deleted.id);
    match state.store.delete_prefix(&prefix).await {
        Ok(0) => {}
        Ok(n) => tracing::debug!(id = %deleted.id, files = n, "removed stored files"),
        Err(e) => tracing::warn!(error = %e, id = %deleted.id, "could not remove stored files"),
    }
    Ok(Json(json!(deleted)))
}

async fn download_file(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let attachment = state
        .repository(&owner)
        .get_attachment(&id)
        .await
        .map_err(to_error)?
        .ok_or_else(|| not_found("attachment", &id))?;

    let submission = Submission::from_attachment(attachment);
    let Some(file_name) = submission.file_name().map(str::to_string) else {
        return Err(not_found("file for attachment", &id));
    };

    let key = attachment_file_key(owner.as_str(), &submission.id, &file_name);
    let data = match state.store.get_opt(&key).await {
        Ok(Some(data)) => data,
        Ok(None) => return Err(not_found("file for attachment", &id)),
        Err(e) => {
            return Err(to_error(ServiceError::Internal(format!("read file: {e}"))));
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        anexo_store::sanitize_file_name(&file_name).replace('"', "")
    );
    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(data))
        .map_err(|e| to_error(ServiceError::Internal(format!("build response: {e}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::test_helpers::test_router;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn raw_crud_and_not_found() {
        let app = test_router().await;

        let (status, created) = call(
            &app,
            "POST",
            "/api/attachments",
            Some(json!({"gdeType": "resumo", "documentType": "relatorio-estagio"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = call(&app, "GET", &format!("/api/attachments/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], id.as_str());

        let (status, updated) = call(
            &app,
            "PUT",
            &format!("/api/attachments/{id}"),
            Some(json!({"gdeType": "emissao"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(updated["data"].as_str().unwrap().contains("emissao"));

        let (status, _) = call(&app, "DELETE", &format!("/api/attachments/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", &format!("/api/attachments/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
        let (status, _) = call(&app, "DELETE", &format!("/api/attachments/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_query_is_validated_and_applied() {
        let app = test_router().await;
        for (doc, at) in [
            ("plano-estagio", "2024-01-10T12:00:00.000Z"),
            ("relatorio-estagio", "2024-02-10T12:00:00.000Z"),
        ] {
            call(
                &app,
                "POST",
                "/api/attachments",
                Some(json!({"gdeType": "resumo", "documentType": doc, "submittedAt": at})),
            )
            .await;
        }

        let (status, all) = call(&app, "GET", "/api/attachments", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, hits) = call(
            &app,
            "GET",
            "/api/attachments?startDate=2024-02-01&search=relat",
            None,
        )
        .await;
        let hits = hits.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0]["data"].as_str().unwrap().contains("relatorio-estagio"));

        let (status, _) = call(&app, "GET", "/api/attachments?gdeType=bogus", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, "GET", "/api/attachments?endDate=10/01/2024", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn file_download_and_removal() {
        let app = test_router().await;
        let input = anexo_core::FormInput::new("submissao", "relatorio-estagio");
        let req = anexo_service::SubmissionRequest::from_form(&input, Some(("r.pdf", &b"bytes"[..])));
        let (status, created) = call(
            &app,
            "POST",
            "/api/submissions",
            Some(serde_json::to_value(&req).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/attachments/{id}/file"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), b"bytes");

        call(&app, "DELETE", &format!("/api/attachments/{id}"), None).await;
        let (status, _) = call(&app, "GET", &format!("/api/attachments/{id}/file"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
