use anexo_core::{Attachment, FieldErrors};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::events::{EventCallback, EventKind, Subscription};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Persistence facade for attachment records.
///
/// Every implementation is scoped to a single owner. Lookups of records
/// that are missing or owned by someone else yield `None`.
/// `LocalService` goes straight to a `Database`.
/// `HttpService` talks to a running anexo-server.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create_attachment(&self, data: &Value) -> Result<Attachment, ServiceError>;
    async fn get_attachment(&self, id: &str) -> Result<Option<Attachment>, ServiceError>;
    /// Newest first.
    async fn list_attachments(&self) -> Result<Vec<Attachment>, ServiceError>;
    async fn update_attachment(
        &self,
        id: &str,
        data: &Value,
    ) -> Result<Option<Attachment>, ServiceError>;
    async fn delete_attachment(&self, id: &str) -> Result<Option<Attachment>, ServiceError>;
    /// Call `callback` for every `kind` change to this owner's records
    /// until the returned `Subscription` is cancelled or dropped.
    async fn subscribe(
        &self,
        kind: EventKind,
        callback: EventCallback,
    ) -> Result<Subscription, ServiceError>;
}

/// Serialize an attachment payload, which must be a JSON object.
pub(crate) fn encode_data(data: &Value) -> Result<String, ServiceError> {
    if !data.is_object() {
        return Err(ServiceError::InvalidInput(
            "attachment data must be a JSON object".into(),
        ));
    }
    serde_json::to_string(data).map_err(|e| ServiceError::Internal(format!("json encode: {e}")))
}
