use std::sync::Arc;

use anexo_core::attachment::CreateAttachment;
use anexo_core::Attachment;
use anexo_db::{Database, DbError};
use async_trait::async_trait;
use serde_json::Value;

use crate::events::{AttachmentEvent, EventCallback, EventHub, EventKind, Subscription};
use crate::traits::encode_data;
use crate::{AttachmentRepository, ServiceError};

/// Database-backed repository acting on behalf of one owner.
///
/// Successful writes are published on the shared `EventHub`.
#[derive(Clone)]
pub struct LocalService {
    db: Arc<dyn Database>,
    owner: String,
    events: EventHub,
}

impl LocalService {
    pub fn new(db: Arc<dyn Database>, owner: impl Into<String>, events: EventHub) -> Self {
        Self {
            db,
            owner: owner.into(),
            events,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    fn publish(&self, kind: EventKind, attachment: &Attachment) {
        self.events.publish(AttachmentEvent {
            kind,
            attachment: attachment.clone(),
        });
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Fold a not-found lookup into `None`.
fn found<T>(result: Result<T, DbError>) -> Result<Option<T>, ServiceError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DbError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl AttachmentRepository for LocalService {
    async fn create_attachment(&self, data: &Value) -> Result<Attachment, ServiceError> {
        let input = CreateAttachment {
            owner: self.owner.clone(),
            data: encode_data(data)?,
        };
        let attachment = self.db.create_attachment(&input).await?;
        tracing::info!(id = %attachment.id, owner = %self.owner, "attachment created");
        self.publish(EventKind::Created, &attachment);
        Ok(attachment)
    }

    async fn get_attachment(&self, id: &str) -> Result<Option<Attachment>, ServiceError> {
        found(self.db.get_attachment(&self.owner, id).await)
    }

    async fn list_attachments(&self) -> Result<Vec<Attachment>, ServiceError> {
        Ok(self.db.list_attachments(&self.owner).await?)
    }

    async fn update_attachment(
        &self,
        id: &str,
        data: &Value,
    ) -> Result<Option<Attachment>, ServiceError> {
        let data = encode_data(data)?;
        let updated = found(self.db.update_attachment(&self.owner, id, &data).await)?;
        if let Some(attachment) = &updated {
            tracing::info!(id, owner = %self.owner, "attachment updated");
            self.publish(EventKind::Updated, attachment);
        }
        Ok(updated)
    }

    async fn delete_attachment(&self, id: &str) -> Result<Option<Attachment>, ServiceError> {
        let deleted = found(self.db.delete_attachment(&self.owner, id).await)?;
        if let Some(attachment) = &deleted {
            tracing::info!(id, owner = %self.owner, "attachment deleted");
            self.publish(EventKind::Deleted, attachment);
        }
        Ok(deleted)
    }

    async fn subscribe(
        &self,
        kind: EventKind,
        callback: EventCallback,
    ) -> Result<Subscription, ServiceError> {
        Ok(self.events.subscribe(kind, self.owner.clone(), callback))
    }
}
