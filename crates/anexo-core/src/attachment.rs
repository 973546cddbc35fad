use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single persisted record. `data` is the JSON-encoded payload and
/// is opaque to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub owner: String,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    pub owner: String,
    pub data: String,
}
