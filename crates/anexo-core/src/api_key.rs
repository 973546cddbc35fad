use serde::Serialize;

/// A bearer key. Only the SHA-256 of the raw key is stored; the owner is
/// the identity every request made with it acts as.
#[derive(Debug, Clone, Serialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub key_hash: String,
    pub created_at: String,
    pub last_used_at: Option<String>,
}
