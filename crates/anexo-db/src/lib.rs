#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use anexo_core::api_key::ApiKey;
use anexo_core::attachment::{Attachment, CreateAttachment};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence for attachments and API keys.
///
/// Attachment reads and writes take the owner explicitly; a record that
/// belongs to someone else behaves exactly like a missing one.
#[async_trait]
pub trait Database: Send + Sync {
    // -- Attachments --
    async fn create_attachment(&self, input: &CreateAttachment) -> Result<Attachment, DbError>;
    async fn get_attachment(&self, owner: &str, id: &str) -> Result<Attachment, DbError>;
    /// Newest first.
    async fn list_attachments(&self, owner: &str) -> Result<Vec<Attachment>, DbError>;
    async fn update_attachment(
        &self,
        owner: &str,
        id: &str,
        data: &str,
    ) -> Result<Attachment, DbError>;
    async fn delete_attachment(&self, owner: &str, id: &str) -> Result<Attachment, DbError>;

    // -- API Keys --
    async fn insert_api_key(
        &self,
        name: &str,
        owner: &str,
        key_hash: &str,
    ) -> Result<ApiKey, DbError>;
    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DbError>;
    async fn touch_api_key(&self, id: &str) -> Result<(), DbError>;
    async fn has_api_keys(&self) -> Result<bool, DbError>;
    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, DbError>;
    async fn delete_api_key(&self, id: &str) -> Result<(), DbError>;
}

#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// SQLite file; defaults to `<data_dir>/anexo.db`.
    pub sqlite_path: Option<String>,
    /// Postgres URL. Takes precedence over SQLite when set.
    pub database_url: Option<String>,
}

/// `$ANEXO_DATA_DIR`, else `$XDG_DATA_HOME/anexo`, else `~/.local/share/anexo`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ANEXO_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("anexo")
}

/// Open the backend selected by `config`.
pub async fn open_database(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            tracing::info!("using postgres backend");
            let db = postgres::PostgresDatabase::connect(url).await?;
            return Ok(Arc::new(db));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            return Err(DbError::Internal(
                "database url given but the postgres feature is not enabled".into(),
            ));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        let db = SqliteDatabase::open(config)?;
        Ok(Arc::new(db))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal("no database backend enabled".into()))
    }
}
