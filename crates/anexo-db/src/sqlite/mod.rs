pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use anexo_core::api_key::ApiKey;
use anexo_core::attachment::{Attachment, CreateAttachment};

use crate::{Database, DbConfig, DbError};

/// Converts `rusqlite::Result<T>` into `Result<T, DbError>` so query code
/// can use `.to_db()?`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("anexo.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).to_db()?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .to_db()?;
        tracing::debug!(path = %path.display(), "opened sqlite database");
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().to_db()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").to_db()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(migrations::run)
    }

    async fn blocking<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&SqliteDatabase) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[async_trait]
impl Database for SqliteDatabase {
    // -- Attachments --
    async fn create_attachment(&self, input: &CreateAttachment) -> Result<Attachment, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_attachment_sync(&input))
            .await
    }
    async fn get_attachment(&self, owner: &str, id: &str) -> Result<Attachment, DbError> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.blocking(move |db| db.get_attachment_sync(&owner, &id))
            .await
    }
    async fn list_attachments(&self, owner: &str) -> Result<Vec<Attachment>, DbError> {
        let owner = owner.to_string();
        self.blocking(move |db| db.list_attachments_sync(&owner))
            .await
    }
    async fn update_attachment(
        &self,
        owner: &str,
        id: &str,
        data: &str,
    ) -> Result<Attachment, DbError> {
        let owner = owner.to_string();
        let id = id.to_string();
        let data = data.to_string();
        self.blocking(move |db| db.update_attachment_sync(&owner, &id, &data))
            .await
    }
    async fn delete_attachment(&self, owner: &str, id: &str) -> Result<Attachment, DbError> {
        let owner = owner.to_string();
        let id = id.to_string();
        self.blocking(move |db| db.delete_attachment_sync(&owner, &id))
            .await
    }

    // -- API Keys --
    async fn insert_api_key(
        &self,
        name: &str,
        owner: &str,
        key_hash: &str,
    ) -> Result<ApiKey, DbError> {
        let name = name.to_string();
        let owner = owner.to_string();
        let key_hash = key_hash.to_string();
        self.blocking(move |db| db.insert_api_key_sync(&name, &owner, &key_hash))
            .await
    }
    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DbError> {
        let key_hash = key_hash.to_string();
        self.blocking(move |db| db.find_api_key_by_hash_sync(&key_hash))
            .await
    }
    async fn touch_api_key(&self, id: &str) -> Result<(), DbError> {
        let id = id.to_string();
        self.blocking(move |db| db.touch_api_key_sync(&id)).await
    }
    async fn has_api_keys(&self) -> Result<bool, DbError> {
        self.blocking(|db| db.has_api_keys_sync()).await
    }
    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, DbError> {
        self.blocking(|db| db.list_api_keys_sync()).await
    }
    async fn delete_api_key(&self, id: &str) -> Result<(), DbError> {
        let id = id.to_string();
        self.blocking(move |db| db.delete_api_key_sync(&id)).await
    }
}
