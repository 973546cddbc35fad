pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use anexo_core::api_key::ApiKey;
use anexo_core::attachment::{Attachment, CreateAttachment};

use crate::{Database, DbError};

pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    DbError::Internal(e.to_string())
}

pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect and bring the schema up to date.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    // -- Attachments --
    async fn create_attachment(&self, input: &CreateAttachment) -> Result<Attachment, DbError> {
        self.pg_create_attachment(input).await
    }
    async fn get_attachment(&self, owner: &str, id: &str) -> Result<Attachment, DbError> {
        self.pg_get_attachment(owner, id).await
    }
    async fn list_attachments(&self, owner: &str) -> Result<Vec<Attachment>, DbError> {
        self.pg_list_attachments(owner).await
    }
    async fn update_attachment(
        &self,
        owner: &str,
        id: &str,
        data: &str,
    ) -> Result<Attachment, DbError> {
        self.pg_update_attachment(owner, id, data).await
    }
    async fn delete_attachment(&self, owner: &str, id: &str) -> Result<Attachment, DbError> {
        self.pg_delete_attachment(owner, id).await
    }

    // -- API Keys --
    async fn insert_api_key(
        &self,
        name: &str,
        owner: &str,
        key_hash: &str,
    ) -> Result<ApiKey, DbError> {
        self.pg_insert_api_key(name, owner, key_hash).await
    }
    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DbError> {
        self.pg_find_api_key_by_hash(key_hash).await
    }
    async fn touch_api_key(&self, id: &str) -> Result<(), DbError> {
        self.pg_touch_api_key(id).await
    }
    async fn has_api_keys(&self) -> Result<bool, DbError> {
        self.pg_has_api_keys().await
    }
    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, DbError> {
        self.pg_list_api_keys().await
    }
    async fn delete_api_key(&self, id: &str) -> Result<(), DbError> {
        self.pg_delete_api_key(id).await
    }
}
