use chrono::{DateTime, Utc};

use anexo_core::attachment::{Attachment, CreateAttachment};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: String,
    owner: String,
    data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AttachmentRow> for Attachment {
    fn from(r: AttachmentRow) -> Self {
        Attachment {
            id: r.id,
            owner: r.owner,
            data: r.data,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_attachment(
        &self,
        input: &CreateAttachment,
    ) -> Result<Attachment, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, AttachmentRow>(
            "INSERT INTO attachments (id, owner, data, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING *",
        )
        .bind(&id)
        .bind(&input.owner)
        .bind(&input.data)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(row.into())
    }

    pub(crate) async fn pg_list_attachments(&self, owner: &str) -> Result<Vec<Attachment>, DbError> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            "SELECT * FROM attachments WHERE owner = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub(crate) async fn pg_get_attachment(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "SELECT * FROM attachments WHERE id = $1 AND owner = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_update_attachment(
        &self,
        owner: &str,
        id: &str,
        data: &str,
    ) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "UPDATE attachments SET data = $1, updated_at = $2
             WHERE id = $3 AND owner = $4
             RETURNING *",
        )
        .bind(data)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_delete_attachment(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "DELETE FROM attachments WHERE id = $1 AND owner = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?
        .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        Ok(row.into())
    }
}
