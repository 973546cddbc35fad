use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use anexo_core::attachment::{Attachment, CreateAttachment};

use super::super::{SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_attachment(row: &Row) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get("id")?,
        owner: row.get("owner")?,
        data: row.get("data")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn not_found(id: &str) -> DbError {
    DbError::NotFound(format!("attachment {id}"))
}

impl SqliteDatabase {
    pub fn create_attachment_sync(&self, input: &CreateAttachment) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let now = Utc::now();
            conn.execute(
                "INSERT INTO attachments (id, owner, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id, input.owner, input.data, now],
            )
            .to_db()?;
            conn.query_row(
                "SELECT * FROM attachments WHERE id = ?1",
                params![id],
                row_to_attachment,
            )
            .to_db()
        })
    }

    pub fn list_attachments_sync(&self, owner: &str) -> Result<Vec<Attachment>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM attachments WHERE owner = ?1
                     ORDER BY created_at DESC, rowid DESC",
                )
                .to_db()?;
            let attachments = stmt
                .query_map(params![owner], row_to_attachment)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(attachments)
        })
    }

    pub fn get_attachment_sync(&self, owner: &str, id: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM attachments WHERE id = ?1 AND owner = ?2",
                params![id, owner],
                row_to_attachment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => not_found(id),
                other => DbError::Internal(other.to_string()),
            })
        })
    }

    pub fn update_attachment_sync(
        &self,
        owner: &str,
        id: &str,
        data: &str,
    ) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE attachments SET data = ?1, updated_at = ?2
                     WHERE id = ?3 AND owner = ?4",
                    params![data, Utc::now(), id, owner],
                )
                .to_db()?;
            if changed == 0 {
                return Err(not_found(id));
            }
            conn.query_row(
                "SELECT * FROM attachments WHERE id = ?1",
                params![id],
                row_to_attachment,
            )
            .to_db()
        })
    }

    pub fn delete_attachment_sync(&self, owner: &str, id: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let attachment = conn
                .query_row(
                    "SELECT * FROM attachments WHERE id = ?1 AND owner = ?2",
                    params![id, owner],
                    row_to_attachment,
                )
                .optional()
                .to_db()?
                .ok_or_else(|| not_found(id))?;
            conn.execute("DELETE FROM attachments WHERE id = ?1", params![id])
                .to_db()?;
            Ok(attachment)
        })
    }
}
