use rusqlite::Connection;

use super::SqliteResultExt;
use crate::DbError;

pub(crate) const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .to_db()?;

    if current_version < 1 {
        // v1: attachments with an opaque JSON payload, owner-scoped api keys
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS attachments (
                 id          TEXT PRIMARY KEY,
                 owner       TEXT NOT NULL,
                 data        TEXT NOT NULL DEFAULT '{}',
                 created_at  TEXT NOT NULL,
                 updated_at  TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_attachments_owner
                 ON attachments(owner, created_at);

             CREATE TABLE IF NOT EXISTS api_keys (
                 id           TEXT PRIMARY KEY,
                 name         TEXT NOT NULL,
                 key_hash     TEXT NOT NULL UNIQUE,
                 owner        TEXT NOT NULL,
                 created_at   TEXT NOT NULL,
                 last_used_at TEXT
             );",
        )
        .to_db()?;

        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
            [],
        )
        .to_db()?;
    }

    Ok(())
}
