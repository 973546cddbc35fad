use sqlx::PgPool;

use crate::DbError;

/// Fixed key for the advisory lock that serialises migration runs across
/// concurrent connections ("anexo" in hex).
const MIGRATION_LOCK_KEY: i64 = 0x616E_6578_6F;

pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    let result = run_inner(pool).await;

    // Released even when a migration failed.
    let _ = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(pool)
        .await;

    result
}

async fn run_inner(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Internal(e.to_string()))?;

    let current: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?;

    if current < 1 {
        sqlx::raw_sql(include_str!("sql/V1__initial.sql"))
            .execute(pool)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?;
    }

    Ok(())
}
