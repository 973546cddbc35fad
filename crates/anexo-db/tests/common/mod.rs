// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

#![allow(dead_code)]

use std::time::Duration;

use anexo_core::attachment::CreateAttachment;
use anexo_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_attachment(owner: &str, data: &str) -> CreateAttachment {
    CreateAttachment {
        owner: owner.to_string(),
        data: data.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Attachment tests
// ---------------------------------------------------------------------------

/// Create, get, update, list and delete a single attachment.
pub async fn test_attachment_crud(db: &dyn Database) {
    let payload = r#"{"gdeType":"emissao","documentType":"protocolo-estagio","empresaEstagio":"bosch"}"#;
    let a = db
        .create_attachment(&make_attachment("ana", payload))
        .await
        .unwrap();
    assert_eq!(a.owner, "ana");
    assert_eq!(a.data, payload);
    assert!(!a.id.is_empty());

    let fetched = db.get_attachment("ana", &a.id).await.unwrap();
    assert_eq!(fetched.id, a.id);
    assert_eq!(fetched.data, payload);

    let updated = db
        .update_attachment("ana", &a.id, r#"{"gdeType":"resumo"}"#)
        .await
        .unwrap();
    assert_eq!(updated.id, a.id);
    assert_eq!(updated.data, r#"{"gdeType":"resumo"}"#);
    assert!(updated.updated_at >= a.updated_at);

    let all = db.list_attachments("ana").await.unwrap();
    assert_eq!(all.len(), 1);

    let deleted = db.delete_attachment("ana", &a.id).await.unwrap();
    assert_eq!(deleted.id, a.id);
    assert!(db.list_attachments("ana").await.unwrap().is_empty());

    assert!(matches!(
        db.get_attachment("ana", &a.id).await,
        Err(DbError::NotFound(_))
    ));
}

/// Records are invisible to other owners.
pub async fn test_owner_scoping(db: &dyn Database) {
    let a = db
        .create_attachment(&make_attachment("ana", "{}"))
        .await
        .unwrap();
    db.create_attachment(&make_attachment("rui", "{}"))
        .await
        .unwrap();

    assert_eq!(db.list_attachments("ana").await.unwrap().len(), 1);
    assert_eq!(db.list_attachments("rui").await.unwrap().len(), 1);
    assert!(db.list_attachments("eva").await.unwrap().is_empty());

    assert!(matches!(
        db.get_attachment("rui", &a.id).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.update_attachment("rui", &a.id, "{}").await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.delete_attachment("rui", &a.id).await,
        Err(DbError::NotFound(_))
    ));
    // still there for its owner
    db.get_attachment("ana", &a.id).await.unwrap();
}

/// Listing returns the newest record first.
pub async fn test_list_newest_first(db: &dyn Database) {
    let mut ids = Vec::new();
    for i in 0..3 {
        let a = db
            .create_attachment(&make_attachment("ana", &format!("{{\"n\":{i}}}")))
            .await
            .unwrap();
        ids.push(a.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    ids.reverse();

    let listed: Vec<String> = db
        .list_attachments("ana")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(listed, ids);
}

/// Missing ids are reported as NotFound, not as internal errors.
pub async fn test_missing_attachment(db: &dyn Database) {
    assert!(matches!(
        db.get_attachment("ana", "no-such-id").await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.update_attachment("ana", "no-such-id", "{}").await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.delete_attachment("ana", "no-such-id").await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// API key tests
// ---------------------------------------------------------------------------

/// Insert, look up by hash, touch, list and delete keys.
pub async fn test_api_key_lifecycle(db: &dyn Database) {
    assert!(!db.has_api_keys().await.unwrap());

    let key = db.insert_api_key("laptop", "ana", "hash-1").await.unwrap();
    assert_eq!(key.name, "laptop");
    assert_eq!(key.owner, "ana");
    assert!(key.last_used_at.is_none());
    assert!(db.has_api_keys().await.unwrap());

    let found = db.find_api_key_by_hash("hash-1").await.unwrap().unwrap();
    assert_eq!(found.id, key.id);
    assert!(db.find_api_key_by_hash("hash-2").await.unwrap().is_none());

    db.touch_api_key(&key.id).await.unwrap();
    let touched = db.find_api_key_by_hash("hash-1").await.unwrap().unwrap();
    assert!(touched.last_used_at.is_some());

    db.insert_api_key("phone", "rui", "hash-2").await.unwrap();
    assert_eq!(db.list_api_keys().await.unwrap().len(), 2);

    db.delete_api_key(&key.id).await.unwrap();
    assert_eq!(db.list_api_keys().await.unwrap().len(), 1);
    assert!(matches!(
        db.delete_api_key(&key.id).await,
        Err(DbError::NotFound(_))
    ));
}
