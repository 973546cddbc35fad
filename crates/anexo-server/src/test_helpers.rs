use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use anexo_db::Database;
use anexo_service::EventHub;
use anexo_store::StoreConfig;

use crate::auth::AuthConfig;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::routes::{AppState, InnerAppState};

fn test_state(
    auth: Option<Arc<AuthConfig>>,
    db: Arc<dyn Database>,
    max_upload_bytes: usize,
) -> AppState {
    let store_config = StoreConfig::local(
        tempfile::tempdir()
            .unwrap()
            .keep()
            .to_string_lossy()
            .to_string(),
    );
    Arc::new(InnerAppState {
        db,
        store: anexo_store::create_store(&store_config),
        events: EventHub::default(),
        auth,
        max_upload_bytes,
    })
}

fn memory_db() -> Arc<dyn Database> {
    Arc::new(anexo_db::SqliteDatabase::open_in_memory().unwrap())
}

/// Build a test router with in-memory SQLite, temp local store, no auth.
pub async fn test_router() -> Router {
    crate::routes::build_router(test_state(None, memory_db(), DEFAULT_MAX_UPLOAD_BYTES))
}

/// Like `test_router`, accepting files up to `max_upload_bytes`.
pub async fn test_router_with_upload_limit(max_upload_bytes: usize) -> Router {
    crate::routes::build_router(test_state(None, memory_db(), max_upload_bytes))
}

/// Build a test router with auth enabled, returning (router, api_key).
/// The key acts for owner `ana`.
pub async fn test_router_with_auth() -> (Router, String) {
    let db = memory_db();
    let api_key = crate::auth::generate_api_key();
    let auth = Arc::new(AuthConfig {
        env_key_hash: Some(crate::auth::sha256_hex(&api_key)),
        env_owner: "ana".into(),
        db: db.clone(),
    });
    let router = crate::routes::build_router(test_state(Some(auth), db, DEFAULT_MAX_UPLOAD_BYTES));
    (router, api_key)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

async fn spawn(app: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    spawn(test_router().await).await
}

/// Like `spawn_test_server`, with auth enabled. Returns the key too.
pub async fn spawn_test_server_with_auth() -> (TestServer, String) {
    let (app, key) = test_router_with_auth().await;
    (spawn(app).await, key)
}
