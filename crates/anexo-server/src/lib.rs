pub mod auth;
pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

use anexo_db::Database;
use anexo_service::EventHub;
use anexo_store::ObjectStore;

use auth::AuthConfig;

pub use routes::{build_router, AppState, InnerAppState};

pub async fn serve(
    listener: TcpListener,
    db: Arc<dyn Database>,
    store: Arc<dyn ObjectStore>,
    auth: Option<Arc<AuthConfig>>,
    max_upload_bytes: usize,
) -> Result<()> {
    let state = Arc::new(InnerAppState {
        db,
        store,
        events: EventHub::default(),
        auth,
        max_upload_bytes,
    });
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
