use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};

use super::AppState;
use crate::auth::Owner;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/api/session", get(session))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn session(Extension(owner): Extension<Owner>) -> Json<Value> {
    Json(json!({ "owner": owner.0 }))
}
