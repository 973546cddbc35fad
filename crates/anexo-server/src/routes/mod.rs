pub mod attachments;
pub mod catalog;
pub mod events;
pub mod health;
pub mod submissions;

use std::sync::Arc;

use axum::{http::StatusCode, middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use anexo_db::Database;
use anexo_service::{EventHub, LocalService, ServiceError};
use anexo_store::ObjectStore;

use crate::auth::{auth_middleware, AuthConfig, Owner};

pub struct InnerAppState {
    pub db: Arc<dyn Database>,
    pub store: Arc<dyn ObjectStore>,
    pub events: EventHub,
    pub auth: Option<Arc<AuthConfig>>,
    /// Largest accepted file, in bytes, before base64 encoding.
    pub max_upload_bytes: usize,
}

impl InnerAppState {
    /// Repository acting for the request's owner.
    pub fn repository(&self, owner: &Owner) -> LocalService {
        LocalService::new(self.db.clone(), owner.as_str(), self.events.clone())
    }
}

pub type AppState = Arc<InnerAppState>;

pub type ApiError = (StatusCode, Json<Value>);

pub fn build_router(state: AppState) -> Router {
    let public = Router::new().merge(health::routes());

    let protected = Router::new()
        .merge(health::protected_routes())
        .merge(catalog::routes())
        .merge(submissions::routes(state.max_upload_bytes))
        .merge(events::routes())
        .merge(attachments::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn to_error(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Validation(errors) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string(), "fields": errors })),
            );
        }
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Network(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    }
    (status, Json(json!({ "error": e.to_string() })))
}

pub(crate) fn not_found(what: &str, id: &str) -> ApiError {
    to_error(ServiceError::NotFound(format!("{what} {id}")))
}
