use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use anexo_db::Database;

use crate::routes::AppState;

/// Owner used for every request when authentication is disabled.
pub const LOCAL_OWNER: &str = "local";

/// Prefix of generated API keys.
pub const KEY_PREFIX: &str = "ax_";

/// The identity a request acts for. Inserted into request extensions by
/// `auth_middleware`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authentication configuration.
pub struct AuthConfig {
    /// SHA-256 hash of the `ANEXO_API_KEY` env var (if set).
    pub env_key_hash: Option<String>,
    /// Owner the env key acts for.
    pub env_owner: String,
    /// Database handle for DB-backed API keys.
    pub db: Arc<dyn Database>,
}

impl AuthConfig {
    /// Resolve a raw bearer token to its owner.
    pub async fn resolve(&self, token: &str) -> Option<Owner> {
        let token_hash = sha256_hex(token);

        if let Some(ref env_hash) = self.env_key_hash {
            if constant_time_eq(&token_hash, env_hash) {
                return Some(Owner(self.env_owner.clone()));
            }
        }

        match self.db.find_api_key_by_hash(&token_hash).await {
            Ok(Some(api_key)) => {
                // Fire-and-forget: update last_used_at
                let db = self.db.clone();
                let key_id = api_key.id.clone();
                tokio::spawn(async move {
                    if let Err(e) = db.touch_api_key(&key_id).await {
                        tracing::debug!(error = %e, "failed to touch api key");
                    }
                });
                Some(Owner(api_key.owner))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "api key lookup failed");
                None
            }
        }
    }
}

/// SHA-256 hash a raw key, returning the hex-encoded digest.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate a new API key: `ax_` + 43 chars of base62-encoded random bytes.
pub fn generate_api_key() -> String {
    use rand::Rng;
    const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let random_part: String = (0..43)
        .map(|_| {
            let idx = rng.gen_range(0..BASE62.len());
            BASE62[idx] as char
        })
        .collect();
    format!("{KEY_PREFIX}{random_part}")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "not signed in: missing or invalid API key" })),
    )
        .into_response()
}

/// Axum middleware that resolves the request owner.
///
/// If `auth` is `None` in the AppState, every request acts for
/// `LOCAL_OWNER`. Otherwise a valid `Authorization: Bearer <token>`
/// header is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = match &state.auth {
        Some(auth) => auth,
        None => {
            request
                .extensions_mut()
                .insert(Owner(LOCAL_OWNER.to_string()));
            return next.run(request).await;
        }
    };

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let Some(token) = token else {
        return unauthorized();
    };

    match auth.resolve(&token).await {
        Some(owner) => {
            request.extensions_mut().insert(owner);
            next.run(request).await
        }
        None => unauthorized(),
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Build auth config from an explicit env key and owner.
///
/// Returns `None` (open access) when no env key is given and the
/// database holds no keys.
pub async fn build_auth_config(
    db: Arc<dyn Database>,
    env_key: Option<&str>,
    env_owner: &str,
) -> Option<Arc<AuthConfig>> {
    let env_key_hash = env_key.filter(|k| !k.is_empty()).map(sha256_hex);

    let has_db_keys = match db.has_api_keys().await {
        Ok(has) => has,
        Err(e) => {
            tracing::warn!(error = %e, "could not count api keys");
            false
        }
    };

    if env_key_hash.is_none() && !has_db_keys {
        return None;
    }

    Some(Arc::new(AuthConfig {
        env_key_hash,
        env_owner: env_owner.to_string(),
        db,
    }))
}
