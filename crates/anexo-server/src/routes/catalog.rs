use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use anexo_core::rules::{rules_for, FILE_FIELD};
use anexo_core::{DocumentType, GdeType};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/catalog", get(catalog))
}

/// Everything a client needs to render the submission form.
pub fn catalog_json() -> Value {
    let gde_types: Vec<Value> = GdeType::ALL
        .iter()
        .map(|g| json!({ "value": g.as_str(), "label": g.display_name() }))
        .collect();
    let document_types: Vec<Value> = DocumentType::ALL
        .iter()
        .map(|d| {
            let rules = rules_for(*d);
            json!({
                "value": d.as_str(),
                "label": d.label(),
                "fields": rules.map(|r| r.fields).unwrap_or_default(),
                "conditional": rules.map(|r| r.conditional).unwrap_or_default(),
            })
        })
        .collect();
    json!({
        "gdeTypes": gde_types,
        "documentTypes": document_types,
        "fileField": FILE_FIELD,
    })
}

async fn catalog() -> Json<Value> {
    Json(catalog_json())
}
