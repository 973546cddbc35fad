use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use anexo_service::{EventKind, ServiceError};

use super::{to_error, ApiError, AppState};
use crate::auth::Owner;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/attachments/events", get(attachment_events))
}

#[derive(Debug, Default, Deserialize)]
struct EventsQuery {
    kind: Option<String>,
}

/// Server-sent change feed of the owner's attachments. `kind` narrows it
/// to created, updated or deleted; without it every change is sent. The
/// SSE event name is the change kind and the data is the attachment.
async fn attachment_events(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Query(q): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let kind = match q.kind.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(s) => Some(EventKind::parse_str(s).ok_or_else(|| {
            to_error(ServiceError::InvalidInput(format!("unknown event kind: {s}")))
        })?),
    };

    // Registered before the response is sent, so nothing written after
    // the client sees the 200 is missed.
    let mut rx = state.events.receiver();
    let owner = owner.0;
    tracing::debug!(%owner, kind = kind.map(|k| k.as_str()), "event stream opened");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if event.attachment.owner != owner || kind.is_some_and(|k| k != event.kind) {
                        continue;
                    }
                    match Event::default().event(event.kind.as_str()).json_data(&event.attachment) {
                        Ok(frame) => yield Ok::<_, Infallible>(frame),
                        Err(e) => tracing::warn!(id = %event.attachment.id, "encode event: {e}"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%owner, skipped, "event stream lagged, events dropped");
                    yield Ok(Event::default().comment(format!("dropped {skipped} events")));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures::StreamExt;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_helpers::test_router;

    #[tokio::test]
    async fn unknown_kind_is_rejected() {
        let app = test_router().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/attachments/events?kind=renamed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn created_record_arrives_on_the_stream() {
        let app = test_router().await;
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/attachments/events?kind=created")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/event-stream");

        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/attachments")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({"gdeType": "resumo"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

        let mut body = resp.into_body().into_data_stream();
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(text.starts_with("event: created\n"), "{text}");
        assert!(text.contains("\"owner\":\"local\""));
    }
}
