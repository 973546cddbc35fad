use anexo_core::{Attachment, FieldErrors, SubmissionFilter};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::events::{EventCallback, EventKind, Subscription};
use crate::request::SubmissionRequest;
use crate::sse::SseDecoder;
use crate::{AttachmentRepository, ServiceError};

/// Async HTTP client implementation of `AttachmentRepository`.
/// Connects to a running anexo-server; the server decides the owner
/// from the API key.
pub struct HttpService {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            api_key: None,
        }
    }

    pub fn with_api_key(base_url: &str, key: String) -> Self {
        let mut svc = Self::new(base_url);
        svc.api_key = Some(key);
        svc
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        self.with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))
    }

    /// Check if the server is reachable.
    /// Health endpoint is NOT authenticated.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let resp = self
            .send(self.client.get(format!("{}{path}", self.base_url)))
            .await?;
        handle_response(resp).await
    }

    /// Send and decode, mapping a 404 to `None`.
    async fn json_or_none<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, ServiceError> {
        let resp = self.send(builder).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(resp).await.map(Some)
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        let resp = self.send(builder).await?;
        handle_response(resp).await
    }

    /// The owner the configured key acts for.
    pub async fn session(&self) -> Result<String, ServiceError> {
        let val: Value = self.get_json("/api/session").await?;
        val["owner"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ServiceError::Internal("missing owner in response".into()))
    }

    /// Submit raw form state; the server validates, stores the file and
    /// persists the payload. Field failures come back as
    /// `ServiceError::Validation`.
    pub async fn submit_form(&self, request: &SubmissionRequest) -> Result<Attachment, ServiceError> {
        self.post_json("/api/submissions", request).await
    }

    /// Attachments filtered server-side.
    pub async fn list_filtered(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Attachment>, ServiceError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(gde) = filter.gde_type {
            params.push(("gdeType", gde.as_str().to_string()));
        }
        if let Some(doc) = filter.document_type {
            params.push(("documentType", doc.as_str().to_string()));
        }
        if let Some(start) = filter.start_date {
            params.push(("startDate", start.to_string()));
        }
        if let Some(end) = filter.end_date {
            params.push(("endDate", end.to_string()));
        }
        if let Some(search) = &filter.search {
            params.push(("search", search.clone()));
        }
        let builder = self
            .client
            .get(format!("{}/api/attachments", self.base_url))
            .query(&params);
        let resp = self.send(builder).await?;
        handle_response(resp).await
    }

    /// Bytes of the file stored with a submission, if any.
    pub async fn file_bytes(&self, id: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        let builder = self
            .client
            .get(format!("{}/api/attachments/{id}/file", self.base_url));
        let resp = self.send(builder).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::Network(format!("read body: {e}")))?;
        Ok(Some(bytes.to_vec()))
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<Value>(&body).ok();
    let msg = parsed
        .as_ref()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST => ServiceError::InvalidInput(msg),
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(msg),
        StatusCode::PAYLOAD_TOO_LARGE => ServiceError::InvalidInput(msg),
        StatusCode::UNPROCESSABLE_ENTITY => {
            let fields = parsed
                .and_then(|mut v| v.get_mut("fields").map(Value::take))
                .and_then(|v| serde_json::from_value::<FieldErrors>(v).ok());
            match fields {
                Some(fields) => ServiceError::Validation(fields),
                None => ServiceError::InvalidInput(msg),
            }
        }
        _ => ServiceError::Internal(msg),
    }
}

#[async_trait]
impl AttachmentRepository for HttpService {
    async fn create_attachment(&self, data: &Value) -> Result<Attachment, ServiceError> {
        self.post_json("/api/attachments", data).await
    }

    async fn get_attachment(&self, id: &str) -> Result<Option<Attachment>, ServiceError> {
        let builder = self
            .client
            .get(format!("{}/api/attachments/{id}", self.base_url));
        self.json_or_none(builder).await
    }

    async fn list_attachments(&self) -> Result<Vec<Attachment>, ServiceError> {
        self.get_json("/api/attachments").await
    }

    async fn update_attachment(
        &self,
        id: &str,
        data: &Value,
    ) -> Result<Option<Attachment>, ServiceError> {
        let builder = self
            .client
            .put(format!("{}/api/attachments/{id}", self.base_url))
            .json(data);
        self.json_or_none(builder).await
    }

    async fn delete_attachment(&self, id: &str) -> Result<Option<Attachment>, ServiceError> {
        let builder = self
            .client
            .delete(format!("{}/api/attachments/{id}", self.base_url));
        self.json_or_none(builder).await
    }

    /// Opens the server's event stream; events are read on a spawned task
    /// until the subscription is dropped or the server closes the stream.
    async fn subscribe(
        &self,
        kind: EventKind,
        mut callback: EventCallback,
    ) -> Result<Subscription, ServiceError> {
        let builder = self
            .client
            .get(format!("{}/api/attachments/events", self.base_url))
            .query(&[("kind", kind.as_str())])
            .header("Accept", "text/event-stream");
        let mut resp = self.send(builder).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }

        let handle = tokio::spawn(async move {
            let mut decoder = SseDecoder::default();
            loop {
                match resp.chunk().await {
                    Ok(Some(chunk)) => {
                        for frame in decoder.push(&chunk) {
                            if frame.event != kind.as_str() {
                                continue;
                            }
                            match serde_json::from_str::<Attachment>(&frame.data) {
                                Ok(attachment) => callback(attachment),
                                Err(e) => tracing::warn!("bad event payload: {e}"),
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(kind = kind.as_str(), "event stream closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(kind = kind.as_str(), "event stream failed: {e}");
                        break;
                    }
                }
            }
        });
        Ok(Subscription::from_handle(handle))
    }
}
