//! HTTP client for the upstream feature API.
//!
//! Every call carries the configured basic-auth credentials and a bounded
//! timeout. Non-2xx answers surface as [`UpstreamError::Status`] with the raw
//! body, transport failures as [`UpstreamError::Transport`]. Nothing is
//! retried.

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};
use crate::types::{FeatureDraft, UploadMeta};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Decoded upstream response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Body declared as JSON.
    Json(Value),
    /// Anything else; the call still succeeded.
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    /// JSON form handed back to gateway callers. Text bodies become
    /// `{"status": "success", "response": <text>}`.
    pub fn into_json(self) -> Value {
        match self {
            Payload::Json(v) => v,
            Payload::Text(text) => serde_json::json!({
                "status": "success",
                "response": text,
            }),
        }
    }
}

/// Client for the upstream feature service.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub fn default_layer_id(&self) -> u64 {
        self.config.default_layer_id
    }

    /// Issues one authenticated call against `path` (relative to the base URL).
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> UpstreamResult<Payload> {
        let url = self.config.url(path);
        let mut req = self.authed(method.clone(), &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        self.dispatch(&method, path, req).await
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        req: RequestBuilder,
    ) -> UpstreamResult<Payload> {
        info!(%method, path, "sending upstream request");
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%method, path, error = %e, timeout = e.is_timeout(), "upstream transport failure");
                return Err(UpstreamError::Transport(e.to_string()));
            }
        };
        read_payload(method, path, resp).await
    }

    fn authed(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    // ── Features ──

    pub async fn list_features(
        &self,
        layer_id: u64,
        query: &[(String, String)],
    ) -> UpstreamResult<Payload> {
        self.call(
            Method::GET,
            &format!("/resource/{layer_id}/feature/"),
            None,
            query,
        )
        .await
    }

    pub async fn get_feature(&self, layer_id: u64, feature_id: i64) -> UpstreamResult<Payload> {
        self.call(
            Method::GET,
            &format!("/resource/{layer_id}/feature/{feature_id}"),
            None,
            &[],
        )
        .await
    }

    pub async fn create_feature(
        &self,
        layer_id: u64,
        draft: &FeatureDraft,
    ) -> UpstreamResult<Payload> {
        let body = serde_json::to_value(draft).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        self.call(
            Method::POST,
            &format!("/resource/{layer_id}/feature/"),
            Some(&body),
            &[],
        )
        .await
    }

    pub async fn update_feature(
        &self,
        layer_id: u64,
        feature_id: i64,
        draft: &FeatureDraft,
    ) -> UpstreamResult<Payload> {
        let body = serde_json::to_value(draft).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        self.call(
            Method::PUT,
            &format!("/resource/{layer_id}/feature/{feature_id}"),
            Some(&body),
            &[],
        )
        .await
    }

    /// Bulk delete; the upstream takes `[{"id": n}, ...]`.
    pub async fn delete_features(&self, layer_id: u64, ids: &[i64]) -> UpstreamResult<Payload> {
        let body = Value::Array(
            ids.iter()
                .map(|id| serde_json::json!({ "id": id }))
                .collect(),
        );
        self.call(
            Method::DELETE,
            &format!("/resource/{layer_id}/feature/"),
            Some(&body),
            &[],
        )
        .await
    }

    // ── Attachments ──

    pub async fn delete_attachment(
        &self,
        layer_id: u64,
        feature_id: i64,
        attachment_id: i64,
    ) -> UpstreamResult<Payload> {
        self.call(
            Method::DELETE,
            &format!("/resource/{layer_id}/feature/{feature_id}/attachment/{attachment_id}"),
            None,
            &[],
        )
        .await
    }

    /// Pushes raw bytes to the file-upload component and returns the first
    /// `upload_meta` entry.
    pub async fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> UpstreamResult<UploadMeta> {
        let path = "/component/file_upload/";
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime_type)
            .map_err(|e| UpstreamError::Config(format!("invalid mime type {mime_type}: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .part("file", part);

        let req = self
            .authed(Method::POST, &self.config.url(path))
            .multipart(form);
        let payload = self.dispatch(&Method::POST, path, req).await?;

        let first = payload
            .as_json()
            .and_then(|v| v.get("upload_meta"))
            .and_then(|meta| meta.get(0))
            .cloned()
            .ok_or_else(|| UpstreamError::Decode("upload response has no upload_meta".to_string()))?;
        let meta: UploadMeta =
            serde_json::from_value(first).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        debug!(upload_id = %meta.id, "file uploaded");
        Ok(meta)
    }

    /// Links an uploaded file to a feature as an attachment.
    pub async fn attach_file(
        &self,
        layer_id: u64,
        feature_id: i64,
        name: &str,
        size: i64,
        mime_type: &str,
        upload: &UploadMeta,
    ) -> UpstreamResult<Payload> {
        let body = serde_json::json!({
            "name": name,
            "size": size,
            "mime_type": mime_type,
            "file_upload": {
                "id": upload.id,
                "size": size,
            },
        });
        self.call(
            Method::POST,
            &format!("/resource/{layer_id}/feature/{feature_id}/attachment/"),
            Some(&body),
            &[],
        )
        .await
    }
}

async fn read_payload(method: &Method, path: &str, resp: Response) -> UpstreamResult<Payload> {
    let status = resp.status();
    info!(%method, path, status = status.as_u16(), "upstream responded");

    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let text = resp
        .text()
        .await
        .map_err(|e| UpstreamError::Transport(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        warn!(%method, path, status = status.as_u16(), body = %text, "upstream error");
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    if is_json && !text.trim().is_empty() {
        serde_json::from_str(&text)
            .map(Payload::Json)
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    } else {
        Ok(Payload::Text(text))
    }
}
