//! Elasticsearch REST client.
//!
//! Talks to `_search`, `_bulk` and `_delete_by_query` with basic auth. The
//! endpoint comes either from an explicit URL or from an Elastic Cloud ID.

use super::{BulkItemStatus, BulkOperation, SearchBackend};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fsi_core::config::SearchSettings;
use fsi_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct DeleteByQueryResponse {
    #[serde(default)]
    deleted: u64,
}

/// HTTP client for an Elasticsearch deployment.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl ElasticClient {
    /// Create a client for an explicit base URL.
    pub fn new(base_url: impl Into<String>, credentials: Option<(String, String)>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create a client from configuration; an explicit URL wins over a cloud id.
    pub fn from_settings(settings: &SearchSettings) -> AppResult<Self> {
        let base_url = match (&settings.url, &settings.cloud_id) {
            (Some(url), _) => url.clone(),
            (None, Some(cloud_id)) => decode_cloud_id(cloud_id)?,
            (None, None) => {
                return Err(AppError::Config(
                    "Search engine requires a URL or a cloud id".to_string(),
                ))
            }
        };

        let credentials = match (&settings.user, &settings.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        tracing::debug!("Search engine endpoint: {}", base_url);
        Self::new(base_url, credentials)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> AppResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::SearchUnavailable(format!("{} request failed: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(%status, "{} rejected by search engine", what);
            return Err(status_error(what, status, &error_text));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl SearchBackend for ElasticClient {
    async fn search(&self, index: &str, body: &Value) -> AppResult<Value> {
        tracing::debug!(index, "Sending search request");

        let builder = self
            .request(reqwest::Method::POST, &format!("{}/_search", index))
            .json(body);
        let response = self.send(builder, "Search").await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))
    }

    async fn bulk(&self, operations: &[BulkOperation]) -> AppResult<Vec<BulkItemStatus>> {
        let mut body = String::new();
        for op in operations {
            body.push_str(&op.to_ndjson()?);
        }

        tracing::debug!(count = operations.len(), "Sending bulk request");

        let builder = self
            .request(reqwest::Method::POST, "_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(body);
        let response = self.send(builder, "Bulk").await?;

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse bulk response: {}", e)))?;

        Ok(parsed.items.iter().map(item_status).collect())
    }

    async fn delete_by_query(&self, index: &str, query: &Value) -> AppResult<u64> {
        tracing::debug!(index, "Sending delete_by_query request");

        let builder = self
            .request(reqwest::Method::POST, &format!("{}/_delete_by_query", index))
            .json(&serde_json::json!({ "query": query }));
        let response = self.send(builder, "Delete by query").await?;

        let parsed: DeleteByQueryResponse = response.json().await.map_err(|e| {
            AppError::Search(format!("Failed to parse delete_by_query response: {}", e))
        })?;

        Ok(parsed.deleted)
    }
}

/// Map a non-success response to an error; throttling and server failures
/// are transient, everything else is final.
fn status_error(what: &str, status: StatusCode, body: &str) -> AppError {
    let message = format!("{} returned {}: {}", what, status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::SearchUnavailable(message)
    } else {
        AppError::Search(message)
    }
}

/// Read one entry of a `_bulk` response's `items` array.
fn item_status(item: &Value) -> BulkItemStatus {
    let Some(result) = item.as_object().and_then(|o| o.values().next()) else {
        return BulkItemStatus::failed(0, "malformed bulk item");
    };

    let status = result
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(0);

    match result.get("error") {
        Some(error) => {
            let reason = error
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            BulkItemStatus::failed(status, reason)
        }
        None => BulkItemStatus::ok(status),
    }
}

/// Turn an Elastic Cloud ID into the deployment's HTTPS endpoint.
///
/// The id is `name:base64(host$es_uuid$kb_uuid)`, where `host` may carry a
/// `:port` suffix.
pub fn decode_cloud_id(cloud_id: &str) -> AppResult<String> {
    let encoded = cloud_id
        .split_once(':')
        .map(|(_, encoded)| encoded)
        .unwrap_or(cloud_id);

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Config(format!("Cloud id is not valid base64: {}", e)))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|e| AppError::Config(format!("Cloud id is not valid UTF-8: {}", e)))?;

    let mut parts = decoded.split('$');
    let host = parts.next().filter(|h| !h.is_empty());
    let es_uuid = parts.next().filter(|u| !u.is_empty());

    let (Some(host), Some(es_uuid)) = (host, es_uuid) else {
        return Err(AppError::Config(
            "Cloud id must contain a host and an Elasticsearch id".to_string(),
        ));
    };

    Ok(match host.split_once(':') {
        Some((domain, port)) => format!("https://{}.{}:{}", es_uuid, domain, port),
        None => format!("https://{}.{}", es_uuid, host),
    })
}
