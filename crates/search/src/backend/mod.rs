//! Search engine boundary.
//!
//! Everything the assistant needs from the engine goes through
//! [`SearchBackend`], so retrieval and indexing can run against an in-memory
//! fake in tests.

pub mod elastic;
#[cfg(test)]
pub(crate) mod mock;

pub use elastic::{decode_cloud_id, ElasticClient};

use fsi_core::AppResult;
use serde::Serialize;
use serde_json::{json, Value};

/// A single document write for the `_bulk` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkOperation {
    pub index: String,
    pub id: String,
    /// Ingest pipeline run before the document is stored
    pub pipeline: Option<String>,
    pub document: Value,
}

impl BulkOperation {
    pub fn new(index: impl Into<String>, id: impl Into<String>, document: Value) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            pipeline: None,
            document,
        }
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    /// Action line followed by the source line, newline terminated.
    pub fn to_ndjson(&self) -> AppResult<String> {
        let mut action = json!({ "_index": self.index, "_id": self.id });
        if let Some(pipeline) = &self.pipeline {
            action["pipeline"] = json!(pipeline);
        }

        let action_line = serde_json::to_string(&json!({ "index": action }))?;
        let source_line = serde_json::to_string(&self.document)?;
        Ok(format!("{}\n{}\n", action_line, source_line))
    }
}

/// Outcome of one item in a `_bulk` request, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemStatus {
    pub status: u16,
    pub error: Option<String>,
}

impl BulkItemStatus {
    pub fn ok(status: u16) -> Self {
        Self {
            status,
            error: None,
        }
    }

    pub fn failed(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The engine asked us to slow down; the item may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        self.status == 429
    }
}

/// Operations the assistant performs against the search engine.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a `_search` request and return the raw response.
    async fn search(&self, index: &str, body: &Value) -> AppResult<Value>;

    /// Write a batch of documents. A request-level failure (transport error,
    /// rejected request) is an `Err`; per-item failures are reported in the
    /// returned statuses.
    async fn bulk(&self, operations: &[BulkOperation]) -> AppResult<Vec<BulkItemStatus>>;

    /// Delete every document matching `query`; returns the number deleted.
    async fn delete_by_query(&self, index: &str, query: &Value) -> AppResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndjson_with_pipeline() {
        let op = BulkOperation::new("search-annual-reports", "abc", json!({"text": "hello"}))
            .with_pipeline("search-annual-reports");
        let ndjson = op.to_ndjson().unwrap();
        let lines: Vec<&str> = ndjson.lines().collect();

        assert_eq!(lines.len(), 2);
        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_id"], "abc");
        assert_eq!(action["index"]["pipeline"], "search-annual-reports");
        assert_eq!(lines[1], r#"{"text":"hello"}"#);
        assert!(ndjson.ends_with('\n'));
    }

    #[test]
    fn test_ndjson_without_pipeline() {
        let op = BulkOperation::new("search-transactions", "0", json!({}));
        let ndjson = op.to_ndjson().unwrap();
        assert!(!ndjson.contains("pipeline"));
    }

    #[test]
    fn test_item_status_classification() {
        assert!(BulkItemStatus::ok(201).is_success());
        assert!(BulkItemStatus::failed(429, "busy").is_retryable());
        assert!(!BulkItemStatus::failed(400, "mapper_parsing_exception").is_retryable());
    }
}
