//! In-memory search backend for tests.

use super::{BulkItemStatus, BulkOperation, SearchBackend};
use fsi_core::{AppError, AppResult};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Scripted reply for one `_bulk` call.
pub(crate) enum BulkScript {
    /// Transient request-level failure (transport, 429, 5xx)
    Unavailable(String),
    /// Request rejected for good (bad credentials, malformed request)
    Reject(String),
    /// Per-item statuses; missing entries default to 201
    Statuses(Vec<u16>),
}

#[derive(Default)]
pub(crate) struct MockBackend {
    responses: Mutex<HashMap<String, Value>>,
    bulk_scripts: Mutex<VecDeque<BulkScript>>,
    pub searches: Mutex<Vec<(String, Value)>>,
    pub bulk_batches: Mutex<Vec<Vec<BulkOperation>>>,
    pub deletes: Mutex<Vec<(String, Value)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for every search against `index`.
    pub fn with_response(self, index: &str, response: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(index.to_string(), response);
        self
    }

    pub fn with_bulk_script(self, script: BulkScript) -> Self {
        self.bulk_scripts.lock().unwrap().push_back(script);
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

/// Build a `_search` response with the given `(score, source)` hits.
pub(crate) fn hits_response(hits: &[(f64, Value)]) -> Value {
    let hits: Vec<Value> = hits
        .iter()
        .map(|(score, source)| json!({ "_score": score, "_source": source }))
        .collect();
    json!({ "hits": { "total": { "value": hits.len(), "relation": "eq" }, "hits": hits } })
}

#[async_trait::async_trait]
impl SearchBackend for MockBackend {
    async fn search(&self, index: &str, body: &Value) -> AppResult<Value> {
        self.searches
            .lock()
            .unwrap()
            .push((index.to_string(), body.clone()));

        self.responses
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::Search(format!("no such index [{}]", index)))
    }

    async fn bulk(&self, operations: &[BulkOperation]) -> AppResult<Vec<BulkItemStatus>> {
        self.bulk_batches.lock().unwrap().push(operations.to_vec());

        let script = self.bulk_scripts.lock().unwrap().pop_front();
        match script {
            Some(BulkScript::Unavailable(message)) => Err(AppError::SearchUnavailable(message)),
            Some(BulkScript::Reject(message)) => Err(AppError::Search(message)),
            Some(BulkScript::Statuses(statuses)) => Ok((0..operations.len())
                .map(|i| match statuses.get(i).copied().unwrap_or(201) {
                    s if (200..300).contains(&s) => BulkItemStatus::ok(s),
                    s => BulkItemStatus::failed(s, "scripted failure"),
                })
                .collect()),
            None => Ok(operations.iter().map(|_| BulkItemStatus::ok(201)).collect()),
        }
    }

    async fn delete_by_query(&self, index: &str, query: &Value) -> AppResult<u64> {
        self.deletes
            .lock()
            .unwrap()
            .push((index.to_string(), query.clone()));
        Ok(0)
    }
}
