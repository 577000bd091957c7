//! Batched `_bulk` indexing with exponential backoff.
//!
//! Documents are sent in fixed-size batches. A batch whose request fails
//! transiently (transport error, 429, 5xx), or whose items are rejected with
//! 429, is retried after a delay that doubles on every attempt up to a cap.
//! Any other request failure is final for the batch. Items that still fail
//! are counted, not raised, so the caller gets a `successes/total` report.

use crate::backend::{BulkOperation, SearchBackend};
use crate::progress::ProgressReporter;
use fsi_core::config::IndexingSettings;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Batching and retry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSettings {
    pub batch_size: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_retries: u32,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self::from(&IndexingSettings::default())
    }
}

impl From<&IndexingSettings> for BulkSettings {
    fn from(settings: &IndexingSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            initial_backoff: Duration::from_secs(settings.initial_backoff_secs),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            max_retries: settings.max_retries,
        }
    }
}

impl BulkSettings {
    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Outcome of a bulk indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub successes: usize,
    pub total: usize,
    /// One message per failed document
    pub errors: Vec<String>,
}

impl BulkReport {
    pub fn failures(&self) -> usize {
        self.total - self.successes
    }

    /// `successes/total`
    pub fn summary(&self) -> String {
        format!("{}/{}", self.successes, self.total)
    }
}

/// Writes documents to the engine in batches.
pub struct BulkIndexer {
    backend: Arc<dyn SearchBackend>,
    settings: BulkSettings,
    progress: ProgressReporter,
}

impl BulkIndexer {
    pub fn new(backend: Arc<dyn SearchBackend>, settings: BulkSettings) -> Self {
        Self {
            backend,
            settings,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Index every operation and report how many were stored.
    pub async fn index_all(&self, operations: &[BulkOperation]) -> BulkReport {
        let mut report = BulkReport {
            total: operations.len(),
            ..Default::default()
        };
        let index = operations.first().map(|op| op.index.as_str()).unwrap_or("");

        let mut done = 0u64;
        for batch in operations.chunks(self.settings.batch_size.max(1)) {
            self.index_batch(batch, &mut report).await;
            done += batch.len() as u64;
            self.progress.index(done, report.total as u64, index);
        }

        tracing::info!(
            successes = report.successes,
            total = report.total,
            "Bulk indexing finished"
        );

        report
    }

    async fn index_batch(&self, batch: &[BulkOperation], report: &mut BulkReport) {
        let mut pending: Vec<BulkOperation> = batch.to_vec();
        let mut attempt = 0u32;

        loop {
            let outcome = self.backend.bulk(&pending).await;
            let last_error = match outcome {
                Ok(statuses) => {
                    let mut retry = Vec::new();
                    let mut throttle = None;
                    for (i, op) in pending.iter().enumerate() {
                        match statuses.get(i) {
                            Some(status) if status.is_success() => report.successes += 1,
                            Some(status) if status.is_retryable() => {
                                throttle = status.error.clone();
                                retry.push(op.clone());
                            }
                            Some(status) => report.errors.push(format!(
                                "{}: {}",
                                op.id,
                                status.error.as_deref().unwrap_or("rejected")
                            )),
                            None => report
                                .errors
                                .push(format!("{}: missing bulk item status", op.id)),
                        }
                    }
                    if retry.is_empty() {
                        return;
                    }
                    pending = retry;
                    throttle.unwrap_or_else(|| "too many requests".to_string())
                }
                Err(e) if e.is_transient() => e.to_string(),
                Err(e) => {
                    tracing::warn!(failed = pending.len(), "Bulk batch rejected: {}", e);
                    report
                        .errors
                        .extend(pending.iter().map(|op| format!("{}: {}", op.id, e)));
                    return;
                }
            };

            if attempt >= self.settings.max_retries {
                tracing::warn!(
                    failed = pending.len(),
                    "Giving up on batch after {} retries: {}",
                    attempt,
                    last_error
                );
                report.errors.extend(
                    pending
                        .iter()
                        .map(|op| format!("{}: {}", op.id, last_error)),
                );
                return;
            }

            let delay = self.settings.backoff(attempt);
            attempt += 1;
            tracing::warn!(
                "Bulk batch failed (attempt {}/{}), retrying in {:?}: {}",
                attempt,
                self.settings.max_retries,
                delay,
                last_error
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{BulkScript, MockBackend};
    use serde_json::json;

    fn ops(n: usize) -> Vec<BulkOperation> {
        (0..n)
            .map(|i| BulkOperation::new("search-transactions", i.to_string(), json!({"value": i})))
            .collect()
    }

    fn fast_settings(batch_size: usize) -> BulkSettings {
        BulkSettings {
            batch_size,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            max_retries: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let settings = BulkSettings::default();
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.backoff(0), Duration::from_secs(5));
        assert_eq!(settings.backoff(1), Duration::from_secs(10));
        assert_eq!(settings.backoff(2), Duration::from_secs(20));
        assert_eq!(settings.backoff(3), Duration::from_secs(30));
        assert_eq!(settings.backoff(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_batches_of_fifty() {
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend.clone(), fast_settings(50));

        let report = indexer.index_all(&ops(120)).await;

        assert_eq!(report.summary(), "120/120");
        let sizes: Vec<usize> = backend.bulk_batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let backend = Arc::new(
            MockBackend::new()
                .with_bulk_script(BulkScript::Unavailable("connection reset".to_string()))
                .with_bulk_script(BulkScript::Statuses(vec![201, 429, 201]))
                .with_bulk_script(BulkScript::Statuses(vec![201])),
        );
        let indexer = BulkIndexer::new(backend.clone(), fast_settings(50));

        let report = indexer.index_all(&ops(3)).await;

        assert_eq!(report.successes, 3);
        assert!(report.errors.is_empty());
        let batches = backend.bulk_batches.lock().unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2][0].id, "1");
    }

    #[tokio::test]
    async fn test_permanent_failures_are_counted() {
        let backend = Arc::new(
            MockBackend::new().with_bulk_script(BulkScript::Statuses(vec![201, 400, 201])),
        );
        let indexer = BulkIndexer::new(backend, fast_settings(50));

        let report = indexer.index_all(&ops(3)).await;

        assert_eq!(report.summary(), "2/3");
        assert_eq!(report.failures(), 1);
        assert!(report.errors[0].starts_with("1:"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let backend = Arc::new(
            MockBackend::new()
                .with_bulk_script(BulkScript::Unavailable("503".to_string()))
                .with_bulk_script(BulkScript::Unavailable("503".to_string()))
                .with_bulk_script(BulkScript::Unavailable("503".to_string())),
        );
        let indexer = BulkIndexer::new(backend.clone(), fast_settings(10));

        let report = indexer.index_all(&ops(4)).await;

        assert_eq!(report.summary(), "0/4");
        assert_eq!(report.errors.len(), 4);
        assert_eq!(backend.bulk_batches.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let backend = Arc::new(
            MockBackend::new()
                .with_bulk_script(BulkScript::Reject("Bulk returned 401 Unauthorized".to_string())),
        );
        let settings = BulkSettings {
            max_retries: 3,
            ..fast_settings(50)
        };
        let indexer = BulkIndexer::new(backend.clone(), settings);

        let report = indexer.index_all(&ops(1)).await;

        assert_eq!(report.summary(), "0/1");
        assert!(report.errors[0].contains("401 Unauthorized"));
        assert_eq!(backend.bulk_batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let indexer = BulkIndexer::new(Arc::new(MockBackend::new()), fast_settings(50));
        assert_eq!(indexer.index_all(&[]).await, BulkReport::default());
    }
}
