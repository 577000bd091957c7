//! Annual report ingestion.
//!
//! Input is plain UTF-8 text with pages separated by form feeds, as written
//! by common PDF-to-text tools. Every passage becomes one document routed
//! through the report ingest pipeline.

use super::bulk::{BulkIndexer, BulkReport};
use super::chunker::{chunk_pages, ChunkStrategy};
use crate::backend::BulkOperation;
use crate::profile::{REPORTS_INDEX, REPORTS_PIPELINE};
use chrono::NaiveDate;
use fsi_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page separator in extracted report text.
pub const PAGE_SEPARATOR: char = '\x0c';

/// Stored form of one report passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub report_name: String,
    pub text: String,
    pub publish_date: NaiveDate,
    pub page: u32,
    pub section: u32,
    pub _extract_binary_content: bool,
    pub _reduce_whitespace: bool,
    pub _run_ml_inference: bool,
}

/// What to ingest and how.
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub report_name: String,
    pub publish_date: NaiveDate,
    pub strategy: ChunkStrategy,
}

/// Read extracted report text from disk.
pub fn read_report_text(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Ingest(format!("Failed to read report {:?}: {}", path, e)))
}

pub fn split_pages(text: &str) -> Vec<&str> {
    text.split(PAGE_SEPARATOR).collect()
}

/// Build one bulk write per passage.
pub fn report_operations(upload: &ReportUpload, text: &str) -> AppResult<Vec<BulkOperation>> {
    let report_name = upload.report_name.trim();
    if report_name.is_empty() {
        return Err(AppError::Ingest("Report name must not be empty".to_string()));
    }

    let pages = split_pages(text);
    let chunked = chunk_pages(report_name, &pages, upload.strategy);

    chunked
        .passages
        .into_iter()
        .map(|passage| -> AppResult<BulkOperation> {
            let doc = ReportDocument {
                report_name: report_name.to_string(),
                text: passage.text,
                publish_date: upload.publish_date,
                page: passage.page_number,
                section: passage.section_index,
                _extract_binary_content: true,
                _reduce_whitespace: true,
                _run_ml_inference: true,
            };
            let id = uuid::Uuid::new_v4().to_string();
            Ok(BulkOperation::new(REPORTS_INDEX, id, serde_json::to_value(doc)?)
                .with_pipeline(REPORTS_PIPELINE))
        })
        .collect()
}

/// Chunk a report and index its passages.
pub async fn ingest_report(
    indexer: &BulkIndexer,
    upload: &ReportUpload,
    text: &str,
) -> AppResult<BulkReport> {
    let operations = report_operations(upload, text)?;
    if operations.is_empty() {
        return Err(AppError::Ingest(format!(
            "Report '{}' contains no text",
            upload.report_name
        )));
    }

    tracing::info!(
        report = %upload.report_name,
        passages = operations.len(),
        "Ingesting report"
    );

    Ok(indexer.index_all(&operations).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::ingest::bulk::BulkSettings;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn upload(name: &str) -> ReportUpload {
        ReportUpload {
            report_name: name.to_string(),
            publish_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            strategy: ChunkStrategy::Sentences { max_chars: 1024 },
        }
    }

    #[test]
    fn test_documents_carry_pipeline_directives() {
        let text = "Revenue grew.\x0cCosts fell. Margins improved.";
        let ops = report_operations(&upload("ACME 2023"), text).unwrap();

        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|op| op.index == REPORTS_INDEX));
        assert_eq!(ops[0].pipeline.as_deref(), Some(REPORTS_PIPELINE));

        let second: ReportDocument = serde_json::from_value(ops[1].document.clone()).unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(second.section, 1);
        assert_eq!(second.text, "Costs fell. Margins improved.");
        assert!(second._run_ml_inference);
        assert_eq!(ops[1].document["publish_date"], "2024-03-31");
    }

    #[test]
    fn test_blank_report_name_rejected() {
        let result = report_operations(&upload("  "), "text");
        assert!(matches!(result, Err(AppError::Ingest(_))));
    }

    #[test]
    fn test_read_report_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");
        std::fs::write(&path, "Page one.\x0cPage two.").unwrap();

        let text = read_report_text(&path).unwrap();
        assert_eq!(split_pages(&text), vec!["Page one.", "Page two."]);

        assert!(read_report_text(&dir.path().join("missing.txt")).is_err());
    }

    #[tokio::test]
    async fn test_ingest_report_indexes_every_passage() {
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend.clone(), BulkSettings::default());

        let text = "One. Two.\x0c\x0cThree.";
        let mut words = upload("ACME 2023");
        words.strategy = ChunkStrategy::Words { words_per_section: 1 };

        let report = ingest_report(&indexer, &words, text).await.unwrap();
        assert_eq!(report.summary(), "3/3");
    }

    #[tokio::test]
    async fn test_ingest_empty_report_is_error() {
        let indexer = BulkIndexer::new(Arc::new(MockBackend::new()), BulkSettings::default());
        let result = ingest_report(&indexer, &upload("ACME"), "\x0c  \x0c").await;
        assert!(matches!(result, Err(AppError::Ingest(_))));
    }
}
