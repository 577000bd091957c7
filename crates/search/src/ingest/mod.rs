//! Passage chunking and bulk document writes.

pub mod bulk;
pub mod chunker;
pub mod reports;

pub use bulk::{BulkIndexer, BulkReport, BulkSettings};
pub use chunker::{chunk_pages, split_sentences, split_words, ChunkStrategy, ChunkedDocument, Passage};
pub use reports::{ingest_report, read_report_text, ReportDocument, ReportUpload};
