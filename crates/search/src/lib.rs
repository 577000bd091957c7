//! Search side of the FSI assistant.
//!
//! Builds hybrid (semantic expansion + lexical) queries per assistant mode,
//! shapes engine responses into scored results, and writes demo data and
//! report passages through the `_bulk` API.

pub mod backend;
pub mod ingest;
pub mod profile;
pub mod progress;
pub mod query;
pub mod retrieval;
pub mod seed;
pub mod shaper;

// Re-export commonly used types
pub use backend::{BulkOperation, ElasticClient, SearchBackend};
pub use ingest::{BulkIndexer, BulkReport, BulkSettings, ChunkStrategy};
pub use profile::ModeProfile;
pub use progress::{ProgressEvent, ProgressReporter};
pub use query::QueryParams;
pub use retrieval::{RetrievalContext, Retriever};
pub use shaper::SearchResult;
