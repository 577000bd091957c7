//! Command handlers for the FSI assistant CLI.

pub mod ask;
pub mod generate;
pub mod ingest;
pub mod prompts;
pub mod reports;
mod session;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use generate::GenerateCommand;
pub use ingest::IngestCommand;
pub use prompts::PromptsCommand;
pub use reports::ReportsCommand;
