//! Error types for the FSI assistant.
//!
//! A single error enum covers every failure category: configuration, I/O,
//! query validation, the search engine, the chat model, prompts and ingestion.

use thiserror::Error;

/// Unified error type for the FSI assistant.
///
/// All fallible functions return `Result<T, AppError>`. Failures from the
/// search engine and the chat model are not retried; they surface to the
/// caller and abort the current interaction.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mode-specific query inputs were missing or out of range
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),

    /// Query or request rejected by the search engine
    #[error("Search engine error: {0}")]
    Search(String),

    /// Search engine unreachable, throttling (429) or failing (5xx); the same
    /// request may succeed later
    #[error("Search engine unavailable: {0}")]
    SearchUnavailable(String),

    /// Chat model invocation failure
    #[error("Model invocation error: {0}")]
    Llm(String),

    /// Prompt definition and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Document ingestion and seeding errors
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl AppError {
    /// Whether retrying the same request can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::SearchUnavailable(_))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
