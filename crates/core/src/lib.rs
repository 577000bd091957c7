//! FSI Assistant Core Library
//!
//! This crate provides the foundational utilities shared by every other crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (secrets, provider settings, retrieval overrides)
//! - The `AssistantMode` shared by retrieval and prompting

pub mod config;
pub mod error;
pub mod logging;
pub mod mode;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use mode::AssistantMode;
