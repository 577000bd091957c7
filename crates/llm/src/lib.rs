//! Chat model integration for the FSI assistant.
//!
//! This crate provides a provider-agnostic abstraction over hosted chat
//! models, plus the two pieces of logic that sit directly on top of it:
//! token budgeting and response rendering (answer text + estimated cost).
//!
//! # Providers
//! - **Azure OpenAI**: deployment-scoped chat completions (default)
//! - **OpenAI-compatible**: any `/chat/completions` endpoint
//! - **Ollama**: local `/api/chat`
//!
//! # Example
//! ```no_run
//! use fsi_llm::{ChatClient, ChatRequest, PromptTurn, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2", vec![PromptTurn::human("Hello")]);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod render;
pub mod tokens;
pub mod types;

// Re-export main types
pub use client::{ChatClient, ChatRequest, ChatResponse, ChatUsage, PromptTurn, Role};
pub use factory::{create_client, ProviderSettings};
pub use providers::{OllamaClient, OpenAiClient};
pub use render::{render_response, Pricing, RenderedResponse};
pub use types::ProviderType;
