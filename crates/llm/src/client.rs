//! Chat client abstraction and request/response types.
//!
//! A conversation is an ordered list of role-tagged turns. The assistant only
//! ever sends a system turn followed by a single human turn; there is no
//! multi-turn memory.

use fsi_core::AppResult;
use serde::{Deserialize, Serialize};

/// Speaker of a prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[serde(rename = "user")]
    Human,
    #[serde(rename = "assistant")]
    Ai,
}

impl Role {
    /// Wire name used by OpenAI-style chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Human => "user",
            Role::Ai => "assistant",
        }
    }
}

/// One role-tagged message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTurn {
    pub role: Role,
    pub content: String,
}

impl PromptTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (deployment name for Azure)
    pub model: String,

    /// Ordered conversation turns
    pub messages: Vec<PromptTurn>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with required fields.
    pub fn new(model: impl Into<String>, messages: Vec<PromptTurn>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics reported by the provider
    pub usage: ChatUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ChatUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl ChatUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for chat model providers.
///
/// Calls are blocking from the caller's point of view: one request, one
/// complete text answer, no streaming and no tool calls.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the provider name (e.g., "azure-openai", "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a chat completion.
    ///
    /// Any transport, status or decoding failure is returned as
    /// `AppError::Llm`.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let json = serde_json::to_string(&PromptTurn::human("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);

        let json = serde_json::to_string(&PromptTurn::ai("hello")).unwrap();
        assert!(json.contains(r#""role":"assistant""#));

        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(
            "gpt-4",
            vec![PromptTurn::system("persona"), PromptTurn::human("question")],
        )
        .with_temperature(0.1)
        .with_max_tokens(256);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(256));
    }

    #[test]
    fn test_usage_totals() {
        let usage = ChatUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
    }
}
