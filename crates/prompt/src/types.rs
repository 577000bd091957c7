//! Prompt types.

use fsi_llm::PromptTurn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier (e.g., "assistant.support")
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,

    /// Persona instruction sent as the system turn
    pub system: String,

    /// Human turn template with Handlebars syntax; `{{context}}` and
    /// `{{question}}` are available
    pub template: String,
}

fn default_api_version() -> String {
    "1.0".to_string()
}

/// A fully built prompt ready for the chat model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Ordered turns: one system turn followed by one human turn
    pub turns: Vec<PromptTurn>,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Size of the embedded context in bytes
    #[serde(rename = "contextBytes")]
    pub context_bytes: usize,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt from a system instruction and a rendered
    /// human turn.
    pub fn new(
        system: String,
        user: String,
        source_prompt_id: String,
        context_bytes: usize,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            turns: vec![PromptTurn::system(system), PromptTurn::human(user)],
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                context_bytes,
                resolved_variables,
            },
        }
    }

    /// The system turn text.
    pub fn system(&self) -> &str {
        &self.turns[0].content
    }

    /// The human turn text.
    pub fn user(&self) -> &str {
        &self.turns[1].content
    }
}
