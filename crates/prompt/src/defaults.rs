//! Built-in prompt definitions, one per assistant mode.

use crate::types::PromptDefinition;
use fsi_core::AssistantMode;

const QUESTION_TEMPLATE: &str =
    "Using only the contexts below, answer the query.\nContexts: {{context}}\n\nQuery: {{question}}";

const CAMPAIGN_TEMPLATE: &str =
    "Using the contexts below, explain to the customer about our special offers.\nContexts: {{context}}";

const TRANSACTIONS_PERSONA: &str = "You are a helpful financial analyst using transaction search results to give advice to customers. \
If you can answer a question, attempt to answer it fully. \
Assume the context provided provides an accurate response to the query.";

const SUPPORT_PERSONA: &str = "You are a helpful customer support agent that answers questions based only on the context provided. \
When you respond, please cite your source.";

const REPORT_PERSONA: &str = "You are a helpful analyst that answers questions based only on the context provided. \
When you respond, please cite your source and where possible, always summarise your answers.";

const CAMPAIGN_PERSONA: &str = "You are a helpful customer support representative that can enthusiastically explain how our special offers can help them. \
Do not simply repeat the special offer text, rephrase it to be positive and rewarding. \
Respond in no more than 80 words.";

/// Prompt identifier used for a mode, both for the built-in definition and
/// for workspace overrides.
pub fn prompt_id(mode: AssistantMode) -> String {
    format!("assistant.{}", mode.key())
}

/// The built-in prompt definition for a mode.
pub fn builtin_prompt(mode: AssistantMode) -> PromptDefinition {
    let (system, template) = match mode {
        AssistantMode::TransactionAnalyser => (TRANSACTIONS_PERSONA, QUESTION_TEMPLATE),
        AssistantMode::CustomerSupport => (SUPPORT_PERSONA, QUESTION_TEMPLATE),
        AssistantMode::ReportAnalyser => (REPORT_PERSONA, QUESTION_TEMPLATE),
        AssistantMode::Campaign => (CAMPAIGN_PERSONA, CAMPAIGN_TEMPLATE),
    };

    PromptDefinition {
        id: prompt_id(mode),
        title: mode.label().to_string(),
        api_version: "1.0".to_string(),
        system: system.to_string(),
        template: template.to_string(),
    }
}
