//! Prompt builder for rendering templates and injecting context.

use crate::types::{BuiltPrompt, PromptDefinition};
use fsi_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build the `[System, Human]` turns for a question and its retrieval context.
///
/// The context is embedded verbatim; any token budgeting happens before this
/// point. An empty context still yields a complete prompt.
///
/// # Example
/// ```no_run
/// use fsi_core::AssistantMode;
/// use fsi_prompt::{assemble_prompt, builtin_prompt};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(AssistantMode::CustomerSupport);
/// let built = assemble_prompt(&def, "[]", "How do I reset my PIN?")?;
/// println!("{}", built.user());
/// # Ok(())
/// # }
/// ```
pub fn assemble_prompt(
    definition: &PromptDefinition,
    context: &str,
    question: &str,
) -> AppResult<BuiltPrompt> {
    let mut variables = HashMap::new();
    variables.insert("context".to_string(), context.to_string());
    variables.insert("question".to_string(), question.to_string());

    build_prompt(definition, variables)
}

/// Build a prompt from a definition and arbitrary template variables.
///
/// The `context` variable, when present, is reported in the prompt metadata.
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;
    let context_bytes = variables.get("context").map(|c| c.len()).unwrap_or(0);

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        context_bytes,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Context is JSON; keep quotes and ampersands intact
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
