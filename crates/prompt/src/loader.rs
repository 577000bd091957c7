//! Prompt loader for YAML prompt overrides.

use crate::defaults::{builtin_prompt, prompt_id};
use crate::types::PromptDefinition;
use fsi_core::{AppError, AppResult, AssistantMode};
use std::path::Path;

const PROMPTS_DIR: &str = ".fsi/prompts";

/// Load a prompt definition by ID from the workspace.
///
/// Looks for `<id>.yml` in `.fsi/prompts/`.
///
/// # Example
/// ```no_run
/// use fsi_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "assistant.support")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(PROMPTS_DIR)
        .join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Resolve the prompt for a mode: a workspace override when one exists,
/// otherwise the built-in definition.
pub fn resolve_prompt(workspace_path: &Path, mode: AssistantMode) -> AppResult<PromptDefinition> {
    let id = prompt_id(mode);
    let override_file = workspace_path.join(PROMPTS_DIR).join(format!("{}.yml", id));

    if override_file.exists() {
        load_prompt(workspace_path, &id)
    } else {
        tracing::debug!("Using built-in prompt: {}", id);
        Ok(builtin_prompt(mode))
    }
}

/// List all prompt override IDs in the workspace.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let prompts_dir = workspace_path.join(PROMPTS_DIR);

    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(&prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.system.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt {} has an empty system instruction",
            def.id
        )));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
