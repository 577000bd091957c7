//! Prompts command handler.

use clap::Args;
use fsi_core::{config::AppConfig, AppResult, AssistantMode};
use fsi_prompt::{list_prompts, prompt_id, resolve_prompt};
use serde::Serialize;
use std::path::Path;

/// Show the prompt each assistant uses and any workspace overrides
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRow {
    pub mode: AssistantMode,
    pub id: String,
    pub title: String,
    pub overridden: bool,
}

/// Overview of the prompts in effect for `workspace`.
///
/// Returns one row per mode plus the ids of override files that match no
/// mode.
pub fn prompt_overview(workspace: &Path) -> AppResult<(Vec<PromptRow>, Vec<String>)> {
    let overrides = list_prompts(workspace)?;

    let mut rows = Vec::new();
    for mode in AssistantMode::all() {
        let id = prompt_id(mode);
        let definition = resolve_prompt(workspace, mode)?;
        rows.push(PromptRow {
            mode,
            overridden: overrides.contains(&id),
            id,
            title: definition.title,
        });
    }

    let unused = overrides
        .into_iter()
        .filter(|id| !rows.iter().any(|row| &row.id == id))
        .collect();

    Ok((rows, unused))
}

impl PromptsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        let (rows, unused) = prompt_overview(&config.workspace)?;

        if self.json {
            let output = serde_json::json!({ "prompts": rows, "unused": unused });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        for row in &rows {
            let source = if row.overridden { "workspace" } else { "built-in" };
            println!("{:<22} {:<10} {}", row.id, source, row.title);
        }
        for id in &unused {
            eprintln!("warning: {}.yml matches no assistant and is ignored", id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_overview_without_overrides() {
        let workspace = TempDir::new().unwrap();
        let (rows, unused) = prompt_overview(workspace.path()).unwrap();

        assert_eq!(rows.len(), AssistantMode::all().len());
        assert!(rows.iter().all(|row| !row.overridden));
        assert_eq!(rows[1].id, "assistant.support");
        assert!(unused.is_empty());
    }

    #[test]
    fn test_overview_marks_overrides() {
        let workspace = TempDir::new().unwrap();
        let prompts = workspace.path().join(".fsi/prompts");
        fs::create_dir_all(&prompts).unwrap();
        fs::write(
            prompts.join("assistant.report.yml"),
            "id: assistant.report\ntitle: Terse reports\nsystem: Be brief.\ntemplate: \"{{context}}\"\n",
        )
        .unwrap();
        fs::write(
            prompts.join("assistant.stocks.yml"),
            "id: assistant.stocks\ntitle: Stocks\nsystem: s\ntemplate: t\n",
        )
        .unwrap();

        let (rows, unused) = prompt_overview(workspace.path()).unwrap();

        let report = rows
            .iter()
            .find(|row| row.mode == AssistantMode::ReportAnalyser)
            .unwrap();
        assert!(report.overridden);
        assert_eq!(report.title, "Terse reports");
        assert_eq!(unused, vec!["assistant.stocks"]);
    }
}
