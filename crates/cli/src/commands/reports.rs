//! Reports command handler.

use super::session;
use clap::Args;
use fsi_core::{config::AppConfig, AppResult};

/// List the annual reports available for analysis
#[derive(Args, Debug)]
pub struct ReportsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReportsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing reports command");

        let backend = session::search_backend(config)?;
        let reports = session::retriever(config, backend).list_reports().await?;

        if self.json {
            let output = serde_json::json!({ "reports": reports });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if reports.is_empty() {
            println!("No reports ingested yet. Use 'fsi ingest' to add one.");
        } else {
            for name in &reports {
                println!("{}", name);
            }
        }

        Ok(())
    }
}
