//! Ingest command handler.

use super::session;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use fsi_core::{config::AppConfig, AppError, AppResult};
use fsi_search::ingest::{
    chunker::{DEFAULT_MAX_CHARS, DEFAULT_WORDS_PER_SECTION},
    ingest_report, read_report_text, ReportUpload,
};
use fsi_search::ChunkStrategy;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Pack whole sentences up to --max-chars
    Sentences,
    /// Even runs of about --words-per-section words
    Words,
}

/// Ingest an annual report's extracted text
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Text file with pages separated by form feeds
    pub path: PathBuf,

    /// Name the report is listed and filtered under
    #[arg(long)]
    pub report_name: String,

    /// Publication date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub publish_date: Option<NaiveDate>,

    /// Passage splitting strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::Sentences)]
    pub strategy: StrategyArg,

    /// Maximum passage length in characters (sentences strategy)
    #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
    pub max_chars: usize,

    /// Target words per passage (words strategy)
    #[arg(long, default_value_t = DEFAULT_WORDS_PER_SECTION)]
    pub words_per_section: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub fn chunk_strategy(&self) -> AppResult<ChunkStrategy> {
        match self.strategy {
            StrategyArg::Sentences if self.max_chars == 0 => Err(AppError::Ingest(
                "--max-chars must be at least 1".to_string(),
            )),
            StrategyArg::Words if self.words_per_section == 0 => Err(AppError::Ingest(
                "--words-per-section must be at least 1".to_string(),
            )),
            StrategyArg::Sentences => Ok(ChunkStrategy::Sentences {
                max_chars: self.max_chars,
            }),
            StrategyArg::Words => Ok(ChunkStrategy::Words {
                words_per_section: self.words_per_section,
            }),
        }
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.path);

        let upload = ReportUpload {
            report_name: self.report_name.clone(),
            publish_date: self
                .publish_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            strategy: self.chunk_strategy()?,
        };
        let text = read_report_text(&self.path)?;

        let backend = session::search_backend(config)?;
        let indexer = session::indexer(config, backend, self.json);
        let report = ingest_report(&indexer, &upload, &text).await?;

        if self.json {
            let output = serde_json::json!({
                "reportName": upload.report_name,
                "publishDate": upload.publish_date,
                "indexed": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} passages of '{}'",
                report.summary(),
                upload.report_name
            );
            for error in &report.errors {
                eprintln!("  failed: {}", error);
            }
        }

        Ok(())
    }
}
