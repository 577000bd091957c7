//! Financial services assistant CLI
//!
//! Main entry point for the `fsi` command-line tool.
//! Answers questions over transactions, support articles and annual reports,
//! and seeds the demo indices.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, GenerateCommand, IngestCommand, PromptsCommand, ReportsCommand};
use fsi_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Financial services assistant - retrieval-augmented answers over banking data
#[derive(Parser, Debug)]
#[command(name = "fsi")]
#[command(about = "Retrieval-augmented answers over banking data", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "FSI_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "FSI_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Chat provider (azure-openai, openai, ollama)
    #[arg(short, long, global = true, env = "FSI_PROVIDER")]
    provider: Option<String>,

    /// Model identifier (deployment name for Azure)
    #[arg(short, long, global = true, env = "FSI_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the assistant a question
    Ask(AskCommand),

    /// List the annual reports available for analysis
    Reports(ReportsCommand),

    /// Ingest an annual report's extracted text
    Ingest(IngestCommand),

    /// Seed demo data
    Generate(GenerateCommand),

    /// Show the prompt each assistant uses
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("FSI assistant starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Reports(_) => "reports",
        Commands::Ingest(_) => "ingest",
        Commands::Generate(_) => "generate",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Reports(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Generate(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
