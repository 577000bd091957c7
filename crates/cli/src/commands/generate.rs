//! Generate command handler: seed the demo indices.

use super::session;
use clap::{Args, Subcommand};
use fsi_core::{config::AppConfig, AppResult};
use fsi_search::seed::{
    generate_transactions, seed_campaigns, seed_transactions, GeneratorSettings,
};
use fsi_search::{BulkReport, ProgressReporter};

/// Seed demo data
#[derive(Args, Debug)]
pub struct GenerateCommand {
    #[command(subcommand)]
    pub action: GenerateAction,
}

#[derive(Subcommand, Debug)]
pub enum GenerateAction {
    /// Replace the transactions index with synthetic transactions
    Transactions(GenerateTransactionsCommand),
    /// Write the campaign catalogue
    Campaigns(GenerateCampaignsCommand),
}

/// Generate synthetic transactions
#[derive(Args, Debug)]
pub struct GenerateTransactionsCommand {
    /// Months of history, 30 days each (1-10)
    #[arg(long, default_value_t = 3)]
    pub months: u32,

    /// Lower bound of the per-day transaction draw
    #[arg(long, default_value_t = 3.0)]
    pub min_per_day: f64,

    /// Upper bound of the per-day transaction draw (at most 10)
    #[arg(long, default_value_t = 3.0)]
    pub max_per_day: f64,

    /// Random seed (default: random, printed so runs can be repeated)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the transactions instead of indexing them
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Write the campaign catalogue
#[derive(Args, Debug)]
pub struct GenerateCampaignsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            GenerateAction::Transactions(cmd) => cmd.execute(config).await,
            GenerateAction::Campaigns(cmd) => cmd.execute(config).await,
        }
    }
}

impl GenerateTransactionsCommand {
    pub fn settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            months: self.months,
            min_per_day: self.min_per_day,
            max_per_day: self.max_per_day,
            end_date: chrono::Local::now().date_naive(),
            seed: self.seed.unwrap_or_else(rand::random::<u64>),
        }
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let settings = self.settings();
        tracing::info!(seed = settings.seed, "Executing generate transactions command");

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            session::stderr_progress()
        };
        let generated = generate_transactions(&settings, &progress)?;

        if self.dry_run {
            if self.json {
                println!("{}", serde_json::to_string_pretty(&generated.transactions)?);
            } else {
                for tx in &generated.transactions {
                    println!(
                        "{}  {:>12}  {:<12} {:>6} {:>8}  {}",
                        tx.transaction_date,
                        tx.account_number,
                        tx.transaction_type.as_str(),
                        tx.value,
                        tx.balance,
                        tx.description
                    );
                }
                println!(
                    "Generated {} transactions (seed {})",
                    generated.transactions.len(),
                    settings.seed
                );
            }
            return Ok(());
        }

        let backend = session::search_backend(config)?;
        let indexer = session::indexer(config, backend.clone(), self.json);
        let report = seed_transactions(backend.as_ref(), &indexer, &generated.transactions).await?;

        print_report(&report, "transactions", Some(settings.seed), self.json)
    }
}

impl GenerateCampaignsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing generate campaigns command");

        let backend = session::search_backend(config)?;
        let indexer = session::indexer(config, backend, self.json);
        let report = seed_campaigns(&indexer).await?;

        print_report(&report, "campaigns", None, self.json)
    }
}

fn print_report(report: &BulkReport, what: &str, seed: Option<u64>, json: bool) -> AppResult<()> {
    if json {
        let output = serde_json::json!({
            "kind": what,
            "seed": seed,
            "indexed": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Indexed {} {}", report.summary(), what);
    if let Some(seed) = seed {
        println!("Seed: {}", seed);
    }
    for error in &report.errors {
        eprintln!("  failed: {}", error);
    }
    Ok(())
}
