//! Ask command handler.
//!
//! Retrieves context for the chosen assistant, asks the chat model, and
//! optionally follows up with matching special offers.

use super::session;
use clap::Args;
use fsi_core::{config::AppConfig, AppError, AppResult, AssistantMode};
use fsi_llm::{render_response, ChatClient, ChatRequest, Pricing, RenderedResponse};
use fsi_prompt::{assemble_prompt, resolve_prompt};
use fsi_search::{QueryParams, Retriever, SearchResult};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Ask the assistant a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Assistant to use: transactions, support or report
    pub mode: AssistantMode,

    /// The question to ask (omit with --interactive)
    pub question: Option<String>,

    /// Number of days of transactions to search
    #[arg(long, default_value_t = 90)]
    pub days: i64,

    /// Report to analyse (see `fsi reports`)
    #[arg(long)]
    pub report: Option<String>,

    /// Opt in to see special offers matching your transactions
    #[arg(long)]
    pub offers: bool,

    /// Keep asking questions from stdin with the same settings
    #[arg(short, long)]
    pub interactive: bool,

    /// Maximum tokens in the answer
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Settings that stay fixed across the questions of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub mode: AssistantMode,
    pub params: QueryParams,
    pub offers_opt_in: bool,
}

impl SessionContext {
    /// Build a session, checking the mode can answer questions.
    pub fn new(
        mode: AssistantMode,
        days: i64,
        report: Option<String>,
        offers: bool,
    ) -> AppResult<Self> {
        let params = match mode {
            AssistantMode::TransactionAnalyser => QueryParams::with_days(days),
            AssistantMode::ReportAnalyser => QueryParams {
                days: None,
                report_name: report,
            },
            AssistantMode::CustomerSupport => QueryParams::default(),
            AssistantMode::Campaign => {
                return Err(AppError::InvalidQuery(
                    "campaign search runs only as a follow-up to transactions".to_string(),
                ))
            }
        };

        Ok(Self {
            mode,
            params,
            offers_opt_in: offers && mode == AssistantMode::TransactionAnalyser,
        })
    }
}

/// Special offers matched to a transaction answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAnswer {
    pub campaigns: Vec<SearchResult>,
    pub answer: RenderedResponse,
}

/// Everything produced for one question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantAnswer {
    pub mode: AssistantMode,
    pub question: String,
    pub answer: RenderedResponse,
    pub results: Vec<SearchResult>,
    pub context_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<OfferAnswer>,
}

/// Retrieval plus chat model, configured once per invocation.
pub struct Assistant {
    retriever: Retriever,
    client: Arc<dyn ChatClient>,
    workspace: PathBuf,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    pricing: Pricing,
}

impl Assistant {
    pub fn new(
        retriever: Retriever,
        client: Arc<dyn ChatClient>,
        workspace: PathBuf,
        model: impl Into<String>,
        temperature: f32,
        pricing: Pricing,
    ) -> Self {
        Self {
            retriever,
            client,
            workspace,
            model: model.into(),
            temperature,
            max_tokens: None,
            pricing,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Answer one question within a session.
    pub async fn answer(&self, session: &SessionContext, question: &str) -> AppResult<AssistantAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidQuery("question must not be empty".to_string()));
        }

        let context = self
            .retriever
            .retrieve(session.mode, question, &session.params)
            .await?;
        tracing::info!("Retrieved {} results", context.len());

        let answer = self.complete(session.mode, &context.serialized, question).await?;

        let offers = if session.offers_opt_in {
            self.offers(&context.serialized).await?
        } else {
            None
        };

        Ok(AssistantAnswer {
            mode: session.mode,
            question: question.to_string(),
            answer,
            results: context.results,
            context_truncated: context.truncated,
            offers,
        })
    }

    async fn offers(&self, transactions: &str) -> AppResult<Option<OfferAnswer>> {
        let campaigns = self.retriever.find_campaigns(transactions).await?;
        if campaigns.is_empty() {
            tracing::debug!("No matching campaigns");
            return Ok(None);
        }

        let answer = self
            .complete(AssistantMode::Campaign, &campaigns.serialized, "")
            .await?;

        Ok(Some(OfferAnswer {
            campaigns: campaigns.results,
            answer,
        }))
    }

    async fn complete(
        &self,
        mode: AssistantMode,
        context: &str,
        question: &str,
    ) -> AppResult<RenderedResponse> {
        let definition = resolve_prompt(&self.workspace, mode)?;
        let built = assemble_prompt(&definition, context, question)?;

        let mut request =
            ChatRequest::new(&self.model, built.turns).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        render_response(self.client.as_ref(), &request, &self.pricing).await
    }
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let session = SessionContext::new(self.mode, self.days, self.report.clone(), self.offers)?;

        let backend = session::search_backend(config)?;
        let client = session::chat_client(config)?;
        let assistant = Assistant::new(
            session::retriever(config, backend),
            client,
            config.workspace.clone(),
            config.model.clone(),
            self.temperature.unwrap_or(config.temperature),
            session::pricing(config),
        )
        .with_max_tokens(self.max_tokens);

        if self.interactive {
            return self.run_interactive(&assistant, &session).await;
        }

        let question = self
            .question
            .as_deref()
            .ok_or_else(|| AppError::InvalidQuery("No question provided".to_string()))?;

        let answer = assistant.answer(&session, question).await?;
        self.print(&answer)
    }

    async fn run_interactive(&self, assistant: &Assistant, session: &SessionContext) -> AppResult<()> {
        if let Some(question) = self.question.as_deref() {
            let answer = assistant.answer(session, question).await?;
            self.print(&answer)?;
        }

        let stdin = std::io::stdin();
        loop {
            if !self.json {
                print!("{}> ", session.mode.key());
                std::io::stdout().flush()?;
            }

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if matches!(question, "exit" | "quit") {
                break;
            }

            match assistant.answer(session, question).await {
                Ok(answer) => self.print(&answer)?,
                // keep the session alive on per-question failures
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        Ok(())
    }

    fn print(&self, answer: &AssistantAnswer) -> AppResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(answer)?);
            return Ok(());
        }

        println!("Retrieved {} results", answer.results.len());
        println!();
        println!("{}", answer.answer.text);
        println!();
        println!("Calculating response cost: ${}", answer.answer.estimated_cost_usd);

        if let Some(offers) = &answer.offers {
            println!();
            println!("Special offers:");
            println!("{}", offers.answer.text);
            for campaign in &offers.campaigns {
                println!("  - {}", serde_json::to_string(campaign)?);
            }
        }

        if !answer.results.is_empty() {
            println!();
            println!("{}:", results_heading(answer.mode));
            for result in &answer.results {
                println!("  {}", serde_json::to_string(result)?);
            }
        }

        Ok(())
    }
}

fn results_heading(mode: AssistantMode) -> &'static str {
    match mode {
        AssistantMode::TransactionAnalyser => "Transactions",
        AssistantMode::CustomerSupport => "Articles",
        AssistantMode::ReportAnalyser => "Report passages",
        AssistantMode::Campaign => "Campaigns",
    }
}
