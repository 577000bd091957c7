//! Per-invocation connections built from configuration.

use fsi_core::{config::AppConfig, AppResult};
use fsi_llm::{create_client, ChatClient, Pricing, ProviderSettings};
use fsi_search::{BulkIndexer, BulkSettings, ElasticClient, ProgressReporter, Retriever, SearchBackend};
use std::sync::Arc;

/// Search engine handle shared by every command.
pub fn search_backend(config: &AppConfig) -> AppResult<Arc<dyn SearchBackend>> {
    config.validate_search()?;
    Ok(Arc::new(ElasticClient::from_settings(&config.search)?))
}

pub fn retriever(config: &AppConfig, backend: Arc<dyn SearchBackend>) -> Retriever {
    Retriever::new(backend, config.search.model_id.clone()).with_overrides(config.retrieval.clone())
}

pub fn indexer(config: &AppConfig, backend: Arc<dyn SearchBackend>, quiet: bool) -> BulkIndexer {
    let indexer = BulkIndexer::new(backend, BulkSettings::from(&config.indexing));
    if quiet {
        indexer
    } else {
        indexer.with_progress(stderr_progress())
    }
}

/// Progress lines on stderr, keeping stdout for results.
pub fn stderr_progress() -> ProgressReporter {
    ProgressReporter::new(Arc::new(|event| eprintln!("{}", event.format_simple())))
}

/// Chat client for the configured provider.
pub fn chat_client(config: &AppConfig) -> AppResult<Arc<dyn ChatClient>> {
    config.validate_llm()?;

    let settings = ProviderSettings {
        endpoint: config.llm.endpoint.as_deref(),
        api_key: config.llm.api_key.as_deref(),
        api_version: config.llm.api_version.as_deref(),
        deployment: Some(config.model.as_str()),
    };
    create_client(&config.provider, &settings)
}

pub fn pricing(config: &AppConfig) -> Pricing {
    config
        .llm
        .cost_per_1k_tokens
        .map(|cost_per_1k_tokens| Pricing { cost_per_1k_tokens })
        .unwrap_or_default()
}
