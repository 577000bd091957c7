//! Configuration management for the FSI assistant.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.fsi/config.yaml` in the workspace, or `FSI_CONFIG`)
//! - Environment variables (`FSI_*`), which is how the hosting environment
//!   supplies service endpoints and credentials
//! - Command-line flags
//!
//! The application has no file format of its own beyond this YAML layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the chat client factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["azure-openai", "openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .fsi/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat model provider ("azure-openai", "openai", "ollama")
    pub provider: String,

    /// Model identifier (the deployment name for Azure)
    pub model: String,

    /// Sampling temperature sent with every chat call
    pub temperature: f32,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Chat model endpoint and credentials
    pub llm: LlmSettings,

    /// Search engine endpoint and credentials
    pub search: SearchSettings,

    /// Bulk indexing behaviour
    pub indexing: IndexingSettings,

    /// Per-mode retrieval overrides keyed by mode name
    /// ("transactions", "support", "report", "campaign")
    pub retrieval: HashMap<String, RetrievalOverride>,
}

/// Chat model endpoint and credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Base URL of the provider
    pub endpoint: Option<String>,

    /// API key
    pub api_key: Option<String>,

    /// API version (Azure only)
    pub api_version: Option<String>,

    /// Price per thousand completion tokens, in USD
    pub cost_per_1k_tokens: Option<f64>,
}

/// Search engine endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    /// Explicit engine URL (takes precedence over `cloud_id`)
    pub url: Option<String>,

    /// Elastic Cloud deployment identifier
    pub cloud_id: Option<String>,

    /// Basic-auth user
    pub user: Option<String>,

    /// Basic-auth password
    pub password: Option<String>,

    /// Identifier of the semantic expansion model used at query time
    pub model_id: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            url: None,
            cloud_id: None,
            user: None,
            password: None,
            model_id: ".elser_model_1".to_string(),
        }
    }
}

/// Bulk indexing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingSettings {
    /// Documents per `_bulk` request
    pub batch_size: usize,

    /// First retry delay in seconds
    pub initial_backoff_secs: u64,

    /// Upper bound for the retry delay in seconds
    pub max_backoff_secs: u64,

    /// Retries per batch before its documents are counted as failed
    pub max_retries: u32,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            initial_backoff_secs: 5,
            max_backoff_secs: 30,
            max_retries: 3,
        }
    }
}

/// Optional overrides for one assistant mode's retrieval profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalOverride {
    /// Minimum score (exclusive) a hit needs to be kept
    pub threshold: Option<f64>,

    /// Maximum number of hits requested from the engine
    pub size: Option<usize>,

    /// Token budget for the serialized context
    pub token_budget: Option<usize>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    llm: Option<LlmFileConfig>,
    search: Option<SearchFileConfig>,
    indexing: Option<IndexingSettings>,
    #[serde(default)]
    retrieval: HashMap<String, RetrievalOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmFileConfig {
    provider: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    #[serde(flatten)]
    settings: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFileConfig {
    url: Option<String>,
    cloud_id: Option<String>,
    user: Option<String>,
    password: Option<String>,
    model_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "azure-openai".to_string(),
            model: "fsi-demo".to_string(),
            temperature: 0.1,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            indexing: IndexingSettings::default(),
            retrieval: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `FSI_WORKSPACE`, `FSI_CONFIG`: workspace and config file locations
    /// - `FSI_PROVIDER`, `FSI_MODEL`: chat provider and model/deployment
    /// - `FSI_LLM_ENDPOINT`, `FSI_LLM_API_KEY`, `FSI_LLM_API_VERSION`
    /// - `FSI_SEARCH_URL`, `FSI_CLOUD_ID`, `FSI_SEARCH_USER`, `FSI_SEARCH_PASSWORD`
    /// - `RUST_LOG`, `NO_COLOR`
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve environment variables.
    pub fn load_with<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = lookup("FSI_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = lookup("FSI_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.fsi_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env(lookup);
        Ok(config)
    }

    /// Environment variables override the config file.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("FSI_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("FSI_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = lookup("FSI_LLM_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("FSI_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(version) = lookup("FSI_LLM_API_VERSION") {
            self.llm.api_version = Some(version);
        }
        if let Some(url) = lookup("FSI_SEARCH_URL") {
            self.search.url = Some(url);
        }
        if let Some(cloud_id) = lookup("FSI_CLOUD_ID") {
            self.search.cloud_id = Some(cloud_id);
        }
        if let Some(user) = lookup("FSI_SEARCH_USER") {
            self.search.user = Some(user);
        }
        if let Some(password) = lookup("FSI_SEARCH_PASSWORD") {
            self.search.password = Some(password);
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            let settings = llm.settings;
            result.llm.endpoint = settings.endpoint.or(result.llm.endpoint);
            result.llm.api_key = settings.api_key.or(result.llm.api_key);
            result.llm.api_version = settings.api_version.or(result.llm.api_version);
            result.llm.cost_per_1k_tokens = settings
                .cost_per_1k_tokens
                .or(result.llm.cost_per_1k_tokens);
        }

        if let Some(search) = config_file.search {
            result.search.url = search.url.or(result.search.url);
            result.search.cloud_id = search.cloud_id.or(result.search.cloud_id);
            result.search.user = search.user.or(result.search.user);
            result.search.password = search.password.or(result.search.password);
            if let Some(model_id) = search.model_id {
                result.search.model_id = model_id;
            }
        }

        if let Some(indexing) = config_file.indexing {
            result.indexing = indexing;
        }

        result.retrieval.extend(config_file.retrieval);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both the config file and the
    /// environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .fsi directory.
    pub fn fsi_dir(&self) -> PathBuf {
        self.workspace.join(".fsi")
    }

    /// Retrieval override for a mode, if one was configured.
    pub fn retrieval_override(&self, mode: &str) -> Option<&RetrievalOverride> {
        self.retrieval.get(mode)
    }

    /// Validate the chat provider settings.
    pub fn validate_llm(&self) -> AppResult<()> {
        let provider = self.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        match provider {
            "azure-openai" => {
                require(&self.llm.endpoint, "FSI_LLM_ENDPOINT")?;
                require(&self.llm.api_key, "FSI_LLM_API_KEY")?;
                require(&self.llm.api_version, "FSI_LLM_API_VERSION")?;
            }
            "openai" => {
                require(&self.llm.api_key, "FSI_LLM_API_KEY")?;
            }
            _ => {}
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }

    /// Validate the search engine settings.
    pub fn validate_search(&self) -> AppResult<()> {
        if self.search.url.is_none() && self.search.cloud_id.is_none() {
            return Err(AppError::Config(
                "Search engine location missing: set FSI_SEARCH_URL or FSI_CLOUD_ID".to_string(),
            ));
        }

        if self.search.user.is_some() != self.search.password.is_some() {
            return Err(AppError::Config(
                "FSI_SEARCH_USER and FSI_SEARCH_PASSWORD must be set together".to_string(),
            ));
        }

        if self.indexing.batch_size == 0 {
            return Err(AppError::Config(
                "indexing.batchSize must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn require(value: &Option<String>, env_var: &str) -> AppResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AppError::Config(format!(
            "Missing required setting: {}",
            env_var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "azure-openai");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.search.model_id, ".elser_model_1");
        assert_eq!(config.indexing.batch_size, 50);
        assert!(!config.verbose);
    }

    #[test]
    fn test_fsi_dir() {
        let config = AppConfig::default();
        assert!(config.fsi_dir().ends_with(".fsi"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_env_supplies_secrets() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_from(&[
            ("FSI_WORKSPACE", workspace.as_str()),
            ("FSI_CLOUD_ID", "demo:abc"),
            ("FSI_SEARCH_USER", "elastic"),
            ("FSI_SEARCH_PASSWORD", "changeme"),
            ("FSI_LLM_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.search.cloud_id.as_deref(), Some("demo:abc"));
        assert_eq!(config.search.user.as_deref(), Some("elastic"));
        assert_eq!(config.llm.api_key.as_deref(), Some("secret"));
        assert!(config.validate_search().is_ok());
    }

    #[test]
    fn test_yaml_then_env_precedence() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".fsi")).unwrap();
        std::fs::write(
            temp.path().join(".fsi/config.yaml"),
            r#"
llm:
  provider: openai
  model: gpt-4
  temperature: 0.3
  costPer1kTokens: 0.02
search:
  url: http://localhost:9200
  modelId: .elser_model_2
indexing:
  batchSize: 10
  initialBackoffSecs: 0
  maxBackoffSecs: 0
  maxRetries: 1
retrieval:
  report:
    threshold: 2.5
    tokenBudget: 4000
"#,
        )
        .unwrap();

        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_from(&[
            ("FSI_WORKSPACE", workspace.as_str()),
            ("FSI_MODEL", "gpt-4o"),
        ]))
        .unwrap();

        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.llm.cost_per_1k_tokens, Some(0.02));
        assert_eq!(config.search.url.as_deref(), Some("http://localhost:9200"));
        assert_eq!(config.search.model_id, ".elser_model_2");
        assert_eq!(config.indexing.batch_size, 10);

        let report = config.retrieval_override("report").unwrap();
        assert_eq!(report.threshold, Some(2.5));
        assert_eq!(report.token_budget, Some(4000));
        assert_eq!(report.size, None);
    }

    #[test]
    fn test_missing_workspace_is_error() {
        let result = AppConfig::load_with(env_from(&[(
            "FSI_WORKSPACE",
            "/definitely/not/a/real/workspace",
        )]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate_llm().is_err());
    }

    #[test]
    fn test_validate_azure_requires_secrets() {
        let mut config = AppConfig::default();
        assert!(config.validate_llm().is_err());

        config.llm.endpoint = Some("https://example.openai.azure.com".to_string());
        config.llm.api_key = Some("key".to_string());
        config.llm.api_version = Some("2023-05-15".to_string());
        assert!(config.validate_llm().is_ok());
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate_llm().is_ok());
    }

    #[test]
    fn test_validate_search_requires_location() {
        let mut config = AppConfig::default();
        assert!(config.validate_search().is_err());

        config.search.url = Some("http://localhost:9200".to_string());
        assert!(config.validate_search().is_ok());

        config.search.user = Some("elastic".to_string());
        assert!(config.validate_search().is_err());
    }
}
