//! Chat provider factory.
//!
//! Builds a chat client from a provider name and the endpoint/credential
//! settings resolved from configuration.

use crate::client::ChatClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use fsi_core::{AppError, AppResult};
use std::sync::Arc;

/// Endpoint and credentials needed to construct a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings<'a> {
    /// Base URL of the provider
    pub endpoint: Option<&'a str>,

    /// API key (Azure and OpenAI)
    pub api_key: Option<&'a str>,

    /// API version (Azure only)
    pub api_version: Option<&'a str>,

    /// Deployment name (Azure only)
    pub deployment: Option<&'a str>,
}

/// Create a chat client based on the provider name.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// endpoint, key, version or deployment is missing.
pub fn create_client(
    provider: &str,
    settings: &ProviderSettings<'_>,
) -> AppResult<Arc<dyn ChatClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!("Creating chat client for provider {}", provider_type.as_str());

    match provider_type {
        ProviderType::AzureOpenAI => {
            let endpoint = required(settings.endpoint, "Azure OpenAI provider requires an endpoint")?;
            let api_key = required(settings.api_key, "Azure OpenAI provider requires API key")?;
            let api_version =
                required(settings.api_version, "Azure OpenAI provider requires an API version")?;
            let deployment =
                required(settings.deployment, "Azure OpenAI provider requires a deployment")?;
            Ok(Arc::new(OpenAiClient::azure(
                endpoint,
                deployment,
                api_version,
                api_key,
            )))
        }
        ProviderType::OpenAI => {
            let api_key = required(settings.api_key, "OpenAI provider requires API key")?;
            let endpoint = settings.endpoint.unwrap_or("https://api.openai.com/v1");
            Ok(Arc::new(OpenAiClient::openai(endpoint, api_key)))
        }
        ProviderType::Ollama => {
            let base_url = settings.endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> AppResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_message(result: AppResult<Arc<dyn ChatClient>>) -> String {
        match result {
            Err(err) => err.to_string(),
            Ok(_) => panic!("Expected an error"),
        }
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ProviderSettings::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_azure_client() {
        let settings = ProviderSettings {
            endpoint: Some("https://fsi.openai.azure.com"),
            api_key: Some("key"),
            api_version: Some("2023-05-15"),
            deployment: Some("fsi-demo"),
        };
        let client = create_client("azure-openai", &settings).unwrap();
        assert_eq!(client.provider_name(), "azure-openai");
    }

    #[test]
    fn test_azure_requires_deployment() {
        let settings = ProviderSettings {
            endpoint: Some("https://fsi.openai.azure.com"),
            api_key: Some("key"),
            api_version: Some("2023-05-15"),
            deployment: None,
        };
        let message = error_message(create_client("azure-openai", &settings));
        assert!(message.contains("requires a deployment"));
    }

    #[test]
    fn test_openai_requires_api_key() {
        let message = error_message(create_client("openai", &ProviderSettings::default()));
        assert!(message.contains("OpenAI provider requires API key"));
    }

    #[test]
    fn test_unknown_provider() {
        let message = error_message(create_client("unknown", &ProviderSettings::default()));
        assert!(message.contains("Unknown provider"));
    }
}
