//! OpenAI-style chat completion provider.
//!
//! Covers two flavours of the same wire format:
//! - Azure OpenAI: `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=`
//!   authenticated with an `api-key` header
//! - OpenAI-compatible: `{base_url}/chat/completions` with a bearer token

use crate::client::{ChatClient, ChatRequest, ChatResponse, ChatUsage, PromptTurn};
use fsi_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Flavor {
    Azure {
        deployment: String,
        api_version: String,
    },
    OpenAi,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [PromptTurn],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI-style chat client.
pub struct OpenAiClient {
    name: &'static str,
    base_url: String,
    api_key: String,
    flavor: Flavor,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create an Azure OpenAI client bound to one deployment.
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: "azure-openai",
            base_url: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            flavor: Flavor::Azure {
                deployment: deployment.into(),
                api_version: api_version.into(),
            },
            client: reqwest::Client::new(),
        }
    }

    /// Create a client for any OpenAI-compatible endpoint.
    pub fn openai(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            name: "openai",
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            flavor: Flavor::OpenAi,
            client: reqwest::Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        match &self.flavor {
            Flavor::Azure {
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, deployment, api_version
            ),
            Flavor::OpenAi => format!("{}/chat/completions", self.base_url),
        }
    }

    fn to_api_request<'a>(&self, request: &'a ChatRequest) -> ApiRequest<'a> {
        // Azure routes by deployment, so the model field is omitted there.
        let model = match self.flavor {
            Flavor::Azure { .. } => None,
            Flavor::OpenAi => Some(request.model.as_str()),
        };

        ApiRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn convert_response(
        &self,
        response: ApiResponse,
        requested_model: &str,
    ) -> AppResult<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("No choices in chat response".to_string()))?;

        let usage = response
            .usage
            .map(|u| ChatUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let model = if response.model.is_empty() {
            requested_model.to_string()
        } else {
            response.model
        };

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        self.name
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!(provider = self.name, model = %request.model, "Sending chat request");
        tracing::debug!("Request: {:?}", request);

        let body = self.to_api_request(request);
        let builder = self.client.post(self.completions_url()).json(&body);
        let builder = match self.flavor {
            Flavor::Azure { .. } => builder.header("api-key", &self.api_key),
            Flavor::OpenAi => builder.bearer_auth(&self.api_key),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send chat request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(%status, "Chat provider returned error");
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                self.name, status, error_text
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse chat response: {}", e)))?;

        let converted = self.convert_response(api_response, &request.model)?;

        tracing::info!(
            completion_tokens = converted.usage.completion_tokens,
            "Received chat completion"
        );

        Ok(converted)
    }
}
