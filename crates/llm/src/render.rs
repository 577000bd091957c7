//! Response rendering: one chat call, answer text plus estimated cost.

use crate::client::{ChatClient, ChatRequest};
use crate::tokens::estimate_tokens;
use fsi_core::AppResult;
use serde::Serialize;

/// Completion pricing used for the cost estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    /// USD charged per started block of 1000 completion tokens
    pub cost_per_1k_tokens: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            cost_per_1k_tokens: 0.06,
        }
    }
}

impl Pricing {
    /// Cost of a completion: `ceil(tokens / 1000) * cost_per_1k_tokens`.
    pub fn cost_for_tokens(&self, tokens: usize) -> f64 {
        tokens.div_ceil(1000) as f64 * self.cost_per_1k_tokens
    }

    /// Estimated cost of a completion text.
    pub fn estimate(&self, text: &str) -> AppResult<f64> {
        Ok(self.cost_for_tokens(estimate_tokens(text)?))
    }
}

/// A rendered model answer ready for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedResponse {
    /// Answer text
    pub text: String,

    /// Estimated cost of the completion in USD
    #[serde(rename = "estimatedCostUSD")]
    pub estimated_cost_usd: f64,

    /// Token estimate of the answer text
    pub completion_tokens: usize,

    /// Model that produced the answer
    pub model: String,
}

/// Send `request` to the model and price the answer.
///
/// Model failures propagate unchanged; there is no retry.
pub async fn render_response(
    client: &dyn ChatClient,
    request: &ChatRequest,
    pricing: &Pricing,
) -> AppResult<RenderedResponse> {
    tracing::info!(
        provider = client.provider_name(),
        turns = request.messages.len(),
        "Reaching out to chat model"
    );

    let response = client.complete(request).await?;
    let completion_tokens = estimate_tokens(&response.content)?;
    let estimated_cost_usd = pricing.cost_for_tokens(completion_tokens);

    tracing::info!(
        completion_tokens,
        estimated_cost_usd,
        "Chat response complete"
    );

    Ok(RenderedResponse {
        text: response.content,
        estimated_cost_usd,
        completion_tokens,
        model: response.model,
    })
}
