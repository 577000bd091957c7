//! Retrieval orchestration: search, shape, serialize, budget.

use crate::backend::SearchBackend;
use crate::profile::{ModeProfile, REPORTS_INDEX};
use crate::query::{build_search_body, report_names_body, QueryParams};
use crate::shaper::{shape_results, SearchResult};
use fsi_core::config::RetrievalOverride;
use fsi_core::{AppResult, AssistantMode};
use fsi_llm::tokens::fit_to_token_budget;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Context retrieved for one question. Built fresh per query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalContext {
    /// Kept results in engine order
    pub results: Vec<SearchResult>,

    /// Compact JSON of `results`, possibly cut to the mode's token budget
    pub serialized: String,

    /// Whether `serialized` was cut
    pub truncated: bool,
}

impl RetrievalContext {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            serialized: "[]".to_string(),
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

/// Runs mode-specific searches against a backend.
#[derive(Clone)]
pub struct Retriever {
    backend: Arc<dyn SearchBackend>,
    model_id: String,
    overrides: HashMap<String, RetrievalOverride>,
}

impl Retriever {
    pub fn new(backend: Arc<dyn SearchBackend>, model_id: impl Into<String>) -> Self {
        Self {
            backend,
            model_id: model_id.into(),
            overrides: HashMap::new(),
        }
    }

    /// Per-mode overrides keyed by [`AssistantMode::key`].
    pub fn with_overrides(mut self, overrides: HashMap<String, RetrievalOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    /// The effective profile for a mode.
    pub fn profile(&self, mode: AssistantMode) -> ModeProfile {
        ModeProfile::for_mode(mode).with_override(self.overrides.get(mode.key()))
    }

    /// Retrieve the context for a question.
    ///
    /// An empty result set is not an error; the context is simply `[]`.
    pub async fn retrieve(
        &self,
        mode: AssistantMode,
        question: &str,
        params: &QueryParams,
    ) -> AppResult<RetrievalContext> {
        let profile = self.profile(mode);
        let body = build_search_body(question, &profile, params, &self.model_id)?;

        tracing::info!(mode = mode.key(), index = profile.index, "Searching");
        let raw = self.backend.search(profile.index, &body).await?;

        let results = shape_results(&raw, profile.allowlist, profile.threshold);
        let context = serialize_context(results, profile.token_budget)?;

        tracing::info!(
            results = context.len(),
            truncated = context.truncated,
            "Retrieved context"
        );

        Ok(context)
    }

    /// Find the campaign best matching some text, typically the serialized
    /// transaction context.
    pub async fn find_campaigns(&self, text: &str) -> AppResult<RetrievalContext> {
        self.retrieve(AssistantMode::Campaign, text, &QueryParams::default())
            .await
    }

    /// Names of all ingested reports.
    pub async fn list_reports(&self) -> AppResult<Vec<String>> {
        let raw = self.backend.search(REPORTS_INDEX, &report_names_body()).await?;
        Ok(bucket_keys(&raw, "reports"))
    }
}

fn serialize_context(
    results: Vec<SearchResult>,
    token_budget: Option<usize>,
) -> AppResult<RetrievalContext> {
    if results.is_empty() {
        return Ok(RetrievalContext::empty());
    }

    let serialized = serde_json::to_string(&results)?;

    let (serialized, truncated) = match token_budget {
        Some(budget) => {
            let fitted = fit_to_token_budget(&serialized, budget)?;
            if fitted.truncated {
                tracing::debug!(tokens = fitted.tokens, budget, "Context cut to token budget");
            }
            (fitted.text, fitted.truncated)
        }
        None => (serialized, false),
    };

    Ok(RetrievalContext {
        results,
        serialized,
        truncated,
    })
}

/// Keys of a `terms` aggregation's buckets; missing or malformed parts yield
/// nothing.
fn bucket_keys(raw: &Value, aggregation: &str) -> Vec<String> {
    raw.pointer(&format!("/aggregations/{}/buckets", aggregation))
        .and_then(Value::as_array)
        .map(|buckets| {
            buckets
                .iter()
                .filter_map(|b| b.get("key").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{hits_response, MockBackend};
    use crate::profile::{CAMPAIGNS_INDEX, SUPPORT_INDEX, TRANSACTIONS_INDEX};
    use fsi_core::AppError;
    use fsi_llm::tokens::estimate_tokens;
    use serde_json::json;

    fn retriever(backend: MockBackend) -> (Retriever, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        (Retriever::new(backend.clone(), ".elser_model_1"), backend)
    }

    #[tokio::test]
    async fn test_transaction_retrieval() {
        let response = hits_response(&[
            (
                8.2,
                json!({"description": "Purchase at Tesco supermarket, for €42 on 2024-03-02",
                       "value": 42, "entity": "Tesco", "internal_id": "x"}),
            ),
            (0.0, json!({"description": "irrelevant"})),
        ]);
        let (retriever, backend) = retriever(MockBackend::new().with_response(TRANSACTIONS_INDEX, response));

        let context = retriever
            .retrieve(
                AssistantMode::TransactionAnalyser,
                "What did I spend on groceries?",
                &QueryParams::with_days(30),
            )
            .await
            .unwrap();

        assert_eq!(context.len(), 1);
        assert!(context.results[0].score > 0.0);
        assert!(!context.results[0].fields.contains_key("internal_id"));
        assert!(context.serialized.starts_with(r#"[{"_score":8.2"#));

        let searches = backend.searches.lock().unwrap();
        let (index, body) = &searches[0];
        assert_eq!(index, TRANSACTIONS_INDEX);
        assert_eq!(body["size"], 100);
        assert_eq!(
            body["query"]["bool"]["filter"][0]["range"]["transaction_date"]["gte"],
            "now-30d"
        );
    }

    #[tokio::test]
    async fn test_zero_hits_gives_empty_context() {
        let response = json!({"hits": {"total": {"value": 0}, "hits": []}});
        let (retriever, _) = retriever(MockBackend::new().with_response(SUPPORT_INDEX, response));

        let context = retriever
            .retrieve(AssistantMode::CustomerSupport, "How do I reset my PIN?", &QueryParams::default())
            .await
            .unwrap();

        assert!(context.is_empty());
        assert_eq!(context.serialized, "[]");
    }

    #[tokio::test]
    async fn test_empty_report_name_never_searches() {
        let (retriever, backend) = retriever(MockBackend::new());

        let result = retriever
            .retrieve(AssistantMode::ReportAnalyser, "revenue", &QueryParams::with_report(""))
            .await;

        assert!(matches!(result, Err(AppError::InvalidQuery(_))));
        assert_eq!(backend.search_count(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let (retriever, _) = retriever(MockBackend::new());

        let result = retriever
            .retrieve(AssistantMode::CustomerSupport, "q", &QueryParams::default())
            .await;

        assert!(matches!(result, Err(AppError::Search(_))));
    }

    #[tokio::test]
    async fn test_support_context_respects_budget() {
        let body = "lorem ipsum dolor sit amet ".repeat(40);
        let hits: Vec<(f64, Value)> = (0..20)
            .map(|i| (1.0 + i as f64, json!({"title": format!("Article {}", i), "body_content": body})))
            .collect();
        let (retriever, _) = retriever(MockBackend::new().with_response(SUPPORT_INDEX, hits_response(&hits)));

        let mut overrides = HashMap::new();
        overrides.insert(
            "support".to_string(),
            RetrievalOverride {
                token_budget: Some(300),
                ..Default::default()
            },
        );
        let retriever = retriever.with_overrides(overrides);

        let context = retriever
            .retrieve(AssistantMode::CustomerSupport, "q", &QueryParams::default())
            .await
            .unwrap();

        assert!(context.truncated);
        assert!(estimate_tokens(&context.serialized).unwrap() <= 300);
        assert_eq!(context.results.len(), 20);
    }

    #[tokio::test]
    async fn test_campaign_search_uses_context_text() {
        let response = hits_response(&[(
            7.0,
            json!({"campaign_name": "Grocery cashback", "campaign_description": "5% back"}),
        )]);
        let (retriever, backend) = retriever(MockBackend::new().with_response(CAMPAIGNS_INDEX, response));

        let campaigns = retriever.find_campaigns(r#"[{"entity":"Tesco"}]"#).await.unwrap();
        assert_eq!(campaigns.len(), 1);

        let searches = backend.searches.lock().unwrap();
        assert_eq!(searches[0].1["size"], 1);
        assert_eq!(searches[0].1["query"]["bool"]["should"][2]["match"]["campaign_description"], r#"[{"entity":"Tesco"}]"#);
    }

    #[tokio::test]
    async fn test_list_reports() {
        let response = json!({
            "hits": {"total": {"value": 12}, "hits": []},
            "aggregations": {"reports": {"buckets": [
                {"key": "ACME 2022", "doc_count": 5},
                {"key": "ACME 2023", "doc_count": 7}
            ]}}
        });
        let (retriever, _) = retriever(MockBackend::new().with_response(REPORTS_INDEX, response));

        let reports = retriever.list_reports().await.unwrap();
        assert_eq!(reports, vec!["ACME 2022", "ACME 2023"]);
    }

    #[test]
    fn test_bucket_keys_tolerates_missing_aggregation() {
        assert!(bucket_keys(&json!({}), "reports").is_empty());
    }
}
