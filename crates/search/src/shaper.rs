//! Reshape raw search responses into scored results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One kept hit: its relevance score plus the allowlisted source fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "_score")]
    pub score: f64,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Extract results from a `_search` response.
///
/// Engine order is preserved. A hit is kept when its score is strictly above
/// `threshold`; only allowlisted `_source` fields survive. A response whose
/// `hits.total.value` is missing, non-numeric or zero yields no results, and
/// hits without a numeric `_score` are skipped. This never fails.
pub fn shape_results(raw: &Value, allowlist: &[&str], threshold: f64) -> Vec<SearchResult> {
    let total = raw
        .pointer("/hits/total/value")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if total == 0 {
        tracing::debug!("Search response reported no hits");
        return Vec::new();
    }

    let Some(hits) = raw.pointer("/hits/hits").and_then(Value::as_array) else {
        return Vec::new();
    };

    let results: Vec<SearchResult> = hits
        .iter()
        .filter_map(|hit| {
            let score = hit.get("_score").and_then(Value::as_f64)?;
            if score <= threshold {
                return None;
            }

            let mut fields = Map::new();
            if let Some(source) = hit.get("_source").and_then(Value::as_object) {
                for key in allowlist {
                    if let Some(value) = source.get(*key) {
                        fields.insert((*key).to_string(), value.clone());
                    }
                }
            }

            Some(SearchResult { score, fields })
        })
        .collect();

    tracing::debug!(
        "Kept {} of {} hits above threshold {}",
        results.len(),
        hits.len(),
        threshold
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(total: Value, hits: Value) -> Value {
        json!({ "hits": { "total": total, "hits": hits } })
    }

    #[test]
    fn test_threshold_is_exclusive_and_order_kept() {
        let raw = response(
            json!({"value": 3, "relation": "eq"}),
            json!([
                {"_score": 9.0, "_source": {"page": 4, "text": "a", "report_name": "x"}},
                {"_score": 5.0, "_source": {"page": 2, "text": "b"}},
                {"_score": 6.5, "_source": {"page": 7, "text": "c"}}
            ]),
        );

        let results = shape_results(&raw, &["page", "text"], 5.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 9.0);
        assert_eq!(results[1].fields["text"], "c");
        assert!(!results[0].fields.contains_key("report_name"));
    }

    #[test]
    fn test_zero_total_yields_empty() {
        let raw = response(
            json!({"value": 0}),
            json!([{"_score": 9.0, "_source": {"text": "stale"}}]),
        );
        assert!(shape_results(&raw, &["text"], 0.0).is_empty());
    }

    #[test]
    fn test_malformed_total_yields_empty() {
        let hits = json!([{"_score": 9.0, "_source": {"text": "a"}}]);
        for total in [json!(5), json!({"relation": "eq"}), json!({"value": "3"}), Value::Null] {
            let raw = response(total, hits.clone());
            assert!(shape_results(&raw, &["text"], 0.0).is_empty());
        }
        assert!(shape_results(&json!({}), &["text"], 0.0).is_empty());
    }

    #[test]
    fn test_hits_without_score_are_skipped() {
        let raw = response(
            json!({"value": 2}),
            json!([
                {"_score": null, "_source": {"text": "a"}},
                {"_score": 1.0, "_source": {"text": "b"}}
            ]),
        );

        let results = shape_results(&raw, &["text"], 0.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fields["text"], "b");
    }

    #[test]
    fn test_serializes_score_next_to_fields() {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Reset PIN"));
        let result = SearchResult { score: 2.5, fields };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, json!({"_score": 2.5, "title": "Reset PIN"}));
    }
}
