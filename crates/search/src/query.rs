//! Hybrid query construction.
//!
//! Every query ORs a semantic-expansion clause with a plain lexical match per
//! text field, then ANDs whatever filter the mode requires.

use crate::profile::{FilterKind, ModeProfile};
use fsi_core::{AppError, AppResult};
use serde_json::{json, Value};

/// Optional scoping parameters supplied alongside a question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Look-back window in days (transactions only)
    pub days: Option<i64>,

    /// Report to restrict the search to (reports only)
    pub report_name: Option<String>,
}

impl QueryParams {
    pub fn with_days(days: i64) -> Self {
        Self {
            days: Some(days),
            report_name: None,
        }
    }

    pub fn with_report(report_name: impl Into<String>) -> Self {
        Self {
            days: None,
            report_name: Some(report_name.into()),
        }
    }
}

/// Name of the inference field populated by the ingest pipeline for `field`.
pub fn expansion_field(field: &str) -> String {
    format!("ml.inference.{}_expanded.predicted_value", field)
}

/// Build the `bool` query for a question.
///
/// Fails with `InvalidQuery` when the mode needs a filter parameter that is
/// missing or unusable.
pub fn build_query(
    question: &str,
    profile: &ModeProfile,
    params: &QueryParams,
    model_id: &str,
) -> AppResult<Value> {
    let mut should = Vec::with_capacity(profile.text_fields.len() * 2);
    for field in profile.text_fields {
        should.push(json!({
            "text_expansion": {
                expansion_field(field): {
                    "model_id": model_id,
                    "model_text": question,
                }
            }
        }));
    }
    for field in profile.text_fields {
        should.push(json!({ "match": { *field: question } }));
    }

    let mut bool_query = json!({ "should": should });

    match profile.filter {
        FilterKind::None => {}
        FilterKind::DateWindow => {
            let days = params.days.filter(|d| *d > 0).ok_or_else(|| {
                AppError::InvalidQuery(format!(
                    "days must be a positive number, got {:?}",
                    params.days
                ))
            })?;
            bool_query["filter"] = json!([
                { "range": { "transaction_date": { "gte": format!("now-{}d", days) } } }
            ]);
        }
        FilterKind::ReportName => {
            let report_name = params
                .report_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    AppError::InvalidQuery("report name must not be empty".to_string())
                })?;
            bool_query["filter"] = json!([{ "term": { "report_name": report_name } }]);
        }
    }

    Ok(json!({ "bool": bool_query }))
}

/// Full `_search` request body: query, result cap and source allowlist.
pub fn build_search_body(
    question: &str,
    profile: &ModeProfile,
    params: &QueryParams,
    model_id: &str,
) -> AppResult<Value> {
    let query = build_query(question, profile, params, model_id)?;

    Ok(json!({
        "query": query,
        "size": profile.size,
        "_source": profile.allowlist,
    }))
}

/// Aggregation body listing distinct report names.
pub fn report_names_body() -> Value {
    json!({
        "size": 0,
        "query": { "match_all": {} },
        "aggs": {
            "reports": {
                "terms": { "field": "report_name", "size": 1000 }
            }
        }
    })
}
