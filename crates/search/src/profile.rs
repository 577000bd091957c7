//! Per-mode retrieval profiles.
//!
//! A profile fixes everything about a mode's search: the index, which text
//! fields are matched, which source fields are returned, the result cap, the
//! relevance threshold and the optional token budget for the serialized
//! context.

use fsi_core::config::RetrievalOverride;
use fsi_core::AssistantMode;

pub const TRANSACTIONS_INDEX: &str = "search-transactions";
pub const SUPPORT_INDEX: &str = "search-customer-support";
pub const REPORTS_INDEX: &str = "search-annual-reports";
pub const CAMPAIGNS_INDEX: &str = "search-campaigns";

/// Ingest pipeline applied to report passages.
pub const REPORTS_PIPELINE: &str = "search-annual-reports";

/// Filter clause shape required by a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    None,
    /// `transaction_date >= now - days`
    DateWindow,
    /// exact `report_name`
    ReportName,
}

/// Retrieval settings for one assistant mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeProfile {
    pub mode: AssistantMode,
    pub index: &'static str,
    /// Raw text fields; each gets an expansion clause and a match clause
    pub text_fields: &'static [&'static str],
    /// Source fields kept on each result
    pub allowlist: &'static [&'static str],
    pub size: usize,
    pub threshold: f64,
    pub token_budget: Option<usize>,
    pub filter: FilterKind,
}

impl ModeProfile {
    /// Default profile for a mode.
    pub fn for_mode(mode: AssistantMode) -> Self {
        match mode {
            AssistantMode::TransactionAnalyser => Self {
                mode,
                index: TRANSACTIONS_INDEX,
                text_fields: &["description"],
                allowlist: &[
                    "transaction_date",
                    "account_number",
                    "balance",
                    "description",
                    "transaction_type",
                    "value",
                    "entity",
                ],
                size: 100,
                threshold: 0.0,
                token_budget: None,
                filter: FilterKind::DateWindow,
            },
            AssistantMode::CustomerSupport => Self {
                mode,
                index: SUPPORT_INDEX,
                text_fields: &["body_content"],
                allowlist: &["title", "body_content"],
                size: 20,
                threshold: 0.0,
                token_budget: Some(10_000),
                filter: FilterKind::None,
            },
            AssistantMode::ReportAnalyser => Self {
                mode,
                index: REPORTS_INDEX,
                text_fields: &["text"],
                allowlist: &["page", "text"],
                size: 20,
                threshold: 5.0,
                token_budget: Some(8_000),
                filter: FilterKind::ReportName,
            },
            AssistantMode::Campaign => Self {
                mode,
                index: CAMPAIGNS_INDEX,
                text_fields: &["campaign_description", "campaign_name"],
                allowlist: &["campaign_name", "campaign_description"],
                size: 1,
                threshold: 5.0,
                token_budget: None,
                filter: FilterKind::None,
            },
        }
    }

    /// Apply configured overrides on top of the defaults.
    pub fn with_override(mut self, overrides: Option<&RetrievalOverride>) -> Self {
        if let Some(o) = overrides {
            if let Some(threshold) = o.threshold {
                self.threshold = threshold;
            }
            if let Some(size) = o.size {
                self.size = size;
            }
            if let Some(budget) = o.token_budget {
                self.token_budget = Some(budget);
            }
        }
        self
    }
}
