//! Assistant modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Which assistant answers the question.
///
/// The mode selects the target index, query shape, field allowlist, prompt
/// persona and relevance threshold. `Campaign` is never chosen by the user;
/// it is the special-offer sub-flow that follows a transaction answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssistantMode {
    TransactionAnalyser,
    CustomerSupport,
    ReportAnalyser,
    Campaign,
}

impl AssistantMode {
    /// Short key used in configuration and prompt ids.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TransactionAnalyser => "transactions",
            Self::CustomerSupport => "support",
            Self::ReportAnalyser => "report",
            Self::Campaign => "campaign",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TransactionAnalyser => "Transaction analyser",
            Self::CustomerSupport => "Customer support",
            Self::ReportAnalyser => "Report analyser",
            Self::Campaign => "Campaign",
        }
    }

    /// All modes, user-facing ones first.
    pub fn all() -> [AssistantMode; 4] {
        [
            Self::TransactionAnalyser,
            Self::CustomerSupport,
            Self::ReportAnalyser,
            Self::Campaign,
        ]
    }
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssistantMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transactions" | "transaction" | "transaction-analyser" => {
                Ok(Self::TransactionAnalyser)
            }
            "support" | "customer-support" => Ok(Self::CustomerSupport),
            "report" | "reports" | "report-analyser" => Ok(Self::ReportAnalyser),
            "campaign" | "campaigns" => Ok(Self::Campaign),
            other => Err(AppError::Config(format!("Unknown assistant mode: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        for mode in AssistantMode::all() {
            assert_eq!(mode.key().parse::<AssistantMode>().unwrap(), mode);
        }
        assert_eq!(
            "Customer-Support".parse::<AssistantMode>().unwrap(),
            AssistantMode::CustomerSupport
        );
        assert!("stocks".parse::<AssistantMode>().is_err());
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(
            AssistantMode::ReportAnalyser.to_string(),
            "Report analyser"
        );
    }
}
