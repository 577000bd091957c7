//! Token budgeting.
//!
//! Token counts use the `cl100k_base` byte-pair encoding shared by the GPT-3.5
//! and GPT-4 families. Two truncation strategies exist: a plain word cut, and
//! a budget fit that keeps the longest whole-word prefix whose token count
//! stays within a token limit.

use fsi_core::{AppError, AppResult};
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

/// Result of fitting text into a token budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budgeted {
    /// The (possibly shortened) text
    pub text: String,

    /// Token count of `text`
    pub tokens: usize,

    /// Whether words were dropped to fit
    pub truncated: bool,
}

fn encoder() -> AppResult<&'static CoreBPE> {
    static ENCODER: OnceLock<Result<CoreBPE, String>> = OnceLock::new();

    ENCODER
        .get_or_init(|| tiktoken_rs::cl100k_base().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| AppError::Other(format!("Failed to load cl100k_base encoding: {}", e)))
}

/// Estimate the number of model tokens in `text`.
pub fn estimate_tokens(text: &str) -> AppResult<usize> {
    if text.is_empty() {
        return Ok(0);
    }
    Ok(encoder()?.encode_ordinary(text).len())
}

/// Keep the first `max_words` whitespace-separated words, joined by single
/// spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fit `text` into `max_tokens`, cutting on whole-word boundaries.
///
/// Text already within budget is returned unchanged. Otherwise the result is
/// the longest prefix of whitespace-separated words (single-space joined)
/// whose token estimate is at most `max_tokens`.
pub fn fit_to_token_budget(text: &str, max_tokens: usize) -> AppResult<Budgeted> {
    let tokens = estimate_tokens(text)?;
    if tokens <= max_tokens {
        return Ok(Budgeted {
            text: text.to_string(),
            tokens,
            truncated: false,
        });
    }

    let words: Vec<&str> = text.split_whitespace().collect();

    // Largest word count known to fit; zero words always fits.
    let mut lo = 0usize;
    let mut lo_tokens = 0usize;
    let mut hi = words.len();

    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        let candidate_tokens = estimate_tokens(&words[..mid].join(" "))?;
        if candidate_tokens <= max_tokens {
            lo = mid;
            lo_tokens = candidate_tokens;
        } else {
            hi = mid - 1;
        }
    }

    tracing::debug!(
        original_tokens = tokens,
        kept_words = lo,
        total_words = words.len(),
        max_tokens,
        "Truncated text to token budget"
    );

    Ok(Budgeted {
        text: words[..lo].join(" "),
        tokens: lo_tokens,
        truncated: true,
    })
}
