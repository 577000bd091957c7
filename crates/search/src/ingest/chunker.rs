//! Split report pages into bounded passages.
//!
//! Two strategies exist. Sentence packing greedily fills sections up to a
//! character limit without breaking sentences. Word splitting cuts a page
//! into `ceil(W / n)` near-equal runs of words, the last run taking the
//! remainder.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub const DEFAULT_MAX_CHARS: usize = 1024;
pub const DEFAULT_WORDS_PER_SECTION: usize = 256;

/// How pages are cut into passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "strategy")]
pub enum ChunkStrategy {
    Sentences { max_chars: usize },
    Words { words_per_section: usize },
}

impl Default for ChunkStrategy {
    fn default() -> Self {
        ChunkStrategy::Sentences {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// One passage of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub source_id: String,
    /// 1-based page number
    pub page_number: u32,
    /// 1-based position within the page
    pub section_index: u32,
    pub text: String,
}

/// Ordered passages of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkedDocument {
    pub source_id: String,
    pub passages: Vec<Passage>,
}

impl ChunkedDocument {
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Chunk every page of a document with one strategy.
pub fn chunk_pages<S: AsRef<str>>(
    source_id: &str,
    pages: &[S],
    strategy: ChunkStrategy,
) -> ChunkedDocument {
    let mut passages = Vec::new();

    for (page_idx, page) in pages.iter().enumerate() {
        let sections = match strategy {
            ChunkStrategy::Sentences { max_chars } => split_sentences(page.as_ref(), max_chars),
            ChunkStrategy::Words { words_per_section } => {
                split_words(page.as_ref(), words_per_section)
            }
        };

        for (section_idx, text) in sections.into_iter().enumerate() {
            passages.push(Passage {
                source_id: source_id.to_string(),
                page_number: page_idx as u32 + 1,
                section_index: section_idx as u32 + 1,
                text,
            });
        }
    }

    tracing::debug!(
        "Chunked {} pages into {} passages ({:?})",
        pages.len(),
        passages.len(),
        strategy
    );

    ChunkedDocument {
        source_id: source_id.to_string(),
        passages,
    }
}

/// Pack whole sentences into sections of at most `max_chars` characters,
/// counting the single spaces that join them. A sentence longer than the
/// limit becomes a section on its own. Sections are never empty.
pub fn split_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for raw in text.split_sentence_bounds() {
        let sentence = normalize_whitespace(raw);
        if sentence.is_empty() {
            continue;
        }
        let sentence_len = sentence.chars().count();

        if current.is_empty() {
            current = sentence;
            current_len = sentence_len;
        } else if current_len + 1 + sentence_len <= max_chars {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + sentence_len;
        } else {
            sections.push(std::mem::take(&mut current));
            current = sentence;
            current_len = sentence_len;
        }
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

/// Cut text into `ceil(W / words_per_section)` sections of `W / n` words,
/// the final section absorbing the remainder.
pub fn split_words(text: &str, words_per_section: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words_per_section == 0 {
        return Vec::new();
    }

    let section_count = words.len().div_ceil(words_per_section);
    let per_section = words.len() / section_count;

    let mut sections = Vec::with_capacity(section_count);
    let mut start = 0;
    for _ in 0..section_count - 1 {
        let end = start + per_section;
        sections.push(words[start..end].join(" "));
        start = end;
    }
    sections.push(words[start..].join(" "));

    sections
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
