//! Text normalization for extracted documents.
//!
//! Page-oriented sources wrap lines wherever the layout ran out of width.
//! The normalizer keeps real paragraph breaks (a blank line) and folds
//! everything else into single-spaced prose that reads naturally aloud.

use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a paragraph break: two line breaks with optional whitespace between.
static PARAGRAPH_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Regex matching line breaks left inside a paragraph.
static LINE_BREAK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());

/// Regex to collapse whitespace runs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Separator placed between paragraphs in normalized output.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Text normalizer for extracted document text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Split raw text into cleaned, non-empty paragraphs in source order.
    pub fn paragraphs(&self, raw: &str) -> Vec<String> {
        let text = raw.replace("\r\n", "\n").replace('\r', "\n");

        PARAGRAPH_BREAK_REGEX
            .split(&text)
            .map(|candidate| {
                let joined = LINE_BREAK_REGEX.replace_all(candidate, " ");
                let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(&joined, " ");
                collapsed.trim().to_string()
            })
            .filter(|paragraph| !paragraph.is_empty())
            .collect()
    }

    /// Normalize raw text into paragraphs separated by one blank line.
    ///
    /// The result is empty only when the input holds nothing but whitespace.
    pub fn normalize(&self, raw: &str) -> String {
        self.paragraphs(raw).join(PARAGRAPH_SEPARATOR)
    }
}

/// Normalize raw text with the default normalizer.
pub fn normalize(raw: &str) -> String {
    TextNormalizer::new().normalize(raw)
}
