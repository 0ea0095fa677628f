//! Text normalization for extracted slide content.
//!
//! Keeps the text faithful to the deck (numbers, punctuation, and casing all
//! matter for inconsistency detection) while cleaning up artifacts of XML
//! extraction and OCR: mixed line endings, decomposed Unicode, whitespace
//! runs, and runs of blank lines.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse multiple horizontal whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{A0}]+").unwrap());

/// Text normalizer for extracted slide and OCR text.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a block of text.
    ///
    /// - Normalizes line endings to `\n`
    /// - Applies Unicode NFC so visually identical strings compare equal
    /// - Collapses horizontal whitespace runs to single spaces
    /// - Trims each line and drops empty lines
    pub fn normalize_block(&self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        let composed: String = unified.nfc().collect();

        composed
            .lines()
            .map(|line| {
                WHITESPACE_COLLAPSE_REGEX
                    .replace_all(line, " ")
                    .trim()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
