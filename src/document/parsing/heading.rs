//! Heading detection and classification
//!
//! This module handles detection of headings from Word paragraphs, both
//! from named styles (`Heading 1`, `Titre 2`) and, for documents that use
//! no heading styles at all, from a bold-short-line heuristic.

use once_cell::sync::Lazy;
use regex::Regex;

use super::super::models::Run;

/// Heading levels emitted by the structural importer.
pub(crate) const STRUCTURE_MAX_LEVEL: u8 = 2;
/// Heading levels emitted by the Markdown importer.
pub(crate) const MARKDOWN_MAX_LEVEL: u8 = 6;

/// Paragraphs with this many words or more are never headings.
const HEADING_WORD_LIMIT: usize = 15;

static STYLE_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:heading|titre)(\d+)").unwrap());

// "2. ", "B. ", "IV. "
static TOP_LEVEL_NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((\d+)|([A-Z])|([IVXLCDM]+))\.\s").unwrap());

/// Lowercase and strip spaces, dashes and underscores: `"Heading 1"` -> `"heading1"`.
pub(crate) fn normalize_style_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Heading level encoded in a style name, if it is within `1..=max_level`.
pub(crate) fn heading_level_from_style(style_name: &str, max_level: u8) -> Option<u8> {
    let normalized = normalize_style_name(style_name);
    let captures = STYLE_LEVEL.captures(&normalized)?;
    let level = captures.get(1)?.as_str().parse::<u8>().ok()?;

    (1..=max_level).contains(&level).then_some(level)
}

/// Whether a style name denotes a heading of any level.
pub(crate) fn is_heading_style(style_name: &str) -> bool {
    heading_level_from_style(style_name, MARKDOWN_MAX_LEVEL).is_some()
}

/// Guess whether an unstyled paragraph is a title.
///
/// Only short, fully bold lines that do not end like a sentence qualify.
/// A top-level numbering prefix (`2. `, `B. `, `IV. `) gives level 1,
/// everything else level 2.
pub(crate) fn probable_heading_level(runs: &[Run]) -> Option<u8> {
    let text: String = runs.iter().map(|run| run.text.as_str()).collect();
    let text = text.trim();

    if text.is_empty() {
        return None;
    }
    if text.split_whitespace().count() >= HEADING_WORD_LIMIT {
        return None;
    }
    if text.ends_with('.') {
        return None;
    }

    let mut visible = runs.iter().filter(|run| !run.text.trim().is_empty()).peekable();
    if visible.peek().is_none() {
        return None;
    }
    if !visible.all(|run| run.style.bold) {
        return None;
    }

    // Nested numbering ("1.2 ") and unnumbered titles both land on level 2
    if TOP_LEVEL_NUMBERING.is_match(text) {
        Some(1)
    } else {
        Some(2)
    }
}
