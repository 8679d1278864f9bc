//! Semantic blocks of a Markdown text
//!
//! A semantic block is a heading line plus everything up to the next heading.
//! Text before the first heading forms a level-0 preamble block.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownBlock {
    /// `#` count of the leading heading, 0 for the preamble.
    pub heading_level: u8,
    pub content: String,
    pub word_count: usize,
}

impl MarkdownBlock {
    fn from_lines(heading_level: u8, lines: &[&str]) -> Option<Self> {
        let content = lines.join("\n").trim().to_string();
        if content.is_empty() {
            return None;
        }
        let word_count = content.split_whitespace().count();
        Some(Self {
            heading_level,
            content,
            word_count,
        })
    }
}

/// ATX heading level of a line (`## Title` -> 2).
fn heading_level(line: &str) -> Option<u8> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
        u8::try_from(hashes).ok()
    } else {
        None
    }
}

/// Split Markdown into heading-led blocks, in order. Empty blocks are dropped
/// and `#` lines inside fenced code do not start a block.
pub fn markdown_blocks(markdown: &str) -> Vec<MarkdownBlock> {
    let mut blocks = Vec::new();
    let mut current_level = 0;
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        let level = if in_fence { None } else { heading_level(line) };
        if let Some(level) = level {
            blocks.extend(MarkdownBlock::from_lines(current_level, &current));
            current.clear();
            current_level = level;
        }
        current.push(line);
    }
    blocks.extend(MarkdownBlock::from_lines(current_level, &current));

    blocks
}
