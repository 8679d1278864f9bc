//! Chunking of imported content
//!
//! Large documents are split before being sent to an LLM. Markdown text is
//! regrouped by word budget; structural trees are regrouped by block count so
//! each chunk is itself a valid `Document`.

use std::mem;

use super::markdown::{MarkdownBlock, markdown_blocks};
use super::models::{Block, Document};

/// Default word budget per Markdown chunk.
pub const DEFAULT_WORD_BUDGET: usize = 7500;
/// Default body block count per structural chunk.
pub const DEFAULT_BLOCK_THRESHOLD: usize = 40;

/// Regroup semantic blocks into chunks of at most `budget` words.
///
/// A block over budget is emitted alone. Blocks are never split or reordered
/// and each chunk joins its blocks with a blank line.
pub fn group_blocks_into_chunks(blocks: &[MarkdownBlock], budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut pending_words = 0;

    for block in blocks {
        if block.word_count > budget {
            if !pending.is_empty() {
                chunks.push(pending.join("\n\n"));
                pending.clear();
                pending_words = 0;
            }
            chunks.push(block.content.clone());
            continue;
        }

        if pending_words + block.word_count > budget && !pending.is_empty() {
            chunks.push(pending.join("\n\n"));
            pending.clear();
            pending_words = 0;
        }
        pending.push(&block.content);
        pending_words += block.word_count;
    }

    if !pending.is_empty() {
        chunks.push(pending.join("\n\n"));
    }

    log::info!("{} blocks regrouped into {} chunks", blocks.len(), chunks.len());
    chunks
}

/// Split Markdown into heading-led blocks and regroup them by word budget.
pub fn chunk_markdown(markdown: &str, budget: usize) -> Vec<String> {
    group_blocks_into_chunks(&markdown_blocks(markdown), budget)
}

/// Split a structural document into chunks of about `threshold` body blocks.
///
/// A level-1 heading always opens a new chunk. When a cut would leave a
/// heading as the last block of a chunk, the heading moves to the next one.
/// Every chunk carries the source header and footer.
pub fn split_document_into_chunks(document: &Document, threshold: usize) -> Vec<Document> {
    let threshold = threshold.max(1);
    if document.body.len() <= threshold {
        return vec![document.clone()];
    }

    let mut bodies: Vec<Vec<Block>> = Vec::new();
    let mut pending: Vec<Block> = Vec::new();

    for block in &document.body {
        if block.is_heading_level(1) && !pending.is_empty() {
            bodies.push(mem::take(&mut pending));
        }
        pending.push(block.clone());

        if pending.len() >= threshold {
            let carried = if pending.len() > 1 && pending.last().is_some_and(Block::is_heading) {
                pending.pop()
            } else {
                None
            };
            bodies.push(mem::take(&mut pending));
            pending.extend(carried);
        }
    }
    if !pending.is_empty() {
        bodies.push(pending);
    }

    log::info!(
        "Document of {} blocks split into {} chunks",
        document.body.len(),
        bodies.len()
    );

    bodies
        .into_iter()
        .map(|body| Document::new(document.header.clone(), body, document.footer.clone()))
        .collect()
}
