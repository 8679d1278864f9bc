//! List processing and detection
//!
//! Paragraphs styled as list items (`List Bullet`, `Liste à puces`, ...) are
//! grouped into `List` blocks. Consecutive items in the same container join
//! the preceding list; anything in between starts a new one.

use super::super::models::Block;

/// Whether a style name denotes a list paragraph.
pub(crate) fn is_list_style(style_name: &str) -> bool {
    let lower = style_name.to_lowercase();
    lower.contains("list") || lower.contains("liste")
}

/// Append `item` to the trailing `List` block, or start a new list.
pub(crate) fn push_list_item(blocks: &mut Vec<Block>, item: String) {
    if let Some(Block::List { items }) = blocks.last_mut() {
        items.push(item);
        return;
    }
    blocks.push(Block::List { items: vec![item] });
}
