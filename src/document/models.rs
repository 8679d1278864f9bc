//! Core data structures for document representation
//!
//! A `Document` is a header, a body and a footer, each an ordered list of
//! `Block`s. The serialized JSON form is what gets embedded in prompts and
//! what an LLM is asked to hand back, so its shape is kept stable:
//!
//! ```json
//! {"header": [], "body": [{"type": "heading_1", "runs": [...]},
//!                         {"type": "list", "items": ["a", "b"]},
//!                         {"type": "table", "rows": [[[...blocks...]]]}],
//!  "footer": []}
//! ```

use serde::{Deserialize, Serialize};

use super::style::Style;

// Type aliases for convenience
pub type TableRows = Vec<Vec<Vec<Block>>>;

/// Highest heading depth accepted from serialized input.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Top-level keys of a serialized `Document`.
const DOCUMENT_KEYS: [&str; 3] = ["header", "body", "footer"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub header: Vec<Block>,
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub footer: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub enum Block {
    Paragraph { runs: Vec<Run> },
    Heading { level: u8, runs: Vec<Run> },
    List { items: Vec<String> },
    Table { rows: TableRows },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub style: Style,
}

impl Run {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::default())
    }
}

impl Block {
    pub fn paragraph(runs: Vec<Run>) -> Self {
        Block::Paragraph { runs }
    }

    pub fn heading(level: u8, runs: Vec<Run>) -> Self {
        Block::Heading { level, runs }
    }

    /// The wire tag: `paragraph`, `heading_<n>`, `list` or `table`.
    pub fn type_name(&self) -> String {
        match self {
            Block::Paragraph { .. } => "paragraph".to_string(),
            Block::Heading { level, .. } => format!("heading_{level}"),
            Block::List { .. } => "list".to_string(),
            Block::Table { .. } => "table".to_string(),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    pub fn is_heading_level(&self, wanted: u8) -> bool {
        matches!(self, Block::Heading { level, .. } if *level == wanted)
    }

    pub fn runs(&self) -> &[Run] {
        match self {
            Block::Paragraph { runs } | Block::Heading { runs, .. } => runs,
            Block::List { .. } | Block::Table { .. } => &[],
        }
    }

    /// Plain text of the block; list items and table cells are newline separated.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph { runs } | Block::Heading { runs, .. } => {
                runs.iter().map(|run| run.text.as_str()).collect()
            }
            Block::List { items } => items.join("\n"),
            Block::Table { rows } => rows
                .iter()
                .flat_map(|row| row.iter())
                .flat_map(|cell| cell.iter())
                .map(Block::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }
}

impl Document {
    pub fn new(header: Vec<Block>, body: Vec<Block>, footer: Vec<Block>) -> Self {
        Self {
            header,
            body,
            footer,
        }
    }

    pub fn with_body(body: Vec<Block>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.body.is_empty() && self.footer.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.header
            .iter()
            .chain(&self.body)
            .chain(&self.footer)
            .map(Block::word_count)
            .sum()
    }

    /// Pretty JSON, as embedded in structural prompts.
    pub fn to_json_pretty(&self) -> String {
        // A Document only holds strings, numbers and booleans; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Parse an LLM response as a `Document`.
    ///
    /// Returns `None` when the text is not a JSON object of the expected
    /// shape: it must carry a `header`, `body` or `footer` key and at least
    /// one block. A response wrapped in a Markdown code fence is unwrapped
    /// first.
    pub fn try_parse(response: &str) -> Option<Document> {
        let payload = strip_code_fence(response.trim());
        if !payload.starts_with('{') {
            return None;
        }

        let value: serde_json::Value = serde_json::from_str(payload).ok()?;
        let object = value.as_object()?;
        if !DOCUMENT_KEYS.iter().any(|key| object.contains_key(*key)) {
            return None;
        }

        let document: Document = serde_json::from_value(value).ok()?;
        (!document.is_empty()).then_some(document)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Flat wire form of a block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    runs: Option<Vec<Run>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows: Option<TableRows>,
}

impl From<RawBlock> for Block {
    fn from(raw: RawBlock) -> Self {
        let kind = raw.kind.trim().to_ascii_lowercase();
        let runs = raw.runs.unwrap_or_default();

        if let Some(level) = kind.strip_prefix("heading") {
            let level = level.trim_start_matches('_').parse::<u8>().ok();
            return match level {
                Some(level) => Block::Heading {
                    level: level.clamp(1, MAX_HEADING_LEVEL),
                    runs,
                },
                None => Block::Paragraph { runs },
            };
        }

        match kind.as_str() {
            "list" => Block::List {
                items: raw.items.unwrap_or_default(),
            },
            "table" => Block::Table {
                rows: raw.rows.unwrap_or_default(),
            },
            _ => Block::Paragraph { runs },
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let kind = block.type_name();
        match block {
            Block::Paragraph { runs } | Block::Heading { runs, .. } => RawBlock {
                kind,
                runs: Some(runs),
                ..RawBlock::default()
            },
            Block::List { items } => RawBlock {
                kind,
                items: Some(items),
                ..RawBlock::default()
            },
            Block::Table { rows } => RawBlock {
                kind,
                rows: Some(rows),
                ..RawBlock::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::style::Rgb;

    #[test]
    fn test_block_wire_shape() {
        let block = Block::heading(2, vec![Run::plain("Scope")]);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "heading_2");
        assert_eq!(json["runs"][0]["text"], "Scope");
        assert!(json.get("items").is_none());

        let list = serde_json::to_value(Block::List {
            items: vec!["one".into()],
        })
        .unwrap();
        assert_eq!(list["type"], "list");
        assert_eq!(list["items"][0], "one");
    }

    #[test]
    fn test_unknown_block_type_becomes_paragraph() {
        let block: Block =
            serde_json::from_str(r#"{"type": "quote", "runs": [{"text": "hi"}]}"#).unwrap();
        assert_eq!(block, Block::paragraph(vec![Run::plain("hi")]));

        let untyped: Block = serde_json::from_str(r#"{"runs": []}"#).unwrap();
        assert_eq!(untyped, Block::paragraph(vec![]));
    }

    #[test]
    fn test_heading_levels_are_clamped() {
        let deep: Block = serde_json::from_str(r#"{"type": "heading_9", "runs": []}"#).unwrap();
        assert_eq!(deep, Block::heading(MAX_HEADING_LEVEL, vec![]));

        let zero: Block = serde_json::from_str(r#"{"type": "heading_0", "runs": []}"#).unwrap();
        assert_eq!(zero, Block::heading(1, vec![]));

        let garbage: Block =
            serde_json::from_str(r#"{"type": "heading_x", "runs": []}"#).unwrap();
        assert_eq!(garbage, Block::paragraph(vec![]));
    }

    #[test]
    fn test_nested_table_json() {
        let json = r#"{
            "body": [{"type": "table", "rows": [[
                [{"type": "paragraph", "runs": [{"text": "a", "style": {"is_bold": true}}]}],
                [{"type": "table", "rows": [[[{"type": "paragraph", "runs": [{"text": "b"}]}]]]}]
            ]]}]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        assert!(document.header.is_empty());
        let Block::Table { rows } = &document.body[0] else {
            panic!("expected a table");
        };
        assert_eq!(rows[0].len(), 2);
        assert!(rows[0][0][0].runs()[0].style.bold);
        assert!(matches!(rows[0][1][0], Block::Table { .. }));
    }

    #[test]
    fn test_try_parse() {
        let document = Document::with_body(vec![Block::paragraph(vec![Run::new(
            "Hola",
            Style::default().with_color(Rgb(1, 2, 3)),
        )])]);
        let json = document.to_json_pretty();

        assert_eq!(Document::try_parse(&json), Some(document.clone()));
        assert_eq!(
            Document::try_parse(&format!("```json\n{json}\n```")),
            Some(document)
        );
        assert_eq!(Document::try_parse("# Just markdown"), None);
        assert_eq!(Document::try_parse("{not json"), None);
        assert_eq!(Document::try_parse("[1, 2]"), None);
    }

    #[test]
    fn test_try_parse_rejects_foreign_objects() {
        assert_eq!(
            Document::try_parse(r#"{"answer": "Bonjour tout le monde"}"#),
            None
        );
        assert_eq!(Document::try_parse(r#"{"body": []}"#), None);
        assert_eq!(Document::try_parse(r#"{"body": "text"}"#), None);
        assert!(Document::try_parse(r#"{"footer": [{"type": "paragraph", "runs": [{"text": "p. 1"}]}]}"#).is_some());
    }

    #[test]
    fn test_plain_text_and_word_count() {
        let document = Document::with_body(vec![
            Block::paragraph(vec![Run::plain("Hello "), Run::plain("world")]),
            Block::List {
                items: vec!["one two".into(), "three".into()],
            },
        ]);
        assert_eq!(document.body[0].plain_text(), "Hello world");
        assert_eq!(document.word_count(), 5);
    }
}
