//! Document loading and orchestration
//!
//! This module contains the importers that turn an uploaded file into
//! something an LLM prompt can carry: a structural [`Document`] tree, a flat
//! Markdown rendering, or the plain text of a PDF.
//!
//! The public importers never fail. Corrupt or unexpected input is logged and
//! degrades to an empty result; the `try_*` variants expose the error.

use std::path::Path;

use super::io::{SourceFormat, read_upload};
use super::models::{Block, Document};
use super::parsing::formatting::markdown_emphasis;
use super::parsing::heading::{
    MARKDOWN_MAX_LEVEL, STRUCTURE_MAX_LEVEL, heading_level_from_style, is_heading_style,
    probable_heading_level,
};
use super::parsing::list::{is_list_style, push_list_item};
use super::parsing::table::{extract_table, markdown_table_lines};
use super::source::{Container, SourceElement, SourcePackage, SourceParagraph};
use crate::error::DocumentError;

/// What a `.docx` upload is turned into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Style-preserving block tree, serialized as JSON for the LLM
    #[default]
    Structure,
    /// Flat Markdown text
    Markdown,
}

/// Result of importing an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedContent {
    Structured(Document),
    Text(String),
}

impl ImportedContent {
    pub fn is_structured(&self) -> bool {
        matches!(self, ImportedContent::Structured(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ImportedContent::Structured(document) => document.is_empty(),
            ImportedContent::Text(text) => text.trim().is_empty(),
        }
    }

    /// The text handed to the LLM: pretty JSON for a tree, the text otherwise.
    pub fn to_prompt_text(&self) -> String {
        match self {
            ImportedContent::Structured(document) => document.to_json_pretty(),
            ImportedContent::Text(text) => text.clone(),
        }
    }
}

/// Parse a `.docx` into a structural tree, or an empty `Document` on failure.
pub fn import_structure(bytes: &[u8]) -> Document {
    match try_import_structure(bytes) {
        Ok(document) => document,
        Err(e) => {
            log::error!("Could not analyze DOCX structure: {e}");
            Document::default()
        }
    }
}

/// Parse a `.docx` into a structural tree.
pub fn try_import_structure(bytes: &[u8]) -> Result<Document, DocumentError> {
    let package = SourcePackage::read(bytes)?;

    let analyzer = StructureAnalyzer {
        heuristic: !uses_heading_styles(&package.body),
    };
    if analyzer.heuristic {
        log::debug!("No heading styles in document body, enabling title heuristic");
    }

    let header = package
        .header
        .as_deref()
        .map(|elements| analyzer.analyze(Container::HeaderFooter(elements)))
        .unwrap_or_default();
    let body = analyzer.analyze(Container::Body(&package.body));
    let footer = package
        .footer
        .as_deref()
        .map(|elements| analyzer.analyze(Container::HeaderFooter(elements)))
        .unwrap_or_default();

    log::info!(
        "Structure extracted: {} header, {} body, {} footer blocks",
        header.len(),
        body.len(),
        footer.len()
    );
    Ok(Document::new(header, body, footer))
}

/// Whether any paragraph in `elements`, including nested cells, has a heading style.
fn uses_heading_styles(elements: &[SourceElement]) -> bool {
    elements.iter().any(|element| match element {
        SourceElement::Paragraph(paragraph) => {
            paragraph.style_label().is_some_and(is_heading_style)
        }
        SourceElement::Table(table) => table
            .rows
            .iter()
            .flatten()
            .any(|cell| uses_heading_styles(cell)),
    })
}

struct StructureAnalyzer {
    /// Guess headings from formatting; only for documents without heading styles.
    heuristic: bool,
}

impl StructureAnalyzer {
    fn analyze(&self, container: Container<'_>) -> Vec<Block> {
        let mut blocks = Vec::new();

        for element in container.children() {
            match element {
                SourceElement::Paragraph(paragraph) => {
                    self.analyze_paragraph(paragraph, &mut blocks);
                }
                SourceElement::Table(table) => {
                    if let Some(block) = extract_table(table, |cell| self.analyze(cell)) {
                        blocks.push(block);
                    }
                }
            }
        }

        log::debug!("Analyzed {}: {} blocks", container.kind(), blocks.len());
        blocks
    }

    fn analyze_paragraph(&self, paragraph: &SourceParagraph, blocks: &mut Vec<Block>) {
        if paragraph.runs.is_empty() {
            return;
        }
        let style = paragraph.style_label().unwrap_or_default();

        if let Some(level) = heading_level_from_style(style, STRUCTURE_MAX_LEVEL) {
            blocks.push(Block::heading(level, paragraph.runs.clone()));
        } else if is_list_style(style) {
            push_list_item(blocks, paragraph.text());
        } else if let Some(level) = (self.heuristic && paragraph.style_id.is_none())
            .then(|| probable_heading_level(&paragraph.runs))
            .flatten()
        {
            log::debug!("Probable title (level {level}): {:?}", paragraph.text());
            blocks.push(Block::heading(level, paragraph.runs.clone()));
        } else {
            blocks.push(Block::paragraph(paragraph.runs.clone()));
        }
    }
}

/// Render a `.docx` body as Markdown, or `""` on failure.
pub fn import_markdown(bytes: &[u8]) -> String {
    match try_import_markdown(bytes) {
        Ok(markdown) => markdown,
        Err(e) => {
            log::error!("Could not convert DOCX to Markdown: {e}");
            String::new()
        }
    }
}

/// Render a `.docx` body as Markdown.
pub fn try_import_markdown(bytes: &[u8]) -> Result<String, DocumentError> {
    let package = SourcePackage::read(bytes)?;
    let mut lines = Vec::new();
    push_markdown_lines(&package.body, &mut lines);
    Ok(lines.join("\n").trim().to_string())
}

fn push_markdown_lines(elements: &[SourceElement], lines: &mut Vec<String>) {
    for element in elements {
        match element {
            SourceElement::Paragraph(paragraph) => {
                if paragraph.text().trim().is_empty() {
                    lines.push(String::new());
                    continue;
                }

                let content: String = paragraph.runs.iter().map(markdown_emphasis).collect();
                let style = paragraph.style_label().unwrap_or_default();

                let line = if let Some(level) = heading_level_from_style(style, MARKDOWN_MAX_LEVEL)
                {
                    format!("{} {content}", "#".repeat(usize::from(level)))
                } else if is_list_style(style) {
                    format!("* {content}")
                } else {
                    content
                };
                lines.push(line);
                lines.push(String::new());
            }
            SourceElement::Table(table) => {
                let table_lines = markdown_table_lines(table);
                if !table_lines.is_empty() {
                    lines.extend(table_lines);
                    lines.push(String::new());
                }
            }
        }
    }
}

/// Concatenated page text of a PDF, or `""` on failure.
pub fn import_pdf_text(bytes: &[u8]) -> String {
    match unpdf::parse_bytes(bytes) {
        Ok(document) => document.plain_text(),
        Err(e) => {
            log::error!("Could not read PDF: {}", DocumentError::Pdf(e.to_string()));
            String::new()
        }
    }
}

/// Import an upload, choosing the importer from the file extension.
///
/// `.docx` yields a tree or Markdown depending on `mode`; `.pdf` always
/// yields text; anything else yields empty text.
pub fn import_upload(file_name: &str, bytes: &[u8], mode: ImportMode) -> ImportedContent {
    match SourceFormat::from_file_name(file_name) {
        Some(SourceFormat::Docx) => match mode {
            ImportMode::Structure => ImportedContent::Structured(import_structure(bytes)),
            ImportMode::Markdown => ImportedContent::Text(import_markdown(bytes)),
        },
        Some(SourceFormat::Pdf) => ImportedContent::Text(import_pdf_text(bytes)),
        None => {
            log::warn!("Unsupported upload type: {file_name}");
            ImportedContent::Text(String::new())
        }
    }
}

/// Read a file from disk and import it.
pub async fn load_upload(path: &Path, mode: ImportMode) -> Result<ImportedContent, DocumentError> {
    let bytes = read_upload(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    Ok(import_upload(file_name, &bytes, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::models::Run;
    use crate::document::source::SourceTable;
    use crate::document::style::Style;

    fn styled(style: Option<&str>, runs: Vec<Run>) -> SourceElement {
        SourceElement::Paragraph(SourceParagraph {
            style_id: style.map(str::to_string),
            style_name: None,
            runs,
        })
    }

    fn bold(text: &str) -> Run {
        Run::new(text, Style::default().with_bold(true))
    }

    #[test]
    fn test_heading_styles_disable_heuristic() {
        let nested = SourceElement::Table(SourceTable {
            rows: vec![vec![vec![styled(Some("Heading2"), vec![Run::plain("t")])]]],
        });
        assert!(uses_heading_styles(&[nested]));
        assert!(!uses_heading_styles(&[styled(None, vec![bold("Bold")])]));
    }

    #[test]
    fn test_paragraph_classification() {
        let analyzer = StructureAnalyzer { heuristic: false };
        let elements = vec![
            styled(Some("Heading1"), vec![Run::plain("Title")]),
            styled(Some("Heading3"), vec![Run::plain("Deep")]),
            styled(Some("ListBullet"), vec![Run::plain("one")]),
            styled(Some("ListBullet"), vec![Run::plain("two")]),
            styled(None, vec![]),
            styled(None, vec![bold("Bold line")]),
        ];
        let blocks = analyzer.analyze(Container::Body(&elements));

        assert_eq!(blocks.len(), 4);
        assert!(blocks[0].is_heading_level(1));
        assert_eq!(blocks[1].type_name(), "paragraph");
        assert_eq!(
            blocks[2],
            Block::List {
                items: vec!["one".into(), "two".into()]
            }
        );
        assert_eq!(blocks[3].type_name(), "paragraph");
    }

    #[test]
    fn test_heuristic_when_enabled() {
        let analyzer = StructureAnalyzer { heuristic: true };
        let elements = vec![
            styled(None, vec![bold("1. Overview")]),
            styled(None, vec![bold("Background")]),
            styled(None, vec![Run::plain("Body text.")]),
        ];
        let blocks = analyzer.analyze(Container::Body(&elements));
        let kinds: Vec<String> = blocks.iter().map(Block::type_name).collect();
        assert_eq!(kinds, vec!["heading_1", "heading_2", "paragraph"]);
    }

    #[test]
    fn test_heuristic_skips_styled_paragraphs() {
        let analyzer = StructureAnalyzer { heuristic: true };
        let elements = vec![
            styled(Some("BodyText"), vec![bold("Hello")]),
            styled(None, vec![bold("Hello")]),
        ];
        let blocks = analyzer.analyze(Container::Body(&elements));
        let kinds: Vec<String> = blocks.iter().map(Block::type_name).collect();
        assert_eq!(kinds, vec!["paragraph", "heading_2"]);
    }

    #[test]
    fn test_markdown_lines() {
        let elements = vec![
            styled(Some("Heading3"), vec![Run::plain("Deep")]),
            styled(None, vec![Run::plain("  ")]),
            styled(Some("List Bullet"), vec![Run::plain("item")]),
            styled(None, vec![Run::plain("a "), bold("b")]),
        ];
        let mut lines = Vec::new();
        push_markdown_lines(&elements, &mut lines);
        assert_eq!(
            lines.join("\n").trim(),
            "### Deep\n\n\n* item\n\na **b**"
        );
    }

    #[test]
    fn test_corrupt_input_degrades() {
        assert_eq!(import_structure(b"not a zip"), Document::default());
        assert_eq!(import_markdown(b"not a zip"), "");
        assert!(try_import_structure(b"not a zip").is_err());
    }

    #[test]
    fn test_upload_dispatch() {
        assert_eq!(
            import_upload("notes.txt", b"hello", ImportMode::Structure),
            ImportedContent::Text(String::new())
        );
        assert_eq!(
            import_upload("broken.docx", b"garbage", ImportMode::Structure),
            ImportedContent::Structured(Document::default())
        );
        assert_eq!(
            import_upload("broken.DOCX", b"garbage", ImportMode::Markdown),
            ImportedContent::Text(String::new())
        );
        assert!(!import_upload("broken.pdf", b"garbage", ImportMode::Structure).is_structured());
    }
}
