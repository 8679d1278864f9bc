//! Markdown answer to `.docx`
//!
//! [`MarkdownConverter`] renders Markdown (or plain text) into native
//! paragraphs and tables using a role style from the style sheet. Rendering
//! never fails from the caller's point of view: when the markup cannot be
//! rendered, a grey italic warning and the raw text are added instead.

use docx_rs::{BreakType, Hyperlink, HyperlinkType, Paragraph, Run, Table, TableCell, TableRow};

use super::markup::{MAX_NESTING, MarkupElement, MarkupNode, MarkupTag, parse_markdown};
use super::native::{
    MONOSPACE_FONT, NativeBlock, NativeDocument, body_paragraph, heading_style_id, list_paragraph,
    styled_run,
};
use crate::document::style::{Rgb, Style, StyleSheet};
use crate::error::{ExportError, RenderError};

/// Color of the rendering-failure notice.
pub const WARNING_COLOR: Rgb = Rgb(120, 120, 120);

#[derive(Debug, Clone, Copy)]
struct ListContext {
    ordered: bool,
    depth: usize,
}

pub struct MarkdownConverter<'a> {
    styles: &'a StyleSheet,
    role: String,
    document: NativeDocument,
}

impl<'a> MarkdownConverter<'a> {
    /// Converter rendering with the `response` role style.
    pub fn new(styles: &'a StyleSheet) -> Self {
        Self {
            styles,
            role: StyleSheet::RESPONSE.to_string(),
            document: NativeDocument::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn document(&self) -> &NativeDocument {
        &self.document
    }

    pub fn into_document(self) -> NativeDocument {
        self.document
    }

    fn base_style(&self) -> Style {
        self.styles.role(&self.role)
    }

    /// Render `text` and append it. Never fails; empty input adds nothing.
    pub fn add_markdown(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        match parse_markdown(text).and_then(|root| self.render(&root)) {
            Ok(blocks) => self.document.extend(blocks),
            Err(e) => {
                log::warn!("Markdown rendering failed, falling back to raw text: {e}");
                self.add_fallback(text, &e);
            }
        }
    }

    fn add_fallback(&mut self, text: &str, error: &RenderError) {
        let notice = Style::default()
            .with_italic(true)
            .with_color(WARNING_COLOR);
        let message = format!("Formatting could not be applied ({error}). Raw text follows.");

        self.document
            .push(body_paragraph().add_run(styled_run(&message, &notice)));
        self.document
            .push(body_paragraph().add_run(styled_run(text, &Style::default())));
    }

    /// Render a markup tree into native blocks without touching the document.
    pub fn render(&self, root: &MarkupElement) -> Result<Vec<NativeBlock>, RenderError> {
        let mut blocks = Vec::new();
        self.render_children(root, None, 0, &mut blocks)?;
        Ok(blocks)
    }

    fn render_children(
        &self,
        parent: &MarkupElement,
        list: Option<ListContext>,
        depth: usize,
        out: &mut Vec<NativeBlock>,
    ) -> Result<(), RenderError> {
        // Loose inline content between blocks forms its own paragraph
        let mut inline: Vec<&MarkupNode> = Vec::new();

        for child in &parent.children {
            match child {
                MarkupNode::Element(element) if !element.tag.is_inline() => {
                    self.flush_inline(&mut inline, list, depth, out)?;
                    self.render_block(element, list, depth + 1, out)?;
                }
                _ => inline.push(child),
            }
        }
        self.flush_inline(&mut inline, list, depth, out)
    }

    fn flush_inline(
        &self,
        inline: &mut Vec<&MarkupNode>,
        list: Option<ListContext>,
        depth: usize,
        out: &mut Vec<NativeBlock>,
    ) -> Result<(), RenderError> {
        if inline.is_empty() {
            return Ok(());
        }
        let has_text = inline.iter().any(|node| match node {
            MarkupNode::Text(text) => !text.trim().is_empty(),
            MarkupNode::Element(element) => !element.text().trim().is_empty(),
        });
        if has_text {
            let paragraph = self.paragraph_for(list);
            let paragraph =
                self.add_inline_nodes(paragraph, inline.iter().copied(), &self.base_style(), depth)?;
            out.push(paragraph.into());
        }
        inline.clear();
        Ok(())
    }

    fn paragraph_for(&self, list: Option<ListContext>) -> Paragraph {
        match list {
            Some(context) => list_paragraph(Paragraph::new(), context.ordered, context.depth),
            None => body_paragraph(),
        }
    }

    fn render_block(
        &self,
        element: &MarkupElement,
        list: Option<ListContext>,
        depth: usize,
        out: &mut Vec<NativeBlock>,
    ) -> Result<(), RenderError> {
        if depth > MAX_NESTING {
            return Err(RenderError::NestingTooDeep(MAX_NESTING));
        }

        match &element.tag {
            MarkupTag::P => {
                let paragraph = self.paragraph_for(list);
                let paragraph =
                    self.add_inline_nodes(paragraph, element.children.iter(), &self.base_style(), depth)?;
                out.push(paragraph.into());
            }
            MarkupTag::H(level) => {
                // Font, size and color come from the heading style
                let style = self.base_style().emphasis_only();
                let paragraph = Paragraph::new().style(&heading_style_id(*level));
                let paragraph =
                    self.add_inline_nodes(paragraph, element.children.iter(), &style, depth)?;
                out.push(paragraph.into());
            }
            MarkupTag::Ul | MarkupTag::Ol => {
                let ordered = element.tag == MarkupTag::Ol;
                let nested = list.map_or(0, |context| context.depth + 1);
                let context = ListContext {
                    ordered,
                    depth: nested,
                };
                for item in element.elements() {
                    self.render_children(item, Some(context), depth + 1, out)?;
                }
            }
            MarkupTag::Pre => {
                let style = self.base_style().with_font(MONOSPACE_FONT);
                out.push(
                    body_paragraph()
                        .add_run(styled_run(&element.text(), &style))
                        .into(),
                );
            }
            MarkupTag::Table => out.push(self.render_table(element, depth)?.into()),
            MarkupTag::Hr => {}
            MarkupTag::Root | MarkupTag::Blockquote | MarkupTag::Li => {
                self.render_children(element, list, depth, out)?;
            }
            _ => {
                if !element.text().trim().is_empty() {
                    let paragraph = self.paragraph_for(list);
                    let paragraph = self.add_inline_nodes(
                        paragraph,
                        element.children.iter(),
                        &self.base_style(),
                        depth,
                    )?;
                    out.push(paragraph.into());
                }
            }
        }
        Ok(())
    }

    fn add_inline_nodes<'n>(
        &self,
        mut paragraph: Paragraph,
        nodes: impl Iterator<Item = &'n MarkupNode>,
        style: &Style,
        depth: usize,
    ) -> Result<Paragraph, RenderError> {
        for node in nodes {
            paragraph = self.add_inline(paragraph, node, style, depth)?;
        }
        Ok(paragraph)
    }

    fn add_inline(
        &self,
        paragraph: Paragraph,
        node: &MarkupNode,
        style: &Style,
        depth: usize,
    ) -> Result<Paragraph, RenderError> {
        if depth > MAX_NESTING {
            return Err(RenderError::NestingTooDeep(MAX_NESTING));
        }

        let element = match node {
            MarkupNode::Text(text) => return Ok(paragraph.add_run(styled_run(text, style))),
            MarkupNode::Element(element) => element,
        };
        let children = element.children.iter();

        match &element.tag {
            MarkupTag::Strong => {
                self.add_inline_nodes(paragraph, children, &style.clone().with_bold(true), depth + 1)
            }
            MarkupTag::Em => {
                self.add_inline_nodes(paragraph, children, &style.clone().with_italic(true), depth + 1)
            }
            MarkupTag::Code => {
                let code = style.clone().with_font(MONOSPACE_FONT);
                Ok(paragraph.add_run(styled_run(&element.text(), &code)))
            }
            MarkupTag::A { href } if !href.is_empty() => {
                let link = Hyperlink::new(href, HyperlinkType::External)
                    .add_run(styled_run(&element.text(), style));
                Ok(paragraph.add_hyperlink(link))
            }
            MarkupTag::Br => Ok(paragraph.add_run(Run::new().add_break(BreakType::TextWrapping))),
            _ => self.add_inline_nodes(paragraph, children, style, depth + 1),
        }
    }

    fn render_table(&self, table: &MarkupElement, depth: usize) -> Result<Table, RenderError> {
        // The header row holds its cells directly; body rows are `tr` elements
        let rows: Vec<Vec<&MarkupElement>> = table
            .elements()
            .filter_map(|row| match row.tag {
                MarkupTag::Thead | MarkupTag::Tr => Some(
                    row.elements()
                        .filter(|cell| cell.tag == MarkupTag::Td)
                        .collect(),
                ),
                _ => None,
            })
            .collect();

        let columns = rows.first().map_or(0, Vec::len);
        let mut native_rows = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            if row.len() > columns {
                return Err(RenderError::CellOutOfRange {
                    row: index,
                    cells: row.len(),
                    columns,
                });
            }

            let mut cells = Vec::with_capacity(columns);
            for cell in row {
                let paragraph = self.add_inline_nodes(
                    body_paragraph(),
                    cell.children.iter(),
                    &self.base_style(),
                    depth + 1,
                )?;
                cells.push(TableCell::new().add_paragraph(paragraph));
            }
            while cells.len() < columns {
                cells.push(TableCell::new().add_paragraph(Paragraph::new()));
            }
            native_rows.push(TableRow::new(cells));
        }

        Ok(Table::new(native_rows))
    }
}

/// Render a Markdown answer into `.docx` bytes.
pub fn export_markdown_docx(text: &str, styles: &StyleSheet) -> Result<Vec<u8>, ExportError> {
    let mut converter = MarkdownConverter::new(styles);
    converter.add_markdown(text);
    converter.into_document().to_bytes()
}
