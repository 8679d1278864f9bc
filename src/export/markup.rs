//! Markdown to markup tree
//!
//! pulldown-cmark events are folded into a small HTML-like tree
//! ([`MarkupElement`]) that the Markdown renderer walks. The tree keeps only
//! what the renderer understands; unknown constructs keep their text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::error::RenderError;

/// Deepest element nesting accepted from Markdown input.
pub const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupTag {
    /// The document itself.
    Root,
    P,
    H(u8),
    Blockquote,
    Pre,
    Code,
    Ul,
    Ol,
    Li,
    Table,
    /// Header row of a table; holds cells directly.
    Thead,
    Tr,
    Td,
    Strong,
    Em,
    Del,
    A { href: String },
    Img,
    Br,
    Hr,
    /// Anything else that carries text (footnotes, definition lists, ...).
    Span,
}

impl MarkupTag {
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            MarkupTag::Code
                | MarkupTag::Strong
                | MarkupTag::Em
                | MarkupTag::Del
                | MarkupTag::A { .. }
                | MarkupTag::Img
                | MarkupTag::Br
                | MarkupTag::Span
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
}

impl MarkupNode {
    pub fn is_inline(&self) -> bool {
        match self {
            MarkupNode::Text(_) => true,
            MarkupNode::Element(element) => element.tag.is_inline(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupElement {
    pub tag: MarkupTag,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    pub fn new(tag: MarkupTag) -> Self {
        Self {
            tag,
            children: Vec::new(),
        }
    }

    pub fn with_children(tag: MarkupTag, children: Vec<MarkupNode>) -> Self {
        Self { tag, children }
    }

    pub fn elements(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(|child| match child {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text(_) => None,
        })
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, into: &mut String) {
        for child in &self.children {
            match child {
                MarkupNode::Text(text) => into.push_str(text),
                MarkupNode::Element(element) if element.tag == MarkupTag::Br => into.push('\n'),
                MarkupNode::Element(element) => element.collect_text(into),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(MarkupNode::Text(previous)) = self.children.last_mut() {
            previous.push_str(text);
        } else {
            self.children.push(MarkupNode::Text(text.to_string()));
        }
    }
}

fn markup_tag(tag: &Tag<'_>) -> MarkupTag {
    match tag {
        Tag::Paragraph => MarkupTag::P,
        Tag::Heading { level, .. } => MarkupTag::H(heading_number(*level)),
        Tag::BlockQuote(_) => MarkupTag::Blockquote,
        Tag::CodeBlock(_) => MarkupTag::Pre,
        Tag::List(Some(_)) => MarkupTag::Ol,
        Tag::List(None) => MarkupTag::Ul,
        Tag::Item => MarkupTag::Li,
        Tag::Table(_) => MarkupTag::Table,
        Tag::TableHead => MarkupTag::Thead,
        Tag::TableRow => MarkupTag::Tr,
        Tag::TableCell => MarkupTag::Td,
        Tag::Emphasis => MarkupTag::Em,
        Tag::Strong => MarkupTag::Strong,
        Tag::Strikethrough => MarkupTag::Del,
        Tag::Link { dest_url, .. } => MarkupTag::A {
            href: dest_url.to_string(),
        },
        Tag::Image { .. } => MarkupTag::Img,
        _ => MarkupTag::Span,
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_line_break_html(html: &str) -> bool {
    let compact: String = html
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    matches!(compact.as_str(), "<br>" | "<br/>")
}

/// Tree builder over a stack of open elements; the root sits at the bottom.
struct TreeBuilder {
    stack: Vec<MarkupElement>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![MarkupElement::new(MarkupTag::Root)],
        }
    }

    fn current(&mut self) -> Result<&mut MarkupElement, RenderError> {
        self.stack
            .last_mut()
            .ok_or_else(|| RenderError::UnbalancedMarkup("no open element".to_string()))
    }

    fn open(&mut self, tag: MarkupTag) -> Result<(), RenderError> {
        // The root does not count as a nesting level
        if self.stack.len() > MAX_NESTING {
            return Err(RenderError::NestingTooDeep(MAX_NESTING));
        }
        self.stack.push(MarkupElement::new(tag));
        Ok(())
    }

    fn close(&mut self) -> Result<(), RenderError> {
        if self.stack.len() < 2 {
            return Err(RenderError::UnbalancedMarkup(
                "closing tag without an open element".to_string(),
            ));
        }
        let element = self
            .stack
            .pop()
            .ok_or_else(|| RenderError::UnbalancedMarkup("empty stack".to_string()))?;
        self.current()?.children.push(MarkupNode::Element(element));
        Ok(())
    }

    fn leaf(&mut self, tag: MarkupTag, text: &str) -> Result<(), RenderError> {
        let mut element = MarkupElement::new(tag);
        element.push_text(text);
        self.current()?.children.push(MarkupNode::Element(element));
        Ok(())
    }

    fn finish(mut self) -> Result<MarkupElement, RenderError> {
        if self.stack.len() != 1 {
            return Err(RenderError::UnbalancedMarkup(format!(
                "{} elements left open",
                self.stack.len() - 1
            )));
        }
        self.stack
            .pop()
            .ok_or_else(|| RenderError::UnbalancedMarkup("empty stack".to_string()))
    }
}

/// Parse CommonMark (with tables and strikethrough) into a markup tree.
pub fn parse_markdown(text: &str) -> Result<MarkupElement, RenderError> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut builder = TreeBuilder::new();

    for event in Parser::new_ext(text, options) {
        match event {
            Event::Start(tag) => builder.open(markup_tag(&tag))?,
            Event::End(TagEnd::CodeBlock) => {
                // Drop the trailing newline of the last code line
                if let Some(MarkupNode::Text(text)) = builder.current()?.children.last_mut() {
                    let trimmed = text.trim_end_matches('\n').len();
                    text.truncate(trimmed);
                }
                builder.close()?;
            }
            Event::End(_) => builder.close()?,
            Event::Text(text) => builder.current()?.push_text(&text),
            Event::Code(code) => builder.leaf(MarkupTag::Code, &code)?,
            Event::SoftBreak => builder.current()?.push_text(" "),
            Event::HardBreak => builder.leaf(MarkupTag::Br, "")?,
            Event::Rule => builder.leaf(MarkupTag::Hr, "")?,
            Event::InlineHtml(html) if is_line_break_html(&html) => {
                builder.leaf(MarkupTag::Br, "")?;
            }
            Event::InlineHtml(_) => {}
            Event::Html(html) => {
                let html = html.trim();
                if !html.is_empty() {
                    builder.leaf(MarkupTag::P, html)?;
                }
            }
            Event::TaskListMarker(checked) => {
                builder
                    .current()?
                    .push_text(if checked { "[x] " } else { "[ ] " });
            }
            Event::FootnoteReference(label) => {
                builder.current()?.push_text(&format!("[{label}]"));
            }
            _ => {}
        }
    }

    builder.finish()
}
