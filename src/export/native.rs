//! Native `.docx` assembly
//!
//! Exporters produce [`NativeBlock`]s; [`NativeDocument`] owns them until the
//! whole document is ready, then registers the heading and list styles, the
//! list numbering definitions and the optional table of contents, and packs
//! everything with docx-rs.

use std::io::Cursor;

use docx_rs::{
    AbstractNumbering, BreakType, Docx, Footer, Header, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, Paragraph, Run, RunFonts, SpecialIndentType, Start,
    Style as NativeStyle, StyleType, Table, TableOfContents,
};

use crate::document::models::MAX_HEADING_LEVEL;
use crate::document::style::Style;
use crate::error::ExportError;

pub const MONOSPACE_FONT: &str = "Consolas";

/// Style of plain paragraphs. Title detection only looks at unstyled ones.
pub const BODY_TEXT_STYLE: &str = "BodyText";
pub const LIST_BULLET_STYLE: &str = "ListBullet";
pub const LIST_NUMBER_STYLE: &str = "ListNumber";

pub(crate) const BULLET_NUMBERING: usize = 1;
pub(crate) const DECIMAL_NUMBERING: usize = 2;

/// Nesting levels defined for each list numbering.
const LIST_LEVELS: usize = 9;
const LIST_INDENT_TWIPS: i32 = 720;

/// Heading levels listed by the table of contents.
const TOC_LEVELS: (usize, usize) = (1, 3);

/// A body-level element waiting to be placed in a document part.
#[derive(Debug, Clone)]
pub enum NativeBlock {
    Paragraph(Box<Paragraph>),
    Table(Box<Table>),
}

impl NativeBlock {
    pub fn is_paragraph(&self) -> bool {
        matches!(self, NativeBlock::Paragraph(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, NativeBlock::Table(_))
    }
}

impl From<Paragraph> for NativeBlock {
    fn from(paragraph: Paragraph) -> Self {
        NativeBlock::Paragraph(Box::new(paragraph))
    }
}

impl From<Table> for NativeBlock {
    fn from(table: Table) -> Self {
        NativeBlock::Table(Box::new(table))
    }
}

/// A document under construction.
#[derive(Debug, Clone, Default)]
pub struct NativeDocument {
    header: Vec<NativeBlock>,
    body: Vec<NativeBlock>,
    footer: Vec<NativeBlock>,
    table_of_contents: bool,
}

impl NativeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table-of-contents field before the body.
    pub fn with_table_of_contents(mut self) -> Self {
        self.table_of_contents = true;
        self
    }

    pub fn push(&mut self, block: impl Into<NativeBlock>) {
        self.body.push(block.into());
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = NativeBlock>) {
        self.body.extend(blocks);
    }

    pub fn set_header(&mut self, blocks: Vec<NativeBlock>) {
        self.header = blocks;
    }

    pub fn set_footer(&mut self, blocks: Vec<NativeBlock>) {
        self.footer = blocks;
    }

    pub fn body(&self) -> &[NativeBlock] {
        &self.body
    }

    pub fn header(&self) -> &[NativeBlock] {
        &self.header
    }

    pub fn footer(&self) -> &[NativeBlock] {
        &self.footer
    }

    pub fn has_table_of_contents(&self) -> bool {
        self.table_of_contents
    }

    /// Number of top-level body paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.body.iter().filter(|block| block.is_paragraph()).count()
    }

    fn build(self) -> Docx {
        let mut docx = Docx::new();
        for style in document_styles() {
            docx = docx.add_style(style);
        }
        docx = add_list_numbering(docx);

        if !self.header.is_empty() {
            let header = self
                .header
                .into_iter()
                .fold(Header::new(), |header, block| match block {
                    NativeBlock::Paragraph(p) => header.add_paragraph(*p),
                    NativeBlock::Table(t) => header.add_table(*t),
                });
            docx = docx.header(header);
        }
        if !self.footer.is_empty() {
            let footer = self
                .footer
                .into_iter()
                .fold(Footer::new(), |footer, block| match block {
                    NativeBlock::Paragraph(p) => footer.add_paragraph(*p),
                    NativeBlock::Table(t) => footer.add_table(*t),
                });
            docx = docx.footer(footer);
        }

        if self.table_of_contents {
            let (from, to) = TOC_LEVELS;
            docx = docx.add_table_of_contents(
                TableOfContents::new()
                    .heading_styles_range(from, to)
                    .alias("Table of contents"),
            );
        }

        for block in self.body {
            docx = match block {
                NativeBlock::Paragraph(p) => docx.add_paragraph(*p),
                NativeBlock::Table(t) => docx.add_table(*t),
            };
        }

        docx
    }

    /// Pack the document into `.docx` bytes.
    pub fn to_bytes(self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Cursor::new(Vec::new());
        self.build()
            .build()
            .pack(&mut buffer)
            .map_err(|e| ExportError::Package(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

/// Style id of a heading paragraph (`Heading1`..`Heading6`).
pub(crate) fn heading_style_id(level: u8) -> String {
    format!("Heading{}", level.clamp(1, MAX_HEADING_LEVEL))
}

fn document_styles() -> Vec<NativeStyle> {
    // Half-point sizes for Heading1..Heading6
    const HEADING_SIZES: [usize; 6] = [32, 28, 26, 24, 22, 22];

    let mut styles: Vec<NativeStyle> = (1..=MAX_HEADING_LEVEL)
        .zip(HEADING_SIZES)
        .map(|(level, size)| {
            NativeStyle::new(heading_style_id(level), StyleType::Paragraph)
                .name(format!("Heading {level}"))
                .size(size)
                .bold()
        })
        .collect();

    styles.push(NativeStyle::new(BODY_TEXT_STYLE, StyleType::Paragraph).name("Body Text"));
    styles.push(NativeStyle::new(LIST_BULLET_STYLE, StyleType::Paragraph).name("List Bullet"));
    styles.push(NativeStyle::new(LIST_NUMBER_STYLE, StyleType::Paragraph).name("List Number"));
    styles
}

fn add_list_numbering(docx: Docx) -> Docx {
    const BULLETS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];

    let mut bullet = AbstractNumbering::new(BULLET_NUMBERING);
    let mut decimal = AbstractNumbering::new(DECIMAL_NUMBERING);

    for level in 0..LIST_LEVELS {
        let left = LIST_INDENT_TWIPS * (level as i32 + 1);
        let indent = |lvl: Level| {
            lvl.indent(
                Some(left),
                Some(SpecialIndentType::Hanging(LIST_INDENT_TWIPS / 2)),
                None,
                None,
            )
        };

        bullet = bullet.add_level(indent(Level::new(
            level,
            Start::new(1),
            NumberFormat::new("bullet"),
            LevelText::new(BULLETS[level % BULLETS.len()]),
            LevelJc::new("left"),
        )));
        decimal = decimal.add_level(indent(Level::new(
            level,
            Start::new(1),
            NumberFormat::new("decimal"),
            LevelText::new(format!("%{}.", level + 1)),
            LevelJc::new("left"),
        )));
    }

    docx.add_abstract_numbering(bullet)
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
        .add_abstract_numbering(decimal)
        .add_numbering(Numbering::new(DECIMAL_NUMBERING, DECIMAL_NUMBERING))
}

/// An empty paragraph in the body text style.
pub(crate) fn body_paragraph() -> Paragraph {
    Paragraph::new().style(BODY_TEXT_STYLE)
}

/// Attach list numbering to a paragraph at nesting `depth` (0-based).
pub(crate) fn list_paragraph(paragraph: Paragraph, ordered: bool, depth: usize) -> Paragraph {
    let (style, numbering) = if ordered {
        (LIST_NUMBER_STYLE, DECIMAL_NUMBERING)
    } else {
        (LIST_BULLET_STYLE, BULLET_NUMBERING)
    };
    paragraph.style(style).numbering(
        NumberingId::new(numbering),
        IndentLevel::new(depth.min(LIST_LEVELS - 1)),
    )
}

/// Apply font, size, bold, italic and color to a run.
fn apply_style(mut run: Run, style: &Style) -> Run {
    if let Some(font) = style.font_name.as_deref().filter(|f| !f.is_empty()) {
        run = run.fonts(
            RunFonts::new()
                .ascii(font)
                .hi_ansi(font)
                .east_asia(font)
                .cs(font),
        );
    }
    if let Some(points) = style.font_size.filter(|p| p.is_finite() && *p > 0.0) {
        run = run.size((points * 2.0).round().max(1.0) as usize);
    }
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }
    if let Some(color) = style.color {
        run = run.color(color.to_hex());
    }
    run
}

/// A styled run; `\n` becomes a line break and `\t` a tab.
pub(crate) fn styled_run(text: &str, style: &Style) -> Run {
    let mut run = Run::new();

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        for (column, segment) in line.split('\t').enumerate() {
            if column > 0 {
                run = run.add_tab();
            }
            if !segment.is_empty() {
                run = run.add_text(segment);
            }
        }
    }

    apply_style(run, style)
}
