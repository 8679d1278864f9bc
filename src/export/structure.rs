//! Structural tree to `.docx`
//!
//! Replays a (possibly LLM-transformed) [`Document`] into native blocks:
//! headings onto the `HeadingN` styles, lists as bullet paragraphs, tables as
//! grids sized by their first row, and every run with its exact formatting.

use docx_rs::{Paragraph, Table, TableCell, TableRow};

use super::native::{
    NativeBlock, NativeDocument, body_paragraph, heading_style_id, list_paragraph, styled_run,
};
use crate::document::models::{Block, Document, Run};
use crate::document::style::StyleSheet;
use crate::error::ExportError;

/// Build the native document for `document` without packing it.
pub fn build_structure(document: &Document, styles: &StyleSheet) -> NativeDocument {
    let mut native = NativeDocument::new().with_table_of_contents();

    if !document.header.is_empty() {
        native.set_header(replay_blocks(&document.header, styles));
    }
    if !document.footer.is_empty() {
        native.set_footer(replay_blocks(&document.footer, styles));
    }
    native.extend(replay_blocks(&document.body, styles));

    native
}

/// Rebuild a `.docx` from a structural tree.
pub fn export_structure_docx(document: &Document, styles: &StyleSheet) -> Result<Vec<u8>, ExportError> {
    build_structure(document, styles).to_bytes()
}

fn replay_blocks(blocks: &[Block], styles: &StyleSheet) -> Vec<NativeBlock> {
    let mut native = Vec::with_capacity(blocks.len());

    for block in blocks {
        match block {
            Block::Heading { level, runs } => {
                let paragraph = Paragraph::new().style(&heading_style_id(*level));
                native.push(replay_runs(paragraph, runs).into());
            }
            Block::Paragraph { runs } => {
                native.push(replay_runs(body_paragraph(), runs).into());
            }
            Block::List { items } => {
                let style = styles.response();
                native.extend(items.iter().map(|item| {
                    let paragraph = Paragraph::new().add_run(styled_run(item, &style));
                    NativeBlock::from(list_paragraph(paragraph, false, 0))
                }));
            }
            Block::Table { rows } => {
                if let Some(table) = replay_table(rows, styles) {
                    native.push(table.into());
                }
            }
        }
    }

    native
}

fn replay_runs(paragraph: Paragraph, runs: &[Run]) -> Paragraph {
    runs.iter().fold(paragraph, |paragraph, run| {
        paragraph.add_run(styled_run(&run.text, &run.style))
    })
}

fn replay_table(rows: &[Vec<Vec<Block>>], styles: &StyleSheet) -> Option<Table> {
    let columns = rows.first().map_or(0, Vec::len);
    if columns == 0 {
        log::warn!("Skipping table without cells in its first row");
        return None;
    }

    let native_rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() > columns {
                log::warn!(
                    "Table row {index} has {} cells, keeping the first {columns}",
                    row.len()
                );
            }
            let mut cells: Vec<TableCell> = row
                .iter()
                .take(columns)
                .map(|cell| replay_cell(cell, styles))
                .collect();
            while cells.len() < columns {
                cells.push(TableCell::new().add_paragraph(Paragraph::new()));
            }
            TableRow::new(cells)
        })
        .collect();

    Some(Table::new(native_rows))
}

/// A cell's content; a cell always ends with a paragraph.
fn replay_cell(blocks: &[Block], styles: &StyleSheet) -> TableCell {
    let content = replay_blocks(blocks, styles);
    let ends_with_paragraph = content.last().is_some_and(NativeBlock::is_paragraph);

    let mut cell = content
        .into_iter()
        .fold(TableCell::new(), |cell, block| match block {
            NativeBlock::Paragraph(paragraph) => cell.add_paragraph(*paragraph),
            NativeBlock::Table(table) => cell.add_table(*table),
        });
    if !ends_with_paragraph {
        cell = cell.add_paragraph(Paragraph::new());
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::style::Style;

    #[test]
    fn test_list_items_become_paragraphs() {
        let document = Document::with_body(vec![Block::List {
            items: vec!["a".into(), "b".into(), "c".into()],
        }]);
        let native = build_structure(&document, &StyleSheet::new());
        assert_eq!(native.paragraph_count(), 3);
        assert!(native.has_table_of_contents());
    }

    #[test]
    fn test_empty_tables_are_skipped() {
        let document = Document::with_body(vec![
            Block::Table { rows: vec![] },
            Block::Table {
                rows: vec![vec![]],
            },
        ]);
        assert!(build_structure(&document, &StyleSheet::new()).body().is_empty());
    }

    #[test]
    fn test_header_and_footer_are_set() {
        let run = Run::new("Page", Style::default().with_italic(true));
        let document = Document::new(
            vec![Block::paragraph(vec![run.clone()])],
            vec![],
            vec![Block::paragraph(vec![run])],
        );
        let native = build_structure(&document, &StyleSheet::new());
        assert_eq!(native.header().len(), 1);
        assert_eq!(native.footer().len(), 1);
        assert!(native.body().is_empty());
    }

    #[test]
    fn test_ragged_rows_are_normalized() {
        let cell = |text: &str| vec![Block::paragraph(vec![Run::plain(text)])];
        let rows = vec![
            vec![cell("a"), cell("b")],
            vec![cell("c")],
            vec![cell("d"), cell("e"), cell("f")],
        ];
        assert!(replay_table(&rows, &StyleSheet::new()).is_some());
    }
}
