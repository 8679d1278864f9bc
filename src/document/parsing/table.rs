//! Table extraction and processing
//!
//! Tables are read cell by cell; each cell is analyzed as a container of its
//! own so nested tables survive. The flat view renders tables as Markdown
//! pipe tables.

use super::super::models::{Block, TableRows};
use super::super::source::{Container, SourceElement, SourceTable};
use super::formatting::markdown_emphasis;

/// Build a `Table` block, analyzing each cell with `analyze_cell`.
///
/// Zero-row tables produce nothing.
pub(crate) fn extract_table<F>(table: &SourceTable, mut analyze_cell: F) -> Option<Block>
where
    F: FnMut(Container<'_>) -> Vec<Block>,
{
    if table.rows.is_empty() {
        return None;
    }

    let rows: TableRows = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| analyze_cell(Container::Cell(cell)))
                .collect()
        })
        .collect();

    log::info!("Table detected in source document ({} rows)", rows.len());
    Some(Block::Table { rows })
}

/// Cell content for a pipe table: the cell's own paragraphs with emphasis,
/// joined by `<br>`. Nested tables are flattened away.
fn markdown_cell(cell: &[SourceElement]) -> String {
    let paragraphs: Vec<String> = cell
        .iter()
        .filter_map(|element| match element {
            SourceElement::Paragraph(paragraph) => Some(
                paragraph
                    .runs
                    .iter()
                    .map(markdown_emphasis)
                    .collect::<String>()
                    .replace('|', "\\|"),
            ),
            SourceElement::Table(_) => None,
        })
        .collect();

    paragraphs.join("<br>")
}

/// Render a table as pipe-table lines: the first row as header, then a
/// `---` separator sized to it, then the remaining rows.
pub(crate) fn markdown_table_lines(table: &SourceTable) -> Vec<String> {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| markdown_cell(cell)).collect())
        .collect();

    let Some(header) = rows.first() else {
        return Vec::new();
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(pipe_row(header));
    lines.push(pipe_row(&vec!["---".to_string(); header.len()]));
    lines.extend(rows.iter().skip(1).map(|row| pipe_row(row)));

    log::info!("Table converted to Markdown:\n{}\n{}\n...", lines[0], lines[1]);
    lines
}

fn pipe_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}
