use docbridge::document::{Block, Rgb, Style, StyleSheet, try_import_structure};
use docbridge::export::{MarkdownConverter, export_markdown_docx};

fn styles() -> StyleSheet {
    StyleSheet::new().with_role(
        StyleSheet::RESPONSE,
        Style::default()
            .with_font("Arial")
            .with_size(12.0)
            .with_color(Rgb(0x1E, 0x1E, 0x1E)),
    )
}

#[test]
fn test_markdown_headings_and_emphasis() {
    let bytes = export_markdown_docx(
        "# Summary\n\nThe result is **final** and *clear*.\n\n## Details\n\nMore text.",
        &styles(),
    )
    .unwrap();
    let document = try_import_structure(&bytes).unwrap();

    assert!(document.body[0].is_heading_level(1));
    assert_eq!(document.body[0].plain_text(), "Summary");
    assert_eq!(document.body[1].plain_text(), "The result is final and clear.");
    assert!(document.body[2].is_heading_level(2));

    let runs = document.body[1].runs();
    let bold = runs.iter().find(|run| run.text == "final").unwrap();
    assert!(bold.style.bold);
    assert_eq!(bold.style.font_name.as_deref(), Some("Arial"));
    let italic = runs.iter().find(|run| run.text == "clear").unwrap();
    assert!(italic.style.italic);
}

#[test]
fn test_markdown_lists_become_list_paragraphs() {
    let bytes = export_markdown_docx("# Items\n\n- alpha\n- beta\n\n1. one\n2. two\n", &styles()).unwrap();
    let document = try_import_structure(&bytes).unwrap();

    let items: Vec<String> = document
        .body
        .iter()
        .filter_map(|block| match block {
            Block::List { items } => Some(items.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(items, vec!["alpha", "beta", "one", "two"]);
}

#[test]
fn test_markdown_table_is_a_native_table() {
    let bytes = export_markdown_docx(
        "# Scores\n\n| Name | Score |\n| --- | --- |\n| Ada | 10 |\n",
        &styles(),
    )
    .unwrap();
    let document = try_import_structure(&bytes).unwrap();

    let Some(Block::Table { rows }) = document.body.get(1) else {
        panic!("expected a table, got {:?}", document.body);
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0][0].plain_text(), "Ada");
}

#[test]
fn test_fallback_always_adds_content() {
    let deep = format!("{} unreachable", ">".repeat(100));
    let sheet = styles();
    let mut converter = MarkdownConverter::new(&sheet);
    converter.add_markdown(&deep);

    let document = converter.into_document();
    assert_eq!(document.paragraph_count(), 2);
    assert!(document.to_bytes().is_ok());
}

#[test]
fn test_empty_markdown_adds_nothing() {
    let sheet = styles();
    let mut converter = MarkdownConverter::new(&sheet);
    converter.add_markdown("  \n ");
    assert_eq!(converter.document().paragraph_count(), 0);
}

#[test]
fn test_code_block_is_monospace() {
    let bytes = export_markdown_docx("# Code\n\n```\nlet x = 1;\n```\n", &styles()).unwrap();
    let document = try_import_structure(&bytes).unwrap();

    let run = &document.body[1].runs()[0];
    assert_eq!(run.text, "let x = 1;");
    assert_eq!(run.style.font_name.as_deref(), Some("Consolas"));
}

#[test]
fn test_inline_code_and_links_are_rendered() {
    let bytes = export_markdown_docx(
        "# Usage\n\nSet `RUST_LOG` and see [the docs](https://example.com/docs).",
        &styles(),
    )
    .unwrap();
    let document = try_import_structure(&bytes).unwrap();

    let paragraph = &document.body[1];
    assert_eq!(paragraph.plain_text(), "Set RUST_LOG and see the docs.");

    let runs = paragraph.runs();
    let code = runs.iter().find(|run| run.text == "RUST_LOG").unwrap();
    assert_eq!(code.style.font_name.as_deref(), Some("Consolas"));
    let link = runs.iter().find(|run| run.text == "the docs").unwrap();
    assert_eq!(link.style.font_name.as_deref(), Some("Arial"));
}
