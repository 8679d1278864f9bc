use std::io::Cursor;

use docbridge::document::{
    Block, ImportMode, ImportedContent, import_markdown, import_structure, import_upload,
    load_upload, try_import_structure,
};
use docx_rs::{Docx, Paragraph, Run, Style, StyleType, Table, TableCell, TableRow};

fn pack(docx: Docx) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("fixture should pack");
    buffer.into_inner()
}

fn text(value: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(value))
}

fn bold(value: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(value).bold())
}

fn styled_fixture() -> Vec<u8> {
    pack(
        Docx::new()
            .add_style(Style::new("Heading1", StyleType::Paragraph).name("Heading 1"))
            .add_style(Style::new("Heading3", StyleType::Paragraph).name("Heading 3"))
            .add_style(Style::new("ListBullet", StyleType::Paragraph).name("List Bullet"))
            .add_paragraph(text("Overview").style("Heading1"))
            .add_paragraph(text("Intro paragraph."))
            .add_paragraph(text("Detail").style("Heading3"))
            .add_paragraph(text("first").style("ListBullet"))
            .add_paragraph(text("second").style("ListBullet"))
            .add_paragraph(bold("Bold line"))
            .add_table(Table::new(vec![
                TableRow::new(vec![
                    TableCell::new().add_paragraph(text("A")),
                    TableCell::new().add_paragraph(text("B")),
                ]),
                TableRow::new(vec![
                    TableCell::new().add_paragraph(text("1")),
                    TableCell::new().add_paragraph(text("2")),
                ]),
            ])),
    )
}

#[test]
fn test_corrupt_container_gives_empty_document() {
    let document = import_structure(b"definitely not a zip");
    assert!(document.is_empty());
    assert!(try_import_structure(b"definitely not a zip").is_err());
    assert_eq!(import_markdown(b"\x00\x01\x02"), "");
}

#[test]
fn test_styled_document_structure() {
    let document = import_structure(&styled_fixture());
    let types: Vec<String> = document.body.iter().map(Block::type_name).collect();

    // Heading 3 is beyond the structural depth and stays a paragraph
    assert_eq!(
        types,
        vec![
            "heading_1",
            "paragraph",
            "paragraph",
            "list",
            "paragraph",
            "table"
        ]
    );
    assert_eq!(
        document.body[3],
        Block::List {
            items: vec!["first".to_string(), "second".to_string()]
        }
    );
    // Heading styles are present, so the bold line is not promoted
    assert!(document.body[4].runs()[0].style.bold);
}

#[test]
fn test_styled_document_markdown() {
    let markdown = import_markdown(&styled_fixture());

    assert!(markdown.starts_with("# Overview"));
    assert!(markdown.contains("### Detail"));
    assert!(markdown.contains("* first\n\n* second"));
    assert!(markdown.contains("**Bold line**"));
    assert!(markdown.contains("| A | B |\n| --- | --- |\n| 1 | 2 |"));
}

#[test]
fn test_heuristic_titles_without_heading_styles() {
    let bytes = pack(
        Docx::new()
            .add_paragraph(bold("2. Methods"))
            .add_paragraph(bold("Sampling strategy"))
            .add_paragraph(text("We sampled widely."))
            .add_paragraph(bold("A complete sentence in bold.")),
    );
    let document = import_structure(&bytes);

    assert!(document.body[0].is_heading_level(1));
    assert!(document.body[1].is_heading_level(2));
    assert_eq!(document.body[2].type_name(), "paragraph");
    assert_eq!(document.body[3].type_name(), "paragraph");
}

#[test]
fn test_empty_paragraphs_are_skipped() {
    let bytes = pack(
        Docx::new()
            .add_paragraph(Paragraph::new())
            .add_paragraph(text("Only content"))
            .add_paragraph(Paragraph::new()),
    );
    let document = import_structure(&bytes);
    assert_eq!(document.body.len(), 1);
    assert_eq!(document.body[0].plain_text(), "Only content");
}

#[test]
fn test_pdf_never_returns_structure() {
    let content = import_upload("scan.pdf", b"%PDF-1.4 garbage", ImportMode::Structure);
    assert!(!content.is_structured());
}

#[test]
fn test_unknown_extension_is_empty_text() {
    let content = import_upload("notes.txt", b"hello", ImportMode::Structure);
    assert_eq!(content, ImportedContent::Text(String::new()));
}

#[test]
fn test_upload_dispatch_by_mode() {
    let bytes = styled_fixture();
    assert!(import_upload("Report.DOCX", &bytes, ImportMode::Structure).is_structured());

    let markdown = import_upload("report.docx", &bytes, ImportMode::Markdown);
    assert!(!markdown.is_structured());
    assert!(!markdown.is_empty());
}

#[tokio::test]
async fn test_load_upload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.docx");
    std::fs::write(&path, styled_fixture()).unwrap();

    let content = load_upload(&path, ImportMode::Structure).await.unwrap();
    assert!(content.is_structured());

    let missing = load_upload(&dir.path().join("missing.docx"), ImportMode::Structure).await;
    assert!(missing.is_err());
}
