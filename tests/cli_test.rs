use std::path::Path;
use std::process::{Command, Output};

use docbridge::document::{Block, Document, Run, StyleSheet, try_import_structure};
use docbridge::export::export_structure_docx;
use tempfile::TempDir;

fn docbridge(dir: &Path, args: &[&str]) -> Output {
    // Keep the user's settings out of the way
    let config = dir.join("config.toml");
    Command::new(env!("CARGO_BIN_EXE_docbridge"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("Failed to execute docbridge")
}

fn write_fixture(dir: &Path) -> String {
    let document = Document::with_body(vec![
        Block::heading(1, vec![Run::plain("Rapport annuel")]),
        Block::paragraph(vec![Run::plain("Le chiffre d'affaires progresse.")]),
    ]);
    let path = dir.join("report.docx");
    std::fs::write(&path, export_structure_docx(&document, &StyleSheet::new()).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_import_prints_json_tree() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    let output = docbridge(dir.path(), &["import", &input]);
    assert!(
        output.status.success(),
        "import should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let document = Document::try_parse(&stdout).expect("stdout should be a document");
    assert!(document.body[0].is_heading_level(1));
}

#[test]
fn test_import_markdown_chunks() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    let output = docbridge(dir.path(), &["import", &input, "--markdown", "--chunk"]);
    assert!(output.status.success());

    let chunks: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].starts_with("# Rapport annuel"));
}

#[test]
fn test_export_writes_docx() {
    let dir = TempDir::new().unwrap();
    let response = dir.path().join("answer.md");
    let target = dir.path().join("answer.docx");
    std::fs::write(&response, "# Annual report\n\nRevenue is **up**.").unwrap();

    let output = docbridge(
        dir.path(),
        &[
            "export",
            &response.to_string_lossy(),
            "-o",
            &target.to_string_lossy(),
        ],
    );
    assert!(
        output.status.success(),
        "export should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let document = try_import_structure(&std::fs::read(&target).unwrap()).unwrap();
    assert_eq!(document.body[0].plain_text(), "Annual report");
}

#[test]
fn test_prompt_embeds_document() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    let output = docbridge(
        dir.path(),
        &["prompt", &input, "--instruction", "Translate to English"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Translate to English"));
    assert!(stdout.contains("JSON TO PROCESS:"));
    assert!(stdout.contains("Rapport annuel"));
}

#[test]
fn test_init_config_writes_settings() {
    let dir = TempDir::new().unwrap();

    let output = docbridge(dir.path(), &["init-config"]);
    assert!(output.status.success());

    let content = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(content.contains("[chunking]"));
    assert!(content.contains("word_budget = 7500"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = docbridge(dir.path(), &["import", "does-not-exist.docx"]);
    assert!(!output.status.success());
}
