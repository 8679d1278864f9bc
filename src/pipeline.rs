//! Prompt construction and response export
//!
//! The glue between an imported upload, the LLM call and the `.docx` that
//! goes back to the user.

use crate::document::loader::ImportedContent;
use crate::document::models::Document;
use crate::document::style::StyleSheet;
use crate::error::ExportError;
use crate::export::markdown::export_markdown_docx;
use crate::export::structure::export_structure_docx;

const MARKDOWN_FORMAT_INSTRUCTION: &str =
    "Formatting instruction: structure your final answer using Markdown syntax \
     (headings, lists, bold, tables...).";

/// Which exporter produced a response document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPath {
    Structure,
    Markdown,
}

#[derive(Debug, Clone)]
pub struct ExportedResponse {
    pub bytes: Vec<u8>,
    pub path: ExportPath,
}

/// Build the prompt sent to the model for `instruction` and an optional upload.
pub fn build_prompt(instruction: &str, content: Option<&ImportedContent>) -> String {
    match content {
        None => instruction.to_string(),
        Some(ImportedContent::Text(text)) => format!(
            "Here is an instruction to apply to the content of a document.\n\n\
             User instruction: \"{instruction}\"\n\n\
             Document content to analyze:\n{text}\n\n---\n{MARKDOWN_FORMAT_INSTRUCTION}"
        ),
        Some(ImportedContent::Structured(document)) => structured_prompt(instruction, document),
    }
}

fn structured_prompt(instruction: &str, document: &Document) -> String {
    format!(
        "You are a document processing expert. Apply the following instruction to \
         the document represented as JSON below.\n\n\
         Instruction: \"{instruction}\"\n\n\
         ABSOLUTE RULES:\n\
         1. Keep the JSON structure exactly as it is. Do not add, remove or rename \
         any key (\"header\", \"body\", \"footer\", \"type\", \"runs\", \"style\", \
         \"items\", \"rows\").\n\
         2. Only change the values of the \"text\" keys (and the strings of \"items\").\n\
         3. Never modify a \"style\" object.\n\
         4. Answer with the JSON document only, without any explanation or code fence.\n\n\
         JSON TO PROCESS:\n{}",
        document.to_json_pretty()
    )
}

/// Turn a model response into `.docx` bytes.
///
/// When structure was requested and the response parses as a [`Document`],
/// the structural exporter replays it; anything else goes through the
/// Markdown renderer.
pub fn export_response(
    response: &str,
    structured_requested: bool,
    styles: &StyleSheet,
) -> Result<ExportedResponse, ExportError> {
    if structured_requested {
        match Document::try_parse(response) {
            Some(document) => {
                log::debug!("Response parsed as a structural document");
                return Ok(ExportedResponse {
                    bytes: export_structure_docx(&document, styles)?,
                    path: ExportPath::Structure,
                });
            }
            None => {
                log::warn!("Response does not match the document schema, exporting as Markdown");
            }
        }
    }

    Ok(ExportedResponse {
        bytes: export_markdown_docx(response, styles)?,
        path: ExportPath::Markdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::models::{Block, Run};

    #[test]
    fn test_plain_prompt_without_upload() {
        assert_eq!(build_prompt("Summarize", None), "Summarize");
    }

    #[test]
    fn test_text_prompt_asks_for_markdown() {
        let content = ImportedContent::Text("Quarterly results".to_string());
        let prompt = build_prompt("Summarize", Some(&content));
        assert!(prompt.contains("\"Summarize\""));
        assert!(prompt.contains("Quarterly results"));
        assert!(prompt.ends_with(MARKDOWN_FORMAT_INSTRUCTION));
    }

    #[test]
    fn test_structured_prompt_embeds_json() {
        let document = Document::with_body(vec![Block::paragraph(vec![Run::plain("Bonjour")])]);
        let content = ImportedContent::Structured(document.clone());
        let prompt = build_prompt("Translate to English", Some(&content));
        assert!(prompt.contains("JSON TO PROCESS:\n"));
        assert!(prompt.ends_with(&document.to_json_pretty()));
    }

    #[test]
    fn test_structured_response_uses_structure_exporter() {
        let document = Document::with_body(vec![Block::heading(1, vec![Run::plain("Hello")])]);
        let exported =
            export_response(&document.to_json_pretty(), true, &StyleSheet::new()).unwrap();
        assert_eq!(exported.path, ExportPath::Structure);
        assert_eq!(&exported.bytes[..2], b"PK");
    }

    #[test]
    fn test_schema_mismatch_falls_back_to_markdown() {
        let exported = export_response("# Not JSON\n\nplain", true, &StyleSheet::new()).unwrap();
        assert_eq!(exported.path, ExportPath::Markdown);
    }

    #[test]
    fn test_foreign_json_object_falls_back_to_markdown() {
        let response = r#"{"answer": "Bonjour tout le monde"}"#;
        let exported = export_response(response, true, &StyleSheet::new()).unwrap();
        assert_eq!(exported.path, ExportPath::Markdown);

        let document = crate::document::loader::import_structure(&exported.bytes);
        assert!(
            document
                .body
                .iter()
                .any(|block| block.plain_text().contains("Bonjour tout le monde"))
        );
    }

    #[test]
    fn test_markdown_requested_ignores_json() {
        let exported = export_response("{\"body\": []}", false, &StyleSheet::new()).unwrap();
        assert_eq!(exported.path, ExportPath::Markdown);
    }
}
