//! docbridge: the document side of LLM workflows
//!
//! This library imports Microsoft Word (.docx) and PDF uploads into a
//! style-preserving structure or Markdown text, chunks them for model calls,
//! and turns model responses back into .docx files.

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod provider;

/// How a model response is exported
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Structural tree when the response parses as one, Markdown otherwise
    #[default]
    Auto,
    /// Structural tree, falling back to Markdown on a schema mismatch
    Structure,
    /// Markdown rendering
    Markdown,
}

impl ExportFormat {
    /// Whether the structural exporter should be attempted for `response`.
    pub fn wants_structure(self, response: &str) -> bool {
        match self {
            ExportFormat::Auto => Document::try_parse(response).is_some(),
            ExportFormat::Structure => true,
            ExportFormat::Markdown => false,
        }
    }
}

// Re-export commonly used types
pub use config::Settings;
pub use document::{Block, Document, ImportMode, ImportedContent, Run, Style, StyleSheet};
pub use error::{DocumentError, ExportError, ProviderError, RenderError};
pub use pipeline::{ExportPath, ExportedResponse, build_prompt, export_response};
pub use provider::{GenerationParams, ModelRegistry, Provider};
