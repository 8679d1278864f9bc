//! Error types
//!
//! Library errors are plain enums; the binary wraps them in `anyhow`.
//! Most import and render failures never reach a caller: they are logged and
//! degraded at the importer/exporter boundary. These types exist for the
//! `try_*` entry points and for contract violations.

use thiserror::Error;

/// Failure while reading a source document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The zip container itself could not be opened.
    #[error("corrupt document container: {0}")]
    Container(#[from] zip::result::ZipError),

    #[error("invalid .docx package: missing {0}")]
    MissingPart(String),

    #[error("this appears to be an Excel workbook, not a Word document")]
    NotWordDocument,

    #[error("malformed XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure while walking a Markdown tree into native blocks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("table row {row} has {cells} cells but the table has {columns} columns")]
    CellOutOfRange {
        row: usize,
        cells: usize,
        columns: usize,
    },

    #[error("markup nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    #[error("unbalanced markup: {0}")]
    UnbalancedMarkup(String),
}

/// Failure while producing output bytes.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write .docx package: {0}")]
    Package(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Contract violations and failures at the provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown model '{model}'. Available models: {}", available.join(", "))]
    UnknownModel {
        model: String,
        available: Vec<String>,
    },

    #[error("no API key available for {0}")]
    MissingApiKey(String),

    #[error("provider {0} must declare at least one model")]
    NoModels(String),

    #[error("invalid batch request: {0}")]
    InvalidBatchRequest(String),

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },

    #[error("API error: {0}")]
    Api(String),
}
