//! Document parsing and data structures module
//!
//! This module provides functionality for importing Microsoft Word (.docx)
//! and PDF uploads, converting them into a structured representation or
//! Markdown text, and chunking the result for LLM calls.

pub mod chunking;
pub(crate) mod io;
pub mod loader;
pub mod markdown;
pub mod models;
pub(crate) mod parsing;
pub(crate) mod source;
pub mod style;

pub use chunking::{chunk_markdown, group_blocks_into_chunks, split_document_into_chunks};
pub use io::{SourceFormat, read_upload};
pub use loader::{
    ImportMode, ImportedContent, import_markdown, import_pdf_text, import_structure,
    import_upload, load_upload, try_import_markdown, try_import_structure,
};
pub use markdown::{MarkdownBlock, markdown_blocks};
pub use models::*;
pub use style::{Rgb, Style, StyleSheet};
