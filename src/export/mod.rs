//! Export functionality for rendering LLM output back into `.docx`
//!
//! Two paths share one native builder: the structural exporter replays a
//! `Document` tree, the Markdown renderer handles free-form answers.

pub mod markdown;
pub mod markup;
pub mod native;
pub mod structure;

pub use markdown::{MarkdownConverter, export_markdown_docx};
pub use markup::{MarkupElement, MarkupNode, MarkupTag, parse_markdown};
pub use native::{NativeBlock, NativeDocument};
pub use structure::{build_structure, export_structure_docx};
