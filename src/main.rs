//! docbridge - document import/export for LLM workflows

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use docbridge::document::{
    ImportMode, ImportedContent, chunk_markdown, load_upload, split_document_into_chunks,
};
use docbridge::{ExportFormat, ExportPath, Settings, build_prompt, export_response};

#[derive(Parser)]
#[command(name = "docbridge")]
#[command(version, about = "Style-preserving .docx import and export for LLM workflows", long_about = None)]
#[command(after_help = "EXAMPLES:
    docbridge import report.docx                 Print the structural tree as JSON
    docbridge import report.docx --markdown      Print the document as Markdown
    docbridge export answer.md -o answer.docx    Render a model response
    docbridge prompt report.docx -i \"Translate to English\"")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a .docx or .pdf upload
    Import {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Flat Markdown instead of the structural tree
        #[arg(short, long)]
        markdown: bool,

        /// Split the result into chunks
        #[arg(short, long)]
        chunk: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Turn a model response into a .docx
    Export {
        /// Response file (JSON tree or Markdown)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output .docx file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Export path
        #[arg(short, long, value_enum, default_value = "auto")]
        format: ExportFormat,
    },

    /// Print the prompt that would be sent for an upload
    Prompt {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Instruction for the model
        #[arg(short, long)]
        instruction: String,

        /// Send the document as Markdown instead of the structural tree
        #[arg(short, long)]
        markdown: bool,
    },

    /// Write the default settings file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };

    match cli.command {
        Commands::Import {
            input,
            markdown,
            chunk,
            output,
        } => {
            let mode = import_mode(markdown);
            let content = load(&input, mode).await?;
            let rendered = if chunk {
                render_chunks(&content, &settings)?
            } else {
                content.to_prompt_text()
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Export {
            input,
            output,
            format,
        } => {
            let response = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let exported = export_response(
                &response,
                format.wants_structure(&response),
                &settings.styles,
            )?;
            tokio::fs::write(&output, &exported.bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;

            let path = match exported.path {
                ExportPath::Structure => "structure",
                ExportPath::Markdown => "markdown",
            };
            eprintln!("Wrote {} ({path})", output.display());
        }
        Commands::Prompt {
            input,
            instruction,
            markdown,
        } => {
            let content = load(&input, import_mode(markdown)).await?;
            println!("{}", build_prompt(&instruction, Some(&content)));
        }
        Commands::InitConfig => {
            let written = match &cli.config {
                Some(path) => {
                    Settings::default().save_to(path)?;
                    Some(path.clone())
                }
                None => Settings::init_default()?,
            };
            match written {
                Some(path) => eprintln!("Wrote default settings to {}", path.display()),
                None => bail!("No configuration directory available on this platform"),
            }
        }
    }

    Ok(())
}

fn import_mode(markdown: bool) -> ImportMode {
    if markdown {
        ImportMode::Markdown
    } else {
        ImportMode::Structure
    }
}

async fn load(path: &Path, mode: ImportMode) -> Result<ImportedContent> {
    let content = load_upload(path, mode)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.is_empty() {
        log::warn!("{} produced no content", path.display());
    }
    Ok(content)
}

fn render_chunks(content: &ImportedContent, settings: &Settings) -> Result<String> {
    let rendered = match content {
        ImportedContent::Structured(document) => {
            let chunks = split_document_into_chunks(document, settings.chunking.block_threshold);
            serde_json::to_string_pretty(&chunks)?
        }
        ImportedContent::Text(text) => {
            let chunks = chunk_markdown(text, settings.chunking.word_budget);
            serde_json::to_string_pretty(&chunks)?
        }
    };
    Ok(rendered)
}

fn write_output(output: Option<&Path>, rendered: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
