//! Package I/O and validation
//!
//! This module opens the `.docx` zip container, validates that it is a Word
//! document, and resolves the parts the importer needs: the main document,
//! the style table and the first section's header/footer.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use zip::ZipArchive;

use super::parsing::xml::{XmlElement, parse_xml};
use crate::error::DocumentError;

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Input formats the importer understands, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Docx,
    Pdf,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("docx") => Some(SourceFormat::Docx),
            Some("pdf") => Some(SourceFormat::Pdf),
            _ => None,
        }
    }
}

/// An opened `.docx` container.
pub(crate) struct Package {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl Package {
    /// Open and validate the container.
    pub(crate) fn open(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec()))?;

        if archive.by_name(DOCUMENT_PART).is_err() {
            // Check if it might be an Excel file
            if archive.by_name("xl/workbook.xml").is_ok() {
                return Err(DocumentError::NotWordDocument);
            }
            return Err(DocumentError::MissingPart(DOCUMENT_PART.to_string()));
        }

        Ok(Self { archive })
    }

    fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, DocumentError> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn read_xml(&mut self, name: &str) -> Result<Option<XmlElement>, DocumentError> {
        match self.read_part(name)? {
            Some(data) => parse_xml(&data, name).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn document_xml(&mut self) -> Result<XmlElement, DocumentError> {
        self.read_xml(DOCUMENT_PART)?
            .ok_or_else(|| DocumentError::MissingPart(DOCUMENT_PART.to_string()))
    }

    /// Style id to display name (`Heading1` -> `heading 1`, `Titre1` -> `heading 1`).
    pub(crate) fn style_names(&mut self) -> Result<HashMap<String, String>, DocumentError> {
        let mut names = HashMap::new();
        let Some(styles) = self.read_xml(STYLES_PART)? else {
            return Ok(names);
        };

        for style in styles.elements().filter(|e| e.is("w:style")) {
            if let (Some(id), Some(name)) = (
                style.attr("styleId"),
                style.child("w:name").and_then(|n| n.attr("val")),
            ) {
                names.entry(id.to_string()).or_insert_with(|| name.to_string());
            }
        }

        Ok(names)
    }

    /// Header and footer parts referenced by the first section, if any.
    pub(crate) fn first_section_parts(
        &mut self,
        document: &XmlElement,
    ) -> Result<SectionParts, DocumentError> {
        let Some(section) = document.find("w:sectPr") else {
            return Ok(SectionParts::default());
        };

        let relationships = self.relationships()?;
        let header_target = preferred_reference(section, "w:headerReference")
            .and_then(|id| relationships.get(id));
        let footer_target = preferred_reference(section, "w:footerReference")
            .and_then(|id| relationships.get(id));

        let header = match header_target {
            Some(target) => self.read_xml(&part_path(target))?,
            None => None,
        };
        let footer = match footer_target {
            Some(target) => self.read_xml(&part_path(target))?,
            None => None,
        };

        Ok(SectionParts { header, footer })
    }

    fn relationships(&mut self) -> Result<HashMap<String, String>, DocumentError> {
        let mut targets = HashMap::new();
        if let Some(rels) = self.read_xml(DOCUMENT_RELS_PART)? {
            for rel in rels.elements().filter(|e| e.is("Relationship")) {
                if let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) {
                    targets.insert(id.to_string(), target.to_string());
                }
            }
        }
        Ok(targets)
    }
}

/// Root elements of the first section's header and footer parts.
#[derive(Debug, Default)]
pub(crate) struct SectionParts {
    pub(crate) header: Option<XmlElement>,
    pub(crate) footer: Option<XmlElement>,
}

/// The `default` reference when present, otherwise the first one.
fn preferred_reference<'a>(section: &'a XmlElement, name: &str) -> Option<&'a str> {
    let references: Vec<&XmlElement> = section.elements().filter(|e| e.is(name)).collect();
    let first = references.first().copied();
    references
        .iter()
        .copied()
        .find(|r| r.attr("type") == Some("default"))
        .or(first)
        .and_then(|r| r.attr("id"))
}

/// Relationship targets are relative to `word/` unless absolute.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}

/// Read an uploaded file from disk.
pub async fn read_upload(path: &Path) -> Result<Vec<u8>, DocumentError> {
    Ok(tokio::fs::read(path).await?)
}
