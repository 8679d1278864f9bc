//! Native element tree
//!
//! The package is first read into paragraphs and tables in document order,
//! with tables nesting inside cells. Importers then walk this tree through a
//! [`Container`] instead of touching XML.

use std::collections::HashMap;

use super::io::Package;
use super::models::Run;
use super::parsing::formatting::collect_paragraph_runs;
use super::parsing::xml::XmlElement;
use crate::error::DocumentError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceParagraph {
    pub(crate) style_id: Option<String>,
    /// Display name from `styles.xml`, when the style is declared there.
    pub(crate) style_name: Option<String>,
    pub(crate) runs: Vec<Run>,
}

impl SourceParagraph {
    /// Name used for classification: the display name, else the style id.
    pub(crate) fn style_label(&self) -> Option<&str> {
        self.style_name.as_deref().or(self.style_id.as_deref())
    }

    pub(crate) fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceTable {
    /// Rows of cells; each cell is itself a sequence of elements.
    pub(crate) rows: Vec<Vec<Vec<SourceElement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SourceElement {
    Paragraph(SourceParagraph),
    Table(SourceTable),
}

/// Where a run of elements lives. Each variant yields its children in
/// document order.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Container<'a> {
    Body(&'a [SourceElement]),
    Cell(&'a [SourceElement]),
    HeaderFooter(&'a [SourceElement]),
}

impl<'a> Container<'a> {
    pub(crate) fn children(&self) -> &'a [SourceElement] {
        match *self {
            Container::Body(children)
            | Container::Cell(children)
            | Container::HeaderFooter(children) => children,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Container::Body(_) => "body",
            Container::Cell(_) => "cell",
            Container::HeaderFooter(_) => "header/footer",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SourcePackage {
    pub(crate) body: Vec<SourceElement>,
    pub(crate) header: Option<Vec<SourceElement>>,
    pub(crate) footer: Option<Vec<SourceElement>>,
}

impl SourcePackage {
    pub(crate) fn read(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut package = Package::open(bytes)?;
        let document = package.document_xml()?;
        let style_names = package.style_names()?;

        let body = document
            .child("w:body")
            .map(|body| read_elements(body, &style_names))
            .unwrap_or_default();

        let section = package.first_section_parts(&document)?;
        let header = section
            .header
            .as_ref()
            .map(|part| read_elements(part, &style_names));
        let footer = section
            .footer
            .as_ref()
            .map(|part| read_elements(part, &style_names));

        Ok(Self {
            body,
            header,
            footer,
        })
    }
}

/// Read the block-level children of `parent` in document order.
fn read_elements(parent: &XmlElement, style_names: &HashMap<String, String>) -> Vec<SourceElement> {
    let mut elements = Vec::new();

    for child in parent.elements() {
        match child.name.as_str() {
            "w:p" => elements.push(SourceElement::Paragraph(read_paragraph(child, style_names))),
            "w:tbl" => elements.push(SourceElement::Table(read_table(child, style_names))),
            "w:sdt" => {
                if is_table_of_contents(child) {
                    log::debug!("Skipping table of contents content control");
                    continue;
                }
                if let Some(content) = child.child("w:sdtContent") {
                    elements.extend(read_elements(content, style_names));
                }
            }
            "w:customXml" => elements.extend(read_elements(child, style_names)),
            _ => {}
        }
    }

    elements
}

fn read_paragraph(paragraph: &XmlElement, style_names: &HashMap<String, String>) -> SourceParagraph {
    let style_id = paragraph
        .child("w:pPr")
        .and_then(|props| props.child("w:pStyle"))
        .and_then(|style| style.attr("val"))
        .map(str::to_string);
    let style_name = style_id
        .as_ref()
        .and_then(|id| style_names.get(id))
        .cloned();

    SourceParagraph {
        style_id,
        style_name,
        runs: collect_paragraph_runs(paragraph),
    }
}

fn read_table(table: &XmlElement, style_names: &HashMap<String, String>) -> SourceTable {
    let rows = table
        .elements()
        .filter(|e| e.is("w:tr"))
        .map(|row| {
            row.elements()
                .filter(|e| e.is("w:tc"))
                .map(|cell| read_elements(cell, style_names))
                .collect()
        })
        .collect();

    SourceTable { rows }
}

fn is_table_of_contents(sdt: &XmlElement) -> bool {
    sdt.child("w:sdtPr")
        .and_then(|props| props.find("w:docPartGallery"))
        .and_then(|gallery| gallery.attr("val"))
        .is_some_and(|val| val.starts_with("Table of Contents"))
}
