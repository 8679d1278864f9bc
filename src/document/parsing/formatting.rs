//! Text extraction and formatting utilities
//!
//! This module handles extraction of text and direct formatting from
//! `w:r` run elements, and the Markdown emphasis used by the flat view.

use super::super::models::Run;
use super::super::style::{Rgb, Style};
use super::xml::{XmlElement, XmlNode};

/// Extract text from a run, mapping tabs and breaks to `\t` and `\n`
pub(crate) fn extract_run_text(run: &XmlElement) -> String {
    let mut text = String::new();

    for child in run.elements() {
        match child.name.as_str() {
            "w:t" => text.push_str(&child.text()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            "w:noBreakHyphen" => text.push('\u{2011}'),
            _ => {
                // Field codes, drawings and deleted text carry no visible text
            }
        }
    }

    text
}

/// Extract direct formatting from a run's `w:rPr`
pub(crate) fn extract_run_style(run: &XmlElement) -> Style {
    let mut style = Style::default();
    let Some(props) = run.child("w:rPr") else {
        return style;
    };

    style.bold = props.child("w:b").is_some_and(toggle_is_on);
    style.italic = props.child("w:i").is_some_and(toggle_is_on);

    if let Some(fonts) = props.child("w:rFonts") {
        style.font_name = ["ascii", "hAnsi", "eastAsia", "cs"]
            .iter()
            .find_map(|slot| fonts.attr(slot))
            .filter(|name| !name.is_empty())
            .map(str::to_string);
    }

    // Sizes are stored in half-points
    style.font_size = props
        .child("w:sz")
        .and_then(|sz| sz.attr("val"))
        .and_then(|val| val.parse::<f32>().ok())
        .map(|half_points| half_points / 2.0);

    // "auto" and malformed values leave the color unset
    style.color = props
        .child("w:color")
        .and_then(|color| color.attr("val"))
        .and_then(Rgb::from_hex);

    style
}

/// `<w:b/>` is on; `w:val` of 0/false/off turns it off.
fn toggle_is_on(element: &XmlElement) -> bool {
    !matches!(element.attr("val"), Some("0" | "false" | "off"))
}

/// Collect the runs of a paragraph in order.
///
/// Runs nested in hyperlinks, insertions, smart tags, simple fields and
/// inline content controls count; deleted and moved-away text does not.
pub(crate) fn collect_paragraph_runs(paragraph: &XmlElement) -> Vec<Run> {
    let mut runs = Vec::new();
    collect_runs_into(paragraph, &mut runs);
    runs
}

fn collect_runs_into(element: &XmlElement, runs: &mut Vec<Run>) {
    for child in &element.children {
        let XmlNode::Element(child) = child else {
            continue;
        };
        match child.name.as_str() {
            "w:r" => {
                let text = extract_run_text(child);
                if !text.is_empty() {
                    runs.push(Run::new(text, extract_run_style(child)));
                }
            }
            "w:del" | "w:moveFrom" | "w:pPr" => {}
            _ => collect_runs_into(child, runs),
        }
    }
}

/// Wrap run text in Markdown emphasis (`***`, `**` or `*`).
pub(crate) fn markdown_emphasis(run: &Run) -> String {
    match (run.style.bold, run.style.italic) {
        (true, true) => format!("***{}***", run.text),
        (true, false) => format!("**{}**", run.text),
        (false, true) => format!("*{}*", run.text),
        (false, false) => run.text.clone(),
    }
}
