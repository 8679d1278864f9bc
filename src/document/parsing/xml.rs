//! Minimal XML element tree
//!
//! WordprocessingML parts are small enough to hold in memory, and walking a
//! tree keeps paragraph/table nesting (tables inside cells, paragraphs inside
//! text boxes) simple to get right. Element names keep their prefix
//! (`w:p`, `w:tbl`), the same convention the rest of the parser matches on.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::DocumentError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct XmlElement {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let raw = String::from_utf8_lossy(&attr.value).into_owned();
                let value = match quick_xml::escape::unescape(&raw) {
                    Ok(value) => value.into_owned(),
                    Err(_) => raw,
                };
                (key, value)
            })
            .collect();

        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    /// Attribute value by local name, ignoring the namespace prefix
    /// (`w:val`, `r:id` and `val` all match `"val"` / `"id"`).
    pub(crate) fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub(crate) fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.is(name))
    }

    /// First element named `name` in document order, searching depth first.
    pub(crate) fn find(&self, name: &str) -> Option<&XmlElement> {
        for element in self.elements() {
            if element.is(name) {
                return Some(element);
            }
            if let Some(found) = element.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated character data of this element and its descendants.
    pub(crate) fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, into: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => into.push_str(text),
                XmlNode::Element(element) => element.collect_text(into),
            }
        }
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Parse a whole XML part and return its root element.
pub(crate) fn parse_xml(bytes: &[u8], part: &str) -> Result<XmlElement, DocumentError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false); // Don't trim to preserve spacing inside w:t

    let xml_error = |source: quick_xml::Error| DocumentError::Xml {
        part: part.to_string(),
        source,
    };

    // The bottom of the stack is a synthetic document node holding the root.
    let mut stack: Vec<XmlElement> = vec![XmlElement::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(ref e) => stack.push(XmlElement::from_start(e)),
            Event::Empty(ref e) => {
                let element = XmlElement::from_start(e);
                push_child(&mut stack, XmlNode::Element(element));
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(element) = stack.pop() {
                        push_child(&mut stack, XmlNode::Element(element));
                    }
                }
            }
            Event::Text(ref e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_text(&mut stack, &text);
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_text(&mut stack, &text);
            }
            Event::GeneralRef(ref e) => {
                // Entity references like &amp; and &#233; arrive as separate events
                let entity = String::from_utf8_lossy(e.as_ref()).into_owned();
                if let Some(resolved) = resolve_entity(&entity) {
                    push_text(&mut stack, &resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    // Tolerate unclosed elements by folding them into their parents.
    while stack.len() > 1 {
        if let Some(element) = stack.pop() {
            push_child(&mut stack, XmlNode::Element(element));
        }
    }

    stack
        .pop()
        .and_then(|document| document.elements().next().cloned())
        .ok_or_else(|| DocumentError::MissingPart(format!("root element of {part}")))
}

fn push_child(stack: &mut [XmlElement], node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        // Merge with a preceding text node so "a&amp;b" stays one string.
        if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
            previous.push_str(text);
        } else {
            parent.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

fn resolve_entity(entity: &str) -> Option<String> {
    let resolved = match entity {
        "apos" => "'",
        "quot" => "\"",
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            return char::from_u32(value).map(String::from);
        }
    };
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let xml = br#"<?xml version="1.0"?>
<w:body xmlns:w="ns"><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><w:tbl/></w:body>"#;
        let root = parse_xml(xml, "test.xml").unwrap();

        assert!(root.is("w:body"));
        let names: Vec<&str> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:p", "w:tbl"]);

        let text = root.find("w:t").unwrap();
        assert_eq!(text.text(), " a & b ");
        assert_eq!(text.attr("space"), Some("preserve"));
    }

    #[test]
    fn test_character_references() {
        let root = parse_xml(b"<t>caf&#233; &#x263A;</t>", "test.xml").unwrap();
        assert_eq!(root.text(), "café ☺");
    }

    #[test]
    fn test_attribute_unescaping() {
        let root = parse_xml(br#"<rel Target="a?x=1&amp;y=2"/>"#, "test.xml").unwrap();
        assert_eq!(root.attr("Target"), Some("a?x=1&y=2"));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(parse_xml(b"", "empty.xml").is_err());
    }
}
