//! In-memory element tree for reply bodies.
//!
//! Names are stored without namespace prefixes (`xsi:nil` becomes `nil`), and
//! namespace declarations are dropped. Text content is accumulated across text,
//! CDATA, and entity-reference events, then trimmed when the element closes.

use quick_xml::encoding::Decoder;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;

use crate::{FacebookerError, Result};

/// Deepest element nesting accepted in a reply. Conversion and drop both
/// recurse over the tree, so deeper documents are rejected while parsing.
pub const MAX_DEPTH: usize = 256;

/// One element of a reply document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Local tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Trimmed text content (empty for elements that only hold children).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `true` if the element carries `xsi:nil="true"`.
    pub fn is_nil(&self) -> bool {
        self.attribute("nil") == Some("true")
    }

    /// `true` if the element carries `list="true"`.
    pub fn is_list(&self) -> bool {
        self.attribute("list") == Some("true")
    }

    /// `true` if every child shares one tag name and there are at least two.
    pub fn has_repeated_children(&self) -> bool {
        match self.children.split_first() {
            Some((first, rest)) if !rest.is_empty() => {
                rest.iter().all(|child| child.name == first.name)
            }
            _ => false,
        }
    }
}

/// Parses a reply body and returns its root element.
pub fn parse_document(body: &str) -> Result<Element> {
    let mut reader = Reader::from_str(body);
    let decoder = reader.decoder();
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                if open.len() >= MAX_DEPTH {
                    return Err(FacebookerError::malformed(format!(
                        "elements nested deeper than {MAX_DEPTH} levels"
                    )));
                }
                open.push(open_element(&start, decoder)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start, decoder)?;
                attach(&mut open, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = open
                    .pop()
                    .ok_or_else(|| FacebookerError::malformed("unbalanced end tag"))?;
                element.text = element.text.trim().to_owned();
                attach(&mut open, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = open.last_mut() {
                    let decoded = decoder.decode(&text).map_err(malformed)?;
                    current.text.push_str(&unescape(&decoded).map_err(malformed)?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = open.last_mut() {
                    current
                        .text
                        .push_str(&decoder.decode(&data).map_err(malformed)?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&resolve_reference(&reference, decoder)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(FacebookerError::malformed(format!(
            "element <{}> is never closed",
            unclosed.name
        )));
    }
    root.ok_or_else(|| FacebookerError::malformed("document has no root element"))
}

fn open_element(start: &BytesStart<'_>, decoder: Decoder) -> Result<Element> {
    let name = decoder
        .decode(start.local_name().as_ref())
        .map_err(malformed)?
        .into_owned();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(malformed)?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = decoder
            .decode(attribute.key.local_name().as_ref())
            .map_err(malformed)?
            .into_owned();
        let raw = decoder.decode(&attribute.value).map_err(malformed)?;
        let value = unescape(&raw).map_err(malformed)?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn resolve_reference(reference: &BytesRef<'_>, decoder: Decoder) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref().map_err(malformed)? {
        return Ok(ch.to_string());
    }
    let name = decoder.decode(reference).map_err(malformed)?;
    resolve_predefined_entity(&name)
        .map(str::to_owned)
        .ok_or_else(|| FacebookerError::malformed(format!("unknown entity &{name};")))
}

fn attach(open: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match open.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(FacebookerError::malformed(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}

fn malformed(error: impl std::fmt::Display) -> FacebookerError {
    FacebookerError::malformed(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes_and_namespace_declarations() {
        let root = parse_document(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <friends_areFriends_response xmlns="http://api.facebook.com/1.0/"
                xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" list="true">
              <friend_info><are_friends xsi:nil="true"/></friend_info>
            </friends_areFriends_response>"#,
        )
        .unwrap();

        assert_eq!(root.name(), "friends_areFriends_response");
        assert!(root.is_list());
        assert_eq!(root.attribute("xsi"), None);
        let flag = root.children()[0].child("are_friends").unwrap();
        assert!(flag.is_nil());
    }

    #[test]
    fn text_keeps_inner_whitespace_and_resolves_entities() {
        let root = parse_document("<caption>  Tom &amp; Jerry &#33; </caption>").unwrap();
        assert_eq!(root.text(), "Tom & Jerry !");
    }

    #[test]
    fn cdata_is_taken_literally() {
        let root = parse_document("<q><![CDATA[a &amp; b]]></q>").unwrap();
        assert_eq!(root.text(), "a &amp; b");
    }

    #[test]
    fn repeated_children_are_detected() {
        let root = parse_document("<r><uid>1</uid><uid>2</uid></r>").unwrap();
        assert!(root.has_repeated_children());
        let mixed = parse_document("<r><uid>1</uid><name>x</name></r>").unwrap();
        assert!(!mixed.has_repeated_children());
        let single = parse_document("<r><uid>1</uid></r>").unwrap();
        assert!(!single.has_repeated_children());
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let root = parse_document(&nested(MAX_DEPTH)).unwrap();
        assert_eq!(root.name(), "a");
    }

    #[test]
    fn nesting_beyond_the_limit_is_rejected() {
        for depth in [MAX_DEPTH + 1, 20_000] {
            assert!(matches!(
                parse_document(&nested(depth)),
                Err(FacebookerError::MalformedReply { .. })
            ));
        }
    }

    #[test]
    fn rejects_bodies_that_are_not_xml() {
        assert!(matches!(
            parse_document("<html><body>oops</html>"),
            Err(FacebookerError::MalformedReply { .. })
        ));
        assert!(matches!(
            parse_document(""),
            Err(FacebookerError::MalformedReply { .. })
        ));
    }
}
