//! Fragment event stream
//!
//! Thin layer over `quick_xml` reducing an XHTML fragment to the three node
//! kinds pointer resolution cares about: element opened, element closed and a
//! run of text measured in Unicode scalar values. Text outside the root element
//! (prolog and epilog whitespace) is only reported when asked for.

use std::io::BufRead;
use std::ops::ControlFlow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// An opened element
pub struct Element<'a> {
    /// Local name, without namespace prefix
    pub name: &'a str,
    start: &'a BytesStart<'a>,
}

impl Element<'_> {
    /// Check for an attribute whose local name is `id` (any case) with the given value
    pub fn has_id(&self, id: &str) -> Result<bool> {
        for attr in self.start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if !attr.key.local_name().as_ref().eq_ignore_ascii_case(b"id") {
                continue;
            }
            if attr.unescape_value()? == id {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// A node reported while walking a fragment
pub enum Node<'a> {
    Open(Element<'a>),
    Close,
    /// Text run, as a count of Unicode scalar values
    Text(u64),
}

/// Walk a fragment, feeding every node to `visit` until it breaks.
///
/// Returns `Ok(None)` when the stream ends without the visitor breaking.
/// Self-closing elements are reported as an open immediately followed by a
/// close; CDATA sections are reported as text. Text outside the root element
/// is reported only when `outer_text` is set.
pub fn walk<R, T, F>(source: R, outer_text: bool, mut visit: F) -> Result<Option<T>>
where
    R: BufRead,
    F: FnMut(Node<'_>) -> Result<ControlFlow<T>>,
{
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        let flow = match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                depth += 1;
                let local = start.local_name();
                let name = reader.decoder().decode(local.as_ref())?;
                visit(Node::Open(Element {
                    name: &name,
                    start: &start,
                }))?
            }
            Event::Empty(start) => {
                let local = start.local_name();
                let name = reader.decoder().decode(local.as_ref())?;
                match visit(Node::Open(Element {
                    name: &name,
                    start: &start,
                }))? {
                    ControlFlow::Continue(()) => visit(Node::Close)?,
                    flow => flow,
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                visit(Node::Close)?
            }
            Event::Text(text) if outer_text || depth > 0 => {
                visit(Node::Text(char_count(&text.unescape()?)))?
            }
            Event::CData(data) if outer_text || depth > 0 => {
                let text = reader.decoder().decode(&data)?;
                visit(Node::Text(char_count(&text)))?
            }
            Event::Eof => return Ok(None),
            _ => ControlFlow::Continue(()),
        };

        if let ControlFlow::Break(value) = flow {
            return Ok(Some(value));
        }
        buf.clear();
    }
}

/// Length of a text run in Unicode scalar values
pub fn char_count(text: &str) -> u64 {
    text.chars().count() as u64
}

/// Error for a stream that ended before the pointer was located
pub(crate) fn exhausted(what: impl std::fmt::Display) -> Error {
    Error::UnresolvedPointer(format!("{} not found before end of fragment", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Seen {
        Open(String),
        Close,
        Text(u64),
    }

    fn collect(xml: &str) -> Vec<Seen> {
        collect_with(xml, false)
    }

    fn collect_with(xml: &str, outer_text: bool) -> Vec<Seen> {
        let mut seen = Vec::new();
        let result: Option<()> = walk(xml.as_bytes(), outer_text, |node| {
            seen.push(match node {
                Node::Open(element) => Seen::Open(element.name.to_string()),
                Node::Close => Seen::Close,
                Node::Text(n) => Seen::Text(n),
            });
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert!(result.is_none());
        seen
    }

    #[test]
    fn test_prolog_text_not_reported() {
        let seen = collect("<?xml version=\"1.0\"?>\n<html><p>ab</p></html>\n");
        assert_eq!(
            seen,
            vec![
                Seen::Open("html".to_string()),
                Seen::Open("p".to_string()),
                Seen::Text(2),
                Seen::Close,
                Seen::Close,
            ]
        );
    }

    #[test]
    fn test_outer_text_reported_on_request() {
        let xml = "<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html>ab</html>\n";
        assert_eq!(
            collect_with(xml, true),
            vec![
                Seen::Text(1),
                Seen::Text(1),
                Seen::Open("html".to_string()),
                Seen::Text(2),
                Seen::Close,
                Seen::Text(1),
            ]
        );
    }

    #[test]
    fn test_empty_element_opens_and_closes() {
        let seen = collect("<html><br/></html>");
        assert_eq!(
            seen,
            vec![
                Seen::Open("html".to_string()),
                Seen::Open("br".to_string()),
                Seen::Close,
                Seen::Close,
            ]
        );
    }

    #[test]
    fn test_text_counts_scalar_values_after_unescape() {
        let seen = collect("<p>caf\u{e9} &amp; <![CDATA[<x>]]></p>");
        assert_eq!(seen[1], Seen::Text(7));
        assert_eq!(seen[2], Seen::Text(3));
    }

    #[test]
    fn test_prefixed_names_use_local_part() {
        let seen = collect("<html xmlns:epub=\"x\"><epub:switch/></html>");
        assert_eq!(seen[1], Seen::Open("switch".to_string()));
    }

    #[test]
    fn test_has_id_ignores_case_and_prefix() {
        let xml = "<html><p ID=\"a\"/><p xml:id=\"pt1\"/></html>";
        let found = walk(xml.as_bytes(), false, |node| {
            if let Node::Open(element) = node {
                if element.has_id("pt1")? {
                    return Ok(ControlFlow::Break(element.name.to_string()));
                }
            }
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(found, Some("p".to_string()));
    }

    #[test]
    fn test_visitor_break_stops_walk() {
        let mut opened = 0;
        let found = walk("<a><b/><c/></a>".as_bytes(), false, |node| {
            if let Node::Open(_) = node {
                opened += 1;
                if opened == 2 {
                    return Ok(ControlFlow::Break(opened));
                }
            }
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(found, Some(2));
    }
}
