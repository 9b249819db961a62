//! Helpers for building and serializing `DAV:` xml trees.
//!
//! `xmltree::Element` is fine for parsing request bodies, but writing
//! namespaced responses through it is awkward, so responses go through
//! an `xml-rs` `EventWriter` instead. All our response roots declare
//! the `D` prefix for the `DAV:` namespace; `write_ev` re-prefixes any
//! `DAV:` element accordingly, whatever prefix the client used.

use std::io::Write;

use xml::writer::{EmitterConfig, EventWriter, XmlEvent as XmlWEvent};
use xml::common::XmlVersion;
use xmltree::{Element, XMLNode};

pub const NS_DAV_URI: &str = "DAV:";

pub trait ElementExt {
    /// Create an element from a prefixed name like `"D:href"`.
    fn new2(name: &str) -> Element;
    /// Builder: append a text node.
    fn text(self, text: impl Into<String>) -> Element;
    /// Builder: append a child element.
    fn push(self, child: Element) -> Element;
    /// Serialize this element and its subtree as writer events.
    fn write_ev<W: Write>(&self, emitter: &mut EventWriter<W>) -> Result<(), xml::writer::Error>;
}

impl ElementExt for Element {
    fn new2(name: &str) -> Element {
        let mut elem = match name.split_once(':') {
            Some((prefix, local)) => {
                let mut e = Element::new(local);
                e.prefix = Some(prefix.to_string());
                e
            }
            None => Element::new(name),
        };
        if elem.prefix.as_deref() == Some("D") {
            elem.namespace = Some(NS_DAV_URI.to_string());
        }
        elem
    }

    fn text(mut self, text: impl Into<String>) -> Element {
        self.children.push(XMLNode::Text(text.into()));
        self
    }

    fn push(mut self, child: Element) -> Element {
        self.children.push(XMLNode::Element(child));
        self
    }

    fn write_ev<W: Write>(&self, emitter: &mut EventWriter<W>) -> Result<(), xml::writer::Error> {
        let name = if self.namespace.as_deref() == Some(NS_DAV_URI) {
            format!("D:{}", self.name)
        } else if let Some(prefix) = &self.prefix {
            format!("{}:{}", prefix, self.name)
        } else {
            self.name.clone()
        };
        let mut start = XmlWEvent::start_element(name.as_str());
        for (k, v) in &self.attributes {
            start = start.attr(k.as_str(), v);
        }
        emitter.write(start)?;
        for child in &self.children {
            match child {
                XMLNode::Element(e) => e.write_ev(emitter)?,
                XMLNode::Text(t) => emitter.write(XmlWEvent::characters(t))?,
                _ => {}
            }
        }
        emitter.write(XmlWEvent::end_element())
    }
}

/// An event writer with our response defaults and the xml declaration
/// already written.
pub fn emitter<W: Write>(w: W) -> Result<EventWriter<W>, xml::writer::Error> {
    let mut emitter = EventWriter::new_with_config(
        w,
        EmitterConfig {
            normalize_empty_elements: false,
            perform_indent: false,
            ..Default::default()
        },
    );
    emitter.write(XmlWEvent::StartDocument {
        version: XmlVersion::Version10,
        encoding: Some("utf-8"),
        standalone: None,
    })?;
    Ok(emitter)
}
