use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{markup, OfxError};

/// Small in-memory tree built from the outer markup of a single element
/// (one account block, one ledger, one transaction).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Direct text content, trimmed.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn parse(xml: &str) -> Result<Element, OfxError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        loop {
            match reader.read_event().map_err(markup)? {
                Event::Start(e) => stack.push(Element::named(e.name().as_ref())),
                Event::Empty(e) => {
                    let leaf = Element::named(e.name().as_ref());
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(leaf),
                        None => return Ok(leaf),
                    }
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&text);
                    }
                }
                Event::CData(c) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&String::from_utf8_lossy(&c));
                    }
                }
                Event::End(_) => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| OfxError::Markup("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Event::Eof => {
                    return Err(OfxError::Markup(format!(
                        "element ended early ({} still open)",
                        stack.len()
                    )))
                }
                _ => {}
            }
        }
    }

    fn named(name: &[u8]) -> Element {
        Element {
            name: String::from_utf8_lossy(name).to_ascii_uppercase(),
            ..Element::default()
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first direct child called `name`, if it is non-empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Text at a nested path such as `["RUNNINGBAL", "BALAMT"]`.
    pub fn path_text(&self, path: &[&str]) -> Option<&str> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node.text.as_str()).filter(|t| !t.is_empty())
    }

    /// This element's text followed by all descendant text, space-separated.
    pub fn deep_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        if !self.text.is_empty() {
            parts.push(&self.text);
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }
}
