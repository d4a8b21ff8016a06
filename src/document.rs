//! Element tree and XML writer shared by the output formats
//!
//! Formats build an [`Element`] tree describing their schema; [`to_xml_string`]
//! owns layout: declaration, two-space indentation, text-only elements on a
//! single line, empty elements self-closed.

use std::fmt::Display;

const INDENT: &str = "  ";

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Leaf element holding a single text value.
    pub fn leaf(name: impl Into<String>, value: impl Display) -> Self {
        Self::new(name).text(value)
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn text(mut self, value: impl Display) -> Self {
        self.children.push(Node::Text(value.to_string()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    /// Append `element` only when present; absent fields are left out entirely.
    pub fn child_opt(self, element: Option<Element>) -> Self {
        match element {
            Some(element) => self.child(element),
            None => self,
        }
    }

    pub fn children(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(elements.into_iter().map(Node::Element));
        self
    }
}

/// Render a complete document with XML declaration and trailing newline.
pub fn to_xml_string(root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    push_indent(out, depth);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_escaped(out, value);
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push('>');

    let text_only = element.children.iter().all(|c| matches!(c, Node::Text(_)));
    if text_only {
        for child in &element.children {
            if let Node::Text(text) = child {
                push_escaped(out, text);
            }
        }
    } else {
        out.push('\n');
        for child in &element.children {
            match child {
                Node::Element(e) => write_element(out, e, depth + 1),
                Node::Text(text) => {
                    push_indent(out, depth + 1);
                    push_escaped(out, text);
                    out.push('\n');
                }
            }
        }
        push_indent(out, depth);
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}
