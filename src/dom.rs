//! Layout DOM – the element tree the renderer styles and lays out.
//!
//! Markup is parsed with `scraper` (html5ever), then copied into a small
//! owned tree of [`DomNode`]s keyed by [`Tag`]. Comments, doctypes and
//! processing instructions are dropped on the way.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Node};

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of an element the renderer knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Title,
    Style,
    Script,
    Body,
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Table,
    Thead,
    Tbody,
    Tfoot,
    Tr,
    Td,
    Th,
    Span,
    B,
    Strong,
    I,
    Em,
    U,
    A,
    Br,
    Img,
    /// Anything else. Laid out as a block so generated structure is kept.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "title" => Tag::Title,
            "style" => Tag::Style,
            "script" => Tag::Script,
            "body" => Tag::Body,
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tfoot" => Tag::Tfoot,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" => Tag::Span,
            "b" => Tag::B,
            "strong" => Tag::Strong,
            "i" => Tag::I,
            "em" => Tag::Em,
            "u" => Tag::U,
            "a" => Tag::A,
            "br" => Tag::Br,
            "img" => Tag::Img,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// The lowercase element name, as matched by type selectors.
    pub fn name(&self) -> &str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Title => "title",
            Tag::Style => "style",
            Tag::Script => "script",
            Tag::Body => "body",
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tfoot => "tfoot",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Span => "span",
            Tag::B => "b",
            Tag::Strong => "strong",
            Tag::I => "i",
            Tag::Em => "em",
            Tag::U => "u",
            Tag::A => "a",
            Tag::Br => "br",
            Tag::Img => "img",
            Tag::Unknown(name) => name,
        }
    }

    /// Elements that never produce boxes.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Tag::Head | Tag::Title | Tag::Style | Tag::Script)
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Tag::Span | Tag::B | Tag::Strong | Tag::I | Tag::Em | Tag::U | Tag::A | Tag::Br
        )
    }

    pub fn is_row_group(&self) -> bool {
        matches!(self, Tag::Thead | Tag::Tbody | Tag::Tfoot)
    }

    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6
        )
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(|s| s.as_str())
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a full HTML document. The result holds the root `<html>` element.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let document = Html::parse_document(html);
    vec![DomNode::Element(convert_element(document.root_element()))]
}

fn convert_element(element: ElementRef<'_>) -> ElementNode {
    let mut node = ElementNode::new(Tag::from_name(element.value().name()));
    for (key, value) in element.value().attrs() {
        node.attributes.insert(key.to_string(), value.to_string());
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => node.children.push(DomNode::Text(text.to_string())),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    node.children.push(DomNode::Element(convert_element(el)));
                }
            }
            _ => {}
        }
    }
    node
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Depth-first search for the first element with `tag`.
pub fn find_element<'a>(nodes: &'a [DomNode], tag: &Tag) -> Option<&'a ElementNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if &e.tag == tag {
                return Some(e);
            }
            if let Some(found) = find_element(&e.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

/// The contents of every `<style>` element, in document order.
pub fn style_blocks(nodes: &[DomNode]) -> Vec<String> {
    let mut blocks = Vec::new();
    collect_styles(nodes, &mut blocks);
    blocks
}

fn collect_styles(nodes: &[DomNode], blocks: &mut Vec<String>) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Style {
                blocks.push(e.text_content());
            } else {
                collect_styles(&e.children, blocks);
            }
        }
    }
}

/// The trimmed `<title>` text, if the document has a non-empty one.
pub fn document_title(nodes: &[DomNode]) -> Option<String> {
    let title = find_element(nodes, &Tag::Title)?.text_content();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
