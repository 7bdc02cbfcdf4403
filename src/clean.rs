//! HTML normalization.
//!
//! Whatever the stylesheet produced is parsed with the html5ever tree
//! builder (through `scraper`), so missing `html`/`head`/`body`/`tbody`
//! elements are implied and bad nesting is repaired. The tree is then
//! written back as well-formed markup, one element per line wherever an
//! element holds only other elements. The line layout matters: the doctype
//! strip below and the stylesheet link replacement in
//! [`crate::inline_css`] are line-based patterns.

use std::io::{self, Write};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::logging::Logger;

const INDENT: &str = "  ";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!.*>").expect("BUG: invalid DECLARATION_RE regex literal"));

/// Turns tag soup into well-formed markup.
#[derive(Debug, Clone, Copy)]
pub struct HtmlCleaner {
    logger: Logger,
}

impl HtmlCleaner {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Parse, repair and re-serialize `html`, dropping any `<!...>` lines.
    pub fn clean(&self, html: &str) -> io::Result<String> {
        let document = Html::parse_document(html);
        for error in &document.errors {
            self.logger.debug(format_args!("HTML recovery: {error}"));
        }

        let mut out = Vec::with_capacity(html.len() + 64);
        serialize_document(&document, &mut out)?;
        let serialized =
            String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(DECLARATION_RE.replace_all(&serialized, "").into_owned())
    }
}

impl Default for HtmlCleaner {
    fn default() -> Self {
        Self::new(Logger::global("pdf_mediator::clean"))
    }
}

fn serialize_document<W: Write>(document: &Html, out: &mut W) -> io::Result<()> {
    for child in document.tree.root().children() {
        match child.value() {
            Node::Doctype(doctype) => {
                writeln!(out, "<!DOCTYPE {}>", doctype.name())?;
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_block(element, 0, out)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Write `element` on its own line(s) at `depth`.
fn write_block<W: Write>(element: ElementRef<'_>, depth: usize, out: &mut W) -> io::Result<()> {
    let pad = INDENT.repeat(depth);
    let name = element.value().name();

    if is_void(name) {
        write!(out, "{pad}")?;
        write_start_tag(element, true, out)?;
        return writeln!(out);
    }

    if !has_text_content(element) {
        let children: Vec<ElementRef<'_>> =
            element.children().filter_map(ElementRef::wrap).collect();
        write!(out, "{pad}")?;
        write_start_tag(element, false, out)?;
        if children.is_empty() {
            return writeln!(out, "</{name}>");
        }
        writeln!(out)?;
        for child in children {
            write_block(child, depth + 1, out)?;
        }
        return writeln!(out, "{pad}</{name}>");
    }

    write!(out, "{pad}")?;
    write_inline(element, out)?;
    writeln!(out)
}

/// Write `element` and its whole subtree without line breaks.
fn write_inline<W: Write>(element: ElementRef<'_>, out: &mut W) -> io::Result<()> {
    let name = element.value().name();
    if is_void(name) {
        return write_start_tag(element, true, out);
    }
    write_start_tag(element, false, out)?;
    let raw = RAW_TEXT_ELEMENTS.contains(&name);
    for child in element.children() {
        match child.value() {
            Node::Text(text) if raw => out.write_all(text.as_bytes())?,
            Node::Text(text) => write_escaped(text, false, out)?,
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_inline(el, out)?;
                }
            }
            _ => {}
        }
    }
    write!(out, "</{name}>")
}

fn write_start_tag<W: Write>(
    element: ElementRef<'_>,
    self_closing: bool,
    out: &mut W,
) -> io::Result<()> {
    write!(out, "<{}", element.value().name())?;
    for (key, value) in element.value().attrs() {
        write!(out, " {key}=\"")?;
        write_escaped(value, true, out)?;
        out.write_all(b"\"")?;
    }
    if self_closing {
        out.write_all(b" />")
    } else {
        out.write_all(b">")
    }
}

fn write_escaped<W: Write>(text: &str, attribute: bool, out: &mut W) -> io::Result<()> {
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let replacement = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' if attribute => "&quot;",
            _ => continue,
        };
        out.write_all(text[last..i].as_bytes())?;
        out.write_all(replacement.as_bytes())?;
        last = i + c.len_utf8();
    }
    out.write_all(text[last..].as_bytes())
}

/// True when any direct text child carries more than whitespace, or when
/// the element's content is raw text.
fn has_text_content(element: ElementRef<'_>) -> bool {
    if RAW_TEXT_ELEMENTS.contains(&element.value().name()) {
        return element.children().next().is_some();
    }
    element.children().any(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    })
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}
