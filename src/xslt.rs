//! XML to HTML transformation with an XSLT stylesheet.
//!
//! The XSLT engine covers a subset of the language. Stylesheets are checked
//! against that subset before compiling, so an instruction the engine would
//! drop fails the transformation instead of quietly changing its output.

use xrust::item::{Item, Node, NodeType, SequenceTrait};
use xrust::parser::xml::parse as parse_xml;
use xrust::transform::context::StaticContextBuilder;
use xrust::trees::smite::RNode;
use xrust::xdmerror::{Error as XrustError, ErrorKind};
use xrust::xslt::from_document;

use crate::error::TransformError;
use crate::logging::Logger;

/// Applies XSLT stylesheets to XML documents using `xrust`.
#[derive(Debug, Clone, Copy)]
pub struct XslTransformer {
    logger: Logger,
}

impl XslTransformer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Transform `xml` with `xsl`, returning the serialized result.
    ///
    /// Failures are logged and turned into an empty string so that the
    /// caller always has a document to hand on.
    pub fn transform(&self, xml: &str, xsl: &str) -> String {
        self.logger
            .info(format_args!("Starting XML content transformation"));
        match self.apply(xml, xsl) {
            Ok(output) => output,
            Err(e) => {
                self.logger
                    .error(format_args!("XML content transformation failed: {e}"));
                String::new()
            }
        }
    }

    /// Like [`transform`](Self::transform) but reports failures.
    pub fn try_transform(&self, xml: &str, xsl: &str) -> Result<String, TransformError> {
        self.logger
            .info(format_args!("Starting XML content transformation"));
        self.apply(xml, xsl)
    }

    fn apply(&self, xml: &str, xsl: &str) -> Result<String, TransformError> {
        let source = parse_document(xml).map_err(|e| TransformError::Parse(e.to_string()))?;
        let style = parse_document(xsl).map_err(|e| TransformError::Compile(e.to_string()))?;
        if let Some(instruction) = unsupported_instruction(&style) {
            return Err(TransformError::Unsupported(instruction));
        }

        let mut compiled = from_document(style, None, parse_document, |_| Ok(String::new()))
            .map_err(|e| TransformError::Compile(e.to_string()))?;
        compiled.context(vec![Item::Node(source)], 0);
        compiled.result_document(RNode::new_document());

        let mut static_context = StaticContextBuilder::new()
            .message(|_| Ok(()))
            .fetcher(|_| Err(XrustError::new(ErrorKind::NotImplemented, "not implemented")))
            .parser(|_| Err(XrustError::new(ErrorKind::NotImplemented, "not implemented")))
            .build();
        let sequence = compiled
            .evaluate(&mut static_context)
            .map_err(|e| TransformError::Apply(e.to_string()))?;

        let output = sequence.to_xml();
        self.logger
            .debug(format_args!("Transformation produced {} bytes", output.len()));
        Ok(output)
    }
}

impl Default for XslTransformer {
    fn default() -> Self {
        Self::new(Logger::global("pdf_mediator::xslt"))
    }
}

const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

/// Declarations allowed directly under `xsl:stylesheet`.
const TOP_LEVEL: [&str; 11] = [
    "template",
    "variable",
    "param",
    "output",
    "include",
    "import",
    "key",
    "attribute-set",
    "function",
    "strip-space",
    "preserve-space",
];

/// Instructions the engine compiles inside templates.
const INSTRUCTIONS: [&str; 21] = [
    "text",
    "value-of",
    "apply-templates",
    "apply-imports",
    "sequence",
    "if",
    "choose",
    "when",
    "otherwise",
    "for-each",
    "for-each-group",
    "copy",
    "copy-of",
    "call-template",
    "with-param",
    "element",
    "attribute",
    "comment",
    "processing-instruction",
    "message",
    "number",
];

/// The first XSLT element in `style` outside the supported subset, as
/// `xsl:<name>`.
fn unsupported_instruction(style: &RNode) -> Option<String> {
    style
        .descend_iter()
        .filter(|n| n.node_type() == NodeType::Element && is_xslt(n))
        .find(|n| !is_supported(n))
        .map(|n| format!("xsl:{}", n.name().localname_to_string()))
}

fn is_xslt(n: &RNode) -> bool {
    n.name().namespace_uri_to_string().as_deref() == Some(XSLT_NS)
}

fn is_supported(n: &RNode) -> bool {
    let name = n.name().localname_to_string();
    if name == "stylesheet" || name == "transform" {
        return true;
    }
    let parent = n.parent().filter(|p| p.node_type() == NodeType::Element && is_xslt(p));
    let parent_name = parent.as_ref().map(|p| p.name().localname_to_string());
    match parent_name.as_deref() {
        Some("stylesheet" | "transform") => TOP_LEVEL.contains(&name.as_str()),
        // Named templates and functions take parameters.
        Some("template" | "function") if name == "param" => true,
        _ => INSTRUCTIONS.contains(&name.as_str()),
    }
}

fn parse_document(text: &str) -> Result<RNode, XrustError> {
    let doc = RNode::new_document();
    parse_xml(doc.clone(), text, None)?;
    Ok(doc)
}
