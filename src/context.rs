//! The per-message evaluation context.
//!
//! The host owns the message; the mediator only borrows it through
//! [`EvaluationContext`] for the duration of one run. [`XmlMessage`] is the
//! implementation shipped with the crate: an XML payload, a property bag and
//! a resource registry, with XPath evaluated by `xrust`.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use xrust::item::{Item, Node, NodeType, SequenceTrait};
use xrust::parser::xml::parse as parse_xml;
use xrust::parser::xpath::parse as parse_xpath;
use xrust::transform::context::{ContextBuilder, StaticContextBuilder};
use xrust::trees::smite::RNode;
use xrust::value::{Value, ValueData};
use xrust::xdmerror::{Error as XrustError, ErrorKind};

use crate::error::{ResourceError, TransformError};
use crate::resources::{Resource, ResourceRegistry};

/// A compiled configuration expression.
///
/// Two forms are understood: property references (`$ctx:name` and
/// `get-property('name')`) and XPath 1.0 paths evaluated against the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    source: String,
    kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
    Property(String),
    Path,
}

impl Expression {
    /// Check the syntax of `source` and build an expression from it.
    pub fn compile(source: &str) -> Result<Self, String> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err("empty expression".to_string());
        }
        if let Some(name) = property_reference(trimmed) {
            return Ok(Self {
                source: trimmed.to_string(),
                kind: ExpressionKind::Property(name),
            });
        }
        if let Some(prefix) = unbound_prefix(trimmed) {
            return Err(format!("namespace prefix {prefix} is not bound"));
        }
        parse_xpath::<RNode>(trimmed, None).map_err(|e| e.to_string())?;
        Ok(Self {
            source: trimmed.to_string(),
            kind: ExpressionKind::Path,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn property_reference(source: &str) -> Option<String> {
    if let Some(name) = source.strip_prefix("$ctx:") {
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || "_-.".contains(c)) {
            return Some(name.to_string());
        }
        return None;
    }
    let inner = source
        .strip_prefix("get-property(")?
        .strip_suffix(')')?
        .trim();
    let unquoted = inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))?;
    Some(unquoted.to_string())
}

static STRING_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'[^']*'|"[^"]*""#).expect("BUG: invalid STRING_LITERAL_RE regex literal")
});

static QNAME_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w.\-$:])([A-Za-z_][\w.\-]*):[A-Za-z_*]")
        .expect("BUG: invalid QNAME_PREFIX_RE regex literal")
});

/// Prefixes every XPath evaluation knows without a declaration.
const PREDECLARED_PREFIXES: [&str; 6] = ["xml", "xs", "fn", "math", "map", "array"];

/// The first namespace prefix in `source` that no declaration binds.
///
/// Expressions are compiled without namespace declarations, so a step such
/// as `//q:a` could never select anything.
fn unbound_prefix(source: &str) -> Option<String> {
    let code = STRING_LITERAL_RE.replace_all(source, "''");
    QNAME_PREFIX_RE
        .captures_iter(&code)
        .map(|c| c[1].to_string())
        .find(|p| !PREDECLARED_PREFIXES.contains(&p.as_str()))
}

/// The kind of a node returned by an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// A node selected by an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub text: String,
}

/// The raw result of evaluating an [`Expression`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalResult {
    String(String),
    Node(NodeHandle),
    Attribute { name: String, value: String },
    Sequence(Vec<EvalResult>),
    Empty,
    /// Anything the resolver cannot turn into a string (numbers, booleans,
    /// document nodes, ...), described by its type name.
    Other(String),
}

/// What the mediator needs from the message it is processing.
pub trait EvaluationContext {
    /// Evaluate `expression` against the message.
    fn evaluate(&self, expression: &Expression) -> Result<EvalResult, String>;

    /// Look up a named message property.
    fn property(&self, name: &str) -> Option<String>;

    /// The message payload serialized as text.
    fn payload_text(&self) -> String;

    /// Fetch `key` from the host's resource registry.
    fn resource(&self, key: &str) -> Result<Resource, ResourceError>;
}

/// An XML message: payload, properties and a registry handle.
pub struct XmlMessage<'r> {
    payload: String,
    document: RNode,
    properties: HashMap<String, String>,
    registry: &'r dyn ResourceRegistry,
}

impl<'r> XmlMessage<'r> {
    /// Parse `payload` and wrap it into a message backed by `registry`.
    pub fn new(payload: &str, registry: &'r dyn ResourceRegistry) -> Result<Self, TransformError> {
        let document = RNode::new_document();
        parse_xml(document.clone(), payload, None)
            .map_err(|e| TransformError::Parse(e.to_string()))?;
        Ok(Self {
            payload: payload.to_string(),
            document,
            properties: HashMap::new(),
            registry,
        })
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    fn evaluate_path(&self, source: &str) -> Result<EvalResult, XrustError> {
        let path = parse_xpath::<RNode>(source, None)?;
        let context = ContextBuilder::new()
            .context(vec![Item::Node(self.document.clone())])
            .build();
        let mut static_context = StaticContextBuilder::new()
            .message(|_| Ok(()))
            .fetcher(|_| Err(XrustError::new(ErrorKind::NotImplemented, "not implemented")))
            .parser(|_| Err(XrustError::new(ErrorKind::NotImplemented, "not implemented")))
            .build();
        let sequence = context.dispatch(&mut static_context, &path)?;

        let mut items: Vec<EvalResult> = Vec::new();
        let mut all_nodes = true;
        for item in &sequence {
            match item {
                Item::Node(n) => items.push(node_result(n)),
                Item::Value(v) => {
                    all_nodes = false;
                    items.push(value_result(v.as_ref()));
                }
                Item::Function => {
                    all_nodes = false;
                    items.push(EvalResult::Other("function".to_string()));
                }
            }
        }

        // Node-sets always come back as sequences, a lone atomic value as itself.
        Ok(match items.len() {
            0 => EvalResult::Empty,
            1 if !all_nodes => items.remove(0),
            _ => EvalResult::Sequence(items),
        })
    }
}

fn node_result(n: &RNode) -> EvalResult {
    let name = n.name().localname_to_string();
    let name = if name.is_empty() { None } else { Some(name) };
    match n.node_type() {
        NodeType::Element => EvalResult::Node(NodeHandle {
            kind: NodeKind::Element,
            name,
            text: direct_text(n),
        }),
        NodeType::Text => EvalResult::Node(NodeHandle {
            kind: NodeKind::Text,
            name: None,
            text: n.to_string(),
        }),
        NodeType::Attribute => EvalResult::Attribute {
            name: name.unwrap_or_default(),
            value: n.to_string(),
        },
        NodeType::Document => EvalResult::Other("document-node()".to_string()),
        NodeType::Comment => EvalResult::Other("comment()".to_string()),
        NodeType::ProcessingInstruction => {
            EvalResult::Other("processing-instruction()".to_string())
        }
        _ => EvalResult::Other("node()".to_string()),
    }
}

/// The element's own text: its text children, not its descendants'.
fn direct_text(n: &RNode) -> String {
    n.child_iter()
        .filter(|c| c.node_type() == NodeType::Text)
        .map(|c| c.to_string())
        .collect()
}

fn value_result(v: &Value) -> EvalResult {
    match v.value_ref() {
        ValueData::String(s) => EvalResult::String(s.clone()),
        ValueData::Integer(_) => EvalResult::Other("xs:integer".to_string()),
        ValueData::Double(_) => EvalResult::Other("xs:double".to_string()),
        ValueData::Decimal(_) => EvalResult::Other("xs:decimal".to_string()),
        ValueData::Boolean(_) => EvalResult::Other("xs:boolean".to_string()),
        _ => EvalResult::Other("xs:anyAtomicType".to_string()),
    }
}

impl EvaluationContext for XmlMessage<'_> {
    fn evaluate(&self, expression: &Expression) -> Result<EvalResult, String> {
        match expression.kind() {
            ExpressionKind::Property(name) => Ok(self
                .property(name)
                .map(EvalResult::String)
                .unwrap_or(EvalResult::Empty)),
            ExpressionKind::Path => self
                .evaluate_path(expression.source())
                .map_err(|e| e.to_string()),
        }
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn payload_text(&self) -> String {
        self.payload.clone()
    }

    fn resource(&self, key: &str) -> Result<Resource, ResourceError> {
        self.registry.lookup(key)
    }
}
