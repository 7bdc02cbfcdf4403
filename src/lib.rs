//! # pdf-mediator – XML message → PDF document
//!
//! A message mediator that renders the XML payload of each message to a PDF
//! file. Three settings drive it, each a literal or an expression evaluated
//! against the message: the XSLT stylesheet, the CSS stylesheet and the
//! output path. For every message the mediator
//!
//! 1. **Resolves** the three paths ([`field`], [`context`])
//! 2. **Loads** both stylesheets from the resource registry ([`resources`])
//! 3. **Transforms** the payload to HTML with XSLT ([`xslt`])
//! 4. **Renders** the HTML and CSS to a PDF file ([`html_to_pdf`])
//!
//! Rendering is itself a pipeline: cleaning ([`clean`]), stylesheet inlining
//! ([`inline_css`]), parsing ([`dom`]), styling ([`stylesheet`], [`style`]),
//! flexbox layout with Taffy ([`layout`]), pagination ([`pagination`]) and
//! PDF emission via printpdf ([`render`]).
//!
//! ```no_run
//! use pdf_mediator::{MediatorConfig, MemoryRegistry, XmlMessage};
//!
//! let mediator = MediatorConfig::from_json(r#"{
//!     "pdfFilePath": { "expression": "//pdfFilePath/@pathToFile" },
//!     "cssFilePath": { "value": "conf:/styles/report.css" },
//!     "xslFilePath": { "value": "conf:/xslt/report.xsl" }
//! }"#)?
//! .into_mediator()?;
//!
//! let registry = MemoryRegistry::new()
//!     .with_text("conf:/styles/report.css", "h1 { color: navy }")
//!     .with_text("conf:/xslt/report.xsl", "<xsl:stylesheet .../>");
//! let message = XmlMessage::new(r#"<doc><pdfFilePath pathToFile="out.pdf"/></doc>"#, &registry)?;
//! mediator.run(&message)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod clean;
pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod field;
pub mod fonts;
pub mod html_to_pdf;
pub mod inline_css;
pub mod layout;
pub mod layout_config;
pub mod logging;
pub mod mediator;
pub mod pagination;
pub mod render;
pub mod resources;
pub mod samples;
pub mod style;
pub mod stylesheet;
pub mod xslt;

// Re-exports for convenience
pub use config::{FieldSpec, MediatorConfig};
pub use context::{EvalResult, EvaluationContext, Expression, XmlMessage};
pub use error::{
    ConfigError, MediatorError, RenderError, ResolutionError, ResourceError, TransformError,
};
pub use field::ConfigField;
pub use html_to_pdf::{compute_layout_config, HtmlToPdf, PageOrientation, RenderConfig};
pub use logging::Logger;
pub use mediator::{
    CollectingReporter, FailureReporter, LogReporter, PdfMediator, PdfRender, XmlTransform,
};
pub use resources::{FileRegistry, MemoryRegistry, Resource, ResourceRegistry};
pub use xslt::XslTransformer;
