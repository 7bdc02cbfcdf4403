//! Error types for every stage of the mediator.
//!
//! Resolution, resource and render failures are fatal to the message being
//! processed; [`MediatorError`] wraps them for the orchestrator, which hands
//! them to the host's failure channel. Transform failures are swallowed by
//! [`crate::xslt::XslTransformer::transform`] and only surface through
//! [`crate::xslt::XslTransformer::try_transform`].

use std::io;

use thiserror::Error;

/// Errors raised while loading the declarative mediator configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} element is required")]
    MissingField { field: &'static str },

    #[error("Either expression or value attribute is required for {field}")]
    MissingValue { field: &'static str },

    #[error("Only one of expression or value attribute may be set for {field}")]
    ConflictingValue { field: &'static str },

    #[error("Invalid {field} expression : {expression}")]
    InvalidExpression {
        field: &'static str,
        expression: String,
    },

    #[error("Malformed mediator configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while turning a configuration field into a concrete value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No value found with {field}'s expression")]
    NoValue { field: String },

    #[error("More than one result found with xpath {expression}, refusing to proceed.")]
    Ambiguous { expression: String },

    #[error("Unsupported result type for {expression}: {type_name}")]
    UnsupportedType {
        expression: String,
        type_name: String,
    },

    #[error("Evaluation of {expression} failed: {message}")]
    Evaluation { expression: String, message: String },
}

/// Errors raised by a resource registry lookup.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to read resource {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Errors raised while applying an XSLT stylesheet.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to parse XML payload: {0}")]
    Parse(String),

    #[error("Failed to compile stylesheet: {0}")]
    Compile(String),

    #[error("Stylesheet uses unsupported XSLT instruction {0}")]
    Unsupported(String),

    #[error("Failed to apply stylesheet: {0}")]
    Apply(String),
}

/// Errors raised while producing the PDF file.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Layout failed: {0}")]
    Layout(String),

    #[error("PDF serialisation failed: {0}")]
    Pdf(String),
}

impl From<taffy::TaffyError> for RenderError {
    fn from(e: taffy::TaffyError) -> Self {
        RenderError::Layout(e.to_string())
    }
}

/// A fatal failure of one mediation run.
#[derive(Error, Debug)]
pub enum MediatorError {
    #[error("{source}")]
    Resolution {
        field: &'static str,
        #[source]
        source: ResolutionError,
    },

    #[error("{source}")]
    Resource {
        path: String,
        #[source]
        source: ResourceError,
    },

    #[error("{0}")]
    Render(#[from] RenderError),
}

impl MediatorError {
    /// The human readable message handed to the host together with the cause.
    pub fn message(&self) -> String {
        match self {
            MediatorError::Resolution { field, .. } => format!("Invalid {field} expression"),
            MediatorError::Resource { path, .. } => format!("Failed to load resource {path}"),
            MediatorError::Render(_) => "Failed to create PDF.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_messages_name_the_field() {
        let e = ResolutionError::NoValue {
            field: "xslFilePath".to_string(),
        };
        assert_eq!(e.to_string(), "No value found with xslFilePath's expression");
    }

    #[test]
    fn mediator_message_wraps_field() {
        let e = MediatorError::Resolution {
            field: "cssFilePath",
            source: ResolutionError::Ambiguous {
                expression: "//a".to_string(),
            },
        };
        assert_eq!(e.message(), "Invalid cssFilePath expression");
        assert!(e.to_string().contains("refusing to proceed"));
    }

    #[test]
    fn render_failures_share_one_message() {
        let e = MediatorError::from(RenderError::Pdf("boom".to_string()));
        assert_eq!(e.message(), "Failed to create PDF.");
    }
}
