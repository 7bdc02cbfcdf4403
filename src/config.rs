//! Declarative mediator configuration.
//!
//! ```json
//! {
//!   "pdfFilePath": { "expression": "//pdfFilePath/@pathToFile" },
//!   "cssFilePath": { "value": "conf:/styles/report.css" },
//!   "xslFilePath": { "value": "conf:/xslt/report.xsl" },
//!   "render": { "pageMargin": 30, "orientation": "landscape" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::field::{ConfigField, CSS_FILE_PATH, PDF_FILE_PATH, XSL_FILE_PATH};
use crate::html_to_pdf::{HtmlToPdf, RenderConfig};
use crate::mediator::PdfMediator;

/// One path setting: exactly one of `value` and `expression`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl FieldSpec {
    pub fn value(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            expression: None,
        }
    }

    pub fn expression(expression: &str) -> Self {
        Self {
            value: None,
            expression: Some(expression.to_string()),
        }
    }

    fn to_field(&self, field: &'static str) -> Result<ConfigField, ConfigError> {
        match (&self.value, &self.expression) {
            (Some(value), None) => Ok(ConfigField::literal(value)),
            (None, Some(expression)) => {
                ConfigField::expression(expression).map_err(|_| ConfigError::InvalidExpression {
                    field,
                    expression: expression.clone(),
                })
            }
            (Some(_), Some(_)) => Err(ConfigError::ConflictingValue { field }),
            (None, None) => Err(ConfigError::MissingValue { field }),
        }
    }
}

impl From<&ConfigField> for FieldSpec {
    fn from(field: &ConfigField) -> Self {
        match field {
            ConfigField::Literal(value) => Self::value(value),
            ConfigField::Expression(expression) => Self::expression(expression.source()),
        }
    }
}

/// Settings of one mediator instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediatorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_file_path: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_file_path: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsl_file_path: Option<FieldSpec>,
    #[serde(default)]
    pub render: RenderConfig,
}

impl MediatorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.fields()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The configuration describing existing fields.
    pub fn from_fields(
        pdf_file_path: &ConfigField,
        css_file_path: &ConfigField,
        xsl_file_path: &ConfigField,
        render: RenderConfig,
    ) -> Self {
        Self {
            pdf_file_path: Some(pdf_file_path.into()),
            css_file_path: Some(css_file_path.into()),
            xsl_file_path: Some(xsl_file_path.into()),
            render,
        }
    }

    /// The `(pdf, css, xsl)` fields, validated in that order.
    pub fn fields(&self) -> Result<(ConfigField, ConfigField, ConfigField), ConfigError> {
        let field =
            |spec: &Option<FieldSpec>, name: &'static str| -> Result<ConfigField, ConfigError> {
                spec.as_ref()
                    .ok_or(ConfigError::MissingField { field: name })?
                    .to_field(name)
            };
        Ok((
            field(&self.pdf_file_path, PDF_FILE_PATH)?,
            field(&self.css_file_path, CSS_FILE_PATH)?,
            field(&self.xsl_file_path, XSL_FILE_PATH)?,
        ))
    }

    pub fn into_mediator(self) -> Result<PdfMediator, ConfigError> {
        let (pdf, css, xsl) = self.fields()?;
        Ok(PdfMediator::new(pdf, css, xsl).with_renderer(HtmlToPdf::new(self.render)))
    }
}
