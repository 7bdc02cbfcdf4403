//! Configuration fields that are either a literal or an expression.

use crate::context::{EvalResult, EvaluationContext, Expression};
use crate::error::ResolutionError;
use crate::logging::Logger;

pub const PDF_FILE_PATH: &str = "pdfFilePath";
pub const CSS_FILE_PATH: &str = "cssFilePath";
pub const XSL_FILE_PATH: &str = "xslFilePath";

/// A mediator setting given as `value="..."` or `expression="..."`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigField {
    Literal(String),
    Expression(Expression),
}

impl ConfigField {
    pub fn literal(value: &str) -> Self {
        ConfigField::Literal(value.to_string())
    }

    /// Compile `source` into an expression field.
    pub fn expression(source: &str) -> Result<Self, String> {
        Expression::compile(source).map(ConfigField::Expression)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            ConfigField::Literal(v) => Some(v),
            ConfigField::Expression(_) => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            ConfigField::Literal(_) => None,
            ConfigField::Expression(e) => Some(e),
        }
    }

    /// Resolve the field for one message.
    ///
    /// Literals are returned without touching `ctx`. `field_name` is only
    /// used to word the error when an expression yields nothing.
    pub fn resolve(
        &self,
        ctx: &dyn EvaluationContext,
        field_name: &str,
        logger: &Logger,
    ) -> Result<String, ResolutionError> {
        let expression = match self {
            ConfigField::Literal(value) => return Ok(value.clone()),
            ConfigField::Expression(e) => e,
        };

        let result = ctx
            .evaluate(expression)
            .map_err(|message| ResolutionError::Evaluation {
                expression: expression.to_string(),
                message,
            })?;

        match extract_value(expression, result)? {
            Some(value) => Ok(value),
            None => {
                logger.debug(format_args!("Resolving resulted in null for {field_name}"));
                Err(ResolutionError::NoValue {
                    field: field_name.to_string(),
                })
            }
        }
    }
}

fn extract_value(
    expression: &Expression,
    result: EvalResult,
) -> Result<Option<String>, ResolutionError> {
    match result {
        EvalResult::String(s) => Ok(Some(s)),
        EvalResult::Node(node) => Ok(Some(node.text)),
        EvalResult::Attribute { value, .. } => Ok(Some(value)),
        EvalResult::Sequence(mut items) => match items.len() {
            0 => Ok(None),
            1 => extract_value(expression, items.remove(0)),
            _ => Err(ResolutionError::Ambiguous {
                expression: expression.to_string(),
            }),
        },
        EvalResult::Empty => Ok(None),
        EvalResult::Other(type_name) => Err(ResolutionError::UnsupportedType {
            expression: expression.to_string(),
            type_name,
        }),
    }
}
