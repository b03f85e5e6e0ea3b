//! Structured template errors
//!
//! Tera reports failures as loosely formatted strings. The renderer parses
//! them into [`TemplateError`] so callers can tell a missing variable from a
//! malformed expression and show the field that failed.

use std::collections::BTreeMap;

/// Template rendering failure with the location it occurred at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// An expression referenced a variable absent from the scope
    VariableNotFound {
        variable: String,
        available_variables: Box<Vec<String>>,
        suggestions: Box<Vec<String>>,
        location: Box<ErrorLocation>,
    },

    /// Malformed expression, unknown filter or any other Tera failure
    SyntaxError {
        message: String,
        location: Box<ErrorLocation>,
    },
}

/// Where in a value a template failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Dotted path of the field, e.g. `args.domain` or `images[0].resultImage`
    pub field: String,
    /// The template source that failed
    pub template: String,
    /// Line number if Tera reported one
    pub line_number: Option<usize>,
}

impl TemplateError {
    /// The location of the failure.
    #[must_use]
    pub fn location(&self) -> &ErrorLocation {
        match self {
            Self::VariableNotFound {
                location,
                ..
            }
            | Self::SyntaxError {
                location,
                ..
            } => location,
        }
    }

    /// The missing variable, for [`TemplateError::VariableNotFound`].
    #[must_use]
    pub fn missing_variable(&self) -> Option<&str> {
        match self {
            Self::VariableNotFound {
                variable,
                ..
            } => Some(variable),
            Self::SyntaxError {
                ..
            } => None,
        }
    }

    /// Generate user-friendly error message with context and suggestions
    #[must_use]
    pub fn format_with_context(&self) -> String {
        match self {
            Self::VariableNotFound {
                variable,
                available_variables,
                suggestions,
                location,
            } => format_variable_not_found_error(
                variable,
                available_variables,
                suggestions,
                location,
            ),
            Self::SyntaxError {
                message,
                location,
            } => format_syntax_error(message, location),
        }
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VariableNotFound {
                variable,
                location,
                ..
            } => {
                write!(f, "Template variable not found: '{variable}' in field '{}'", location.field)
            }
            Self::SyntaxError {
                message,
                location,
            } => {
                write!(f, "Template error in field '{}': {message}", location.field)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

fn format_location(msg: &mut String, location: &ErrorLocation) {
    msg.push_str(&format!("Field: {}\n", location.field));
    msg.push_str(&format!("Template: {}\n", location.template));
    if let Some(line) = location.line_number {
        msg.push_str(&format!("Line: {line}\n"));
    }
}

fn format_variable_not_found_error(
    variable: &str,
    available_variables: &[String],
    suggestions: &[String],
    location: &ErrorLocation,
) -> String {
    let mut msg = String::new();

    msg.push_str("Template Variable Not Found\n\n");
    msg.push_str(&format!("Variable: {variable}\n"));
    format_location(&mut msg, location);
    msg.push('\n');

    if !suggestions.is_empty() {
        msg.push_str("Did you mean one of these?\n");
        for suggestion in suggestions {
            msg.push_str(&format!("  - {suggestion}\n"));
        }
        msg.push('\n');
    }

    if !available_variables.is_empty() {
        msg.push_str("Available variables in this context:\n");

        // Group by namespace so large arg maps stay readable
        let mut grouped: BTreeMap<&str, Vec<&String>> = BTreeMap::new();
        for var in available_variables {
            let prefix = var.split('.').take(2).last().unwrap_or(var);
            grouped.entry(prefix).or_default().push(var);
        }

        for (prefix, vars) in grouped.iter().take(8) {
            if vars.len() <= 3 {
                for var in vars {
                    msg.push_str(&format!("  {var}\n"));
                }
            } else {
                msg.push_str(&format!("  *.{prefix}.*  ({} variables)\n", vars.len()));
            }
        }

        if grouped.len() > 8 {
            msg.push_str(&format!("  ... and {} more\n", grouped.len() - 8));
        }
    }

    msg
}

fn format_syntax_error(message: &str, location: &ErrorLocation) -> String {
    let mut msg = String::new();

    msg.push_str("Template Syntax Error\n\n");
    msg.push_str(&format!("Error: {message}\n"));
    format_location(&mut msg, location);

    msg.push_str("\nCommon issues:\n");
    msg.push_str("  - Unclosed {{ }} or {% %} delimiters\n");
    msg.push_str("  - Invalid filter names\n");
    msg.push_str("  - Missing quotes around string values\n");

    msg
}
