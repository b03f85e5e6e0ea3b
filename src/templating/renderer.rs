//! Template rendering engine with Tera.
//!
//! [`TemplateRenderer`] renders every templated string inside a JSON value
//! against a Tera context and turns Tera failures into [`TemplateError`].

use regex::Regex;
use serde_json::Value;
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::error::{ErrorLocation, TemplateError};

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Nesting depth up to which context variables are listed in error messages.
const MAX_LISTED_DEPTH: usize = 4;

/// Result of rendering a whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedValue {
    /// The value with every renderable string replaced by its output
    pub value: Value,
    /// Strings left untouched because they reference a namespace the context
    /// does not provide yet
    pub deferred: Vec<TemplateError>,
}

/// Template renderer wrapping a Tera instance.
pub struct TemplateRenderer {
    tera: Tera,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// Whether a string contains any Tera delimiters.
    #[must_use]
    pub fn is_template(s: &str) -> bool {
        s.contains("{{") || s.contains("{%") || s.contains("{#")
    }

    /// Render a single template string.
    ///
    /// `field` only feeds the error location.
    pub fn render_str(
        &mut self,
        template: &str,
        context: &TeraContext,
        field: &str,
    ) -> Result<String, TemplateError> {
        self.tera
            .render_str(template, context)
            .map_err(|e| Self::parse_tera_error(&e, template, context, field))
    }

    /// Render every templated string inside `value`, keeping its shape.
    ///
    /// A string whose only problem is a variable from a top-level namespace
    /// missing in `context` is kept as is and reported in
    /// [`RenderedValue::deferred`]. Any other failure aborts the walk.
    pub fn render_json(
        &mut self,
        value: &Value,
        context: &TeraContext,
    ) -> Result<RenderedValue, TemplateError> {
        let mut deferred = Vec::new();
        let value = self.render_node(value, context, "", &mut deferred)?;
        Ok(RenderedValue {
            value,
            deferred,
        })
    }

    fn render_node(
        &mut self,
        value: &Value,
        context: &TeraContext,
        path: &str,
        deferred: &mut Vec<TemplateError>,
    ) -> Result<Value, TemplateError> {
        match value {
            Value::String(s) if Self::is_template(s) => match self.render_str(s, context, path) {
                Ok(rendered) => Ok(Value::String(rendered)),
                Err(e) if Self::references_missing_namespace(&e, context) => {
                    tracing::trace!("Deferring '{}': {}", path, e);
                    deferred.push(e);
                    Ok(value.clone())
                }
                Err(e) => Err(e),
            },
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.render_node(item, context, &format!("{path}[{i}]"), deferred)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    out.insert(key.clone(), self.render_node(item, context, &child, deferred)?);
                }
                Ok(Value::Object(out))
            }
            _ => Ok(value.clone()),
        }
    }

    fn references_missing_namespace(error: &TemplateError, context: &TeraContext) -> bool {
        error.missing_variable().is_some_and(|var| {
            let root = var.split(['.', '[']).next().unwrap_or(var);
            !context.contains_key(root)
        })
    }

    /// Parse a Tera error into a structured TemplateError
    fn parse_tera_error(
        error: &tera::Error,
        template: &str,
        context: &TeraContext,
        field: &str,
    ) -> TemplateError {
        let location = Box::new(ErrorLocation {
            field: field.to_string(),
            template: template.to_string(),
            line_number: Self::extract_line_from_tera_error(error),
        });

        // The interesting message is usually on a nested source
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
        while let Some(err) = current {
            if let Some(name) = Self::extract_variable_name(&err.to_string()) {
                let available_variables = Self::extract_available_variables(context);
                let suggestions = Self::find_similar_variables(&name, &available_variables);
                return TemplateError::VariableNotFound {
                    variable: name,
                    available_variables: Box::new(available_variables),
                    suggestions: Box::new(suggestions),
                    location,
                };
            }
            current = err.source();
        }

        TemplateError::SyntaxError {
            message: Self::format_tera_error(error),
            location,
        }
    }

    /// Extract variable name from "Variable `foo` not found" message
    fn extract_variable_name(error_msg: &str) -> Option<String> {
        let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
        if let Some(m) = re.captures(error_msg).and_then(|caps| caps.get(1)) {
            return Some(m.as_str().to_string());
        }

        let re2 = Regex::new(r"Unknown variable `([^`]+)`").ok()?;
        re2.captures(error_msg).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
    }

    /// List the dotted paths available in a Tera context
    fn extract_available_variables(context: &TeraContext) -> Vec<String> {
        fn collect(prefix: &str, value: &Value, depth: usize, out: &mut Vec<String>) {
            match value {
                Value::Object(map) if depth < MAX_LISTED_DEPTH => {
                    for (k, v) in map {
                        let path = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        collect(&path, v, depth + 1, out);
                    }
                }
                _ if !prefix.is_empty() => out.push(prefix.to_string()),
                _ => {}
            }
        }

        let mut vars = Vec::new();
        collect("", &context.clone().into_json(), 0, &mut vars);
        vars.sort();
        vars
    }

    /// Find similar variable names using Levenshtein distance
    fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
        let mut scored: Vec<_> =
            available.iter().map(|var| (var.clone(), levenshtein(target, var))).collect();

        scored.sort_by_key(|(_, dist)| *dist);

        scored
            .into_iter()
            .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(var, _)| var)
            .collect()
    }

    /// Extract line number from Tera error message
    ///
    /// Tera includes line:column information in parse error messages.
    fn extract_line_from_tera_error(error: &tera::Error) -> Option<usize> {
        let error_msg = format!("{error:?}");
        let re = Regex::new(r"(\d+):(\d+)").ok()?;
        re.captures(&error_msg)
            .and_then(|caps| caps.get(1))
            .and_then(|line| line.as_str().parse::<usize>().ok())
    }

    /// Format a Tera error chain, dropping Tera's internal one-off template name.
    #[must_use]
    pub fn format_tera_error(error: &tera::Error) -> String {
        use std::error::Error;

        let mut all_messages = vec![error.to_string()];
        let mut current_error: Option<&dyn Error> = error.source();
        while let Some(err) = current_error {
            all_messages.push(err.to_string());
            current_error = err.source();
        }

        let messages: Vec<String> = all_messages
            .into_iter()
            .map(|msg| {
                msg.replace("while rendering '__tera_one_off'", "")
                    .replace("Failed to render '__tera_one_off'", "Template rendering failed")
                    .replace("Failed to parse '__tera_one_off'", "Template syntax error")
                    .replace("'__tera_one_off'", "template")
                    .trim()
                    .to_string()
            })
            .filter(|cleaned| {
                !cleaned.is_empty()
                    && cleaned != "Template rendering failed"
                    && cleaned != "Template syntax error"
            })
            .collect();

        if messages.is_empty() {
            "Template syntax error".to_string()
        } else {
            messages.join("\n  → ")
        }
    }
}
