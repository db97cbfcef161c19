//! Gateway validation errors
//!
//! A `422` response carries a tree of field errors. Lookups by field name never fail:
//! an unknown field simply yields `None`, so callers can chain lookups with
//! [`Option::and_then`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message used when a `422` body cannot be parsed
pub const PARSING_ERROR_MESSAGE: &str = "Parsing error response failed";

/// A validation error attached to a single request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

impl FieldError {
    /// Create a field error.
    ///
    /// Returns `None` when the node has neither a message nor any nested errors,
    /// since such a node carries no information.
    pub fn new(
        field: impl Into<String>,
        message: Option<String>,
        field_errors: Vec<FieldError>,
    ) -> Option<Self> {
        let message = message.filter(|m| !m.is_empty());
        if message.is_none() && field_errors.is_empty() {
            return None;
        }

        Some(Self {
            field: field.into(),
            message,
            code: None,
            field_errors,
        })
    }

    /// Attach the gateway's error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Name of the field this error applies to
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Human readable message, absent on pure grouping nodes such as `creditCard`
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Gateway error code, if provided
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Nested errors in the order the gateway reported them
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// Look up a direct child error by field name
    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        find_field(&self.field_errors, field)
    }
}

/// Validation failure returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorWithResponse {
    status_code: u16,
    message: String,
    field_errors: Vec<FieldError>,
    original_response: String,
}

impl ErrorWithResponse {
    /// Parse an error body.
    ///
    /// Never fails: an unreadable body produces an error with
    /// [`PARSING_ERROR_MESSAGE`] and no field errors.
    pub fn from_json(status_code: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<RawErrorResponse>(body)
            .ok()
            .and_then(|raw| {
                let message = raw.error.and_then(|e| e.message)?;
                Some((message, raw.field_errors))
            });

        match parsed {
            Some((message, raw_errors)) => Self {
                status_code,
                message,
                field_errors: convert_field_errors(raw_errors),
                original_response: body.to_string(),
            },
            None => {
                tracing::debug!("Unable to parse {} error body: {}", status_code, body);
                Self {
                    status_code,
                    message: PARSING_ERROR_MESSAGE.to_string(),
                    field_errors: Vec::new(),
                    original_response: body.to_string(),
                }
            }
        }
    }

    /// Build an error directly, mostly useful in tests
    pub fn new(status_code: u16, message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            status_code,
            message: message.into(),
            field_errors,
            original_response: String::new(),
        }
    }

    /// HTTP status code of the response
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Top level message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Top level field errors
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// Raw response body as received
    pub fn original_response(&self) -> &str {
        &self.original_response
    }

    /// Look up a top level field error by name
    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        find_field(&self.field_errors, field)
    }

    /// Follow a path of field names, e.g. `["creditCard", "number"]`
    pub fn error_for_path(&self, path: &[&str]) -> Option<&FieldError> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.error_for(first)?, |node, field| node.error_for(field))
    }
}

impl fmt::Display for ErrorWithResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorWithResponse {}

fn find_field<'a>(errors: &'a [FieldError], field: &str) -> Option<&'a FieldError> {
    errors.iter().find(|error| error.field == field)
}

#[derive(Deserialize)]
struct RawErrorResponse {
    error: Option<RawErrorMessage>,
    #[serde(default, rename = "fieldErrors")]
    field_errors: Vec<RawFieldError>,
}

#[derive(Deserialize)]
struct RawErrorMessage {
    message: Option<String>,
}

#[derive(Deserialize)]
struct RawFieldError {
    field: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "fieldErrors")]
    field_errors: Vec<RawFieldError>,
}

fn convert_field_errors(raw: Vec<RawFieldError>) -> Vec<FieldError> {
    raw.into_iter()
        .filter_map(|node| {
            let children = convert_field_errors(node.field_errors);
            let field = node.field;
            let error = FieldError::new(field.clone(), node.message, children);
            if error.is_none() {
                tracing::debug!("Dropping empty field error for '{}'", field);
            }
            match (error, node.code) {
                (Some(error), Some(code)) => Some(error.with_code(code)),
                (error, _) => error,
            }
        })
        .collect()
}
