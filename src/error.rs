// src/error.rs

//! Error types shared by every stage of the metadata pipeline

use thiserror::Error;

/// Errors raised while parsing directives or resolving tags
///
/// Rules that simply do not apply to the current event are never errors;
/// only malformed input ends up here.
#[derive(Error, Debug)]
pub enum Error {
    /// A directive record could not be split into fields
    #[error("Invalid directive '{directive}': {reason}")]
    Directive { directive: String, reason: String },

    #[error("Unknown tag type attribute '{value}' in {directive}")]
    UnknownTagType { value: String, directive: String },

    #[error("Missing {attr} attribute for {directive}")]
    MissingAttribute { attr: &'static str, directive: String },

    /// An attribute value failed validation for its tag type
    #[error("Invalid {attr} attribute for {directive}")]
    InvalidAttribute { attr: &'static str, directive: String },

    #[error("Invalid flavor entry '{directive}': {reason}")]
    Flavor { directive: String, reason: String },

    #[error("Invalid image entry '{directive}': {reason}")]
    Image { directive: String, reason: String },

    /// `enable` rendered to something other than true/false
    #[error("Invalid value for enable attribute: {0}")]
    Enable(String),

    #[error("Template error in '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("Invalid match pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn template(template: &str, reason: impl Into<String>) -> Self {
        Self::Template {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
