//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unexpected import identifier '{id}': expected <namespace>/<name>")]
    InvalidImportId { id: String },

    #[error("Value at '{path}' has the wrong shape: expected {expected}")]
    ShapeMismatch { path: String, expected: &'static str },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid wait_for path '{path}': {message}")]
    InvalidWaitPath { path: String, message: String },

    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
