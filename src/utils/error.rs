//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while reading the input bundle or typed parameters
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field '{field}' for {module_type}")]
    MissingField { module_type: String, field: String },

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Errors raised by a trace store lookup
#[derive(Error, Debug)]
pub enum TraceStoreError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid trace store response: {0}")]
    InvalidResponse(String),

    #[error("Trace not found: {0}")]
    TraceNotFound(String),

    #[error("Trace batch unreadable: {0}")]
    Parse(#[from] ParseError),
}

/// Errors that abort the assembly of a single graph unit
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Cannot format node for block {block}: {source}")]
    NodeText {
        block: String,
        #[source]
        source: ParseError,
    },

    #[error("Nested unit '{0}' has no events")]
    EmptyUnit(String),
}

/// A block identifier that is not a well-formed UUID
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("'{0}' is not a UUID")]
    NotUuid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
