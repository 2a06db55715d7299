//! Error types for the reclass classifier
//!
//! Provides structured error types for the metadata stores, the condition
//! evaluator and the command line front end.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the classifier and its stores
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    // =========================================================================
    // Condition Errors
    // =========================================================================
    #[error("Malformed condition '{expression}': {reason}")]
    MalformedCondition { expression: String, reason: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    #[error("Unable to access {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to process YAML {path}: {source}")]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Error category, used for reporting and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Node, cluster file or key absent
    NotFound,
    /// Condition string does not have the `A__OP__B` shape
    Malformed,
    /// Read, write or (de)serialization failure in a store
    StoreIo,
    /// Bad configuration or bad caller input
    Invalid,
}

impl Error {
    /// Helper for the common not-found case
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Helper for a malformed condition
    pub fn malformed(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedCondition {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Determine the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,

            Error::MalformedCondition { .. } => ErrorKind::Malformed,

            Error::StoreIo { .. }
            | Error::StoreFormat { .. }
            | Error::InvalidDocument { .. } => ErrorKind::StoreIo,

            Error::Configuration(_)
            | Error::InvalidRequest(_)
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::Pattern(_) => ErrorKind::Invalid,
        }
    }

    /// Process exit code for the command line front end
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::NotFound => 2,
            ErrorKind::Malformed => 3,
            ErrorKind::StoreIo => 4,
            ErrorKind::Invalid => 64,
        }
    }

    /// Check if this error means the target simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }
}

/// Result type alias for the classifier
pub type Result<T> = std::result::Result<T, Error>;
