//! Error types for bench-report operations.
//!
//! Defines error types for the major subsystems:
//! - Trace store loading
//! - Report construction and artifact output
//! - Configuration loading and validation

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading traces into a store.
///
/// Lookups never fail: an unknown trace id yields no spans.
#[derive(Debug, Error)]
pub enum TraceStoreError {
    #[error("Failed to read trace dump '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid trace dump '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while building or writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Benchmark '{benchmark}' lists task '{task}' without evaluation results")]
    MissingEvaluation { benchmark: String, task: String },

    #[error("Invalid task name '{0}': must be a single path component")]
    InvalidTaskName(String),

    #[error("Template rendering error: {0}")]
    Template(#[from] tera::Error),

    #[error("Failed to create output directory {path:?}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
