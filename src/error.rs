//! Error types for loading county data and running pipeline scripts.

use thiserror::Error;

/// Errors raised while loading the record store or executing a command.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("'{path}' not found")]
    FileNotFound { path: String },

    #[error("field '{segment}' not found in '{path}'")]
    FieldNotFound { segment: String, path: String },

    #[error("field '{path}' is {found}, not a number")]
    TypeMismatch { path: String, found: &'static str },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The working set is empty or has zero total population.
    #[error("division by zero computing percentage of '{field}'")]
    DivisionByZero { field: String },

    #[error("{command}: {reason}")]
    MalformedCommand { command: String, reason: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn malformed(command: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCommand {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
