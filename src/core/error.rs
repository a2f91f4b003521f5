use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a stage (and, unless retried, the whole flow).
#[derive(Error, Debug)]
pub enum TbcError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Abort branch and failed upgrade preconditions. Never retried.
    #[error("{0}")]
    Fatal(String),
}

impl TbcError {
    /// Errors a stage retry loop must hand straight back to the caller.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TbcError::Fatal(_) | TbcError::MissingInput(_))
    }
}

/// A single record that could not be read or written.
///
/// Collected per batch; the rest of the batch still runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub id: Option<String>,
    pub path: Option<PathBuf>,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(id: Option<&str>, path: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            id: id.map(str::to_string),
            path,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.id, &self.path) {
            (Some(id), Some(path)) => write!(f, "{} ({}): {}", id, path.display(), self.reason),
            (Some(id), None) => write!(f, "{}: {}", id, self.reason),
            (None, Some(path)) => write!(f, "{}: {}", path.display(), self.reason),
            (None, None) => write!(f, "{}", self.reason),
        }
    }
}
