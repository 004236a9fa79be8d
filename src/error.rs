//! Error taxonomy for the classifier
//!
//! Every failure surfaces immediately to the caller. Nothing here is retried
//! or downgraded to a warning.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading data, training, predicting or
/// persisting a model
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema error in {}{}: {message}", .path.display(), line_suffix(.line))]
    Schema {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("Cannot {operation}: {requires} first")]
    NotReady {
        operation: &'static str,
        requires: &'static str,
    },

    #[error("Invalid model file: {0}")]
    ModelFormat(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PredictorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PredictorError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) -> Self {
        PredictorError::Schema {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, PredictorError>;
