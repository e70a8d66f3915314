use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse failure category reported to callers in the result envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    User,
    Data,
    Internal,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::User => "user",
            ErrorKind::Data => "data",
            ErrorKind::Internal => "internal",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("{0}")]
    NoRenderableData(String),

    /// A failure reported by an external series or depth source, forwarded
    /// with its own kind and message.
    #[error("{message}")]
    SourceError { kind: ErrorKind, message: String },

    #[error("Failed to persist chart: {0}")]
    PersistenceError(String),

    #[error("Internal processing error: {0}")]
    ProcessingError(String),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    /// Builds a source failure, dropping a leading `"Error: "` from the message.
    pub fn from_source(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = message
            .strip_prefix("Error: ")
            .map(str::to_string)
            .unwrap_or(message);
        EngineError::SourceError { kind, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigError(_) => ErrorKind::User,
            EngineError::NoRenderableData(_) => ErrorKind::User,
            EngineError::CsvSystemError { .. } => ErrorKind::Data,
            EngineError::CsvDataFormatError(_) => ErrorKind::Data,
            EngineError::SourceError { kind, .. } => *kind,
            EngineError::IoError { .. } => ErrorKind::Io,
            EngineError::PersistenceError(_) => ErrorKind::Io,
            EngineError::ProcessingError(_) => ErrorKind::Internal,
            EngineError::AnyhowError(_) => ErrorKind::Internal,
        }
    }
}

/// Failure half of the result envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<EngineError> for ErrorEnvelope {
    fn from(err: EngineError) -> Self {
        tracing::error!(kind = %err.kind(), "Mapping EngineError to error envelope: {:?}", err);
        ErrorEnvelope {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
