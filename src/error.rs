// Workspace Gate - Error Taxonomy
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every gated operation returns Result<T, GateError>.
// Only the tool facade flattens these into display strings.

use serde::Serialize;
use thiserror::Error;

pub type GateResult<T> = Result<T, GateError>;

/// Structured tag for a failure, independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    NotFound,
    UnsupportedWrite,
    DecodeFailure,
    AlreadyExists,
    QueryError,
    SystemError,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedWrite => "unsupported_write",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::QueryError => "query_error",
            ErrorKind::SystemError => "system_error",
            ErrorKind::InvalidArgument => "invalid_argument",
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Error: Access denied: {0} is outside the allowed directory.")]
    AccessDenied(String),

    #[error("Error: File '{0}' not found.")]
    NotFound(String),

    #[error("Error: Cannot write text directly to binary/database files ('{0}').")]
    UnsupportedWrite(String),

    /// Message is already phrased for the caller ("Error reading PDF: ...")
    #[error("{0}")]
    DecodeFailure(String),

    #[error("Error: File '{0}' already exists.")]
    AlreadyExists(String),

    #[error("Query Execution Error: {0}")]
    QueryError(String),

    #[error("System Error: {0}")]
    SystemError(String),

    #[error("Error: {0}")]
    InvalidArgument(String),
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::AccessDenied(_) => ErrorKind::AccessDenied,
            GateError::NotFound(_) => ErrorKind::NotFound,
            GateError::UnsupportedWrite(_) => ErrorKind::UnsupportedWrite,
            GateError::DecodeFailure(_) => ErrorKind::DecodeFailure,
            GateError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            GateError::QueryError(_) => ErrorKind::QueryError,
            GateError::SystemError(_) => ErrorKind::SystemError,
            GateError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Map an io::Error on a named file into the taxonomy
    pub fn from_io(filename: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => GateError::NotFound(filename.to_string()),
            std::io::ErrorKind::AlreadyExists => GateError::AlreadyExists(filename.to_string()),
            _ => GateError::SystemError(format!("{}: {}", filename, err)),
        }
    }
}

impl From<rusqlite::Error> for GateError {
    fn from(err: rusqlite::Error) -> Self {
        GateError::QueryError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
