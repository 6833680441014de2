//! Whole-file import failures
//!
//! Row-level problems never surface here: they are folded into
//! `ImportResult::errors` and the batch keeps going.

use thiserror::Error;

/// Spreadsheet could not be turned into rows
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Unable to read spreadsheet: {0}")]
    Unreadable(String),
    #[error("No worksheet found")]
    NoWorksheetFound,
}

/// Failure that aborts an import request before any row is processed
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("No file provided")]
    NoFile,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("File exceeds the upload limit of {limit} bytes")]
    FileTooLarge { limit: usize },
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ImportError {
    /// Error code used in NATS error responses
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::Unauthorized(_) => "UNAUTHORIZED",
            ImportError::NoFile => "NO_FILE",
            ImportError::InvalidRequest(_) => "INVALID_REQUEST",
            ImportError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ImportError::Sheet(SheetError::NoWorksheetFound) => "NO_WORKSHEET",
            ImportError::Sheet(SheetError::Unreadable(_)) => "UNREADABLE_FILE",
            ImportError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
