//! Upload workflow error types
//!
//! Covers archive intake, the processing collaborator, the storage layer and
//! result file access.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Upload workflow errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Claimed filename does not carry the archive extension
    #[error("Unsupported file type: only ZIP archives are accepted (got '{0}')")]
    UnsupportedFileType(String),

    /// Archive bytes could not be read or contain unsafe entries
    #[error("Invalid ZIP archive: {0}")]
    InvalidArchive(String),

    /// Multipart request did not carry a file part
    #[error("No file provided in upload request")]
    MissingFile,

    /// Request body, path or query could not be parsed
    #[error("Malformed request: {0}")]
    InvalidRequest(String),

    /// Upload body exceeded the configured size limit (bytes)
    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    /// Upload record not found by ID
    #[error("Upload {0} not found")]
    NotFound(String),

    /// Record exists but its spreadsheet is gone from disk
    #[error("Result file missing for upload: {0}")]
    ResultFileMissing(PathBuf),

    /// Processing collaborator failed
    #[error("Script processing failed: {0}")]
    Processing(String),

    /// Processing collaborator did not finish in time
    #[error("Script processing timed out after {0:?}")]
    ProcessingTimeout(Duration),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UploadError {
    /// Check if this is a client error (400-series, excluding not found)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UploadError::UnsupportedFileType(_)
                | UploadError::InvalidArchive(_)
                | UploadError::MissingFile
                | UploadError::InvalidRequest(_)
                | UploadError::PayloadTooLarge(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, UploadError::NotFound(_))
    }

    /// Check if this is a server error (500-series)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error() && !self.is_not_found()
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            UploadError::InvalidArchive(_) => "INVALID_ARCHIVE",
            UploadError::MissingFile => "MISSING_FILE",
            UploadError::InvalidRequest(_) => "INVALID_REQUEST",
            UploadError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            UploadError::NotFound(_) => "NOT_FOUND",
            UploadError::ResultFileMissing(_) => "RESULT_FILE_MISSING",
            UploadError::Processing(_) | UploadError::ProcessingTimeout(_) => "PROCESSING_FAILED",
            UploadError::Database(_) => "DATABASE_ERROR",
            UploadError::Io(_) | UploadError::Json(_) => "INTERNAL_ERROR",
        }
    }
}
