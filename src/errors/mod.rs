//! Domain error types for the scene table service
//!
//! Every failure on the upload, read and download paths is expressed as an
//! [`UploadError`]. Variants are classified as client errors (safe to show to
//! the caller), not-found errors, or server errors (logged, never leaked).
//!
//! # Examples
//!
//! ```rust
//! use scenetable::errors::UploadError;
//!
//! let err = UploadError::UnsupportedFileType("script.rar".to_string());
//! assert!(err.is_client_error());
//! assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
//!
//! let err = UploadError::NotFound("999999".to_string());
//! assert!(err.is_not_found());
//! ```

pub mod upload;

pub use upload::UploadError;

/// Result type alias for upload workflow operations
pub type UploadResult<T> = Result<T, UploadError>;
