//! Error types for filtering, merging, negotiation, and encoding.
//!
//! Client-input failures (`Schema`, `NotAcceptable`, `UnsupportedFormat`) are
//! recovered at the boundary and turned into an [`ErrorBody`]. `Shape` and
//! `Encode` signal a mismatch between a declared schema and the data it
//! describes; they abort the current request and are reported to clients
//! only as a generic internal error.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while deriving, merging, or encoding a view.
#[derive(Error, Debug)]
pub enum ViewError {
    /// The payload could not be decoded into the expected shape.
    #[error("Schema error: {0}")]
    Schema(String),

    /// None of the media types in the `Accept` header can be produced.
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    /// The requested wire format is not implemented by the codec.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value has no valid conversion path into its destination shape.
    /// `path` is a dotted location such as `items[2].price`.
    #[error("Shape error at {path}: {message}")]
    Shape { path: String, message: String },

    /// Serializing an already-filtered value failed.
    #[error("Encoding error: {0}")]
    Encode(String),
}

/// Convenience alias used throughout view-core.
pub type Result<T> = std::result::Result<T, ViewError>;

impl ViewError {
    pub(crate) fn shape(path: &str, message: impl Into<String>) -> Self {
        ViewError::Shape {
            path: if path.is_empty() {
                "$".to_string()
            } else {
                path.to_string()
            },
            message: message.into(),
        }
    }

    /// Prefix the location of a `Shape` error with the enclosing field or
    /// index segment. Other variants are returned unchanged.
    pub(crate) fn within(self, segment: &str) -> Self {
        match self {
            ViewError::Shape { path, message } => {
                let path = if path == "$" {
                    segment.to_string()
                } else if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                ViewError::Shape { path, message }
            }
            other => other,
        }
    }

    /// Reclassify a conversion failure as bad client input. Used on decode
    /// paths, where an unconvertible value comes from the payload.
    pub(crate) fn into_schema(self) -> Self {
        match self {
            ViewError::Shape { path, message } => {
                ViewError::Schema(format!("{message} (at {path})"))
            }
            other => other,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ViewError::Schema(_) => ErrorCode::SchemaError,
            ViewError::NotAcceptable(_) => ErrorCode::NotAcceptable,
            ViewError::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            ViewError::Shape { .. } | ViewError::Encode(_) => ErrorCode::InternalError,
        }
    }

    /// `true` when the error was caused by the request rather than a defect.
    pub fn is_client_error(&self) -> bool {
        self.code() != ErrorCode::InternalError
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        ViewError::Schema(err.to_string())
    }
}

/// Stable error codes carried by [`ErrorBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    SchemaError,
    NotAcceptable,
    UnsupportedFormat,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SchemaError => "schema_error",
            ErrorCode::NotAcceptable => "not_acceptable",
            ErrorCode::UnsupportedFormat => "unsupported_format",
            ErrorCode::InternalError => "internal_error",
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::SchemaError => 400,
            ErrorCode::NotAcceptable => 406,
            ErrorCode::UnsupportedFormat => 415,
            ErrorCode::InternalError => 500,
        }
    }
}

/// Structured failure response: a stable code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&ViewError> for ErrorBody {
    fn from(err: &ViewError) -> Self {
        let code = err.code();
        let message = if err.is_client_error() {
            err.to_string()
        } else {
            "internal error".to_string()
        };
        ErrorBody { code, message }
    }
}
