use std::fmt;

use serde::Serialize;
use ts_rs::TS;

/// Structured error type for the dashboard view-models. The renderer matches
/// on `code` to decide between a warning toast, an error toast, or silence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum AppError {
    NotFound { what: String },
    InvalidIndex { what: String, index: usize },
    ValidationError { message: String },
    IoError { message: String },
    /// The request never got a reply (connection refused, timeout, bad HTTP status).
    TransportError { message: String },
    /// The controller answered with an error response.
    RemoteError { message: String },
    /// The controller answered, but not in a shape we understand.
    ProtocolError { message: String },
    /// Another dialog surface is already open.
    Busy { surface: String },
    /// A reply arrived for an edit session that is no longer open.
    StaleSession,
    NoController { devicetype: String },
}

impl AppError {
    /// Local failures never touched the network and are shown as warnings;
    /// everything else is an error.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError { .. }
                | AppError::InvalidIndex { .. }
                | AppError::Busy { .. }
                | AppError::NotFound { .. }
                | AppError::NoController { .. }
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { what } => write!(f, "{what} not found"),
            AppError::InvalidIndex { what, index } => {
                write!(f, "Invalid {what} index: {index}")
            }
            AppError::ValidationError { message } => write!(f, "{message}"),
            AppError::IoError { message } => write!(f, "I/O error: {message}"),
            AppError::TransportError { message } => write!(f, "Transport error: {message}"),
            AppError::RemoteError { message } => write!(f, "Controller error: {message}"),
            AppError::ProtocolError { message } => {
                write!(f, "Unexpected controller response: {message}")
            }
            AppError::Busy { surface } => write!(f, "Another dialog is open ({surface})"),
            AppError::StaleSession => write!(f, "Edit session was closed before the reply arrived"),
            AppError::NoController { devicetype } => {
                write!(f, "No {devicetype} device in inventory")
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<crate::storage::StoreError> for AppError {
    fn from(e: crate::storage::StoreError) -> Self {
        match e {
            crate::storage::StoreError::Io(io_err) => AppError::IoError {
                message: io_err.to_string(),
            },
            crate::storage::StoreError::Json(json_err) => AppError::ValidationError {
                message: json_err.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::TransportError {
            message: e.to_string(),
        }
    }
}
