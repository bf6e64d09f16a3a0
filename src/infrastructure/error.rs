//! Client error taxonomy
//!
//! Every failure that reaches a caller of the API client is one of these
//! variants. `Display` is the plain message shown to the user; the variant
//! and its fields carry the structure.

use thiserror::Error;

use crate::domain::auth::ValidationError;

/// Discriminant of [`ApiError`], for matching without looking at messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connectivity,
    Request,
    Decode,
    Timeout,
    Validation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure, or an HTML page where JSON was expected
    #[error("{message}")]
    Connectivity {
        message: String,
        cause: Option<String>,
    },

    /// Backend answered with a non-success status
    #[error("{message}")]
    Request { status: u16, message: String },

    /// Success status but the body could not be decoded
    #[error("{message}")]
    Decode {
        message: String,
        cause: Option<String>,
    },

    /// Poll budget exhausted without a result
    #[error("{message}")]
    Timeout { message: String, attempts: u32 },

    /// Input rejected before any network call
    #[error("{message}")]
    Validation { field: String, message: String },
}

impl ApiError {
    pub fn connectivity(message: impl Into<String>, cause: Option<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            cause,
        }
    }

    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::Request {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>, cause: Option<String>) -> Self {
        Self::Decode {
            message: message.into(),
            cause,
        }
    }

    pub fn timeout(message: impl Into<String>, attempts: u32) -> Self {
        Self::Timeout {
            message: message.into(),
            attempts,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::Request { .. } => ErrorKind::Request,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// User-facing message
    pub fn message(&self) -> &str {
        match self {
            Self::Connectivity { message, .. }
            | Self::Request { message, .. }
            | Self::Decode { message, .. }
            | Self::Timeout { message, .. }
            | Self::Validation { message, .. } => message,
        }
    }

    /// Underlying low-level detail, if one was kept
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Connectivity { cause, .. } | Self::Decode { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            message: err.message,
        }
    }
}
