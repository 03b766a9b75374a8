//! Error type for the AWS provider clients.

use thiserror::Error;

/// Errors raised by the AWS provider clients.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AwsApiError {
    /// Raised when an API call is rejected or fails on the provider side.
    #[error("{operation} failed: {message}")]
    Api {
        /// Remote operation that failed.
        operation: &'static str,
        /// Rendered SDK error message.
        message: String,
    },
    /// Raised when a response body cannot be read into memory.
    #[error("{operation} response body could not be read: {message}")]
    Body {
        /// Remote operation whose body failed to stream.
        operation: &'static str,
        /// Rendered SDK error message.
        message: String,
    },
    /// Raised when a response omits a field the workflow requires.
    #[error("{operation} response was missing {field}")]
    MissingField {
        /// Remote operation that responded.
        operation: &'static str,
        /// Field that was absent.
        field: &'static str,
    },
}

impl AwsApiError {
    pub(crate) fn api(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Api {
            operation,
            message: err.to_string(),
        }
    }

    pub(crate) fn body(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Body {
            operation,
            message: err.to_string(),
        }
    }

    pub(crate) const fn missing_field(operation: &'static str, field: &'static str) -> Self {
        Self::MissingField { operation, field }
    }
}
