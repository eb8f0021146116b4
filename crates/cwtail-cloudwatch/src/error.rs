//! Error types for the CloudWatch Logs boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request rate for the account was exceeded (`ThrottlingException`).
    #[error("rate exceeded during {operation}")]
    Throttled { operation: &'static str },

    /// The log group no longer exists (`ResourceNotFoundException`).
    #[error("resource not found during {operation}: {message}")]
    ResourceNotFound {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} failed ({code}): {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },
}

impl ApiError {
    pub const THROTTLING_CODE: &'static str = "ThrottlingException";
    pub const NOT_FOUND_CODE: &'static str = "ResourceNotFoundException";

    /// Classify an AWS error code into the taxonomy the tail engine acts on.
    pub fn from_code(operation: &'static str, code: Option<&str>, message: Option<&str>) -> Self {
        let message = message.unwrap_or_default().to_string();
        match code {
            Some(Self::THROTTLING_CODE) => Self::Throttled { operation },
            Some(Self::NOT_FOUND_CODE) => Self::ResourceNotFound { operation, message },
            Some(code) => Self::Service {
                operation,
                code: code.to_string(),
                message,
            },
            None => Self::Service {
                operation,
                code: "Unknown".to_string(),
                message,
            },
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }
}
