//! Errors returned by alert rule collection backends.

use std::fmt;

/// Errors that can occur while talking to the alert rule collection.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The rule does not exist.
    #[error("alert rule not found: {id}")]
    NotFound {
        /// Path of the rule that was not found.
        id: String,
    },

    /// The etag sent with a write no longer matches the stored rule.
    #[error("precondition failed for {id}: {message}")]
    PreconditionFailed {
        /// Path of the rule being written.
        id: String,
        /// Message reported by the backend.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("unexpected status {status}{}: {message}", code_suffix(.code))]
    Http {
        /// HTTP status code.
        status: u16,
        /// ARM error code, when the body carried one.
        code: Option<String>,
        /// Error message or raw body.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("decoding response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// Credentials could not be turned into an access token.
    #[error("authentication failed: {message}")]
    Auth {
        /// Description of the authentication failure.
        message: String,
    },
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl ApiError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `PreconditionFailed` error.
    #[must_use]
    pub fn precondition_failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Http` error.
    #[must_use]
    pub fn http(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            code,
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new `Auth` error.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Returns `true` if the rule does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if an etag check rejected the write.
    #[must_use]
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::PreconditionFailed { .. } => ErrorCategory::Conflict,
            Self::Http { status, .. } if *status < 500 => ErrorCategory::Client,
            Self::Http { .. } => ErrorCategory::Server,
            Self::Transport { .. } => ErrorCategory::Infrastructure,
            Self::Decode { .. } => ErrorCategory::Internal,
            Self::Auth { .. } => ErrorCategory::Auth,
        }
    }
}

/// Categories of API errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rule not found.
    NotFound,
    /// Etag mismatch.
    Conflict,
    /// Other 4xx answers.
    Client,
    /// 5xx answers.
    Server,
    /// Network failures.
    Infrastructure,
    /// Authentication failures.
    Auth,
    /// Unexpected payloads.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Auth => write!(f, "auth"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
