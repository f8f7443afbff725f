//! Errors surfaced by alert rule reconcilers.

use std::time::Duration;

use sentinel_alert_rules::{AlertRuleKind, ApiError};
use sentinel_core::CoreError;
use thiserror::Error;

use crate::timeouts::Operation;

#[derive(Debug, Error)]
pub enum ResourceError {
    /// Identifier or attribute validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(
        "A resource with the ID {id:?} already exists - to be managed via this tool it needs to be imported into the state. Please see the documentation for {resource_type:?} for more information."
    )]
    AlreadyExists {
        resource_type: &'static str,
        id: String,
    },

    #[error(
        "asserting alert rule of {id:?}: Sentinel Alert Rule has mismatched kind, expected: {expected:?}, got {actual:?}"
    )]
    KindMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    /// A remote call failed for any reason other than a tolerated not-found.
    #[error("{action} Sentinel Alert Rule {label} {id:?}: {source}")]
    Api {
        action: &'static str,
        label: &'static str,
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("cannot import non-existent remote object {id:?}")]
    ImportNotFound { id: String },

    #[error("Sentinel Alert Rule {id:?} was not found right after it was written")]
    Vanished { id: String },

    #[error("{operation} did not finish within {after:?}")]
    DeadlineExceeded { operation: Operation, after: Duration },

    #[error("{operation} was cancelled")]
    Cancelled { operation: Operation },

    #[error("unknown resource type {0:?}")]
    UnknownResourceType(String),

    #[error("decoding resource data: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResourceError {
    pub(crate) fn api(
        action: &'static str,
        label: &'static str,
        id: impl Into<String>,
        source: ApiError,
    ) -> Self {
        Self::Api {
            action,
            label,
            id: id.into(),
            source,
        }
    }

    pub(crate) fn kind_mismatch(
        id: impl Into<String>,
        expected: &AlertRuleKind,
        actual: &AlertRuleKind,
    ) -> Self {
        Self::KindMismatch {
            id: id.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn is_kind_mismatch(&self) -> bool {
        matches!(self, Self::KindMismatch { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// The underlying API error, if a remote call failed.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Core(_) | Self::UnknownResourceType(_) | Self::Json(_) => {
                ErrorCategory::Validation
            }
            Self::AlreadyExists { .. } | Self::KindMismatch { .. } => ErrorCategory::Conflict,
            Self::ImportNotFound { .. } | Self::Vanished { .. } => ErrorCategory::NotFound,
            Self::Api { .. } => ErrorCategory::Remote,
            Self::DeadlineExceeded { .. } | Self::Cancelled { .. } => ErrorCategory::Interrupted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Remote,
    Interrupted,
}

pub type Result<T> = std::result::Result<T, ResourceError>;
