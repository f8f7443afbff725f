use thiserror::Error;

/// Core error types for identifier parsing and attribute validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("parsing {kind} ID {input:?}: {reason}")]
    InvalidId {
        kind: &'static str,
        input: String,
        reason: String,
    },

    #[error("{attribute:?} must not be empty")]
    EmptyValue { attribute: String },

    #[error("{attribute:?} is an invalid UUID: {value:?}")]
    InvalidUuid { attribute: String, value: String },

    #[error("{attribute:?}: {message}")]
    InvalidAttribute { attribute: String, message: String },
}

impl CoreError {
    /// Create a new InvalidId error
    pub fn invalid_id(
        kind: &'static str,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidId {
            kind,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new EmptyValue error
    pub fn empty_value(attribute: impl Into<String>) -> Self {
        Self::EmptyValue {
            attribute: attribute.into(),
        }
    }

    /// Create a new InvalidUuid error
    pub fn invalid_uuid(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidUuid {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a new InvalidAttribute error
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidId { .. } => ErrorCategory::Identifier,
            Self::EmptyValue { .. } | Self::InvalidUuid { .. } | Self::InvalidAttribute { .. } => {
                ErrorCategory::Validation
            }
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Identifier,
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::empty_value("name");
        assert_eq!(err.to_string(), "\"name\" must not be empty");

        let err = CoreError::invalid_uuid("alert_rule_template_guid", "nope");
        assert_eq!(
            err.to_string(),
            "\"alert_rule_template_guid\" is an invalid UUID: \"nope\""
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            CoreError::invalid_id("AlertRule", "/x", "bad").category(),
            ErrorCategory::Identifier
        );
        assert_eq!(
            CoreError::empty_value("name").category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
    }
}
