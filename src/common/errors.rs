use std::fmt;

/// Custom error types for business logic validation inside the study model
#[derive(Debug, Clone)]
pub enum SpiritError {
    /// Validation errors for user input
    Validation { field: String, message: String },
    /// Business rule violations (the mutation would corrupt the design)
    RuleViolation { rule: String, message: String },
    /// An operation named an entity the study does not contain
    NotFound { resource: String, id: String },
}

impl fmt::Display for SpiritError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiritError::Validation { field, message } => {
                write!(f, "Validation error in field '{field}': {message}")
            }
            SpiritError::RuleViolation { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            SpiritError::NotFound { resource, id } => {
                write!(f, "{resource} with id '{id}' not found")
            }
        }
    }
}

impl std::error::Error for SpiritError {}

/// Result type alias for study-model operations
pub type SpiritResult<T> = Result<T, SpiritError>;

/// Convenience macros for creating business errors
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::SpiritError::Validation {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! rule_violation {
    ($rule:expr, $message:expr) => {
        $crate::common::errors::SpiritError::RuleViolation {
            rule: $rule.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::SpiritError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}
