//! Error types for criterion and query construction.

use thiserror::Error;

/// Errors that can occur while building criteria or queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    /// A constructor received the wrong number or kind of parameters.
    #[error("invalid criterion shape: expected {expected}, got {got}")]
    InvalidCriterionShape {
        /// What the constructor required (an arity or a parameter kind).
        expected: String,
        /// What it was actually given.
        got: String,
    },

    /// A query could not be assembled from its parts.
    #[error("invalid query: {reason}")]
    InvalidQuery {
        /// Description of the defect.
        reason: String,
    },
}

impl CriteriaError {
    /// Shorthand for [`CriteriaError::InvalidCriterionShape`].
    pub fn shape(expected: impl Into<String>, got: impl Into<String>) -> Self {
        CriteriaError::InvalidCriterionShape {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Shorthand for [`CriteriaError::InvalidQuery`].
    pub fn query(reason: impl Into<String>) -> Self {
        CriteriaError::InvalidQuery {
            reason: reason.into(),
        }
    }
}

/// Result type for criteria operations.
pub type CriteriaResult<T> = std::result::Result<T, CriteriaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_display() {
        let err = CriteriaError::shape("2 parameters", "3 parameters");
        assert_eq!(
            err.to_string(),
            "invalid criterion shape: expected 2 parameters, got 3 parameters"
        );
    }

    #[test]
    fn test_query_display() {
        let err = CriteriaError::query("root object name is empty");
        assert_eq!(err.to_string(), "invalid query: root object name is empty");
    }
}
