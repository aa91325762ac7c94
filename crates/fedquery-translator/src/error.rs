//! Error types for query translation.

use fedquery_criteria::CriteriaError;
use thiserror::Error;

use crate::key_type::KeyType;

/// Errors that can occur while translating query groups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslatorError {
    /// Criterion or query construction failed.
    #[error("criteria error: {0}")]
    Criteria(#[from] CriteriaError),

    /// A non-demographic item expanded to no concept codes.
    #[error("empty domain for {key_type} item '{item_key}'")]
    EmptyDomain {
        /// Classification of the item.
        key_type: KeyType,
        /// The raw item key.
        item_key: String,
    },

    /// A FLAG value constraint used a letter outside H, L, N and A.
    #[error("unsupported value flag: '{flag}'")]
    UnsupportedValueFlag {
        /// The offending flag text.
        flag: String,
    },

    /// A domain token could not be interpreted for its key type.
    #[error("invalid {key_type} domain token '{token}': {reason}")]
    InvalidDomainToken {
        /// Classification of the item.
        key_type: KeyType,
        /// The offending token.
        token: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A value constraint could not be turned into a criterion.
    #[error("invalid value constraint '{value}': {reason}")]
    InvalidValueConstraint {
        /// The constrained value text.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An item key did not have the `\\TABLE\segment\...\` shape.
    #[error("invalid item key '{key}' at position {position}")]
    InvalidItemKey {
        /// The raw item key.
        key: String,
        /// Byte offset of the first unexpected character.
        position: usize,
    },
}

/// Result type for translator operations.
pub type TranslatorResult<T> = std::result::Result<T, TranslatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_empty_domain() {
        let err = TranslatorError::EmptyDomain {
            key_type: KeyType::Loinc,
            item_key: "\\\\i2b2\\Labs\\LOINC\\2345-7\\".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "empty domain for LOINC item '\\\\i2b2\\Labs\\LOINC\\2345-7\\'"
        );
    }

    #[test]
    fn test_error_display_unsupported_flag() {
        let err = TranslatorError::UnsupportedValueFlag {
            flag: "X".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported value flag: 'X'");
    }

    #[test]
    fn test_error_display_invalid_token() {
        let err = TranslatorError::InvalidDomainToken {
            key_type: KeyType::Age,
            token: "forty".to_string(),
            reason: "not an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid AGE domain token 'forty': not an integer"
        );
    }

    #[test]
    fn test_error_from_criteria_error() {
        let err: TranslatorError = CriteriaError::query("root object name is empty").into();
        assert!(matches!(err, TranslatorError::Criteria(_)));
    }
}
