//! Error types for asnforge

use thiserror::Error;

/// Main error type for asnforge operations.
///
/// A failed match is never an error: `check_and_set` and `add` report
/// "no match" and "deferred match" as ordinary values. Errors are reserved
/// for broken rule definitions and misuse of the engine.
#[derive(Debug, Error)]
pub enum AsnError {
    /// A rule or constraint tree is structurally invalid.
    #[error("Malformed rule '{rule}': {reason}")]
    MalformedRule { rule: String, reason: String },

    /// A named constraint could not be found in a constraint tree.
    #[error("Constraint '{0}' not found")]
    ConstraintNotFound(String),

    /// A registry was built without any rule prototypes.
    #[error("No association rules are registered")]
    NoRules,

    /// Invalid operation for the current engine state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error in engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AsnError {
    /// Creates a [`AsnError::MalformedRule`] for the given rule name.
    pub fn malformed(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors that must abort registry construction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedRule { .. } | Self::NoRules)
    }
}

/// Result type alias for asnforge operations
pub type Result<T> = std::result::Result<T, AsnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let err = AsnError::malformed("Asn_Image", "empty tree");
        assert_eq!(err.to_string(), "Malformed rule 'Asn_Image': empty tree");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_lookup_is_not_fatal() {
        let err = AsnError::ConstraintNotFound("opt_elem".into());
        assert_eq!(err.to_string(), "Constraint 'opt_elem' not found");
        assert!(!err.is_fatal());
    }
}
