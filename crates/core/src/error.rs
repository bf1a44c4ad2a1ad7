//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only (validation, invariants, conflicts).
/// Storage and IO failures are modelled by the infra crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (negative amount, empty entry, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A ledger invariant would be broken (unbalanced strict entry, closed year).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist (e.g. an unknown account number).
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested transition already happened (e.g. posting twice).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(err: &DomainError) -> &'static str {
        match err {
            DomainError::Validation(_) => "validation",
            DomainError::InvariantViolation(_) => "invariant",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
        }
    }

    #[test]
    fn constructors_pick_the_matching_kind() {
        assert_eq!(kind(&DomainError::validation("x")), "validation");
        assert_eq!(kind(&DomainError::invariant("x")), "invariant");
        assert_eq!(kind(&DomainError::invalid_id("x")), "invalid_id");
        assert_eq!(kind(&DomainError::not_found("x")), "not_found");
        assert_eq!(kind(&DomainError::conflict("x")), "conflict");
    }

    #[test]
    fn messages_name_the_subject() {
        assert_eq!(
            DomainError::not_found("account 9999").to_string(),
            "not found: account 9999"
        );
        assert_eq!(
            DomainError::conflict("JE-0001 is already posted").to_string(),
            "conflict: JE-0001 is already posted"
        );
    }
}
