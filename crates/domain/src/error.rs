//! Unified error types for the domain layer
//!
//! Value objects report construction failures through [`DomainError`] so the
//! protocol and engine crates never have to fall back to `String` errors.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., empty room id)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// Use this when a value is well-formed but not acceptable:
    /// - Required fields are empty
    /// - Values exceed length limits
    ///
    /// # Example
    /// ```ignore
    /// if id.is_empty() {
    ///     return Err(DomainError::validation("Room id cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Use this in `FromStr` implementations when the input string
    /// doesn't match any known variant or format:
    /// - Squares outside `a1`..`h8`
    /// - Unknown piece letters
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
