//! Error types for the domain layer

use thiserror::Error;

/// Errors raised while building domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An attribute key that is not part of the fixed field table
    #[error("Unknown attribute key: {0}")]
    UnknownAttribute(String),

    /// A persistence mode or other enumerated value that could not be parsed
    #[error("Invalid value '{value}' for {what}")]
    InvalidValue {
        /// What was being parsed
        what: &'static str,
        /// The rejected input
        value: String,
    },
}
