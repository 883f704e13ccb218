//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Model variant identifier is not part of the variant table
    #[error("Unknown model variant: {0}")]
    UnknownVariant(String),

    /// Power preference is neither high-performance nor low-power
    #[error("Invalid power preference: {0}")]
    InvalidPowerPreference(String),

    /// Host command could not be decoded
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
