//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unit not found: {0}")]
    UnitNotFound(String),

    #[error("validation failed: {}", issues.join("; "))]
    Validation { issues: Vec<String> },
}

impl DomainError {
    pub fn validation(issues: Vec<String>) -> Self {
        Self::Validation { issues }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
