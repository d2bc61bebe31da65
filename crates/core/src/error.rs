//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// These are per-rental, recoverable failures: the reminder scan records them
/// against the rental and moves on. Collaborator failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field required for evaluation was absent or blank.
    #[error("missing field: {0}")]
    MissingField(String),

    /// The timezone identifier is not a known IANA zone.
    #[error("invalid timezone: {0:?}")]
    InvalidTimezone(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_timezone(tz: impl Into<String>) -> Self {
        Self::InvalidTimezone(tz.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Stable machine-readable code, used in reports and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::MissingField(_) => "missing_field",
            DomainError::InvalidTimezone(_) => "invalid_timezone",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}
