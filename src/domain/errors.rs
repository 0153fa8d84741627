use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    #[error("Template rendering failed: {0}")]
    Template(String),
}

/// Failure reported by a mail transport for a single delivery attempt.
///
/// Timeout, connection and DNS failures are transient network errors,
/// authentication failures are credential rejections and everything the
/// transport cannot classify ends up in `Other` with the raw error text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection timed out: {0}")]
    Timeout(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("dns resolution failed: {0}")]
    Dns(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_transient_network(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connection(_) | TransportError::Dns(_)
        )
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, TransportError::Authentication(_))
    }
}
