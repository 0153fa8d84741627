use crate::domain::errors::TransportError;

pub const STATUS_GATEWAY_TIMEOUT: u16 = 504;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// User-facing view of a failed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFailure {
    pub status: u16,
    pub message: String,
    pub code: &'static str,
}

/// Maps the last transport error to the status, message and code reported to
/// the client. Pure and total: unknown errors fall through with their raw
/// text.
pub fn classify(error: &TransportError) -> ClassifiedFailure {
    match error {
        TransportError::Timeout(_) => ClassifiedFailure {
            status: STATUS_GATEWAY_TIMEOUT,
            message: "connection timed out".to_string(),
            code: "ETIMEDOUT",
        },
        TransportError::Authentication(_) => ClassifiedFailure {
            status: STATUS_INTERNAL_ERROR,
            message: "authentication failed".to_string(),
            code: "EAUTH",
        },
        TransportError::Connection(_) => ClassifiedFailure {
            status: STATUS_INTERNAL_ERROR,
            message: "cannot connect to mail server".to_string(),
            code: "ECONNECTION",
        },
        TransportError::Dns(_) => ClassifiedFailure {
            status: STATUS_INTERNAL_ERROR,
            message: "cannot resolve mail server".to_string(),
            code: "EDNS",
        },
        TransportError::Other(raw) => ClassifiedFailure {
            status: STATUS_INTERNAL_ERROR,
            message: raw.clone(),
            code: "ESEND",
        },
    }
}
