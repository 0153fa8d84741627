use crate::domain::errors::TransportError;

/// What a transport hands back for an accepted message. Both values are
/// provider specific and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider_message_id: String,
    pub provider_response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success {
        provider_message_id: String,
        provider_response: String,
    },
    Failure {
        last_error: TransportError,
        attempts_made: u32,
    },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }
}

impl From<DeliveryReceipt> for DeliveryOutcome {
    fn from(receipt: DeliveryReceipt) -> Self {
        DeliveryOutcome::Success {
            provider_message_id: receipt.provider_message_id,
            provider_response: receipt.provider_response,
        }
    }
}
