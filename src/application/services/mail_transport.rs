use async_trait::async_trait;

use crate::domain::{
    errors::TransportError,
    models::{DeliveryReceipt, Message},
};

/// Outbound capability that hands a rendered message to a mail relay.
///
/// One instance is created at startup and shared by every request, so
/// implementations must be safe for concurrent use.
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, TransportError>;

    /// Connectivity probe run once at startup.
    async fn verify(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
