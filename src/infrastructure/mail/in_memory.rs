use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    application::services::mail_transport::MailTransport,
    domain::{
        errors::TransportError,
        models::{DeliveryReceipt, Message},
    },
};

/// Keeps every accepted message in memory. Used for local development and
/// tests where no relay is available.
#[derive(Default)]
pub struct InMemoryMailTransport {
    sent: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Message> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl MailTransport for InMemoryMailTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, TransportError> {
        let mut sent = self.sent.write().await;
        sent.push(message.clone());

        Ok(DeliveryReceipt {
            provider_message_id: format!("<{}@localhost>", Uuid::new_v4()),
            provider_response: format!("250 queued in memory as message #{}", sent.len()),
        })
    }
}
