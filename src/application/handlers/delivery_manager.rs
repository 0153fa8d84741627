use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::{
    application::services::mail_transport::MailTransport,
    domain::{
        errors::TransportError,
        models::{DeliveryOutcome, Message},
    },
};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    /// When false, an authentication failure ends the attempt loop immediately.
    pub retry_on_authentication: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            retry_on_authentication: true,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given 1-indexed attempt: `backoff_base * 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(multiplier)
    }

    pub fn should_retry(&self, error: &TransportError) -> bool {
        self.retry_on_authentication || !error.is_authentication()
    }
}

/// Drives a bounded number of delivery attempts against the shared transport.
pub struct DeliveryAttemptManager {
    transport: Arc<dyn MailTransport>,
    policy: RetryPolicy,
}

impl DeliveryAttemptManager {
    pub fn new(transport: Arc<dyn MailTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Sends `message`, retrying every failure until `max_attempts` is
    /// reached. A `max_attempts` of zero is treated as one.
    pub async fn deliver(&self, message: &Message, max_attempts: u32) -> DeliveryOutcome {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            tracing::info!(
                attempt,
                max_attempts,
                recipient = %message.to,
                transport = self.transport.name(),
                "attempting email delivery"
            );

            let error = match self.transport.send(message).await {
                Ok(receipt) => {
                    tracing::info!(
                        attempt,
                        max_attempts,
                        message_id = %receipt.provider_message_id,
                        "email delivered"
                    );
                    return receipt.into();
                }
                Err(error) => error,
            };

            if attempt >= max_attempts || !self.policy.should_retry(&error) {
                tracing::error!(
                    attempt,
                    max_attempts,
                    error = %error,
                    "email delivery failed, giving up"
                );
                return DeliveryOutcome::Failure {
                    last_error: error,
                    attempts_made: attempt,
                };
            }

            let delay = self.policy.backoff_delay(attempt);
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                transient = error.is_transient_network(),
                error = %error,
                "email delivery attempt failed, retrying"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
