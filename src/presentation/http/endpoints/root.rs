use std::sync::Arc;

use poem_openapi::Tags;

use crate::{
    application::{
        handlers::delivery_manager::{DeliveryAttemptManager, RetryPolicy},
        services::{mail_transport::MailTransport, templates::TemplateRenderer},
        usecases::send_booking_email::{SendBookingEmailConfig, SendBookingEmailUseCase},
    },
    config::Config,
    domain::models::Sender,
};

#[derive(Clone)]
pub struct ApiState {
    pub send_booking_email_usecase: Arc<SendBookingEmailUseCase>,
}

impl ApiState {
    /// Wires the use cases around the process-wide transport.
    pub fn from_config(transport: Arc<dyn MailTransport>, config: &Config) -> Self {
        let policy = RetryPolicy {
            max_attempts: config.delivery.max_attempts,
            backoff_base: config.delivery.backoff_base,
            retry_on_authentication: config.delivery.retry_on_authentication,
        };

        let usecase = SendBookingEmailUseCase::new(
            DeliveryAttemptManager::new(transport, policy),
            TemplateRenderer::new(config.mail.business_name.clone()),
            SendBookingEmailConfig {
                request_timeout: config.delivery.request_timeout,
                sender: Sender {
                    name: config.mail.sender_name.clone(),
                    address: config.mail.sender_email.clone(),
                },
                reply_to: config.mail.reply_to.clone(),
            },
        );

        Self {
            send_booking_email_usecase: Arc::new(usecase),
        }
    }
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Emails,
}
