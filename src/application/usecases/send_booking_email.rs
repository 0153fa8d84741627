use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::{
    application::{
        handlers::delivery_manager::DeliveryAttemptManager, services::templates::TemplateRenderer,
    },
    domain::{
        errors::{DomainError, TransportError},
        models::{Booking, BookingStatus, DeliveryOutcome, Message, Sender},
        value_objects::EmailAddress,
    },
};

pub struct SendBookingEmailConfig {
    pub request_timeout: Duration,
    pub sender: Sender,
    pub reply_to: Option<String>,
}

pub struct SendBookingEmailUseCase {
    manager: DeliveryAttemptManager,
    templates: TemplateRenderer,
    config: SendBookingEmailConfig,
}

pub struct SendBookingEmailRequest {
    pub booking: Option<Booking>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub struct SendBookingEmailResponse {
    pub message_id: String,
    pub provider_response: String,
    pub recipient: String,
    pub status: BookingStatus,
}

#[derive(Debug, Error)]
pub enum SendBookingEmailError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    /// `attempts_made` is unknown when the request timeout cut the loop short.
    #[error("delivery failed: {error}")]
    Delivery {
        error: TransportError,
        attempts_made: Option<u32>,
    },
}

impl SendBookingEmailUseCase {
    pub fn new(
        manager: DeliveryAttemptManager,
        templates: TemplateRenderer,
        config: SendBookingEmailConfig,
    ) -> Self {
        Self {
            manager,
            templates,
            config,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.manager.transport_name()
    }

    pub async fn execute(
        &self,
        request: SendBookingEmailRequest,
    ) -> Result<SendBookingEmailResponse, SendBookingEmailError> {
        let booking = request
            .booking
            .ok_or_else(|| DomainError::Validation("booking details are required".to_string()))?;
        let recipient = Self::recipient(&booking)?;
        let status = BookingStatus::from_status(request.status.as_deref());

        let message = self.build_message(&booking, &recipient, status)?;

        tracing::info!(
            recipient = %recipient,
            booking_id = booking.booking_id.as_deref().unwrap_or("-"),
            status = status.as_str(),
            "sending booking email"
        );

        let outcome = timeout(
            self.config.request_timeout,
            self.manager.deliver(&message, self.manager.policy().max_attempts),
        )
        .await;

        match outcome {
            Ok(DeliveryOutcome::Success {
                provider_message_id,
                provider_response,
            }) => Ok(SendBookingEmailResponse {
                message_id: provider_message_id,
                provider_response,
                recipient: recipient.into_inner(),
                status,
            }),
            Ok(DeliveryOutcome::Failure {
                last_error,
                attempts_made,
            }) => Err(SendBookingEmailError::Delivery {
                error: last_error,
                attempts_made: Some(attempts_made),
            }),
            Err(_) => {
                tracing::error!(
                    recipient = %recipient,
                    timeout_secs = self.config.request_timeout.as_secs(),
                    "request timed out before delivery completed"
                );
                Err(SendBookingEmailError::Delivery {
                    error: TransportError::Timeout(format!(
                        "request timed out after {}s",
                        self.config.request_timeout.as_secs()
                    )),
                    attempts_made: None,
                })
            }
        }
    }

    fn recipient(booking: &Booking) -> Result<EmailAddress, DomainError> {
        let email = booking
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| DomainError::Validation("recipient email is required".to_string()))?;

        EmailAddress::parse(email)
    }

    fn build_message(
        &self,
        booking: &Booking,
        recipient: &EmailAddress,
        status: BookingStatus,
    ) -> Result<Message, DomainError> {
        let rendered = self.templates.render(booking, status)?;

        Ok(Message {
            from: self.config.sender.clone(),
            to: recipient.as_str().to_string(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
            reply_to: self.config.reply_to.clone(),
        })
    }
}
