use std::sync::Arc;

use poem_openapi::{OpenApi, payload::Json};

use crate::{
    application::usecases::send_booking_email::SendBookingEmailError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_failure, map_request, map_sent},
        requests::SendEmailRequestDto,
        responses::SendEmailResponse,
    },
};

#[derive(Clone)]
pub struct EmailEndpoints {
    state: Arc<ApiState>,
}

impl EmailEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl EmailEndpoints {
    /// Sends a booking confirmation or reminder email.
    #[oai(path = "/send-email", method = "post", tag = EndpointsTags::Emails)]
    pub async fn send_email(&self, request: Json<SendEmailRequestDto>) -> SendEmailResponse {
        let result = self
            .state
            .send_booking_email_usecase
            .execute(map_request(request.0))
            .await;

        match result {
            Ok(response) => map_sent(response),
            Err(err) => {
                match &err {
                    SendBookingEmailError::Invalid(reason) => {
                        tracing::warn!(reason = %reason, "rejected send-email request");
                    }
                    SendBookingEmailError::Delivery {
                        error,
                        attempts_made,
                    } => {
                        tracing::error!(
                            error = %error,
                            attempts_made = ?attempts_made,
                            "failed to send booking email"
                        );
                    }
                }
                map_failure(&err)
            }
        }
    }
}
