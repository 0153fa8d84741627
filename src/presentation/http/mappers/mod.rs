use poem_openapi::payload::Json;

use crate::{
    application::{
        services::error_classifier::{STATUS_GATEWAY_TIMEOUT, classify},
        usecases::send_booking_email::{
            SendBookingEmailError, SendBookingEmailRequest, SendBookingEmailResponse,
        },
    },
    domain::{errors::DomainError, models::Booking},
    presentation::http::{
        requests::{BookingDto, SendEmailRequestDto},
        responses::{EmailResultDto, SendEmailResponse},
    },
};

pub fn map_request(request: SendEmailRequestDto) -> SendBookingEmailRequest {
    SendBookingEmailRequest {
        booking: request.booking.map(map_booking),
        status: request.status,
    }
}

fn map_booking(booking: BookingDto) -> Booking {
    Booking {
        email: booking.email,
        booking_id: booking.booking_id.as_ref().and_then(json_to_text),
        customer_name: booking.customer_name,
        service: booking.service,
        date: booking.date,
        time: booking.time,
        service_price: booking.service_price.as_ref().and_then(price_to_text),
    }
}

fn json_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn price_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(number) => number.as_f64().map(|price| format!("{price:.2}")),
        other => json_to_text(other),
    }
}

pub fn map_sent(response: SendBookingEmailResponse) -> SendEmailResponse {
    SendEmailResponse::Sent(Json(EmailResultDto::sent(
        response.message_id,
        response.recipient,
    )))
}

pub fn map_failure(error: &SendBookingEmailError) -> SendEmailResponse {
    match error {
        SendBookingEmailError::Invalid(err) => {
            let message = match err {
                DomainError::InvalidAddress(_) => "invalid recipient email address".to_string(),
                other => other.to_string(),
            };
            SendEmailResponse::BadRequest(Json(EmailResultDto::failed(message, "EVALIDATION")))
        }
        SendBookingEmailError::Delivery { error, .. } => {
            let failure = classify(error);
            let body = Json(EmailResultDto::failed(failure.message, failure.code));
            if failure.status == STATUS_GATEWAY_TIMEOUT {
                SendEmailResponse::TimedOut(body)
            } else {
                SendEmailResponse::Failed(body)
            }
        }
    }
}
