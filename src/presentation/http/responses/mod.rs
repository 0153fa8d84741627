use chrono::Utc;
use poem_openapi::{ApiResponse, Object, payload::Json};

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct EmailResultDto {
    pub success: bool,
    #[oai(skip_serializing_if_is_none)]
    pub message_id: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub recipient: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub error: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub code: Option<String>,
    pub timestamp: String,
}

impl EmailResultDto {
    pub fn sent(message_id: String, recipient: String) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            recipient: Some(recipient),
            error: None,
            code: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn failed(error: impl Into<String>, code: &str) -> Self {
        Self {
            success: false,
            message_id: None,
            recipient: None,
            error: Some(error.into()),
            code: Some(code.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(ApiResponse)]
#[oai(bad_request_handler = "bad_request_handler")]
pub enum SendEmailResponse {
    /// The relay accepted the message.
    #[oai(status = 200)]
    Sent(Json<EmailResultDto>),
    /// The payload was malformed or missing the recipient.
    #[oai(status = 400)]
    BadRequest(Json<EmailResultDto>),
    /// Delivery failed after all attempts.
    #[oai(status = 500)]
    Failed(Json<EmailResultDto>),
    /// The relay or the request timed out.
    #[oai(status = 504)]
    TimedOut(Json<EmailResultDto>),
}

fn bad_request_handler(err: poem::Error) -> SendEmailResponse {
    SendEmailResponse::BadRequest(Json(EmailResultDto::failed(
        err.to_string(),
        "EVALIDATION",
    )))
}

#[derive(Object, Debug)]
pub struct HealthDto {
    pub status: String,
    pub service: String,
    pub version: String,
    pub transport: String,
    pub timestamp: String,
}
