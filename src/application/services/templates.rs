use askama::Template;

use crate::domain::{
    errors::DomainError,
    models::{Booking, BookingStatus},
};

const NOT_PROVIDED: &str = "Not specified";

pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct BookingView {
    business_name: String,
    customer_name: String,
    booking_id: String,
    service: String,
    date: String,
    time: String,
    price: String,
}

impl BookingView {
    fn new(business_name: &str, booking: &Booking) -> Self {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(NOT_PROVIDED)
                .to_string()
        };

        Self {
            business_name: business_name.to_string(),
            customer_name: booking
                .customer_name
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or("there")
                .to_string(),
            booking_id: field(&booking.booking_id),
            service: field(&booking.service),
            date: field(&booking.date),
            time: field(&booking.time),
            price: field(&booking.service_price),
        }
    }
}

#[derive(Template)]
#[template(path = "confirmation.html")]
struct ConfirmationHtml<'a> {
    booking: &'a BookingView,
}

#[derive(Template)]
#[template(path = "confirmation.txt")]
struct ConfirmationText<'a> {
    booking: &'a BookingView,
}

#[derive(Template)]
#[template(path = "reminder.html")]
struct ReminderHtml<'a> {
    booking: &'a BookingView,
}

#[derive(Template)]
#[template(path = "reminder.txt")]
struct ReminderText<'a> {
    booking: &'a BookingView,
}

/// Renders the confirmation and reminder emails. HTML output is escaped by
/// askama, the plain-text fallback is not.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    business_name: String,
}

impl TemplateRenderer {
    pub fn new(business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
        }
    }

    pub fn render(
        &self,
        booking: &Booking,
        status: BookingStatus,
    ) -> Result<RenderedEmail, DomainError> {
        let view = BookingView::new(&self.business_name, booking);

        let (subject, html, text) = match status {
            BookingStatus::Confirmed => (
                format!("Booking confirmed: {} on {}", view.service, view.date),
                ConfirmationHtml { booking: &view }.render(),
                ConfirmationText { booking: &view }.render(),
            ),
            BookingStatus::Reminder => (
                format!("Reminder: {} on {} at {}", view.service, view.date, view.time),
                ReminderHtml { booking: &view }.render(),
                ReminderText { booking: &view }.render(),
            ),
        };

        Ok(RenderedEmail {
            subject,
            html: html.map_err(|e| DomainError::Template(e.to_string()))?,
            text: text.map_err(|e| DomainError::Template(e.to_string()))?,
        })
    }
}
