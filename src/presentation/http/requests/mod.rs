use poem_openapi::Object;

/// Booking fields sent by the booking front end. Only `email` is required
/// for delivery; ids and prices may arrive as strings or numbers.
#[derive(Object, Debug, Default)]
#[oai(rename_all = "camelCase")]
pub struct BookingDto {
    pub email: Option<String>,
    pub booking_id: Option<serde_json::Value>,
    pub customer_name: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_price: Option<serde_json::Value>,
}

#[derive(Object, Debug, Default)]
pub struct SendEmailRequestDto {
    pub booking: Option<BookingDto>,
    /// `reminder` selects the reminder email, anything else a confirmation.
    pub status: Option<String>,
}
