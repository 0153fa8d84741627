
#[derive(Debug, Clone, Default)]
pub struct Booking {
    pub email: Option<String>,
    pub booking_id: Option<String>,
    pub customer_name: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub service_price: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Reminder,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Reminder => "reminder",
        }
    }

    /// Anything other than `reminder` is treated as a confirmation.
    pub fn from_status(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(status) if status.eq_ignore_ascii_case("reminder") => BookingStatus::Reminder,
            _ => BookingStatus::Confirmed,
        }
    }
}
