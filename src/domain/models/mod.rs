pub mod booking;
pub mod delivery;
pub mod message;

pub use booking::{Booking, BookingStatus};
pub use delivery::{DeliveryOutcome, DeliveryReceipt};
pub use message::{Message, Sender};
