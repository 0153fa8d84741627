pub mod send_booking_email;
