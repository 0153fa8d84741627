pub mod error_classifier;
pub mod mail_transport;
pub mod templates;
