pub mod in_memory;
pub mod smtp;

pub use in_memory::InMemoryMailTransport;
pub use smtp::{SmtpMailTransport, SmtpSettings, SmtpTls};
