#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

/// A fully rendered email, built fresh for every request and never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: Sender,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
}
