use std::fmt;
use std::str::FromStr;

use lettre::Address;

use crate::domain::errors::DomainError;

/// A syntactically valid, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        Address::from_str(trimmed)
            .map(|_| EmailAddress(trimmed.to_string()))
            .map_err(|_| DomainError::InvalidAddress(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
