use std::fmt;
use thiserror::Error;

/// Form field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    PhoneNumber,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Amount => f.write_str("amount"),
            Field::PhoneNumber => f.write_str("phoneNumber"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("{message}")]
    Validation { field: Field, message: String },
    #[error("Gateway error: {0}")]
    Gateway(String),
    #[error("Status check failed: {0}")]
    Transient(String),
    #[error("{0}")]
    Timeout(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Payment cancelled")]
    Cancelled,
    #[error("Poll task aborted: {0}")]
    Aborted(String),
}

impl PaymentError {
    pub fn validation(field: Field, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Message suitable for showing to the payer as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Gateway(message) | Self::Timeout(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
