use crate::error::{Field, PaymentError, Result};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Service name used when the caller does not provide one.
pub const DEFAULT_SERVICE_TYPE: &str = "AutoCare Service";

const INVALID_AMOUNT: &str = "Please enter a valid amount";
const MISSING_PHONE: &str = "Please enter your phone number";
const INVALID_PHONE: &str = "Please enter a valid Kenyan phone number";

/// Kenyan mobile numbers: optional `254`, `+254` or `0` prefix, then nine
/// digits starting with 1 or 7.
static KENYAN_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:254|\+254|0)?([17][0-9]{8})$").expect("invalid phone pattern")
});

/// A strictly positive payment amount in KES.
///
/// Wraps `rust_decimal::Decimal` so that a zero or negative amount can never
/// reach the gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Amount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::validation(Field::Amount, INVALID_AMOUNT))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for Amount {
    type Err = PaymentError;

    /// Accepts plain decimals and exponent notation such as `1e3`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let value = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| PaymentError::validation(Field::Amount, INVALID_AMOUNT))?;
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KES {}", self.0)
    }
}

/// A validated Kenyan mobile number.
///
/// The raw input is kept verbatim: the backend normalises it when it builds
/// the STK push, so we send exactly what the payer typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(PaymentError::validation(Field::PhoneNumber, MISSING_PHONE));
        }
        if !KENYAN_MOBILE.is_match(raw) {
            return Err(PaymentError::validation(Field::PhoneNumber, INVALID_PHONE));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The nine subscriber digits, without any country or trunk prefix.
    pub fn subscriber(&self) -> &str {
        KENYAN_MOBILE
            .captures(&self.0)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(&self.0)
    }

    /// Human readable form, e.g. `+254 712 345 678`.
    pub fn display(&self) -> String {
        format_for_display(&self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Groups a phone number for display. Only `254...` and `0...` inputs are
/// regrouped; everything else is returned unchanged.
fn format_for_display(phone: &str) -> String {
    if let Some(rest) = phone.strip_prefix("254") {
        group_subscriber(rest)
    } else if let Some(rest) = phone.strip_prefix('0') {
        group_subscriber(rest)
    } else {
        phone.to_string()
    }
}

fn group_subscriber(rest: &str) -> String {
    let part = |from: usize, to: usize| rest.get(from..to.min(rest.len())).unwrap_or("");
    format!(
        "+254 {} {} {}",
        part(0, 3),
        part(3, 6),
        rest.get(6..).unwrap_or("")
    )
}

/// A validated payment request. Lives only for the duration of one
/// initiation call.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub phone_number: PhoneNumber,
    pub description: String,
}

/// Raw payment input as entered by the payer.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    pub amount: String,
    pub phone_number: String,
    pub description: Option<String>,
    pub service_type: String,
}

impl PaymentForm {
    pub fn new(amount: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            phone_number: phone_number.into(),
            description: None,
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    /// Validates the form. Amount is checked before the phone number and
    /// the first failure is returned.
    pub fn validate(&self) -> Result<PaymentRequest> {
        let amount = self.amount.parse::<Amount>()?;
        let phone_number = PhoneNumber::parse(&self.phone_number)?;

        let description = match self.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("{} Payment", self.service_type),
        };

        Ok(PaymentRequest {
            amount,
            phone_number,
            description,
        })
    }
}
