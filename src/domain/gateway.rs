use super::payment::{Amount, PaymentRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope every backend endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Body of `POST /daraja/initiate-payment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentBody<'a> {
    pub amount: Amount,
    pub phone_number: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a PaymentRequest> for InitiatePaymentBody<'a> {
    fn from(request: &'a PaymentRequest) -> Self {
        Self {
            amount: request.amount,
            phone_number: request.phone_number.as_str(),
            description: &request.description,
        }
    }
}

/// `data` of a successful initiation. Fields beyond the correlation id are
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutData {
    #[serde(rename = "checkoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CheckoutData {
    pub fn new(checkout_request_id: impl Into<String>) -> Self {
        Self {
            checkout_request_id: Some(checkout_request_id.into()),
            extra: Map::new(),
        }
    }
}

/// Status the backend reports for a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Completed,
    Failed,
    /// Anything else, including `"pending"`.
    Pending,
}

/// `data` of a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusData {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn gateway_status(&self) -> GatewayStatus {
        match self.status.as_str() {
            "completed" => GatewayStatus::Completed,
            "failed" => GatewayStatus::Failed,
            _ => GatewayStatus::Pending,
        }
    }
}
