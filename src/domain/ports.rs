use super::gateway::{ApiResponse, CheckoutData, StatusData};
use super::payment::PaymentRequest;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Backend payment endpoints.
///
/// `Err` means the call itself failed (transport, non-2xx, unparseable body);
/// an `Ok` envelope may still report `success: false`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate_payment(&self, request: &PaymentRequest) -> Result<ApiResponse<CheckoutData>>;
    async fn payment_status(&self, checkout_request_id: &str) -> Result<ApiResponse<StatusData>>;
}

pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
