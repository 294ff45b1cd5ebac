use crate::domain::gateway::CheckoutData;
use crate::domain::payment::{PaymentForm, PaymentRequest};
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::session::CheckoutSession;
use crate::error::{PaymentError, Result};

pub const GENERIC_FAILURE: &str = "Payment processing failed. Please try again.";
pub const DEFAULT_REJECTION: &str = "Payment failed";

/// A session the backend accepted, together with the initiation payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Initiated {
    pub session: CheckoutSession,
    pub payload: CheckoutData,
}

/// Validates payment input and asks the backend to start an STK push.
///
/// Nothing is retried here: a rejected or failed initiation ends the
/// attempt and the payer has to submit again.
pub struct PaymentInitiator {
    gateway: PaymentGatewayRef,
    max_attempts: u32,
}

impl PaymentInitiator {
    /// Creates a new `PaymentInitiator`.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The backend used to start payments.
    /// * `max_attempts` - Poll budget given to every new session.
    pub fn new(gateway: PaymentGatewayRef, max_attempts: u32) -> Self {
        Self {
            gateway,
            max_attempts,
        }
    }

    /// Validates `form` and submits it.
    ///
    /// Validation errors return before any network call. On success the
    /// returned session is already `Pending`.
    pub async fn initiate(&self, form: &PaymentForm) -> Result<Initiated> {
        let request = form.validate()?;
        self.submit(&request).await
    }

    /// Submits an already validated request.
    pub async fn submit(&self, request: &PaymentRequest) -> Result<Initiated> {
        let response = match self.gateway.initiate_payment(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "payment initiation failed");
                return Err(PaymentError::Gateway(GENERIC_FAILURE.to_string()));
            }
        };

        if !response.success {
            let message = response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
            tracing::info!(%message, "payment rejected by gateway");
            return Err(PaymentError::Gateway(message));
        }

        let Some(payload) = response.data else {
            tracing::warn!("gateway accepted payment without data");
            return Err(PaymentError::Gateway(GENERIC_FAILURE.to_string()));
        };
        let Some(checkout_request_id) = payload
            .checkout_request_id
            .clone()
            .filter(|id| !id.is_empty())
        else {
            tracing::warn!("gateway accepted payment without a checkout id");
            return Err(PaymentError::Gateway(GENERIC_FAILURE.to_string()));
        };

        let mut session = CheckoutSession::new(checkout_request_id, self.max_attempts);
        session.mark_pending();
        tracing::info!(
            checkout_request_id = session.checkout_request_id(),
            amount = %request.amount,
            "payment initiated, awaiting confirmation"
        );

        Ok(Initiated { session, payload })
    }
}
