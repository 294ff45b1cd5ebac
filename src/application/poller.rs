use crate::config::PollSchedule;
use crate::domain::gateway::{GatewayStatus, StatusData};
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::session::{CheckoutSession, CheckoutStatus, Observation, Transition};
use crate::error::{PaymentError, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const PAYMENT_FAILED: &str = "Payment failed";
pub const PAYMENT_TIMEOUT: &str = "Payment timeout. Please check your phone and try again.";

/// How a poll run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The backend confirmed the payment; carries the last status payload.
    Completed(StatusData),
    Failed { message: String },
    TimedOut { message: String },
    /// The run was cancelled before reaching a terminal state.
    Cancelled,
}

impl PollOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Converts non-successful outcomes into the matching error.
    pub fn into_result(self) -> Result<StatusData> {
        match self {
            Self::Completed(data) => Ok(data),
            Self::Failed { message } => Err(PaymentError::Gateway(message)),
            Self::TimedOut { message } => Err(PaymentError::Timeout(message)),
            Self::Cancelled => Err(PaymentError::Cancelled),
        }
    }
}

/// Final state of a session together with how polling ended.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub session: CheckoutSession,
    pub outcome: PollOutcome,
}

/// Drives a pending [`CheckoutSession`] to a terminal state.
///
/// Queries are strictly sequential: the next one is only scheduled once the
/// previous answer (or error) has been recorded. Failed queries count as an
/// attempt just like a pending answer, so the budget always ends in a
/// timeout.
#[derive(Clone)]
pub struct StatusPoller {
    gateway: PaymentGatewayRef,
    schedule: PollSchedule,
}

impl StatusPoller {
    pub fn new(gateway: PaymentGatewayRef, schedule: PollSchedule) -> Self {
        Self { gateway, schedule }
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    /// Polls until the session is terminal or `cancel` fires.
    ///
    /// A cancellation observed while a query is in flight drops that query;
    /// its answer never reaches the session.
    pub async fn run(
        &self,
        session: &mut CheckoutSession,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        if session.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        if let Some(outcome) = settled(session) {
            return outcome;
        }
        session.mark_pending();

        let mut delay = self.schedule.initial_delay;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return abandon(session),
                _ = tokio::time::sleep(delay) => {}
            }

            let observation = tokio::select! {
                biased;
                _ = cancel.cancelled() => return abandon(session),
                observation = self.check(session.checkout_request_id()) => observation,
            };
            if cancel.is_cancelled() {
                return abandon(session);
            }

            match session.record(observation) {
                Transition::Retry => {
                    tracing::debug!(
                        checkout_request_id = session.checkout_request_id(),
                        attempts = session.attempts(),
                        max_attempts = session.max_attempts(),
                        "payment still pending"
                    );
                    delay = self.schedule.interval;
                }
                Transition::Completed(data) => {
                    tracing::info!(
                        checkout_request_id = session.checkout_request_id(),
                        "payment completed"
                    );
                    return PollOutcome::Completed(data);
                }
                Transition::Failed => {
                    tracing::info!(
                        checkout_request_id = session.checkout_request_id(),
                        "payment failed"
                    );
                    return PollOutcome::Failed {
                        message: PAYMENT_FAILED.to_string(),
                    };
                }
                Transition::TimedOut => {
                    tracing::warn!(
                        checkout_request_id = session.checkout_request_id(),
                        attempts = session.attempts(),
                        "payment status polling timed out"
                    );
                    return PollOutcome::TimedOut {
                        message: PAYMENT_TIMEOUT.to_string(),
                    };
                }
                Transition::Ignored => return PollOutcome::Cancelled,
            }
        }
    }

    /// Runs [`StatusPoller::run`] on its own task.
    pub fn spawn(&self, mut session: CheckoutSession) -> PollHandle {
        let cancel = CancellationToken::new();
        let checkout_request_id = session.checkout_request_id().to_string();
        let poller = self.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let outcome = poller.run(&mut session, &token).await;
            PollReport { session, outcome }
        });

        PollHandle {
            checkout_request_id,
            cancel,
            task,
        }
    }

    async fn check(&self, checkout_request_id: &str) -> Observation {
        let observation = match self.gateway.payment_status(checkout_request_id).await {
            Ok(response) if response.success => match response.data {
                Some(data) => match data.gateway_status() {
                    GatewayStatus::Completed => Observation::Completed(data),
                    GatewayStatus::Failed => Observation::Failed,
                    GatewayStatus::Pending => Observation::StillPending,
                },
                None => Observation::Transient("status response without data".to_string()),
            },
            Ok(response) => Observation::Transient(
                response
                    .message
                    .unwrap_or_else(|| "status check rejected".to_string()),
            ),
            Err(e) => Observation::Transient(e.to_string()),
        };

        if let Observation::Transient(reason) = &observation {
            tracing::warn!(checkout_request_id, %reason, "payment status check error");
        }
        observation
    }
}

/// Outcome of a session that is already terminal; such sessions are never
/// queried again. A completed session reports the payload it completed with.
fn settled(session: &CheckoutSession) -> Option<PollOutcome> {
    match session.status() {
        CheckoutStatus::Completed => session.receipt().cloned().map(PollOutcome::Completed),
        CheckoutStatus::Failed => Some(PollOutcome::Failed {
            message: PAYMENT_FAILED.to_string(),
        }),
        CheckoutStatus::Timeout => Some(PollOutcome::TimedOut {
            message: PAYMENT_TIMEOUT.to_string(),
        }),
        CheckoutStatus::Initiating | CheckoutStatus::Pending => None,
    }
}

fn abandon(session: &mut CheckoutSession) -> PollOutcome {
    session.cancel();
    tracing::debug!(
        checkout_request_id = session.checkout_request_id(),
        "payment status polling cancelled"
    );
    PollOutcome::Cancelled
}

/// Handle to a poll running on a background task.
///
/// Dropping the handle does not stop the task; call [`PollHandle::cancel`].
pub struct PollHandle {
    checkout_request_id: String,
    cancel: CancellationToken,
    task: JoinHandle<PollReport>,
}

impl PollHandle {
    pub fn checkout_request_id(&self) -> &str {
        &self.checkout_request_id
    }

    /// Stops polling. Any scheduled or in-flight query becomes a no-op.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this poll when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the poll to end.
    pub async fn join(self) -> Result<PollReport> {
        self.task
            .await
            .map_err(|e| PaymentError::Aborted(e.to_string()))
    }
}
