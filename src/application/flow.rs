use super::initiator::{Initiated, PaymentInitiator};
use super::poller::{PollOutcome, PollReport, StatusPoller};
use crate::config::PollSchedule;
use crate::domain::gateway::{CheckoutData, StatusData};
use crate::domain::payment::{PaymentForm, PaymentRequest};
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::session::{CheckoutSession, CheckoutStatus};
use crate::error::{PaymentError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Callbacks fired as a payment progresses. Every method defaults to a no-op.
pub trait PaymentEvents: Send + Sync {
    fn on_status(&self, _status: CheckoutStatus) {}
    /// The validated request is about to be sent to the backend.
    fn on_submitted(&self, _request: &PaymentRequest) {}
    fn on_initiated(&self, _session: &CheckoutSession, _payload: &CheckoutData) {}
    fn on_completed(&self, _payload: &StatusData) {}
    fn on_failed(&self, _message: &str) {}
    fn on_timeout(&self, _message: &str) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl PaymentEvents for NoopEvents {}

struct ActivePoll {
    generation: u64,
    cancel: CancellationToken,
    /// Taken by whoever waits for the poll to finish.
    watcher: Option<JoinHandle<Result<PollReport>>>,
}

/// One payer's checkout: initiates payments and keeps exactly one session
/// under observation.
///
/// Starting a new payment cancels the poll of the previous one. Each payment
/// gets a generation number; only the newest generation may report terminal
/// events, so a stale poll that finishes late stays silent.
pub struct PaymentFlow {
    initiator: PaymentInitiator,
    poller: StatusPoller,
    events: Arc<dyn PaymentEvents>,
    generation: Arc<AtomicU64>,
    active: Mutex<Option<ActivePoll>>,
}

impl PaymentFlow {
    pub fn new(
        gateway: PaymentGatewayRef,
        schedule: PollSchedule,
        events: Arc<dyn PaymentEvents>,
    ) -> Self {
        Self {
            initiator: PaymentInitiator::new(gateway.clone(), schedule.max_attempts),
            poller: StatusPoller::new(gateway, schedule),
            events,
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
        }
    }

    /// Validates and initiates a payment, then starts polling its status in
    /// the background. Returns the checkout request id.
    ///
    /// Fails with [`PaymentError::Cancelled`] when a newer payment or an
    /// explicit [`PaymentFlow::cancel`] overtook this one while it was being
    /// initiated; such a payment never reaches the observer.
    pub async fn pay(&self, form: &PaymentForm) -> Result<String> {
        let request = form.validate()?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_active().await;
        self.events.on_status(CheckoutStatus::Initiating);
        self.events.on_submitted(&request);

        let Initiated { session, payload } = match self.initiator.submit(&request).await {
            Ok(initiated) => initiated,
            Err(e) => {
                if self.is_current(generation) {
                    self.events.on_status(CheckoutStatus::Failed);
                    self.events.on_failed(&e.user_message());
                }
                return Err(e);
            }
        };

        // Holding the lock orders these events before those of any newer
        // payment, which has to take the lock to cancel this one.
        let mut active = self.active.lock().await;
        if !self.is_current(generation) {
            tracing::info!(
                checkout_request_id = session.checkout_request_id(),
                "payment superseded before polling started"
            );
            return Err(PaymentError::Cancelled);
        }

        let checkout_request_id = session.checkout_request_id().to_string();
        self.events.on_initiated(&session, &payload);
        self.events.on_status(session.status());

        let handle = self.poller.spawn(session);
        let cancel = handle.cancellation_token();
        let events = self.events.clone();
        let current = self.generation.clone();
        let watcher = tokio::spawn(async move {
            let report = handle.join().await?;
            if current.load(Ordering::SeqCst) == generation {
                notify(events.as_ref(), &report.outcome);
            }
            Ok::<_, PaymentError>(report)
        });

        if let Some(previous) = active.replace(ActivePoll {
            generation,
            cancel,
            watcher: Some(watcher),
        }) {
            previous.cancel.cancel();
        }

        Ok(checkout_request_id)
    }

    /// Cancels the payment currently being polled. Returns whether there was
    /// one.
    pub async fn cancel(&self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_active().await
    }

    /// Waits for the current poll to end and returns its report, or `None`
    /// when nothing is being polled.
    pub async fn wait(&self) -> Result<Option<PollReport>> {
        let (generation, watcher) = {
            let mut active = self.active.lock().await;
            let Some(entry) = active.as_mut() else {
                return Ok(None);
            };
            let Some(watcher) = entry.watcher.take() else {
                return Ok(None);
            };
            (entry.generation, watcher)
        };

        let joined = watcher.await;

        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|entry| entry.generation == generation) {
            *active = None;
        }
        drop(active);

        let report = joined.map_err(|e| PaymentError::Aborted(e.to_string()))??;
        Ok(Some(report))
    }

    /// Whether a poll is currently running.
    pub async fn is_polling(&self) -> bool {
        self.active.lock().await.as_ref().is_some_and(|entry| {
            entry
                .watcher
                .as_ref()
                .is_none_or(|watcher| !watcher.is_finished())
        })
    }

    async fn cancel_active(&self) -> bool {
        match self.active.lock().await.take() {
            Some(previous) => {
                previous.cancel.cancel();
                tracing::debug!(generation = previous.generation, "abandoned previous payment");
                true
            }
            None => false,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

impl Drop for PaymentFlow {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.cancel.cancel();
        }
    }
}

fn notify(events: &dyn PaymentEvents, outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Completed(payload) => {
            events.on_status(CheckoutStatus::Completed);
            events.on_completed(payload);
        }
        PollOutcome::Failed { message } => {
            events.on_status(CheckoutStatus::Failed);
            events.on_failed(message);
        }
        PollOutcome::TimedOut { message } => {
            events.on_status(CheckoutStatus::Timeout);
            events.on_timeout(message);
        }
        PollOutcome::Cancelled => {}
    }
}
