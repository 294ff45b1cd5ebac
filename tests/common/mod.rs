#![allow(dead_code)]

use autocare_pay::application::flow::PaymentEvents;
use autocare_pay::application::poller::StatusPoller;
use autocare_pay::config::PollSchedule;
use autocare_pay::domain::gateway::{CheckoutData, StatusData};
use autocare_pay::domain::session::{CheckoutSession, CheckoutStatus};
use autocare_pay::infrastructure::in_memory::ScriptedGateway;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEN_SECONDS: Duration = Duration::from_secs(10);

pub fn default_poller(gateway: &ScriptedGateway) -> StatusPoller {
    StatusPoller::new(Arc::new(gateway.clone()), PollSchedule::default())
}

pub fn pending_session(id: &str) -> CheckoutSession {
    let mut session = CheckoutSession::new(id, PollSchedule::default().max_attempts);
    session.mark_pending();
    session
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Status(CheckoutStatus),
    Initiated(String),
    Completed(StatusData),
    Failed(String),
    Timeout(String),
}

/// Collects every event in the order it was fired.
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<Event>>,
}

impl RecordingEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl PaymentEvents for RecordingEvents {
    fn on_status(&self, status: CheckoutStatus) {
        self.push(Event::Status(status));
    }

    fn on_initiated(&self, session: &CheckoutSession, _payload: &CheckoutData) {
        self.push(Event::Initiated(session.checkout_request_id().to_string()));
    }

    fn on_completed(&self, payload: &StatusData) {
        self.push(Event::Completed(payload.clone()));
    }

    fn on_failed(&self, message: &str) {
        self.push(Event::Failed(message.to_string()));
    }

    fn on_timeout(&self, message: &str) {
        self.push(Event::Timeout(message.to_string()));
    }
}
