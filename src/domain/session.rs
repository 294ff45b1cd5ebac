use super::gateway::StatusData;
use std::fmt;

/// Attempt budget used by the hosted checkout (5 minutes at 10 second steps).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStatus {
    Initiating,
    Pending,
    Completed,
    Failed,
    Timeout,
}

impl CheckoutStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiating => "initiating",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one status query told us.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Completed(StatusData),
    Failed,
    /// The backend answered with a non-terminal status.
    StillPending,
    /// The query failed or the answer was unusable.
    Transient(String),
}

/// Result of applying an [`Observation`] to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Session is still pending, schedule another query.
    Retry,
    Completed(StatusData),
    Failed,
    TimedOut,
    /// Session was already terminal or cancelled; nothing changed.
    Ignored,
}

/// Lifecycle of one payment attempt, keyed by the gateway's correlation id.
///
/// The session is an explicit state machine: `attempts` only moves on
/// non-terminal observations and is capped by `max_attempts`, after which
/// the session times out.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    checkout_request_id: String,
    status: CheckoutStatus,
    attempts: u32,
    max_attempts: u32,
    cancelled: bool,
    receipt: Option<StatusData>,
}

impl CheckoutSession {
    /// Creates a session in `Initiating` for a freshly issued correlation id.
    pub fn new(checkout_request_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            checkout_request_id: checkout_request_id.into(),
            status: CheckoutStatus::Initiating,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            cancelled: false,
            receipt: None,
        }
    }

    pub fn checkout_request_id(&self) -> &str {
        &self.checkout_request_id
    }

    pub fn status(&self) -> CheckoutStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The status payload that completed the session.
    pub fn receipt(&self) -> Option<&StatusData> {
        self.receipt.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True while the poller still has work to do for this session.
    pub fn is_active(&self) -> bool {
        !self.cancelled && !self.status.is_terminal()
    }

    /// `Initiating -> Pending`. Any other state is left alone.
    pub fn mark_pending(&mut self) {
        if self.status == CheckoutStatus::Initiating && !self.cancelled {
            self.status = CheckoutStatus::Pending;
        }
    }

    /// Stops the session. Later observations are ignored.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn record(&mut self, observation: Observation) -> Transition {
        if !self.is_active() {
            return Transition::Ignored;
        }

        match observation {
            Observation::Completed(payload) => {
                self.status = CheckoutStatus::Completed;
                self.receipt = Some(payload.clone());
                Transition::Completed(payload)
            }
            Observation::Failed => {
                self.status = CheckoutStatus::Failed;
                Transition::Failed
            }
            Observation::StillPending | Observation::Transient(_) => {
                self.attempts += 1;
                if self.attempts >= self.max_attempts {
                    self.status = CheckoutStatus::Timeout;
                    Transition::TimedOut
                } else {
                    Transition::Retry
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_session(max_attempts: u32) -> CheckoutSession {
        let mut session = CheckoutSession::new("ws_CO_1", max_attempts);
        session.mark_pending();
        session
    }

    #[test]
    fn test_new_session_is_initiating() {
        let session = CheckoutSession::new("abc", DEFAULT_MAX_ATTEMPTS);
        assert_eq!(session.status(), CheckoutStatus::Initiating);
        assert_eq!(session.attempts(), 0);
        assert!(session.is_active());
    }

    #[test]
    fn test_pending_until_budget_exhausted() {
        let mut session = pending_session(3);
        assert_eq!(session.record(Observation::StillPending), Transition::Retry);
        assert_eq!(
            session.record(Observation::Transient("boom".into())),
            Transition::Retry
        );
        assert_eq!(session.record(Observation::StillPending), Transition::TimedOut);
        assert_eq!(session.status(), CheckoutStatus::Timeout);
        assert_eq!(session.attempts(), 3);

        // Terminal: nothing moves any more.
        assert_eq!(session.record(Observation::StillPending), Transition::Ignored);
        assert_eq!(session.attempts(), 3);
    }

    #[test]
    fn test_failed_does_not_count_attempt() {
        let mut session = pending_session(30);
        assert_eq!(session.record(Observation::Failed), Transition::Failed);
        assert_eq!(session.status(), CheckoutStatus::Failed);
        assert_eq!(session.attempts(), 0);
    }

    #[test]
    fn test_completed_is_final() {
        let mut session = pending_session(30);
        session.record(Observation::StillPending);
        let payload = StatusData::new("completed");
        assert_eq!(
            session.record(Observation::Completed(payload.clone())),
            Transition::Completed(payload)
        );
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.receipt(), Some(&StatusData::new("completed")));
        assert_eq!(session.record(Observation::Failed), Transition::Ignored);
        assert_eq!(session.status(), CheckoutStatus::Completed);
    }

    #[test]
    fn test_cancelled_session_ignores_observations() {
        let mut session = pending_session(30);
        session.cancel();
        assert_eq!(
            session.record(Observation::Completed(StatusData::new("completed"))),
            Transition::Ignored
        );
        assert_eq!(session.status(), CheckoutStatus::Pending);
        assert!(session.is_cancelled());
        assert!(!session.is_active());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!CheckoutStatus::Initiating.is_terminal());
        assert!(!CheckoutStatus::Pending.is_terminal());
        assert!(CheckoutStatus::Completed.is_terminal());
        assert!(CheckoutStatus::Failed.is_terminal());
        assert!(CheckoutStatus::Timeout.is_terminal());
    }
}
