use crate::application::flow::PaymentEvents;
use crate::domain::gateway::{CheckoutData, StatusData};
use crate::domain::payment::PaymentRequest;
use crate::domain::presentation::StatusView;
use crate::domain::session::{CheckoutSession, CheckoutStatus};
use std::io::{self, Write};
use std::sync::Mutex;

pub const INITIATED_MESSAGE: &str =
    "Payment initiated! Please check your phone for the M-Pesa prompt.";

/// Writes payment progress as plain text lines.
///
/// Events may arrive from the poll task, so the sink is behind a mutex.
/// Write errors are logged and otherwise ignored: losing a progress line
/// must not abort the payment.
pub struct ConsoleReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(out, "{}", line))
            .and_then(|_| out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write payment progress");
        }
    }
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> PaymentEvents for ConsoleReporter<W> {
    fn on_status(&self, status: CheckoutStatus) {
        let view = StatusView::for_status(Some(status));
        let mut lines = vec![format!(
            "[{}] {}",
            view.badge.unwrap_or("-"),
            view.headline
        )];
        if let Some(detail) = view.detail {
            lines.push(format!("    {}", detail));
        }
        self.write_lines(&lines);
    }

    fn on_submitted(&self, request: &PaymentRequest) {
        self.write_lines(&[
            format!("Amount: {}", request.amount),
            format!("Phone: {}", request.phone_number.display()),
        ]);
    }

    fn on_initiated(&self, session: &CheckoutSession, _payload: &CheckoutData) {
        self.write_lines(&[
            INITIATED_MESSAGE.to_string(),
            format!("Transaction ID: {}", session.checkout_request_id()),
        ]);
    }

    fn on_completed(&self, payload: &StatusData) {
        if payload.extra.is_empty() {
            return;
        }
        match serde_json::to_string(&payload.extra) {
            Ok(details) => self.write_lines(&[format!("Details: {}", details)]),
            Err(e) => tracing::warn!(error = %e, "failed to render payment details"),
        }
    }

    fn on_failed(&self, message: &str) {
        self.write_lines(&[format!("Error: {}", message)]);
    }

    fn on_timeout(&self, message: &str) {
        self.write_lines(&[format!("Error: {}", message)]);
    }
}
