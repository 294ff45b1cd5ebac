//! Application layer: the payment initiation and status polling workflow.
//!
//! `PaymentInitiator` starts a checkout, `StatusPoller` drives the resulting
//! session to a terminal state on a tokio task, and `PaymentFlow` ties the
//! two together for a single payer, keeping at most one session active.

pub mod flow;
pub mod initiator;
pub mod poller;
