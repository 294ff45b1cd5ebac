//! Domain types for the M-Pesa checkout: validated requests, the checkout
//! session state machine, the backend wire format and the gateway port.

pub mod gateway;
pub mod payment;
pub mod ports;
pub mod presentation;
pub mod session;
