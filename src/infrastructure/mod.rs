//! Adapters implementing the payment gateway port.

pub mod http;
pub mod in_memory;
