//! Checkout data model and the ports the adapters implement.

pub mod event;
pub mod outcome;
pub mod payment;
pub mod ports;
pub mod request;
pub mod result;
