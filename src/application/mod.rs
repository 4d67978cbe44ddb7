//! Application layer containing the checkout correlation logic.
//!
//! `CheckoutStateMachine` owns the single pending-request slot and decides
//! which completion signal resolves it. `CheckoutBridge` runs that state
//! machine inside one tokio task, fed by a command channel for the caller and
//! an event channel for the adapters, so the slot has exactly one writer.

pub mod bridge;
pub mod redirect;
pub mod state_machine;
pub mod wallet;
