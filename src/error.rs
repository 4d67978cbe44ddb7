use crate::domain::request::RequestId;
use thiserror::Error;

/// Failures surfaced synchronously by the command surface.
///
/// Provider-side failures are not represented here: they are delivered through
/// the result contract with the provider's own code and message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Call setup() before making payments")]
    NotInitialized,
    #[error("{0}")]
    InvalidArgs(String),
    #[error("No active UI surface to present the checkout on")]
    NoActiveSurface,
    #[error("Checkout attempt {0} is still pending")]
    AlreadyPending(RequestId),
    #[error("{0}")]
    Unsupported(String),
    #[error("Checkout bridge is no longer running")]
    BridgeClosed,
}

impl BridgeError {
    /// Stable error code handed to the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::NotInitialized => "NOT_INITIALIZED",
            BridgeError::InvalidArgs(_) => "INVALID_ARGS",
            BridgeError::NoActiveSurface => "NO_ACTIVE_SURFACE",
            BridgeError::AlreadyPending(_) => "ALREADY_PENDING",
            BridgeError::Unsupported(_) => "UNSUPPORTED",
            BridgeError::BridgeClosed => "BRIDGE_CLOSED",
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        BridgeError::InvalidArgs(format!("{field} is required"))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
