//! The uniform result contract handed to the calling layer.

use super::outcome::{TransactionMode, TransactionOutcome};
use serde::{Deserialize, Serialize};

/// One result map per attempt.
///
/// Fields that do not apply to the outcome are absent rather than empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub is_success: bool,
    pub is_canceled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CheckoutResult {
    pub fn success(resource_path: impl Into<String>, mode: TransactionMode) -> Self {
        Self {
            is_success: true,
            is_canceled: false,
            resource_path: Some(resource_path.into()),
            transaction_type: Some(mode),
            error_code: None,
            error_message: None,
        }
    }

    pub fn canceled() -> Self {
        Self {
            is_success: false,
            is_canceled: true,
            resource_path: None,
            transaction_type: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn failed(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            is_canceled: false,
            resource_path: None,
            transaction_type: None,
            error_code: Some(error_code.into()),
            error_message: Some(error_message.into()),
        }
    }
}

/// Maps a terminal outcome onto the result contract.
///
/// Returns `None` for `Pending`, which never reaches the caller directly.
pub fn shape(outcome: TransactionOutcome) -> Option<CheckoutResult> {
    match outcome {
        TransactionOutcome::Success {
            resource_path,
            mode,
        } => Some(CheckoutResult::success(resource_path, mode)),
        TransactionOutcome::Canceled => Some(CheckoutResult::canceled()),
        TransactionOutcome::Failed {
            error_code,
            error_message,
        } => Some(CheckoutResult::failed(error_code, error_message)),
        TransactionOutcome::Pending { .. } => None,
    }
}

/// Answer to `getPaymentStatus`. The real status lives on the gateway and must
/// be checked by a server-side caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub status: String,
    pub resource_path: Option<String>,
}

pub const PENDING_SERVER_VERIFICATION: &str = "PENDING_SERVER_VERIFICATION";

impl PaymentStatus {
    pub fn pending_server_verification(resource_path: Option<String>) -> Self {
        Self {
            status: PENDING_SERVER_VERIFICATION.to_string(),
            resource_path,
        }
    }
}
