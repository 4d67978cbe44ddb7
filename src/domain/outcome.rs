use serde::{Deserialize, Serialize};

/// How the provider completed a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    Sync,
    Async,
}

/// What an adapter reports back for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success {
        resource_path: String,
        mode: TransactionMode,
    },
    Canceled,
    /// Provider rejection, code and message passed through verbatim.
    Failed {
        error_code: String,
        error_message: String,
    },
    /// Asynchronous transaction: the shopper must complete it on a redirect
    /// surface and the app is re-entered through the registered scheme.
    Pending {
        resource_path: String,
        redirect_url: Option<String>,
    },
}

impl TransactionOutcome {
    pub fn sync(resource_path: impl Into<String>) -> Self {
        TransactionOutcome::Success {
            resource_path: resource_path.into(),
            mode: TransactionMode::Sync,
        }
    }

    pub fn failed(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        TransactionOutcome::Failed {
            error_code: error_code.into(),
            error_message: error_message.into(),
        }
    }

    pub fn pending(resource_path: impl Into<String>, redirect_url: Option<String>) -> Self {
        TransactionOutcome::Pending {
            resource_path: resource_path.into(),
            redirect_url,
        }
    }
}

/// Raw answer of a hosted checkout form, before it is classified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostedCheckoutReport {
    pub canceled: bool,
    pub error: Option<(String, String)>,
    pub resource_path: Option<String>,
    pub mode: Option<TransactionMode>,
    pub redirect_url: Option<String>,
}

pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN";

impl From<HostedCheckoutReport> for TransactionOutcome {
    /// Cancel wins over an error, an error over a resource path. A report
    /// with none of them is an unknown failure.
    fn from(report: HostedCheckoutReport) -> Self {
        if report.canceled {
            return TransactionOutcome::Canceled;
        }
        if let Some((code, message)) = report.error {
            return TransactionOutcome::failed(code, message);
        }
        match (report.resource_path, report.mode) {
            (Some(resource_path), Some(TransactionMode::Async)) => {
                TransactionOutcome::pending(resource_path, report.redirect_url)
            }
            (Some(resource_path), _) => TransactionOutcome::sync(resource_path),
            (None, _) => TransactionOutcome::failed(UNKNOWN_ERROR_CODE, "Unknown checkout result"),
        }
    }
}

impl From<TransactionOutcome> for HostedCheckoutReport {
    fn from(outcome: TransactionOutcome) -> Self {
        match outcome {
            TransactionOutcome::Success {
                resource_path,
                mode,
            } => Self {
                resource_path: Some(resource_path),
                mode: Some(mode),
                ..Default::default()
            },
            TransactionOutcome::Canceled => Self {
                canceled: true,
                ..Default::default()
            },
            TransactionOutcome::Failed {
                error_code,
                error_message,
            } => Self {
                error: Some((error_code, error_message)),
                ..Default::default()
            },
            TransactionOutcome::Pending {
                resource_path,
                redirect_url,
            } => Self {
                resource_path: Some(resource_path),
                mode: Some(TransactionMode::Async),
                redirect_url,
                ..Default::default()
            },
        }
    }
}
