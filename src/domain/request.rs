use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The flow an attempt was started through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Provider-rendered payment form.
    HostedCheckout,
    /// Card fields collected by the caller's own form.
    CustomCard,
    /// Platform wallet sheet (Apple Pay / Google Pay).
    WalletPay,
}

/// The single in-flight correlation record.
///
/// Only the state machine creates, mutates and clears it. Adapters see the
/// `id` alone and tag their events with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    /// Scheme a redirect re-entry URL must carry to resolve this attempt.
    pub redirect_scheme: Option<String>,
    /// Set once the provider reported an asynchronous transaction.
    pub awaiting_redirect: bool,
}

impl PendingRequest {
    pub fn new(id: RequestId, kind: RequestKind, redirect_scheme: Option<String>) -> Self {
        Self {
            id,
            kind,
            redirect_scheme,
            awaiting_redirect: false,
        }
    }

    /// Case-insensitive comparison against the registered scheme.
    pub fn matches_scheme(&self, scheme: &str) -> bool {
        self.redirect_scheme
            .as_deref()
            .is_some_and(|registered| registered.eq_ignore_ascii_case(scheme))
    }
}
