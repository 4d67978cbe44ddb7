use super::outcome::{HostedCheckoutReport, TransactionOutcome};
use super::payment::{CheckoutSettings, PaymentToken, Submission, WalletRequest, WalletType};
use crate::config::ProviderMode;
use async_trait::async_trait;
use std::sync::Arc;

/// Facade over the payment provider SDK.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Submits one transaction and reports exactly one outcome.
    ///
    /// Asynchronous transactions come back as `Pending`; their completion is
    /// signalled through redirect re-entry, not through this call. Failures
    /// keep the provider's native code. Never retried.
    async fn submit(&self, submission: Submission) -> TransactionOutcome;
}

/// Provider-rendered checkout form.
#[async_trait]
pub trait HostedCheckoutSurface: Send + Sync {
    /// Presents the form and reports how the shopper left it.
    async fn present(&self, settings: CheckoutSettings) -> HostedCheckoutReport;
    /// Closes the form after an asynchronous payment re-entered the app.
    async fn dismiss(&self);
}

/// Result of showing the platform wallet sheet.
#[derive(Debug)]
pub enum WalletAuthorization {
    Canceled,
    Authorized(PaymentToken),
}

/// Facade over the platform wallet authorization UI.
#[async_trait]
pub trait WalletAuthorizer: Send + Sync {
    fn supports(&self, wallet: WalletType) -> bool;
    async fn authorize(&self, request: &WalletRequest) -> WalletAuthorization;
    /// Tells the sheet whether the authorized payment went through.
    async fn finish(&self, succeeded: bool);
}

/// External browser / web view the shopper completes async payments in.
#[async_trait]
pub trait RedirectSurface: Send + Sync {
    async fn present(&self, url: &str);
    async fn dismiss(&self);
}

pub type SharedPaymentProvider = Arc<dyn PaymentProvider>;
pub type SharedHostedCheckout = Arc<dyn HostedCheckoutSurface>;
pub type SharedWalletAuthorizer = Arc<dyn WalletAuthorizer>;
pub type SharedRedirectSurface = Arc<dyn RedirectSurface>;

/// Builds the provider for the mode chosen in `setup`.
pub type ProviderFactory = Box<dyn Fn(ProviderMode) -> SharedPaymentProvider + Send + Sync>;
