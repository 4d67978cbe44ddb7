use super::outcome::TransactionOutcome;
use super::request::RequestId;

/// Every completion signal the state machine consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// An adapter finished its part of the attempt.
    AdapterCompleted {
        request_id: RequestId,
        outcome: TransactionOutcome,
    },
    /// The shopper authorized the wallet sheet; the token is about to be submitted.
    WalletAuthorized { request_id: RequestId },
    /// The app was re-entered through a URL carrying this scheme.
    RedirectReentry { scheme: String },
    UserCancel,
    /// The owning UI surface went away.
    Abandon,
}
