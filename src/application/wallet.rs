use super::bridge::EventSink;
use crate::domain::outcome::TransactionOutcome;
use crate::domain::payment::{PaymentMethod, PaymentToken, Submission, WalletRequest};
use crate::domain::ports::{SharedPaymentProvider, SharedWalletAuthorizer, WalletAuthorization};
use crate::domain::request::RequestId;
use tracing::{debug, info};

/// What the wallet flow keeps between presenting the sheet and submitting the
/// authorized token. Consumed by the submission; dropped if the flow stops
/// earlier.
pub struct WalletSession {
    request_id: RequestId,
    request: WalletRequest,
    shopper_result_url: Option<String>,
    provider: SharedPaymentProvider,
}

impl WalletSession {
    pub fn new(
        request_id: RequestId,
        request: WalletRequest,
        shopper_result_url: Option<String>,
        provider: SharedPaymentProvider,
    ) -> Self {
        Self {
            request_id,
            request,
            shopper_result_url,
            provider,
        }
    }

    pub fn request(&self) -> &WalletRequest {
        &self.request
    }

    /// Submits the token through the provider. Both the session and the
    /// token are spent; a retry needs a fresh authorization.
    pub async fn submit(self, token: PaymentToken) -> TransactionOutcome {
        let submission = Submission {
            checkout_id: self.request.checkout_id,
            method: PaymentMethod::Wallet {
                wallet_type: self.request.wallet_type,
                token,
            },
            shopper_result_url: self.shopper_result_url,
        };
        self.provider.submit(submission).await
    }
}

/// Drives `PresentingAuth -> {Authorized -> Submitting -> done} | canceled`.
pub(crate) async fn run_wallet_flow(
    session: WalletSession,
    authorizer: SharedWalletAuthorizer,
    sink: EventSink,
) {
    let request_id = session.request_id;
    let token = match authorizer.authorize(session.request()).await {
        WalletAuthorization::Canceled => {
            info!(%request_id, wallet = %session.request().wallet_type, "wallet sheet dismissed");
            sink.complete(request_id, TransactionOutcome::Canceled);
            return;
        }
        WalletAuthorization::Authorized(token) => token,
    };

    if !sink.authorize(request_id).await {
        debug!(%request_id, "attempt no longer waiting for this wallet, dropping token");
        authorizer.finish(false).await;
        return;
    }

    let outcome = session.submit(token).await;
    let succeeded = matches!(
        outcome,
        TransactionOutcome::Success { .. } | TransactionOutcome::Pending { .. }
    );
    authorizer.finish(succeeded).await;
    sink.complete(request_id, outcome);
}
