use crate::config::{ProviderMode, StorePaymentDetails};
use crate::domain::outcome::{HostedCheckoutReport, TransactionOutcome};
use crate::domain::payment::{
    CheckoutSettings, PaymentMethod, PaymentToken, Submission, WalletRequest, WalletType,
};
use crate::domain::ports::{
    HostedCheckoutSurface, PaymentProvider, ProviderFactory, RedirectSurface, SharedPaymentProvider,
    WalletAuthorization, WalletAuthorizer,
};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, oneshot};

/// How a scripted adapter answers its next call.
#[derive(Debug)]
pub enum Script<T> {
    Respond(T),
    /// Wait for the paired sender; never answer if it is dropped.
    Deferred(oneshot::Receiver<T>),
    /// Never answer.
    Hang,
}

impl<T> Script<T> {
    async fn play(self) -> T {
        match self {
            Script::Respond(value) => value,
            Script::Deferred(rx) => match rx.await {
                Ok(value) => value,
                Err(_) => std::future::pending().await,
            },
            Script::Hang => std::future::pending().await,
        }
    }
}

/// A queue of scripted answers shared between clones.
#[derive(Debug)]
struct ScriptQueue<T> {
    scripts: Arc<Mutex<VecDeque<Script<T>>>>,
}

impl<T> Clone for ScriptQueue<T> {
    fn clone(&self) -> Self {
        Self {
            scripts: Arc::clone(&self.scripts),
        }
    }
}

impl<T> Default for ScriptQueue<T> {
    fn default() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<T> ScriptQueue<T> {
    async fn push(&self, script: Script<T>) {
        self.scripts.lock().await.push_back(script);
    }

    async fn defer(&self) -> oneshot::Sender<T> {
        let (tx, rx) = oneshot::channel();
        self.push(Script::Deferred(rx)).await;
        tx
    }

    async fn next(&self) -> Option<Script<T>> {
        self.scripts.lock().await.pop_front()
    }

    async fn retract_last(&self) -> Option<Script<T>> {
        self.scripts.lock().await.pop_back()
    }
}

/// What the scripted provider saw, with the card data left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub mode: ProviderMode,
    pub checkout_id: String,
    pub brand: String,
    pub shopper_result_url: Option<String>,
    pub tokenize: bool,
    pub wallet_token: Option<Vec<u8>>,
}

pub const SCRIPT_EXHAUSTED: &str = "SCRIPT_EXHAUSTED";

/// In-process stand-in for the payment provider SDK.
///
/// Answers submissions from a script queue and records every submission.
/// Clones share the queue and the record.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    mode: ProviderMode,
    outcomes: ScriptQueue<TransactionOutcome>,
    submitted: Arc<Mutex<Vec<SubmittedTransaction>>>,
    created: Arc<std::sync::Mutex<Vec<ProviderMode>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn respond(&self, outcome: TransactionOutcome) {
        self.outcomes.push(Script::Respond(outcome)).await;
    }

    /// Queues an answer the caller completes later through the returned sender.
    pub async fn defer(&self) -> oneshot::Sender<TransactionOutcome> {
        self.outcomes.defer().await
    }

    pub async fn hang(&self) {
        self.outcomes.push(Script::Hang).await;
    }

    /// Drops the most recently queued answer, if it is still unplayed.
    pub async fn retract_last(&self) -> bool {
        self.outcomes.retract_last().await.is_some()
    }

    pub async fn submitted(&self) -> Vec<SubmittedTransaction> {
        self.submitted.lock().await.clone()
    }

    /// Modes the factory built providers for, in order.
    pub fn created_modes(&self) -> Vec<ProviderMode> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Factory that hands out clones of this provider bound to the given mode.
    pub fn factory(&self) -> ProviderFactory {
        let template = self.clone();
        Box::new(move |mode| {
            let provider = ScriptedProvider {
                mode,
                ..template.clone()
            };
            provider
                .created
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(mode);
            Arc::new(provider) as SharedPaymentProvider
        })
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn submit(&self, submission: Submission) -> TransactionOutcome {
        let brand = submission.brand().to_string();
        let (tokenize, wallet_token) = match &submission.method {
            PaymentMethod::Card(card) => (card.tokenize, None),
            PaymentMethod::Wallet { token, .. } => (false, Some(token.as_bytes().to_vec())),
        };
        self.submitted.lock().await.push(SubmittedTransaction {
            mode: self.mode,
            checkout_id: submission.checkout_id,
            brand,
            shopper_result_url: submission.shopper_result_url,
            tokenize,
            wallet_token,
        });

        match self.outcomes.next().await {
            Some(script) => script.play().await,
            None => TransactionOutcome::failed(SCRIPT_EXHAUSTED, "no scripted provider outcome"),
        }
    }
}

/// In-process stand-in for the provider's hosted checkout form.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHostedCheckout {
    reports: ScriptQueue<HostedCheckoutReport>,
    presented: Arc<Mutex<Vec<CheckoutSettings>>>,
    dismissed: Arc<Mutex<usize>>,
}

impl ScriptedHostedCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the form's next answer, either a raw report or an outcome.
    pub async fn respond(&self, report: impl Into<HostedCheckoutReport>) {
        self.reports.push(Script::Respond(report.into())).await;
    }

    pub async fn defer(&self) -> oneshot::Sender<HostedCheckoutReport> {
        self.reports.defer().await
    }

    pub async fn hang(&self) {
        self.reports.push(Script::Hang).await;
    }

    pub async fn retract_last(&self) -> bool {
        self.reports.retract_last().await.is_some()
    }

    pub async fn presented(&self) -> Vec<CheckoutSettings> {
        self.presented.lock().await.clone()
    }

    pub async fn dismiss_count(&self) -> usize {
        *self.dismissed.lock().await
    }
}

#[async_trait]
impl HostedCheckoutSurface for ScriptedHostedCheckout {
    async fn present(&self, settings: CheckoutSettings) -> HostedCheckoutReport {
        let prompts_storage = settings.store_payment_details == StorePaymentDetails::Prompt;
        tracing::debug!(
            checkout_id = %settings.checkout_id,
            brands = ?settings.brands,
            prompts_storage,
            "presenting scripted hosted checkout"
        );
        self.presented.lock().await.push(settings);
        match self.reports.next().await {
            Some(script) => script.play().await,
            None => HostedCheckoutReport {
                canceled: true,
                ..Default::default()
            },
        }
    }

    async fn dismiss(&self) {
        *self.dismissed.lock().await += 1;
    }
}

/// What the scripted wallet sheet does when presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletScript {
    Cancel,
    Authorize(Vec<u8>),
}

/// In-process stand-in for the platform wallet sheet.
#[derive(Debug, Clone)]
pub struct ScriptedWallet {
    supported: HashSet<WalletType>,
    answers: ScriptQueue<WalletScript>,
    requests: Arc<Mutex<Vec<WalletRequest>>>,
    finished: Arc<Mutex<Vec<bool>>>,
}

impl ScriptedWallet {
    pub fn new(supported: impl IntoIterator<Item = WalletType>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
            answers: ScriptQueue::default(),
            requests: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn respond(&self, answer: WalletScript) {
        self.answers.push(Script::Respond(answer)).await;
    }

    pub async fn defer(&self) -> oneshot::Sender<WalletScript> {
        self.answers.defer().await
    }

    pub async fn retract_last(&self) -> bool {
        self.answers.retract_last().await.is_some()
    }

    pub async fn requests(&self) -> Vec<WalletRequest> {
        self.requests.lock().await.clone()
    }

    /// Results reported back to the sheet, in order.
    pub async fn finished(&self) -> Vec<bool> {
        self.finished.lock().await.clone()
    }
}

#[async_trait]
impl WalletAuthorizer for ScriptedWallet {
    fn supports(&self, wallet: WalletType) -> bool {
        self.supported.contains(&wallet)
    }

    async fn authorize(&self, request: &WalletRequest) -> WalletAuthorization {
        self.requests.lock().await.push(request.clone());
        let answer = match self.answers.next().await {
            Some(script) => script.play().await,
            None => WalletScript::Cancel,
        };
        match answer {
            WalletScript::Cancel => WalletAuthorization::Canceled,
            WalletScript::Authorize(data) => {
                WalletAuthorization::Authorized(PaymentToken::new(data))
            }
        }
    }

    async fn finish(&self, succeeded: bool) {
        self.finished.lock().await.push(succeeded);
    }
}

/// Records what the bridge asks the redirect surface to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingRedirectSurface {
    presented: Arc<Mutex<Vec<String>>>,
    dismissed: Arc<Mutex<usize>>,
}

impl RecordingRedirectSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn presented(&self) -> Vec<String> {
        self.presented.lock().await.clone()
    }

    pub async fn dismiss_count(&self) -> usize {
        *self.dismissed.lock().await
    }
}

#[async_trait]
impl RedirectSurface for RecordingRedirectSurface {
    async fn present(&self, url: &str) {
        self.presented.lock().await.push(url.to_string());
    }

    async fn dismiss(&self) {
        *self.dismissed.lock().await += 1;
    }
}
