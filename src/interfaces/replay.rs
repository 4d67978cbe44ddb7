//! Drives a `CheckoutBridge` wired to scripted adapters through a list of
//! scenario steps and reports one record per step.

use super::csv::scenario_reader::{Action, ScenarioStep, ScriptedOutcome};
use crate::application::bridge::{Adapters, CheckoutBridge};
use crate::application::state_machine::Handle;
use crate::config::{CheckoutConfig, ProviderMode};
use crate::domain::outcome::TransactionOutcome;
use crate::domain::payment::{
    CardPaymentArgs, HostedCheckoutArgs, Sensitive, WalletPaymentArgs, WalletType,
};
use crate::domain::request::RequestId;
use crate::domain::result::{CheckoutResult, PaymentStatus};
use crate::error::BridgeError;
use crate::infrastructure::scripted::{
    RecordingRedirectSurface, ScriptedHostedCheckout, ScriptedProvider, ScriptedWallet,
    WalletScript,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_CHECKOUT_ID: &str = "replay-checkout";

/// Why an attempt never produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unresolved {
    /// Dropped by `abandon()` or a surface teardown.
    Abandoned,
    /// Still pending when the scenario ended.
    StillPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: String,
    pub message: String,
}

impl From<BridgeError> for Rejection {
    fn from(err: BridgeError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub step: usize,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CheckoutResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<Unresolved>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed: Option<bool>,
}

impl ReplayRecord {
    fn new(step: usize, action: Action) -> Self {
        Self {
            step,
            action,
            result: None,
            unresolved: None,
            error: None,
            status: None,
            claimed: None,
        }
    }
}

struct Harness {
    bridge: CheckoutBridge,
    config: CheckoutConfig,
    provider: ScriptedProvider,
    hosted: ScriptedHostedCheckout,
    wallet: ScriptedWallet,
}

/// Replays `steps` and returns the records in step order.
///
/// Results of payment steps are collected after the last step, once the
/// bridge has shut down, so attempts still pending at the end are reported
/// as such.
pub async fn replay(
    steps: Vec<ScenarioStep>,
    mode: ProviderMode,
    config: CheckoutConfig,
) -> Result<Vec<ReplayRecord>, BridgeError> {
    let provider = ScriptedProvider::new();
    let hosted = ScriptedHostedCheckout::new();
    let wallet = ScriptedWallet::new([WalletType::ApplePay, WalletType::GooglePay]);
    let adapters = Adapters {
        provider_factory: provider.factory(),
        hosted_checkout: Arc::new(hosted.clone()),
        wallet: Arc::new(wallet.clone()),
        redirect: Arc::new(RecordingRedirectSurface::new()),
    };
    let harness = Harness {
        bridge: CheckoutBridge::spawn(adapters, config.clone()),
        config,
        provider,
        hosted,
        wallet,
    };
    harness.bridge.setup(&mode.to_string()).await?;

    let mut records = Vec::with_capacity(steps.len());
    let mut attempts: Vec<(usize, Handle)> = Vec::new();
    for (index, step) in steps.into_iter().enumerate() {
        let mut record = ReplayRecord::new(index + 1, step.action);
        match harness.run_step(&step).await {
            Ok(StepOutput::Attempt(handle)) => attempts.push((index, handle)),
            Ok(StepOutput::Status(status)) => record.status = Some(status),
            Ok(StepOutput::Claimed(claimed)) => record.claimed = Some(claimed),
            Ok(StepOutput::Done) => {}
            Err(BridgeError::BridgeClosed) => return Err(BridgeError::BridgeClosed),
            Err(err) => record.error = Some(err.into()),
        }
        records.push(record);
    }

    let still_pending = harness.bridge.snapshot().await?.pending.map(|p| p.id);
    drop(harness);

    for (index, handle) in attempts {
        let request_id = handle.request_id();
        let record = &mut records[index];
        match tokio::time::timeout(SETTLE_TIMEOUT, handle.outcome()).await {
            Ok(Some(result)) => record.result = Some(result),
            Ok(None) if still_pending == Some(request_id) => {
                record.unresolved = Some(Unresolved::StillPending)
            }
            Ok(None) => record.unresolved = Some(Unresolved::Abandoned),
            Err(_) => {
                warn!(%request_id, "attempt did not settle after shutdown");
                record.unresolved = Some(Unresolved::StillPending)
            }
        }
    }
    Ok(records)
}

enum StepOutput {
    Attempt(Handle),
    Status(PaymentStatus),
    Claimed(bool),
    Done,
}

#[derive(Debug, Clone, Copy)]
enum Attempt {
    Card,
    Hosted,
    Wallet(WalletType),
}

/// Which script queue an attempt pushed an answer onto.
#[derive(Debug, Clone, Copy)]
enum Queued {
    Provider,
    Hosted,
    Wallet,
}

fn scripted_outcome(step: &ScenarioStep, checkout_id: &str) -> Option<TransactionOutcome> {
    let resource_path = step
        .resource_path
        .clone()
        .unwrap_or_else(|| format!("/v1/checkouts/{checkout_id}/payment"));
    match step.outcome.unwrap_or(ScriptedOutcome::Sync) {
        ScriptedOutcome::Sync => Some(TransactionOutcome::sync(resource_path)),
        ScriptedOutcome::Async => Some(TransactionOutcome::pending(
            resource_path,
            Some(format!("https://gateway.test/redirect/{checkout_id}")),
        )),
        ScriptedOutcome::Failed => Some(TransactionOutcome::failed(
            step.code.clone().unwrap_or_else(|| "PAYMENT_ERROR".to_string()),
            step.message.clone().unwrap_or_default(),
        )),
        ScriptedOutcome::Canceled => Some(TransactionOutcome::Canceled),
        ScriptedOutcome::Hang => None,
    }
}

impl Harness {
    async fn run_step(&self, step: &ScenarioStep) -> Result<StepOutput, BridgeError> {
        match step.action {
            Action::Card => self.run_attempt(Attempt::Card, step).await,
            Action::Hosted => self.run_attempt(Attempt::Hosted, step).await,
            Action::WalletApple => {
                let attempt = Attempt::Wallet(WalletType::ApplePay);
                self.run_attempt(attempt, step).await
            }
            Action::WalletGoogle => {
                let attempt = Attempt::Wallet(WalletType::GooglePay);
                self.run_attempt(attempt, step).await
            }
            Action::Redirect => {
                let scheme = step.scheme.as_deref().unwrap_or_default();
                let url = self.config.shopper_result_url(scheme);
                let matched = self.bridge.handle_redirect(&url).await?;
                Ok(StepOutput::Claimed(matched.is_claimed()))
            }
            Action::Cancel => {
                self.bridge.cancel().await?;
                Ok(StepOutput::Done)
            }
            Action::Detach => {
                self.bridge.detach_surface().await?;
                Ok(StepOutput::Done)
            }
            Action::Attach => {
                self.bridge.attach_surface().await?;
                Ok(StepOutput::Done)
            }
            Action::Status => Ok(StepOutput::Status(
                self.bridge.get_payment_status(step.resource_path.clone()),
            )),
        }
    }

    /// Queues the adapter answers for one attempt and starts it.
    ///
    /// Answers go in before the command because the adapter task may run
    /// before the command returns. A rejected command never reaches its
    /// adapters, so its answers are taken back out.
    async fn run_attempt(
        &self,
        attempt: Attempt,
        step: &ScenarioStep,
    ) -> Result<StepOutput, BridgeError> {
        let checkout_id = step
            .checkout_id
            .clone()
            .unwrap_or_else(|| DEFAULT_CHECKOUT_ID.to_string());
        let outcome = scripted_outcome(step, &checkout_id);
        let queued = self.queue_answers(attempt, &checkout_id, outcome).await;
        let started = match attempt {
            Attempt::Card => {
                self.bridge
                    .pay_custom_ui(CardPaymentArgs {
                        checkout_id,
                        brand: "VISA".to_string(),
                        card_number: Sensitive::new("4200000000000000"),
                        holder: "Replay Shopper".to_string(),
                        expiry_month: "12".to_string(),
                        expiry_year: "2030".to_string(),
                        cvv: Sensitive::new("123"),
                        tokenize: false,
                        shopper_result_url: step.scheme.clone(),
                    })
                    .await
            }
            Attempt::Hosted => {
                self.bridge
                    .checkout_ready_ui(HostedCheckoutArgs {
                        checkout_id,
                        brands: vec!["VISA".to_string(), "MASTER".to_string()],
                        shopper_result_url: step.scheme.clone(),
                        wallet_config: None,
                        lang: None,
                    })
                    .await
            }
            Attempt::Wallet(wallet_type) => {
                self.bridge
                    .pay_wallet(WalletPaymentArgs {
                        checkout_id,
                        wallet_type: Some(wallet_type),
                        merchant_id: "merchant.test.replay".to_string(),
                        country_code: "SA".to_string(),
                        currency_code: "SAR".to_string(),
                        amount: Some(Decimal::ONE),
                        company_name: "Replay".to_string(),
                        shopper_result_url: step.scheme.clone(),
                    })
                    .await
            }
        };

        match started {
            Ok(handle) => {
                self.settle(handle.request_id(), step.outcome).await?;
                Ok(StepOutput::Attempt(handle))
            }
            Err(err) => {
                for queue in queued.into_iter().rev() {
                    let retracted = match queue {
                        Queued::Provider => self.provider.retract_last().await,
                        Queued::Hosted => self.hosted.retract_last().await,
                        Queued::Wallet => self.wallet.retract_last().await,
                    };
                    if !retracted {
                        warn!(?queue, "scripted answer of a rejected step was already played");
                    }
                }
                Err(err)
            }
        }
    }

    async fn queue_answers(
        &self,
        attempt: Attempt,
        checkout_id: &str,
        outcome: Option<TransactionOutcome>,
    ) -> Vec<Queued> {
        match (attempt, outcome) {
            (Attempt::Card, Some(outcome)) => {
                self.provider.respond(outcome).await;
                vec![Queued::Provider]
            }
            (Attempt::Card, None) => {
                self.provider.hang().await;
                vec![Queued::Provider]
            }
            (Attempt::Hosted, Some(outcome)) => {
                self.hosted.respond(outcome).await;
                vec![Queued::Hosted]
            }
            (Attempt::Hosted, None) => {
                self.hosted.hang().await;
                vec![Queued::Hosted]
            }
            (Attempt::Wallet(_), Some(TransactionOutcome::Canceled)) => {
                self.wallet.respond(WalletScript::Cancel).await;
                vec![Queued::Wallet]
            }
            (Attempt::Wallet(_), Some(outcome)) => {
                let token = format!("token-{checkout_id}").into_bytes();
                self.wallet.respond(WalletScript::Authorize(token)).await;
                self.provider.respond(outcome).await;
                vec![Queued::Wallet, Queued::Provider]
            }
            (Attempt::Wallet(_), None) => {
                // Dropping the sender leaves the sheet open.
                let _ = self.wallet.defer().await;
                vec![Queued::Wallet]
            }
        }
    }

    /// Waits until the adapters have answered the attempt, so later steps
    /// see a deterministic state. Hanging adapters are not waited for.
    async fn settle(
        &self,
        request_id: RequestId,
        outcome: Option<ScriptedOutcome>,
    ) -> Result<(), BridgeError> {
        if outcome == Some(ScriptedOutcome::Hang) {
            return Ok(());
        }
        let wait = async {
            loop {
                let snapshot = self.bridge.snapshot().await?;
                match snapshot.pending {
                    Some(pending) if pending.id == request_id && !pending.awaiting_redirect => {
                        tokio::task::yield_now().await
                    }
                    _ => return Ok(()),
                }
            }
        };
        match tokio::time::timeout(SETTLE_TIMEOUT, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%request_id, "attempt did not settle, continuing");
                Ok(())
            }
        }
    }
}
