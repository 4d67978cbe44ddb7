use super::redirect::{ReentryMatch, match_reentry};
use super::state_machine::{CheckoutState, CheckoutStateMachine, Handle, Transition, WalletStage};
use super::wallet::{WalletSession, run_wallet_flow};
use crate::config::{CheckoutConfig, ProviderMode};
use crate::domain::event::CheckoutEvent;
use crate::domain::outcome::TransactionOutcome;
use crate::domain::payment::{CardPaymentArgs, HostedCheckoutArgs, WalletPaymentArgs};
use crate::domain::ports::{
    ProviderFactory, SharedHostedCheckout, SharedPaymentProvider, SharedRedirectSurface,
    SharedWalletAuthorizer,
};
use crate::domain::request::{PendingRequest, RequestId, RequestKind};
use crate::domain::result::PaymentStatus;
use crate::error::{BridgeError, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// External collaborators the bridge drives.
pub struct Adapters {
    pub provider_factory: ProviderFactory,
    pub hosted_checkout: SharedHostedCheckout,
    pub wallet: SharedWalletAuthorizer,
    pub redirect: SharedRedirectSurface,
}

/// Point-in-time view of the bridge, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSnapshot {
    pub state: CheckoutState,
    pub pending: Option<PendingRequest>,
    pub wallet_stage: Option<WalletStage>,
    pub mode: Option<ProviderMode>,
    pub surface_attached: bool,
}

enum BeginRequest {
    Hosted(HostedCheckoutArgs),
    Card(CardPaymentArgs),
    Wallet(WalletPaymentArgs),
}

enum Command {
    Setup {
        mode: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Surface {
        attached: bool,
        reply: oneshot::Sender<()>,
    },
    Begin {
        args: BeginRequest,
        reply: oneshot::Sender<Result<Handle>>,
    },
    Redirect {
        url: String,
        reply: oneshot::Sender<ReentryMatch>,
    },
    Cancel {
        reply: oneshot::Sender<()>,
    },
    Abandon {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<BridgeSnapshot>,
    },
}

/// Event posted by an adapter task, optionally waiting for an answer.
pub(crate) struct AdapterMessage {
    event: CheckoutEvent,
    ack: Option<oneshot::Sender<bool>>,
}

/// Lets adapter tasks hand their events to the owning task.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<AdapterMessage>,
}

impl EventSink {
    pub(crate) fn complete(&self, request_id: RequestId, outcome: TransactionOutcome) {
        let message = AdapterMessage {
            event: CheckoutEvent::AdapterCompleted {
                request_id,
                outcome,
            },
            ack: None,
        };
        if self.tx.send(message).is_err() {
            debug!(%request_id, "bridge stopped before the adapter completed");
        }
    }

    /// Asks whether a wallet token may be submitted for `request_id`.
    pub(crate) async fn authorize(&self, request_id: RequestId) -> bool {
        let (ack, answer) = oneshot::channel();
        let message = AdapterMessage {
            event: CheckoutEvent::WalletAuthorized { request_id },
            ack: Some(ack),
        };
        if self.tx.send(message).is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }
}

/// Cloneable handle to the task that owns the checkout state machine.
///
/// Every command is queued to that task, which is the only writer of the
/// pending-request slot. The task stops once all handles are dropped; an
/// attempt still pending at that point is abandoned.
#[derive(Clone)]
pub struct CheckoutBridge {
    commands: mpsc::UnboundedSender<Command>,
}

impl CheckoutBridge {
    /// Spawns the owning task on the current tokio runtime.
    ///
    /// The bridge starts with a UI surface attached and no provider; call
    /// `setup` before paying.
    pub fn spawn(adapters: Adapters, config: CheckoutConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let task = BridgeTask {
            machine: CheckoutStateMachine::new(),
            adapters,
            config,
            mode: None,
            provider: None,
            surface_attached: true,
            sink: EventSink { tx: events_tx },
        };
        tokio::spawn(task.run(commands_rx, events_rx));
        Self {
            commands: commands_tx,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| BridgeError::BridgeClosed)?;
        answer.await.map_err(|_| BridgeError::BridgeClosed)
    }

    /// Creates the provider for `"test"` or `"live"`.
    pub async fn setup(&self, mode: &str) -> Result<()> {
        let mode = mode.to_string();
        self.request(|reply| Command::Setup { mode, reply }).await?
    }

    pub async fn attach_surface(&self) -> Result<()> {
        self.request(|reply| Command::Surface {
            attached: true,
            reply,
        })
        .await
    }

    /// The UI surface is being torn down; a pending attempt is abandoned.
    pub async fn detach_surface(&self) -> Result<()> {
        self.request(|reply| Command::Surface {
            attached: false,
            reply,
        })
        .await
    }

    pub async fn checkout_ready_ui(&self, args: HostedCheckoutArgs) -> Result<Handle> {
        self.begin(BeginRequest::Hosted(args)).await
    }

    pub async fn pay_custom_ui(&self, args: CardPaymentArgs) -> Result<Handle> {
        self.begin(BeginRequest::Card(args)).await
    }

    pub async fn pay_wallet(&self, args: WalletPaymentArgs) -> Result<Handle> {
        self.begin(BeginRequest::Wallet(args)).await
    }

    async fn begin(&self, args: BeginRequest) -> Result<Handle> {
        self.request(|reply| Command::Begin { args, reply }).await?
    }

    /// Hands back the resource path for server-side verification. Does not
    /// query the gateway.
    pub fn get_payment_status(&self, resource_path: Option<String>) -> PaymentStatus {
        PaymentStatus::pending_server_verification(resource_path)
    }

    /// Offers an app re-entry URL to the pending attempt.
    pub async fn handle_redirect(&self, url: &str) -> Result<ReentryMatch> {
        let url = url.to_string();
        self.request(|reply| Command::Redirect { url, reply }).await
    }

    /// The shopper canceled from the UI.
    pub async fn cancel(&self) -> Result<()> {
        self.request(|reply| Command::Cancel { reply }).await
    }

    pub async fn abandon(&self) -> Result<()> {
        self.request(|reply| Command::Abandon { reply }).await
    }

    pub async fn snapshot(&self) -> Result<BridgeSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }
}

struct BridgeTask {
    machine: CheckoutStateMachine,
    adapters: Adapters,
    config: CheckoutConfig,
    mode: Option<ProviderMode>,
    provider: Option<SharedPaymentProvider>,
    surface_attached: bool,
    sink: EventSink,
}

impl BridgeTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<AdapterMessage>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(message) = events.recv() => self.on_adapter_message(message),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }
        if let Transition::Abandoned { request_id } = self.machine.abandon() {
            info!(%request_id, "bridge shut down with an attempt pending");
        }
    }

    fn on_adapter_message(&mut self, message: AdapterMessage) {
        let transition = self.machine.handle(message.event);
        if let Some(ack) = message.ack {
            let granted = matches!(transition, Transition::SubmittingWallet { .. });
            let _ = ack.send(granted);
        }
        self.apply(transition);
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Setup { mode, reply } => {
                let _ = reply.send(self.setup(&mode));
            }
            Command::Surface { attached, reply } => {
                self.surface_attached = attached;
                if !attached {
                    let transition = self.machine.abandon();
                    self.apply(transition);
                }
                let _ = reply.send(());
            }
            Command::Begin { args, reply } => {
                let _ = reply.send(self.begin(args));
            }
            Command::Redirect { url, reply } => {
                let (matched, scheme) = match_reentry(self.machine.pending(), &url);
                if let (ReentryMatch::Claimed, Some(scheme)) = (matched, scheme) {
                    let transition = self.machine.handle(CheckoutEvent::RedirectReentry { scheme });
                    self.apply(transition);
                } else {
                    debug!(%url, "re-entry URL not for this bridge");
                }
                let _ = reply.send(matched);
            }
            Command::Cancel { reply } => {
                let transition = self.machine.handle(CheckoutEvent::UserCancel);
                self.apply(transition);
                let _ = reply.send(());
            }
            Command::Abandon { reply } => {
                let transition = self.machine.handle(CheckoutEvent::Abandon);
                self.apply(transition);
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(BridgeSnapshot {
                    state: self.machine.state(),
                    pending: self.machine.pending().cloned(),
                    wallet_stage: self.machine.wallet_stage(),
                    mode: self.mode,
                    surface_attached: self.surface_attached,
                });
            }
        }
    }

    fn setup(&mut self, mode: &str) -> Result<()> {
        let mode: ProviderMode = mode.parse()?;
        if let Some(pending) = self.machine.pending() {
            return Err(BridgeError::AlreadyPending(pending.id));
        }
        self.provider = Some((self.adapters.provider_factory)(mode));
        self.mode = Some(mode);
        info!(%mode, "payment provider ready");
        Ok(())
    }

    fn require_surface(&self) -> Result<()> {
        if self.surface_attached {
            Ok(())
        } else {
            Err(BridgeError::NoActiveSurface)
        }
    }

    fn begin(&mut self, request: BeginRequest) -> Result<Handle> {
        let (Some(provider), Some(mode)) = (self.provider.clone(), self.mode) else {
            return Err(BridgeError::NotInitialized);
        };

        match request {
            BeginRequest::Hosted(args) => {
                let (settings, scheme) = args.validate(mode, &self.config)?;
                self.require_surface()?;
                let handle = self.machine.begin(RequestKind::HostedCheckout, scheme)?;
                let request_id = handle.request_id();
                let hosted = self.adapters.hosted_checkout.clone();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let report = hosted.present(settings).await;
                    sink.complete(request_id, TransactionOutcome::from(report));
                });
                Ok(handle)
            }
            BeginRequest::Card(args) => {
                let (submission, scheme) = args.validate(&self.config)?;
                let handle = self.machine.begin(RequestKind::CustomCard, scheme)?;
                let request_id = handle.request_id();
                let sink = self.sink.clone();
                tokio::spawn(async move {
                    let outcome = provider.submit(submission).await;
                    sink.complete(request_id, outcome);
                });
                Ok(handle)
            }
            BeginRequest::Wallet(args) => {
                let (wallet_request, scheme) = args.validate()?;
                if !self.adapters.wallet.supports(wallet_request.wallet_type) {
                    return Err(BridgeError::Unsupported(format!(
                        "{} is not available on this platform",
                        wallet_request.wallet_type
                    )));
                }
                self.require_surface()?;
                let shopper_result_url = scheme
                    .as_deref()
                    .map(|s| self.config.shopper_result_url(s));
                let handle = self.machine.begin(RequestKind::WalletPay, scheme)?;
                let session = WalletSession::new(
                    handle.request_id(),
                    wallet_request,
                    shopper_result_url,
                    provider,
                );
                let authorizer = self.adapters.wallet.clone();
                let sink = self.sink.clone();
                tokio::spawn(run_wallet_flow(session, authorizer, sink));
                Ok(handle)
            }
        }
    }

    /// Carries out the side effects a transition asks for.
    fn apply(&self, transition: Transition) {
        match transition {
            Transition::Resolved {
                kind,
                dismiss_redirect: true,
                ..
            } => self.dismiss(kind),
            Transition::AwaitingRedirect {
                request_id,
                kind,
                redirect_url: Some(url),
            } if kind != RequestKind::HostedCheckout => {
                debug!(%request_id, %url, "presenting redirect surface");
                let redirect = self.adapters.redirect.clone();
                tokio::spawn(async move { redirect.present(&url).await });
            }
            _ => {}
        }
    }

    fn dismiss(&self, kind: RequestKind) {
        if kind == RequestKind::HostedCheckout {
            let hosted = self.adapters.hosted_checkout.clone();
            tokio::spawn(async move { hosted.dismiss().await });
        } else {
            let redirect = self.adapters.redirect.clone();
            tokio::spawn(async move { redirect.dismiss().await });
        }
    }
}
