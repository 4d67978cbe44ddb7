use crate::domain::event::CheckoutEvent;
use crate::domain::outcome::{TransactionMode, TransactionOutcome};
use crate::domain::request::{PendingRequest, RequestId, RequestKind};
use crate::domain::result::{CheckoutResult, shape};
use crate::error::{BridgeError, Result};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Coarse lifecycle of the single checkout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Submitted,
    /// The only state that can last indefinitely: the shopper is somewhere
    /// else completing an asynchronous payment.
    AwaitingRedirect,
}

/// Progress of the wallet flow while the attempt is `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStage {
    PresentingAuth,
    Submitting,
}

/// Result channel that accepts at most one completion.
#[derive(Debug)]
pub struct Continuation {
    sender: Option<oneshot::Sender<CheckoutResult>>,
}

impl Continuation {
    pub fn new() -> (Self, oneshot::Receiver<CheckoutResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Delivers the result. Returns `false` if the continuation was already used.
    pub fn resolve(&mut self, result: CheckoutResult) -> bool {
        match self.sender.take() {
            Some(tx) => {
                if tx.send(result).is_err() {
                    debug!("caller stopped waiting before the result arrived");
                }
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.is_none()
    }
}

/// Caller's side of one attempt.
#[derive(Debug)]
pub struct Handle {
    request_id: RequestId,
    receiver: oneshot::Receiver<CheckoutResult>,
}

impl Handle {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Waits for the attempt to finish.
    ///
    /// `None` means the attempt was abandoned: its continuation was dropped
    /// without ever being invoked and no result will follow.
    pub async fn outcome(self) -> Option<CheckoutResult> {
        self.receiver.await.ok()
    }

    /// Non-blocking peek used by synchronous callers and tests.
    pub fn try_outcome(&mut self) -> Option<CheckoutResult> {
        self.receiver.try_recv().ok()
    }
}

/// What the owner of the state machine has to do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Stale, duplicate or out-of-state event. Nothing changed.
    Ignored,
    /// The continuation was invoked and the slot is free again.
    Resolved {
        request_id: RequestId,
        kind: RequestKind,
        /// A redirect surface may still be on screen and must be dismissed.
        dismiss_redirect: bool,
    },
    /// The provider wants the shopper on a redirect surface.
    AwaitingRedirect {
        request_id: RequestId,
        kind: RequestKind,
        redirect_url: Option<String>,
    },
    /// The wallet token may be submitted to the provider.
    SubmittingWallet { request_id: RequestId },
    /// The slot was cleared without resolving the continuation.
    Abandoned { request_id: RequestId },
}

#[derive(Debug)]
enum Phase {
    Submitted { wallet: Option<WalletStage> },
    AwaitingRedirect { resource_path: String },
}

#[derive(Debug)]
struct Attempt {
    request: PendingRequest,
    phase: Phase,
    continuation: Continuation,
}

/// Owns the one pending-request slot and decides which event resolves it.
///
/// All methods take `&mut self`; the owner is expected to funnel every event
/// through a single task.
#[derive(Debug, Default)]
pub struct CheckoutStateMachine {
    attempt: Option<Attempt>,
    next_id: u64,
}

impl CheckoutStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CheckoutState {
        match &self.attempt {
            None => CheckoutState::Idle,
            Some(Attempt {
                phase: Phase::Submitted { .. },
                ..
            }) => CheckoutState::Submitted,
            Some(Attempt {
                phase: Phase::AwaitingRedirect { .. },
                ..
            }) => CheckoutState::AwaitingRedirect,
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.attempt.as_ref().map(|attempt| &attempt.request)
    }

    pub fn wallet_stage(&self) -> Option<WalletStage> {
        match &self.attempt {
            Some(Attempt {
                phase: Phase::Submitted { wallet },
                ..
            }) => *wallet,
            _ => None,
        }
    }

    /// Opens a new attempt. Fails without touching the current one if the
    /// slot is taken.
    pub fn begin(&mut self, kind: RequestKind, redirect_scheme: Option<String>) -> Result<Handle> {
        if let Some(attempt) = &self.attempt {
            warn!(
                pending = %attempt.request.id,
                ?kind,
                "rejecting checkout: another attempt is pending"
            );
            return Err(BridgeError::AlreadyPending(attempt.request.id));
        }

        self.next_id += 1;
        let request_id = RequestId::new(self.next_id);
        let (continuation, receiver) = Continuation::new();
        let wallet = (kind == RequestKind::WalletPay).then_some(WalletStage::PresentingAuth);

        info!(%request_id, ?kind, scheme = ?redirect_scheme, "checkout attempt submitted");
        self.attempt = Some(Attempt {
            request: PendingRequest::new(request_id, kind, redirect_scheme),
            phase: Phase::Submitted { wallet },
            continuation,
        });

        Ok(Handle {
            request_id,
            receiver,
        })
    }

    /// Single entry point for the closed event type.
    pub fn handle(&mut self, event: CheckoutEvent) -> Transition {
        match event {
            CheckoutEvent::AdapterCompleted {
                request_id,
                outcome,
            } => self.on_adapter_completion(request_id, outcome),
            CheckoutEvent::WalletAuthorized { request_id } => self.on_wallet_authorized(request_id),
            CheckoutEvent::RedirectReentry { scheme } => self.on_redirect_reentry(&scheme),
            CheckoutEvent::UserCancel => self.on_user_cancel(),
            CheckoutEvent::Abandon => self.abandon(),
        }
    }

    pub fn on_adapter_completion(
        &mut self,
        request_id: RequestId,
        outcome: TransactionOutcome,
    ) -> Transition {
        let Some(attempt) = self.attempt.as_mut() else {
            debug!(%request_id, "adapter completion with no pending attempt");
            return Transition::Ignored;
        };
        if attempt.request.id != request_id {
            debug!(%request_id, pending = %attempt.request.id, "stale adapter completion");
            return Transition::Ignored;
        }

        match outcome {
            TransactionOutcome::Pending {
                resource_path,
                redirect_url,
            } => {
                if let Phase::AwaitingRedirect { .. } = attempt.phase {
                    debug!(%request_id, "duplicate async completion");
                    return Transition::Ignored;
                }
                info!(%request_id, %resource_path, "awaiting redirect re-entry");
                attempt.request.awaiting_redirect = true;
                attempt.phase = Phase::AwaitingRedirect { resource_path };
                Transition::AwaitingRedirect {
                    request_id,
                    kind: attempt.request.kind,
                    redirect_url,
                }
            }
            terminal => {
                let dismiss_redirect = attempt.request.awaiting_redirect;
                match shape(terminal) {
                    Some(result) => self.resolve(result, dismiss_redirect),
                    None => Transition::Ignored,
                }
            }
        }
    }

    /// Grants the wallet flow permission to submit its token, once.
    pub fn on_wallet_authorized(&mut self, request_id: RequestId) -> Transition {
        match self.attempt.as_mut() {
            Some(Attempt {
                request,
                phase:
                    Phase::Submitted {
                        wallet: Some(stage @ WalletStage::PresentingAuth),
                    },
                ..
            }) if request.id == request_id => {
                *stage = WalletStage::Submitting;
                info!(%request_id, "wallet authorized, submitting token");
                Transition::SubmittingWallet { request_id }
            }
            _ => {
                debug!(%request_id, "wallet authorization for an attempt that is not presenting");
                Transition::Ignored
            }
        }
    }

    /// Resolves an attempt waiting on a redirect whose scheme matches.
    /// Anything else is a silent no-op: devices deliver duplicates.
    pub fn on_redirect_reentry(&mut self, scheme: &str) -> Transition {
        let resource_path = match &self.attempt {
            Some(Attempt {
                request,
                phase: Phase::AwaitingRedirect { resource_path },
                ..
            }) if request.matches_scheme(scheme) => resource_path.clone(),
            _ => {
                debug!(scheme, "redirect re-entry ignored");
                return Transition::Ignored;
            }
        };
        self.resolve(
            CheckoutResult::success(resource_path, TransactionMode::Async),
            true,
        )
    }

    pub fn on_user_cancel(&mut self) -> Transition {
        let dismiss_redirect = match &self.attempt {
            None => {
                debug!("user cancel with no pending attempt");
                return Transition::Ignored;
            }
            Some(Attempt {
                request,
                phase:
                    Phase::Submitted {
                        wallet: Some(WalletStage::Submitting),
                    },
                ..
            }) => {
                debug!(request_id = %request.id, "user cancel after wallet authorization ignored");
                return Transition::Ignored;
            }
            Some(attempt) => attempt.request.awaiting_redirect,
        };
        self.resolve(CheckoutResult::canceled(), dismiss_redirect)
    }

    /// Drops the pending attempt without resolving it. The caller's handle
    /// yields `None`.
    pub fn abandon(&mut self) -> Transition {
        match self.attempt.take() {
            Some(attempt) => {
                info!(
                    request_id = %attempt.request.id,
                    awaiting_redirect = attempt.request.awaiting_redirect,
                    "checkout attempt abandoned"
                );
                Transition::Abandoned {
                    request_id: attempt.request.id,
                }
            }
            None => Transition::Ignored,
        }
    }

    fn resolve(&mut self, result: CheckoutResult, dismiss_redirect: bool) -> Transition {
        let Some(mut attempt) = self.attempt.take() else {
            return Transition::Ignored;
        };
        let request_id = attempt.request.id;
        if !attempt.continuation.resolve(result) {
            return Transition::Ignored;
        }
        info!(%request_id, kind = ?attempt.request.kind, "checkout attempt resolved");
        Transition::Resolved {
            request_id,
            kind: attempt.request.kind,
            dismiss_redirect,
        }
    }
}
