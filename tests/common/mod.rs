#![allow(dead_code)]

use checkout_bridge::application::bridge::{Adapters, CheckoutBridge};
use checkout_bridge::config::CheckoutConfig;
use checkout_bridge::domain::payment::{
    CardPaymentArgs, HostedCheckoutArgs, WalletPaymentArgs, WalletType,
};
use checkout_bridge::infrastructure::scripted::{
    RecordingRedirectSurface, ScriptedHostedCheckout, ScriptedProvider, ScriptedWallet,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const SCHEME: &str = "com.shop.payments";

/// A bridge wired to scripted adapters, with handles on every adapter.
pub struct Rig {
    pub bridge: CheckoutBridge,
    pub provider: ScriptedProvider,
    pub hosted: ScriptedHostedCheckout,
    pub wallet: ScriptedWallet,
    pub redirect: RecordingRedirectSurface,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_wallets([WalletType::ApplePay, WalletType::GooglePay])
    }

    pub fn with_wallets(wallets: impl IntoIterator<Item = WalletType>) -> Self {
        let provider = ScriptedProvider::new();
        let hosted = ScriptedHostedCheckout::new();
        let wallet = ScriptedWallet::new(wallets);
        let redirect = RecordingRedirectSurface::new();
        let adapters = Adapters {
            provider_factory: provider.factory(),
            hosted_checkout: Arc::new(hosted.clone()),
            wallet: Arc::new(wallet.clone()),
            redirect: Arc::new(redirect.clone()),
        };
        Self {
            bridge: CheckoutBridge::spawn(adapters, CheckoutConfig::default()),
            provider,
            hosted,
            wallet,
            redirect,
        }
    }

    /// A rig that already ran `setup("test")`.
    pub async fn ready() -> Self {
        let rig = Self::new();
        rig.bridge.setup("test").await.unwrap();
        rig
    }

    /// Polls until no attempt is pending or the pending one waits on a
    /// redirect.
    pub async fn settle(&self) {
        for _ in 0..1000 {
            let snapshot = self.bridge.snapshot().await.unwrap();
            match snapshot.pending {
                Some(pending) if !pending.awaiting_redirect => tokio::task::yield_now().await,
                _ => return,
            }
        }
        panic!("bridge did not settle");
    }

    pub async fn wait_for_wallet_requests(&self, count: usize) {
        eventually(|| async move { self.wallet.requests().await.len() >= count }).await;
    }

    pub async fn wait_for_submissions(&self, count: usize) {
        eventually(|| async move { self.provider.submitted().await.len() >= count }).await;
    }
}

/// Yields to the runtime until `check` holds. Adapter side effects run on
/// spawned tasks, so tests poll for them.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..1000 {
        if check().await {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn card_args(checkout_id: &str, scheme: Option<&str>) -> CardPaymentArgs {
    CardPaymentArgs {
        checkout_id: checkout_id.to_string(),
        brand: "VISA".to_string(),
        card_number: "4200000000000000".into(),
        holder: "Jane Doe".to_string(),
        expiry_month: "12".to_string(),
        expiry_year: "2030".to_string(),
        cvv: "123".into(),
        tokenize: false,
        shopper_result_url: scheme.map(str::to_string),
    }
}

pub fn hosted_args(checkout_id: &str, scheme: Option<&str>) -> HostedCheckoutArgs {
    HostedCheckoutArgs {
        checkout_id: checkout_id.to_string(),
        brands: vec!["VISA".to_string(), "MASTER".to_string()],
        shopper_result_url: scheme.map(str::to_string),
        wallet_config: None,
        lang: None,
    }
}

pub fn wallet_args(checkout_id: &str, wallet_type: WalletType) -> WalletPaymentArgs {
    WalletPaymentArgs {
        checkout_id: checkout_id.to_string(),
        wallet_type: Some(wallet_type),
        merchant_id: "merchant.com.shop".to_string(),
        country_code: "SA".to_string(),
        currency_code: "SAR".to_string(),
        amount: Some(dec!(49.99)),
        company_name: "Shop".to_string(),
        shopper_result_url: Some(SCHEME.to_string()),
    }
}

pub fn callback_url(scheme: &str) -> String {
    format!("{scheme}://callback")
}
