use checkout_bridge::config::ProviderMode;
use checkout_bridge::domain::outcome::TransactionOutcome;
use checkout_bridge::domain::payment::{PaymentMethod, PaymentToken, Submission, WalletType};
use checkout_bridge::domain::ports::{
    ProviderFactory, SharedHostedCheckout, SharedPaymentProvider, SharedRedirectSurface,
    SharedWalletAuthorizer,
};
use checkout_bridge::infrastructure::scripted::{
    RecordingRedirectSurface, ScriptedHostedCheckout, ScriptedProvider, ScriptedWallet,
};
use std::sync::Arc;

fn wallet_submission(checkout_id: &str) -> Submission {
    Submission {
        checkout_id: checkout_id.to_string(),
        method: PaymentMethod::Wallet {
            wallet_type: WalletType::ApplePay,
            token: PaymentToken::new(b"tok".to_vec()),
        },
        shopper_result_url: None,
    }
}

#[tokio::test]
async fn test_adapters_as_trait_objects() {
    let scripted = ScriptedProvider::new();
    scripted.respond(TransactionOutcome::sync("/one")).await;

    let provider: SharedPaymentProvider = Arc::new(scripted.clone());
    let hosted: SharedHostedCheckout = Arc::new(ScriptedHostedCheckout::new());
    let wallet: SharedWalletAuthorizer = Arc::new(ScriptedWallet::new([WalletType::ApplePay]));
    let redirect: SharedRedirectSurface = Arc::new(RecordingRedirectSurface::new());

    // Verify Send + Sync by moving each into its own task
    let provider_task =
        tokio::spawn(async move { provider.submit(wallet_submission("abc")).await });
    let hosted_task = tokio::spawn(async move { hosted.dismiss().await });
    let wallet_task = tokio::spawn(async move { wallet.supports(WalletType::GooglePay) });
    let redirect_task = tokio::spawn(async move { redirect.present("https://acs.test").await });

    assert_eq!(
        provider_task.await.unwrap(),
        TransactionOutcome::sync("/one")
    );
    hosted_task.await.unwrap();
    assert!(!wallet_task.await.unwrap());
    redirect_task.await.unwrap();
    assert_eq!(scripted.submitted().await[0].checkout_id, "abc");
}

#[tokio::test]
async fn test_factory_instantiation() {
    let scripted = ScriptedProvider::new();
    scripted.respond(TransactionOutcome::Canceled).await;
    let factory: ProviderFactory = scripted.factory();

    let provider = factory(ProviderMode::Test);
    assert_eq!(
        provider.submit(wallet_submission("abc")).await,
        TransactionOutcome::Canceled
    );
    assert_eq!(scripted.submitted().await[0].mode, ProviderMode::Test);
}

#[tokio::test]
async fn test_factory_in_task() {
    let scripted = ScriptedProvider::new();
    scripted.respond(TransactionOutcome::sync("/live")).await;
    let factory: ProviderFactory = scripted.factory();

    let handle = tokio::spawn(async move {
        let provider = factory(ProviderMode::Live);
        provider.submit(wallet_submission("def")).await
    });

    assert_eq!(handle.await.unwrap(), TransactionOutcome::sync("/live"));
    assert_eq!(scripted.created_modes(), vec![ProviderMode::Live]);
}
