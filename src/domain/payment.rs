use crate::config::{CheckoutConfig, ProviderMode, SkipCvvMode, StorePaymentDetails};
use crate::error::{BridgeError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wraps card data so it never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl From<&str> for Sensitive {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A strictly positive amount charged through a wallet sheet.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(BridgeError::InvalidArgs("amount must be positive".into()))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BridgeError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

/// Platform wallets the bridge knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletType {
    ApplePay,
    GooglePay,
}

impl WalletType {
    /// Payment brand the provider expects for a token from this wallet.
    pub fn brand(&self) -> &'static str {
        match self {
            WalletType::ApplePay => "APPLEPAY",
            WalletType::GooglePay => "GOOGLEPAY",
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletType::ApplePay => f.write_str("Apple Pay"),
            WalletType::GooglePay => f.write_str("Google Pay"),
        }
    }
}

/// One-time token produced by a wallet authorization.
///
/// Not `Clone`: submitting it moves it.
#[derive(PartialEq, Eq)]
pub struct PaymentToken(Vec<u8>);

impl PaymentToken {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentToken(<{} bytes>)", self.0.len())
    }
}

/// Optional wallet button configuration forwarded to the hosted checkout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
    pub merchant_id: String,
    pub merchant_name: String,
    pub country_code: String,
    pub currency_code: String,
    pub amount: Option<Decimal>,
    pub company_name: String,
}

/// Arguments of `checkoutReadyUI`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostedCheckoutArgs {
    pub checkout_id: String,
    pub brands: Vec<String>,
    pub shopper_result_url: Option<String>,
    pub wallet_config: Option<WalletConfig>,
    pub lang: Option<String>,
}

/// Arguments of `payCustomUI`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardPaymentArgs {
    pub checkout_id: String,
    pub brand: String,
    pub card_number: Sensitive,
    pub holder: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: Sensitive,
    pub tokenize: bool,
    pub shopper_result_url: Option<String>,
}

/// Arguments of `payWallet`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletPaymentArgs {
    pub checkout_id: String,
    pub wallet_type: Option<WalletType>,
    pub merchant_id: String,
    pub country_code: String,
    pub currency_code: String,
    pub amount: Option<Decimal>,
    pub company_name: String,
    pub shopper_result_url: Option<String>,
}

/// Validated settings for presenting the hosted checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSettings {
    pub checkout_id: String,
    pub brands: Vec<String>,
    pub mode: ProviderMode,
    pub shopper_result_url: Option<String>,
    pub wallet: Option<WalletConfig>,
    pub lang: Option<String>,
    pub skip_cvv: SkipCvvMode,
    pub store_payment_details: StorePaymentDetails,
}

/// Validated card fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub brand: String,
    pub number: Sensitive,
    pub holder: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: Sensitive,
    pub tokenize: bool,
}

/// What the wallet sheet asks the shopper to authorize.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletRequest {
    pub wallet_type: WalletType,
    pub checkout_id: String,
    pub merchant_id: String,
    pub country_code: String,
    pub currency_code: String,
    pub amount: Amount,
    pub company_name: String,
}

#[derive(Debug, PartialEq)]
pub enum PaymentMethod {
    Card(CardDetails),
    Wallet {
        wallet_type: WalletType,
        token: PaymentToken,
    },
}

/// A transaction handed to the provider.
#[derive(Debug, PartialEq)]
pub struct Submission {
    pub checkout_id: String,
    pub method: PaymentMethod,
    pub shopper_result_url: Option<String>,
}

impl Submission {
    pub fn brand(&self) -> &str {
        match &self.method {
            PaymentMethod::Card(card) => &card.brand,
            PaymentMethod::Wallet { wallet_type, .. } => wallet_type.brand(),
        }
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(BridgeError::missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Validates an optional redirect scheme (RFC 3986: a letter followed by
/// letters, digits, `+`, `-` or `.`). An empty string counts as absent.
pub fn validate_scheme(scheme: Option<&str>) -> Result<Option<String>> {
    let Some(scheme) = scheme.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(Some(scheme.to_string()))
    } else {
        Err(BridgeError::InvalidArgs(format!(
            "shopperResultUrl {scheme:?} is not a valid URL scheme"
        )))
    }
}

impl HostedCheckoutArgs {
    /// Returns the settings together with the redirect scheme to register.
    pub fn validate(
        self,
        mode: ProviderMode,
        config: &CheckoutConfig,
    ) -> Result<(CheckoutSettings, Option<String>)> {
        let checkout_id = required(&self.checkout_id, "checkoutId")?;
        let mut brands: Vec<String> = Vec::with_capacity(self.brands.len());
        for brand in self.brands.iter().map(|b| b.trim()).filter(|b| !b.is_empty()) {
            if !brands.iter().any(|b| b == brand) {
                brands.push(brand.to_string());
            }
        }
        if brands.is_empty() {
            return Err(BridgeError::missing("brands"));
        }
        let scheme = validate_scheme(self.shopper_result_url.as_deref())?;
        let settings = CheckoutSettings {
            checkout_id,
            brands,
            mode,
            shopper_result_url: scheme.as_deref().map(|s| config.shopper_result_url(s)),
            wallet: self.wallet_config,
            lang: self.lang.filter(|l| !l.trim().is_empty()),
            skip_cvv: config.skip_cvv,
            store_payment_details: config.store_payment_details,
        };
        Ok((settings, scheme))
    }
}

impl CardPaymentArgs {
    pub fn validate(self, config: &CheckoutConfig) -> Result<(Submission, Option<String>)> {
        let checkout_id = required(&self.checkout_id, "checkoutId")?;
        let brand = required(&self.brand, "brand")?;
        if self.card_number.is_empty() {
            return Err(BridgeError::missing("cardNumber"));
        }
        let holder = required(&self.holder, "holder")?;
        let expiry_month = required(&self.expiry_month, "expiryMonth")?;
        let expiry_year = required(&self.expiry_year, "expiryYear")?;
        if self.cvv.is_empty() {
            return Err(BridgeError::missing("cvv"));
        }
        let scheme = validate_scheme(self.shopper_result_url.as_deref())?;
        let submission = Submission {
            checkout_id,
            method: PaymentMethod::Card(CardDetails {
                brand,
                number: self.card_number,
                holder,
                expiry_month,
                expiry_year,
                cvv: self.cvv,
                tokenize: self.tokenize,
            }),
            shopper_result_url: scheme.as_deref().map(|s| config.shopper_result_url(s)),
        };
        Ok((submission, scheme))
    }
}

impl WalletPaymentArgs {
    pub fn validate(self) -> Result<(WalletRequest, Option<String>)> {
        let checkout_id = required(&self.checkout_id, "checkoutId")?;
        let wallet_type = self
            .wallet_type
            .ok_or_else(|| BridgeError::missing("walletType"))?;
        let merchant_id = required(&self.merchant_id, "merchantId")?;
        let country_code = required(&self.country_code, "countryCode")?;
        let currency_code = required(&self.currency_code, "currencyCode")?;
        let amount = Amount::new(self.amount.ok_or_else(|| BridgeError::missing("amount"))?)?;
        let company_name = required(&self.company_name, "companyName")?;
        let scheme = validate_scheme(self.shopper_result_url.as_deref())?;
        let request = WalletRequest {
            wallet_type,
            checkout_id,
            merchant_id,
            country_code,
            currency_code,
            amount,
            company_name,
        };
        Ok((request, scheme))
    }
}
