use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gateway environment the provider is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[default]
    Test,
    Live,
}

impl FromStr for ProviderMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("test") {
            Ok(ProviderMode::Test)
        } else if s.eq_ignore_ascii_case("live") {
            Ok(ProviderMode::Live)
        } else {
            Err(BridgeError::InvalidArgs(format!(
                "mode must be \"test\" or \"live\", got {s:?}"
            )))
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderMode::Test => f.write_str("test"),
            ProviderMode::Live => f.write_str("live"),
        }
    }
}

/// When the hosted checkout may skip asking for the CVV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCvvMode {
    Never,
    #[default]
    ForStoredCards,
    Always,
}

/// Whether the hosted checkout offers to store the entered payment details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePaymentDetails {
    Never,
    #[default]
    Prompt,
    Always,
}

/// Static settings applied to every checkout the bridge starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Host component of the shopper result URL (`<scheme>://<callback_host>`).
    pub callback_host: String,
    pub skip_cvv: SkipCvvMode,
    pub store_payment_details: StorePaymentDetails,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            callback_host: "callback".to_string(),
            skip_cvv: SkipCvvMode::default(),
            store_payment_details: StorePaymentDetails::default(),
        }
    }
}

impl CheckoutConfig {
    /// Builds the URL the provider redirects the shopper to once an
    /// asynchronous payment finishes.
    pub fn shopper_result_url(&self, scheme: &str) -> String {
        format!("{scheme}://{}", self.callback_host)
    }
}
