use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid step: {0}")]
    InvalidStep(String),
}

/// What a replay step does.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Card,
    Hosted,
    WalletApple,
    WalletGoogle,
    Redirect,
    Cancel,
    Detach,
    Attach,
    Status,
}

/// How the scripted adapters answer a payment step.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedOutcome {
    Sync,
    Async,
    Failed,
    Canceled,
    /// The adapter never answers.
    Hang,
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct ScenarioStep {
    pub action: Action,
    pub checkout_id: Option<String>,
    pub outcome: Option<ScriptedOutcome>,
    pub resource_path: Option<String>,
    pub scheme: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Reads replay steps from a CSV source with the header
/// `action,checkout_id,outcome,resource_path,scheme,code,message`.
pub struct ScenarioReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScenarioReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields steps; a bad row yields an error and reading continues.
    pub fn steps(self) -> impl Iterator<Item = Result<ScenarioStep, ScenarioError>> {
        self.reader.into_deserialize().map(|result| {
            let step: ScenarioStep = result?;
            if step.action == Action::Redirect && step.scheme.is_none() {
                return Err(ScenarioError::InvalidStep("redirect without scheme".into()));
            }
            Ok(step)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "action,checkout_id,outcome,resource_path,scheme,code,message";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{HEADER}\ncard, abc, async, /v1/checkouts/abc/payment, com.shop, ,\nredirect,,,,com.shop,,\ncancel"
        );
        let steps: Vec<_> = ScenarioReader::new(data.as_bytes()).steps().collect();

        assert_eq!(steps.len(), 3);
        let card = steps[0].as_ref().unwrap();
        assert_eq!(card.action, Action::Card);
        assert_eq!(card.checkout_id.as_deref(), Some("abc"));
        assert_eq!(card.outcome, Some(ScriptedOutcome::Async));
        assert_eq!(card.code, None);

        let cancel = steps[2].as_ref().unwrap();
        assert_eq!(cancel.action, Action::Cancel);
        assert_eq!(cancel.scheme, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = format!("{HEADER}\nrefund,abc,,,,,\nredirect,,,,,,\nstatus,,,/v1/p,,,");
        let steps: Vec<_> = ScenarioReader::new(data.as_bytes()).steps().collect();

        assert!(matches!(steps[0], Err(ScenarioError::Csv(_))));
        assert!(matches!(steps[1], Err(ScenarioError::InvalidStep(_))));
        assert!(steps[2].is_ok());
    }
}
