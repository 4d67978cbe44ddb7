use checkout_bridge::config::{CheckoutConfig, ProviderMode};
use checkout_bridge::interfaces::csv::scenario_reader::ScenarioReader;
use checkout_bridge::interfaces::replay::replay;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "CHECKOUT_BRIDGE_LOG";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario CSV file, one checkout step per row
    scenario: PathBuf,

    /// Provider environment passed to setup()
    #[arg(long, value_enum, default_value_t = ProviderMode::Test)]
    mode: ProviderMode,

    /// JSON file with checkout settings. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config: CheckoutConfig = match cli.config {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            serde_json::from_reader(file).into_diagnostic()?
        }
        None => CheckoutConfig::default(),
    };

    let file = File::open(cli.scenario).into_diagnostic()?;
    let reader = ScenarioReader::new(file);
    let mut steps = Vec::new();
    for step in reader.steps() {
        match step {
            Ok(step) => steps.push(step),
            Err(e) => tracing::warn!(error = %e, "skipping malformed scenario step"),
        }
    }

    let records = replay(steps, cli.mode, config).await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in records {
        serde_json::to_writer(&mut out, &record).into_diagnostic()?;
        writeln!(out).into_diagnostic()?;
    }
    Ok(())
}
