use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_bloom_credit::client::BloomClient;
use rust_bloom_credit::config::Config;
use rust_bloom_credit::models::ConsumerInfo;
use rust_bloom_credit::workflow::{run_report, ReportRequest};

/// Order and download a Bloom Credit report for one consumer.
#[derive(Debug, Parser)]
#[command(name = "rust-bloom-credit", version)]
struct Cli {
    /// JSON file with the consumer's identification fields.
    #[arg(long)]
    consumer: PathBuf,

    /// Report product to order.
    #[arg(long, default_value = "equifax-gold-soft-fico-internet")]
    sku: String,

    /// Portfolio to order against. Defaults to the organization's first portfolio.
    #[arg(long)]
    portfolio_id: Option<String>,

    /// Overrides BLOOM_AUDIENCE (`dev-api` targets the sandbox).
    #[arg(long)]
    audience: Option<String>,

    /// Also write the report to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, runs the report workflow and
/// prints the report to stdout.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_bloom_credit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    let consumer_json = tokio::fs::read_to_string(&cli.consumer).await.map_err(|e| {
        anyhow::anyhow!("Failed to read consumer file {}: {}", cli.consumer.display(), e)
    })?;
    let consumer: ConsumerInfo = serde_json::from_str(&consumer_json)?;

    let client = BloomClient::new(config)?;

    let mut request = ReportRequest::new(consumer, cli.sku);
    request.portfolio_id = cli.portfolio_id;
    request.credentials.audience = cli.audience;
    request.outfile = cli.out;

    let outcome = run_report(&client, &request).await?;
    tracing::info!(
        "Consumer {} / portfolio {} / order {}",
        outcome.consumer_id,
        outcome.portfolio_id,
        outcome.order_id
    );

    println!("{}", outcome.report);
    Ok(())
}
