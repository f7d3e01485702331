//! End-to-end credit report retrieval for one consumer.
//!
//! The steps run strictly in order and each consumes the id produced by the
//! previous one:
//! 1. Fetch an access token
//! 2. Resolve the portfolio (skipped when one is supplied)
//! 3. Register the consumer
//! 4. Place the order
//! 5. Retrieve the report
//!
//! The first failure ends the run; the error is tagged with the step name.
use std::path::PathBuf;

use crate::client::BloomClient;
use crate::errors::{AppError, ResultExt};
use crate::models::{ConsumerInfo, CredentialOverrides};

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub consumer: ConsumerInfo,
    pub sku: String,
    pub portfolio_id: Option<String>,
    pub credentials: CredentialOverrides,
    pub outfile: Option<PathBuf>,
}

impl ReportRequest {
    pub fn new(consumer: ConsumerInfo, sku: impl Into<String>) -> Self {
        Self {
            consumer,
            sku: sku.into(),
            portfolio_id: None,
            credentials: CredentialOverrides::default(),
            outfile: None,
        }
    }
}

/// Ids collected along the chain plus the pretty-printed report.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub consumer_id: String,
    pub portfolio_id: String,
    pub order_id: String,
    pub report: String,
    pub raw_report: serde_json::Value,
}

/// Runs the full chain for one consumer.
///
/// # Arguments
///
/// * `client` - Configured Bloom client.
/// * `request` - Consumer, SKU and optional portfolio, credentials and output file.
///
/// # Returns
///
/// * `Result<ReportOutcome, AppError>` - Every id produced along the way plus the report,
///   or the first error tagged with the failing step.
pub async fn run_report(
    client: &BloomClient,
    request: &ReportRequest,
) -> Result<ReportOutcome, AppError> {
    let audience = request.credentials.audience.as_deref();

    let token = client
        .fetch_auth_token(&request.credentials)
        .await
        .context("fetch_auth_token")?
        .value;

    let portfolio_id = match request.portfolio_id {
        Some(ref id) => {
            tracing::info!("Using supplied portfolio {}", id);
            id.clone()
        }
        None => {
            client
                .get_portfolios(&token, audience)
                .await
                .context("get_portfolios")?
                .value
        }
    };

    let consumer_id = client
        .register_consumer(&request.consumer, &token, audience)
        .await
        .context("register_consumer")?
        .value;

    let order_id = client
        .order_credit_data(
            Some(consumer_id.as_str()),
            Some(portfolio_id.as_str()),
            Some(request.sku.as_str()),
            &token,
            audience,
        )
        .await
        .context("order_credit_data")?
        .value;

    let report = client
        .get_credit_data(&order_id, &token, audience, request.outfile.as_deref())
        .await
        .with_context(|| format!("get_credit_data for order {}", order_id))?;

    tracing::info!("✓ Credit report retrieved for order {}", order_id);

    Ok(ReportOutcome {
        consumer_id,
        portfolio_id,
        order_id,
        report: report.value,
        raw_report: report.raw,
    })
}
