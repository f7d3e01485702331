use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::config::{Config, Environment, ORDER_ID_PLACEHOLDER};
use crate::errors::AppError;
use crate::models::{ApiResponse, ConsumerInfo, CredentialOverrides, Portfolio};
use crate::tokenizer::{order_tokens, tokenize_json};
use crate::utils::{coalesce, redact};

pub const CONSUMER_TEMPLATE: &str = "consumer.json";
pub const ORDER_TEMPLATE: &str = "order.json";

/// Client for the Bloom Credit API.
///
/// Every call is a single request. Failures come back as [`AppError`]; nothing
/// is retried.
#[derive(Clone)]
pub struct BloomClient {
    client: reqwest::Client,
    config: Config,
}

impl BloomClient {
    /// Creates a new `BloomClient` whose requests time out after
    /// `config.timeout_secs`.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create Bloom client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retrieves an access token from the authentication endpoint.
    ///
    /// Each credential is taken from `overrides` when present, else from the
    /// configuration. Unset credentials are left out of the form.
    ///
    /// # Arguments
    ///
    /// * `overrides` - Per-call credentials; `None` fields use the configured values.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse<String>, AppError>` - The access token and the raw token response.
    pub async fn fetch_auth_token(
        &self,
        overrides: &CredentialOverrides,
    ) -> Result<ApiResponse<String>, AppError> {
        let audience = self.config.resolve_audience(overrides.audience.as_deref());
        let environment = Environment::from_audience(audience.as_deref());
        let url = &self.config.endpoints(environment).auth_url;

        let fields = [
            ("audience", audience.as_deref()),
            (
                "client_id",
                coalesce([
                    overrides.client_id.as_deref(),
                    self.config.client_id.as_deref(),
                ]),
            ),
            (
                "client_secret",
                coalesce([
                    overrides.client_secret.as_deref(),
                    self.config.client_secret.as_deref(),
                ]),
            ),
            (
                "grant_type",
                coalesce([
                    overrides.grant_type.as_deref(),
                    self.config.grant_type.as_deref(),
                ]),
            ),
            (
                "scope",
                coalesce([overrides.scope.as_deref(), self.config.scope.as_deref()]),
            ),
        ];
        let form: Vec<(&str, &str)> = fields
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();

        tracing::info!("Requesting access token ({:?})", environment);
        tracing::debug!("Auth URL: {}", url);

        let mut request = self.client.post(url).form(&form);
        if let Some(ref partner) = self.config.partner_id {
            request = request.header("X-Partner", partner);
        }

        let raw = self.send(request).await?;
        let token = string_at(&raw, "/access_token", "access_token")?;

        tracing::info!("✓ Access token received {}", redact(&token));
        Ok(ApiResponse::new(token, raw))
    }

    /// Returns the id of the organization's first portfolio.
    ///
    /// Organizations may hold several portfolios; this picks the first one
    /// without any further selection. Use [`Self::list_portfolios`] to choose.
    ///
    /// # Arguments
    ///
    /// * `auth_token` - Bearer token from [`Self::fetch_auth_token`].
    /// * `audience` - Overrides the configured audience.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse<String>, AppError>` - The first portfolio id and the organization document.
    pub async fn get_portfolios(
        &self,
        auth_token: &str,
        audience: Option<&str>,
    ) -> Result<ApiResponse<String>, AppError> {
        let raw = self.fetch_organization(auth_token, audience).await?;
        let portfolio_id = string_at(
            &raw,
            "/data/attributes/portfolios/0/id",
            "data.attributes.portfolios[0].id",
        )?;

        tracing::info!("✓ Using portfolio {}", portfolio_id);
        Ok(ApiResponse::new(portfolio_id, raw))
    }

    /// Returns every portfolio configured on the organization, in API order.
    pub async fn list_portfolios(
        &self,
        auth_token: &str,
        audience: Option<&str>,
    ) -> Result<ApiResponse<Vec<Portfolio>>, AppError> {
        let raw = self.fetch_organization(auth_token, audience).await?;
        let list = raw
            .pointer("/data/attributes/portfolios")
            .filter(|v| v.is_array())
            .ok_or_else(|| AppError::MissingField {
                field: "data.attributes.portfolios",
                response: raw.clone(),
            })?;
        let portfolios: Vec<Portfolio> = serde_json::from_value(list.clone())
            .map_err(|e| AppError::Decode(format!("Failed to parse portfolios: {}", e)))?;

        tracing::info!("Organization has {} portfolio(s)", portfolios.len());
        Ok(ApiResponse::new(portfolios, raw))
    }

    async fn fetch_organization(
        &self,
        auth_token: &str,
        audience: Option<&str>,
    ) -> Result<Value, AppError> {
        let environment = self.config.environment_for(audience);
        let url = &self.config.endpoints(environment).org_url;
        tracing::info!("Fetching organization portfolios ({:?})", environment);
        tracing::debug!("Organization URL: {}", url);

        let request = self
            .client
            .get(url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("Authorization", format!("Bearer {}", auth_token));

        self.send(request).await
    }

    /// Submits a consumer and returns the consumer id assigned by Bloom.
    ///
    /// # Arguments
    ///
    /// * `consumer` - Identification fields rendered into the consumer template.
    /// * `auth_token` - Bearer token from [`Self::fetch_auth_token`].
    /// * `audience` - Overrides the configured audience.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse<String>, AppError>` - The consumer id (`data.id`) and the raw response.
    pub async fn register_consumer(
        &self,
        consumer: &ConsumerInfo,
        auth_token: &str,
        audience: Option<&str>,
    ) -> Result<ApiResponse<String>, AppError> {
        let environment = self.config.environment_for(audience);
        let url = &self.config.endpoints(environment).consumer_url;
        let payload = tokenize_json(
            self.config.template_dir.join(CONSUMER_TEMPLATE),
            &consumer.to_tokens(),
        )?;

        tracing::info!("Registering consumer ({:?})", environment);
        tracing::debug!("Consumer URL: {}", url);

        let raw = self.post_json(url, auth_token, payload).await?;
        let consumer_id = string_at(&raw, "/data/id", "data.id")?;

        tracing::info!("✓ Consumer registered: {}", consumer_id);
        Ok(ApiResponse::new(consumer_id, raw))
    }

    /// Orders a credit report for a registered consumer.
    ///
    /// Absent ids are sent as empty strings; the API decides what to do with
    /// them.
    ///
    /// # Arguments
    ///
    /// * `consumer_id` - Id returned by [`Self::register_consumer`].
    /// * `portfolio_id` - Portfolio to order against.
    /// * `sku` - Report product.
    /// * `auth_token` - Bearer token from [`Self::fetch_auth_token`].
    /// * `audience` - Overrides the configured audience.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse<String>, AppError>` - The order id (`data.id`) and the raw response.
    pub async fn order_credit_data(
        &self,
        consumer_id: Option<&str>,
        portfolio_id: Option<&str>,
        sku: Option<&str>,
        auth_token: &str,
        audience: Option<&str>,
    ) -> Result<ApiResponse<String>, AppError> {
        let environment = self.config.environment_for(audience);
        let url = &self.config.endpoints(environment).order_url;
        let payload = tokenize_json(
            self.config.template_dir.join(ORDER_TEMPLATE),
            &order_tokens(consumer_id, portfolio_id, sku),
        )?;

        tracing::info!(
            "Placing order for consumer {:?} (sku {:?}, {:?})",
            consumer_id,
            sku,
            environment
        );
        tracing::debug!("Order URL: {}", url);

        let raw = self.post_json(url, auth_token, payload).await?;
        let order_id = string_at(&raw, "/data/id", "data.id")?;

        tracing::info!("✓ Order placed: {}", order_id);
        Ok(ApiResponse::new(order_id, raw))
    }

    /// Fetches the report for an order.
    ///
    /// The value is the report pretty-printed with four-space indentation.
    /// When `outfile` is given the same text is written there.
    ///
    /// # Arguments
    ///
    /// * `order_id` - Id returned by [`Self::order_credit_data`].
    /// * `auth_token` - Bearer token from [`Self::fetch_auth_token`].
    /// * `audience` - Overrides the configured audience.
    /// * `outfile` - Optional path for a copy of the report.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse<String>, AppError>` - The formatted report and the parsed document.
    pub async fn get_credit_data(
        &self,
        order_id: &str,
        auth_token: &str,
        audience: Option<&str>,
        outfile: Option<&Path>,
    ) -> Result<ApiResponse<String>, AppError> {
        let environment = self.config.environment_for(audience);
        let url = self
            .config
            .endpoints(environment)
            .orders_url
            .replace(ORDER_ID_PLACEHOLDER, order_id);

        tracing::info!("Fetching credit data for order {} ({:?})", order_id, environment);
        tracing::debug!("Orders URL: {}", url);

        let request = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("Authorization", format!("Bearer {}", auth_token));

        let raw = self.send(request).await?;
        let report = to_pretty_json(&raw)?;

        if let Some(path) = outfile {
            tokio::fs::write(path, &report).await?;
            tracing::info!("Report written to {}", path.display());
        }

        Ok(ApiResponse::new(report, raw))
    }

    async fn post_json(
        &self,
        url: &str,
        auth_token: &str,
        payload: String,
    ) -> Result<Value, AppError> {
        let request = self
            .client
            .post(url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("Authorization", format!("Bearer {}", auth_token))
            .body(payload);

        self.send(request).await
    }

    /// Sends the request and parses a successful body as JSON.
    async fn send(&self, request: RequestBuilder) -> Result<Value, AppError> {
        let response = request.send().await.map_err(|e| {
            let err = AppError::from(e);
            tracing::error!("Bloom request failed: {}", err);
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| extract_error_detail(&v));
            let err = AppError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                detail,
            };
            tracing::warn!("Bloom returned {}", err);
            return Err(err);
        }

        // The client timeout also covers reading the body, so a slow body
        // still surfaces as a timeout rather than a decode failure.
        let raw: Value = response.json().await.map_err(|e| {
            let err = AppError::from(e);
            tracing::error!("Failed to read Bloom response: {}", err);
            err
        })?;
        Ok(raw)
    }
}

/// Reads a string (or integer) id at a JSON pointer.
fn string_at(raw: &Value, pointer: &str, field: &'static str) -> Result<String, AppError> {
    match raw.pointer(pointer) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => {
            tracing::warn!("Bloom response missing '{}'", field);
            Err(AppError::MissingField {
                field,
                response: raw.clone(),
            })
        }
    }
}

/// First error detail from an API error body.
///
/// Checks `errors[0].detail`, then a top-level `status_message`.
pub fn extract_error_detail(body: &Value) -> Option<String> {
    body.pointer("/errors/0/detail")
        .or_else(|| body.get("status_message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Serializes JSON with four-space indentation.
pub fn to_pretty_json(value: &Value) -> Result<String, AppError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| AppError::Decode(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| AppError::Decode(e.to_string()))
}
