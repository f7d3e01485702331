use serde::Deserialize;
use std::path::PathBuf;

use crate::utils::coalesce;

/// Audience value that selects the sandbox deployment.
pub const SANDBOX_AUDIENCE: &str = "dev-api";

/// Placeholder in the orders URL that is replaced by the order id.
pub const ORDER_ID_PLACEHOLDER: &str = "<order_id>";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Deployment targeted by a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// Anything other than the sandbox marker, including no audience at all,
    /// targets production.
    pub fn from_audience(audience: Option<&str>) -> Self {
        match audience {
            Some(SANDBOX_AUDIENCE) => Self::Sandbox,
            _ => Self::Production,
        }
    }
}

/// Endpoint set for one deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    pub auth_url: String,
    pub org_url: String,
    pub consumer_url: String,
    pub order_url: String,
    /// Report retrieval URL; must contain `<order_id>`.
    pub orders_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audience: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub grant_type: Option<String>,
    pub scope: Option<String>,
    pub partner_id: Option<String>,
    pub sandbox: Endpoints,
    pub production: Endpoints,
    pub template_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            audience: optional("BLOOM_AUDIENCE"),
            client_id: optional("BLOOM_CLIENT_ID"),
            client_secret: optional("BLOOM_CLIENT_SECRET"),
            grant_type: optional("BLOOM_TOKEN_GRANT")
                .or_else(|| Some("client_credentials".to_string())),
            scope: optional("BLOOM_DATA_ACCESS_SCOPE"),
            partner_id: optional("BLOOM_PARTNER_ID"),
            sandbox: endpoints_from_env("SANDBOX")?,
            production: endpoints_from_env("PRODUCTION")?,
            template_dir: optional("BLOOM_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("templates")),
            timeout_secs: match optional("BLOOM_TIMEOUT_SECS") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("BLOOM_TIMEOUT_SECS must be a whole number"))?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Default audience: {:?}", config.audience);
        tracing::debug!("Sandbox auth URL: {}", config.sandbox.auth_url);
        tracing::debug!("Production auth URL: {}", config.production.auth_url);
        tracing::debug!("Template dir: {}", config.template_dir.display());

        Ok(config)
    }

    pub fn endpoints(&self, environment: Environment) -> &Endpoints {
        match environment {
            Environment::Sandbox => &self.sandbox,
            Environment::Production => &self.production,
        }
    }

    /// Applies the per-call audience over the configured default.
    pub fn resolve_audience(&self, audience: Option<&str>) -> Option<String> {
        coalesce([audience, self.audience.as_deref()]).map(str::to_string)
    }

    pub fn environment_for(&self, audience: Option<&str>) -> Environment {
        Environment::from_audience(self.resolve_audience(audience).as_deref())
    }
}

/// Reads an optional variable; blank values count as unset.
fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn required_url(name: &str) -> anyhow::Result<String> {
    let raw = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if raw.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    let parsed = url::Url::parse(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(raw)
}

fn endpoints_from_env(stage: &str) -> anyhow::Result<Endpoints> {
    let endpoints = Endpoints {
        auth_url: required_url(&format!("BLOOM_{}_AUTH_URL", stage))?,
        org_url: required_url(&format!("BLOOM_{}_ORG_URL", stage))?,
        consumer_url: required_url(&format!("BLOOM_{}_CONSUMER_URL", stage))?,
        order_url: required_url(&format!("BLOOM_{}_ORDER_URL", stage))?,
        orders_url: required_url(&format!("BLOOM_{}_ORDERS_URL", stage))?,
    };
    if !endpoints.orders_url.contains(ORDER_ID_PLACEHOLDER) {
        anyhow::bail!(
            "BLOOM_{}_ORDERS_URL must contain the {} placeholder",
            stage,
            ORDER_ID_PLACEHOLDER
        );
    }
    Ok(endpoints)
}
