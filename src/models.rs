use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::tokenizer::Tokens;

/// Successful call result: the extracted value plus the raw parsed response.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub raw: Value,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, raw: Value) -> Self {
        Self { value, raw }
    }
}

/// Per-call credential overrides. `None` falls back to the configured value.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub audience: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub grant_type: Option<String>,
    pub scope: Option<String>,
}

/// Personal identification submitted when registering a consumer.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConsumerInfo {
    pub ssn: String,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state_code: String,
    pub zipcode: String,
    #[serde(default = "default_primary")]
    pub address_primary: bool,
}

fn default_primary() -> bool {
    true
}

impl ConsumerInfo {
    /// Token map for the consumer template.
    pub fn to_tokens(&self) -> Tokens {
        Tokens::from([
            ("ssn".to_string(), self.ssn.as_str().into()),
            ("first_name".to_string(), self.first_name.as_str().into()),
            ("last_name".to_string(), self.last_name.as_str().into()),
            ("date_of_birth".to_string(), self.date_of_birth.as_str().into()),
            ("line1".to_string(), self.line1.as_str().into()),
            ("line2".to_string(), self.line2.as_deref().into()),
            ("city".to_string(), self.city.as_str().into()),
            ("state_code".to_string(), self.state_code.as_str().into()),
            ("zipcode".to_string(), self.zipcode.as_str().into()),
            ("address_primary".to_string(), self.address_primary.into()),
        ])
    }
}

// SSN and date of birth stay out of logs.
impl fmt::Debug for ConsumerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerInfo")
            .field("ssn", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("date_of_birth", &"[REDACTED]")
            .field("city", &self.city)
            .field("state_code", &self.state_code)
            .field("zipcode", &self.zipcode)
            .field("address_primary", &self.address_primary)
            .finish()
    }
}

/// A credit product configured on the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Accepts ids sent either as JSON strings or as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
