use crate::error::ConfigError;
use std::fmt;

pub const DEFAULT_AUTH_URL: &str = "https://sandbox.safaricom.co.ke/oauth/v1/generate";
pub const DEFAULT_PAYMENT_URL: &str = "https://sandbox.safaricom.co.ke/mpesa/b2b/v1/paymentrequest";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub maps_api_key: Option<String>,
    pub mock_behavior: Option<String>,
    pub mpesa: MpesaConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            maps_api_key: std::env::var("MAPS_API_KEY").ok().filter(|k| !k.is_empty()),
            mock_behavior: std::env::var("MPESA_MOCK_BEHAVIOR").ok(),
            mpesa: MpesaConfig::from_env(),
        }
    }
}

/// Everything the payment payload needs that is not supplied per booking.
#[derive(Clone)]
pub struct MpesaConfig {
    pub auth_url: String,
    pub payment_url: String,
    pub basic_auth: String,
    pub initiator: String,
    pub security_credential: String,
    pub command_id: String,
    pub identifier_type: String,
    pub short_code: String,
    pub till_number: String,
    pub queue_timeout_url: String,
    pub result_url: String,
    pub timeout_ms: u64,
}

impl MpesaConfig {
    pub fn from_env() -> Self {
        Self {
            auth_url: std::env::var("MPESA_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            payment_url: std::env::var("MPESA_PAYMENT_URL")
                .unwrap_or_else(|_| DEFAULT_PAYMENT_URL.to_string()),
            basic_auth: std::env::var("MPESA_BASIC_AUTH").unwrap_or_default(),
            initiator: std::env::var("MPESA_INITIATOR").unwrap_or_default(),
            security_credential: std::env::var("MPESA_SECURITY_CREDENTIAL").unwrap_or_default(),
            command_id: std::env::var("MPESA_COMMAND_ID")
                .unwrap_or_else(|_| "BusinessBuyGoods".to_string()),
            identifier_type: std::env::var("MPESA_IDENTIFIER_TYPE").unwrap_or_else(|_| "4".to_string()),
            short_code: std::env::var("MPESA_SHORT_CODE").unwrap_or_else(|_| "174379".to_string()),
            till_number: std::env::var("MPESA_TILL_NUMBER").unwrap_or_else(|_| "174379".to_string()),
            queue_timeout_url: std::env::var("MPESA_QUEUE_TIMEOUT_URL").unwrap_or_default(),
            result_url: std::env::var("MPESA_RESULT_URL").unwrap_or_default(),
            timeout_ms: std::env::var("MPESA_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(10_000),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require("MPESA_BASIC_AUTH", &self.basic_auth)?;
        require("MPESA_INITIATOR", &self.initiator)?;
        require("MPESA_SECURITY_CREDENTIAL", &self.security_credential)?;
        require("MPESA_COMMAND_ID", &self.command_id)?;
        require_numeric("MPESA_IDENTIFIER_TYPE", &self.identifier_type)?;
        require_numeric("MPESA_SHORT_CODE", &self.short_code)?;
        require_numeric("MPESA_TILL_NUMBER", &self.till_number)?;
        require_url("MPESA_AUTH_URL", &self.auth_url)?;
        require_url("MPESA_PAYMENT_URL", &self.payment_url)?;
        require_url("MPESA_QUEUE_TIMEOUT_URL", &self.queue_timeout_url)?;
        require_url("MPESA_RESULT_URL", &self.result_url)?;

        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "MPESA_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.short_code == self.till_number {
            tracing::warn!(
                short_code = %self.short_code,
                "payer short-code and receiver till number are identical"
            );
        }

        Ok(())
    }
}

impl fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("auth_url", &self.auth_url)
            .field("payment_url", &self.payment_url)
            .field("basic_auth", &"<redacted>")
            .field("initiator", &self.initiator)
            .field("security_credential", &"<redacted>")
            .field("command_id", &self.command_id)
            .field("identifier_type", &self.identifier_type)
            .field("short_code", &self.short_code)
            .field("till_number", &self.till_number)
            .field("queue_timeout_url", &self.queue_timeout_url)
            .field("result_url", &self.result_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(field));
    }
    Ok(())
}

fn require_numeric(field: &'static str, value: &str) -> Result<(), ConfigError> {
    require(field, value)?;
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Invalid {
            field,
            reason: "must contain digits only".to_string(),
        });
    }
    Ok(())
}

fn require_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    require(field, value)?;
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::Invalid {
            field,
            reason: "must be an absolute http(s) URL".to_string(),
        }),
    }
}
