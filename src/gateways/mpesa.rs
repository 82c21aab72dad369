use crate::config::MpesaConfig;
use crate::domain::payment::{AuthToken, PaymentResult};
use crate::error::BookingError;
use crate::gateways::{B2bPaymentPayload, PaymentSubmitter, TokenSource};
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

pub struct MpesaTokenAcquirer {
    pub auth_url: String,
    pub basic_auth: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl MpesaTokenAcquirer {
    pub fn from_config(config: &MpesaConfig, client: reqwest::Client) -> Self {
        Self {
            auth_url: config.auth_url.clone(),
            basic_auth: config.basic_auth.clone(),
            timeout_ms: config.timeout_ms,
            client,
        }
    }
}

#[async_trait::async_trait]
impl TokenSource for MpesaTokenAcquirer {
    fn name(&self) -> &'static str {
        "mpesa_oauth"
    }

    async fn acquire(&self) -> Result<AuthToken, BookingError> {
        let resp = self
            .client
            .get(&self.auth_url)
            .query(&[("grant_type", "client_credentials")])
            .header(AUTHORIZATION, format!("Basic {}", self.basic_auth))
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => match r.json::<AuthToken>().await {
                Ok(token) if !token.access_token.is_empty() => Ok(token),
                Ok(_) => {
                    tracing::error!("auth response carried an empty access_token");
                    Err(BookingError::Authentication)
                }
                Err(e) => {
                    tracing::error!(error = %e, "auth response body could not be decoded");
                    Err(BookingError::Authentication)
                }
            },
            Ok(r) => {
                let status = r.status();
                let body: String = r.text().await.unwrap_or_default().chars().take(200).collect();
                tracing::warn!(
                    status = status.as_u16(),
                    body = %body,
                    "auth endpoint rejected token request"
                );
                Err(BookingError::Authentication)
            }
            Err(e) if e.is_timeout() => {
                tracing::error!(timeout_ms = self.timeout_ms, "auth endpoint timed out");
                Err(BookingError::Authentication)
            }
            Err(e) => {
                tracing::error!(error = %e, "error getting M-Pesa token");
                Err(BookingError::Authentication)
            }
        }
    }
}

pub struct MpesaPaymentSubmitter {
    pub payment_url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl MpesaPaymentSubmitter {
    pub fn from_config(config: &MpesaConfig, client: reqwest::Client) -> Self {
        Self {
            payment_url: config.payment_url.clone(),
            timeout_ms: config.timeout_ms,
            client,
        }
    }
}

#[async_trait::async_trait]
impl PaymentSubmitter for MpesaPaymentSubmitter {
    fn name(&self) -> &'static str {
        "mpesa_b2b"
    }

    async fn submit(
        &self,
        token: &AuthToken,
        payload: &B2bPaymentPayload,
    ) -> Result<PaymentResult, BookingError> {
        // `json` sets Content-Type: application/json.
        let resp = self
            .client
            .post(&self.payment_url)
            .bearer_auth(&token.access_token)
            .json(payload)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => r.json::<PaymentResult>().await.map_err(|e| {
                tracing::error!(error = %e, "payment response body could not be decoded");
                BookingError::PaymentInitiation
            }),
            Ok(r) => {
                let status = r.status();
                let body: String = r.text().await.unwrap_or_default().chars().take(200).collect();
                tracing::warn!(
                    status = status.as_u16(),
                    body = %body,
                    account_reference = %payload.account_reference,
                    "payment endpoint returned an error status"
                );
                Err(BookingError::PaymentInitiation)
            }
            Err(e) if e.is_timeout() => {
                tracing::error!(timeout_ms = self.timeout_ms, "payment endpoint timed out");
                Err(BookingError::PaymentInitiation)
            }
            Err(e) => {
                tracing::error!(error = %e, "error initiating M-Pesa payment");
                Err(BookingError::PaymentInitiation)
            }
        }
    }
}
