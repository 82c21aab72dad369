use crate::config::MpesaConfig;
use crate::domain::payment::{AuthToken, PaymentRequest, PaymentResult};
use crate::error::BookingError;
use serde::{Deserialize, Serialize};

pub mod mock;
pub mod mpesa;

/// Body of the B2B `paymentrequest` call. Field spelling follows the gateway,
/// including `RecieverIdentifierType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct B2bPaymentPayload {
    pub initiator: String,
    pub security_credential: String,
    #[serde(rename = "CommandID")]
    pub command_id: String,
    pub sender_identifier_type: String,
    pub reciever_identifier_type: String,
    pub amount: String,
    pub party_a: String,
    pub party_b: String,
    pub account_reference: String,
    pub requester: String,
    pub remarks: String,
    #[serde(rename = "QueueTimeOutURL")]
    pub queue_time_out_url: String,
    #[serde(rename = "ResultURL")]
    pub result_url: String,
}

impl B2bPaymentPayload {
    pub fn build(config: &MpesaConfig, request: &PaymentRequest) -> Self {
        Self {
            initiator: config.initiator.clone(),
            security_credential: config.security_credential.clone(),
            command_id: config.command_id.clone(),
            sender_identifier_type: config.identifier_type.clone(),
            reciever_identifier_type: config.identifier_type.clone(),
            amount: request.amount.to_string(),
            party_a: config.short_code.clone(),
            party_b: config.till_number.clone(),
            account_reference: request.space_reference.clone(),
            requester: request.phone_number.as_str().to_string(),
            remarks: request.remarks(),
            queue_time_out_url: config.queue_timeout_url.clone(),
            result_url: config.result_url.clone(),
        }
    }
}

/// Acquire stage: exchanges the pre-shared credential for a bearer token.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn acquire(&self) -> Result<AuthToken, BookingError>;
}

/// Submit stage: posts a payment payload with a token from the acquire stage.
#[async_trait::async_trait]
pub trait PaymentSubmitter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit(
        &self,
        token: &AuthToken,
        payload: &B2bPaymentPayload,
    ) -> Result<PaymentResult, BookingError>;
}
