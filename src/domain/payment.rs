use crate::error::BookingError;
use serde::{Deserialize, Serialize};

pub const PHONE_COUNTRY_CODE: &str = "254";
const PHONE_SUBSCRIBER_DIGITS: usize = 9;

/// A payer MSISDN in the `254XXXXXXXXX` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, BookingError> {
        let valid = raw
            .strip_prefix(PHONE_COUNTRY_CODE)
            .map(|rest| rest.len() == PHONE_SUBSCRIBER_DIGITS && rest.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false);

        if !valid {
            return Err(BookingError::Validation(
                "Please enter a valid phone number in the format 254XXXXXXXXX".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn hours_label(hours: u32) -> &'static str {
    if hours == 1 {
        "hour"
    } else {
        "hours"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub amount: u64,
    pub phone_number: PhoneNumber,
    pub space_reference: String,
    pub duration_hours: u32,
}

impl PaymentRequest {
    pub fn new(
        amount: u64,
        phone_number: PhoneNumber,
        space_reference: impl Into<String>,
        duration_hours: u32,
    ) -> Result<Self, BookingError> {
        let space_reference = space_reference.into();
        if amount == 0 {
            return Err(BookingError::Validation("amount must be positive".to_string()));
        }
        if duration_hours == 0 {
            return Err(BookingError::Validation("duration must be at least one hour".to_string()));
        }
        if space_reference.trim().is_empty() {
            return Err(BookingError::Validation("space reference is required".to_string()));
        }

        Ok(Self {
            amount,
            phone_number,
            space_reference,
            duration_hours,
        })
    }

    pub fn remarks(&self) -> String {
        format!(
            "Payment for parking space {} for {} {}",
            self.space_reference,
            self.duration_hours,
            hours_label(self.duration_hours)
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentResult {
    #[serde(rename = "OriginatorConversationID", default)]
    pub originator_conversation_id: String,
    #[serde(rename = "ConversationID", default)]
    pub conversation_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
}

pub const ACCEPTED_RESPONSE_CODE: &str = "0";

impl PaymentResult {
    pub fn is_accepted(&self) -> bool {
        self.response_code == ACCEPTED_RESPONSE_CODE
    }
}

/// Code "0" only means the gateway queued the request; completion would
/// arrive on the result callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Accepted(PaymentResult),
    Rejected(PaymentResult),
}

impl PaymentOutcome {
    pub fn result(&self) -> &PaymentResult {
        match self {
            PaymentOutcome::Accepted(r) | PaymentOutcome::Rejected(r) => r,
        }
    }

    pub fn description(&self) -> &str {
        &self.result().response_description
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PaymentOutcome::Accepted(_))
    }
}

impl From<PaymentResult> for PaymentOutcome {
    fn from(result: PaymentResult) -> Self {
        if result.is_accepted() {
            PaymentOutcome::Accepted(result)
        } else {
            PaymentOutcome::Rejected(result)
        }
    }
}

/// Bookings are created `Pending`. `Completed` and `Failed` are reserved for
/// the gateway's asynchronous result callback, which this service does not receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&BookingError> for ErrorEnvelope {
    fn from(e: &BookingError) -> Self {
        ErrorEnvelope {
            error: ErrorPayload {
                code: e.code().to_string(),
                message: e.to_string(),
                details: None,
            },
        }
    }
}
