use crate::domain::payment::{PaymentResult, PaymentStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DURATION_OPTIONS: [u32; 8] = [1, 2, 3, 4, 6, 8, 12, 24];
pub const DEFAULT_DURATION_HOURS: u32 = 1;

/// Progress of one Acquire -> Submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStage {
    Idle,
    TokenRequested,
    TokenObtained,
    AuthFailed,
    PaymentRequested,
    Accepted,
    Rejected,
    TransportFailed,
    Canceled,
}

impl FlowStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FlowStage::AuthFailed
                | FlowStage::Accepted
                | FlowStage::Rejected
                | FlowStage::TransportFailed
                | FlowStage::Canceled
        )
    }

    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            FlowStage::TokenRequested | FlowStage::TokenObtained | FlowStage::PaymentRequested
        )
    }

    pub fn can_transition_to(self, next: FlowStage) -> bool {
        use FlowStage::*;
        match (self, next) {
            (_, Canceled) => !self.is_terminal() && self != Idle,
            (Idle, TokenRequested) => true,
            (TokenRequested, TokenObtained | AuthFailed) => true,
            (TokenObtained, PaymentRequested) => true,
            (PaymentRequested, Accepted | Rejected | TransportFailed) => true,
            (s, Idle) => s.is_terminal() || s == Idle,
            (s, TokenRequested) => s.is_terminal(),
            _ => false,
        }
    }
}

/// Local record of a booking whose payment the gateway accepted for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub space_id: String,
    pub space_number: String,
    pub phone_number: String,
    pub amount: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub originator_conversation_id: String,
    pub conversation_id: String,
}

impl Booking {
    pub fn provisional(
        space_id: &str,
        space_number: &str,
        phone_number: &str,
        amount: u64,
        duration_hours: u32,
        result: &PaymentResult,
    ) -> Self {
        let start_time = Utc::now();
        Self {
            id: Uuid::new_v4(),
            space_id: space_id.to_string(),
            space_number: space_number.to_string(),
            phone_number: phone_number.to_string(),
            amount,
            start_time,
            end_time: start_time + Duration::hours(i64::from(duration_hours)),
            payment_status: PaymentStatus::Pending,
            originator_conversation_id: result.originator_conversation_id.clone(),
            conversation_id: result.conversation_id.clone(),
        }
    }
}
