use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Failed to get M-Pesa authorization token")]
    Authentication,
    #[error("Failed to initiate M-Pesa payment")]
    PaymentInitiation,
    #[error("{0}")]
    Validation(String),
    #[error("parking space {0} is not available for booking")]
    SpaceUnavailable(String),
    #[error("booking was canceled")]
    Canceled,
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Authentication => "AUTHENTICATION_FAILED",
            BookingError::PaymentInitiation => "PAYMENT_INITIATION_FAILED",
            BookingError::Validation(_) => "VALIDATION_FAILED",
            BookingError::SpaceUnavailable(_) => "SPACE_UNAVAILABLE",
            BookingError::Canceled => "CANCELED",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing config value: {0}")]
    Missing(&'static str),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
