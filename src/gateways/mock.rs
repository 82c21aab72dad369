use crate::domain::payment::{AuthToken, PaymentResult};
use crate::error::BookingError;
use crate::gateways::{B2bPaymentPayload, PaymentSubmitter, TokenSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    Accept,
    Reject { code: String, description: String },
    Fail,
    Hang,
}

impl MockBehavior {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ALWAYS_FAILURE" => MockBehavior::Fail,
            "ALWAYS_REJECT" => MockBehavior::Reject {
                code: "1".to_string(),
                description: "The balance is insufficient for the transaction".to_string(),
            },
            "ALWAYS_TIMEOUT" => MockBehavior::Hang,
            _ => MockBehavior::Accept,
        }
    }
}

async fn hang() {
    tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60)).await;
}

#[derive(Clone)]
pub struct MockTokenSource {
    pub behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockTokenSource {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenSource for MockTokenSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn acquire(&self) -> Result<AuthToken, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Fail => Err(BookingError::Authentication),
            MockBehavior::Hang => {
                hang().await;
                Err(BookingError::Authentication)
            }
            _ => Ok(AuthToken {
                access_token: format!("mock_token_{}", uuid::Uuid::new_v4()),
                expires_in: "3599".to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct MockPaymentSubmitter {
    pub behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    last_payload: Arc<Mutex<Option<B2bPaymentPayload>>>,
}

impl MockPaymentSubmitter {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            last_payload: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<B2bPaymentPayload> {
        self.last_payload.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait::async_trait]
impl PaymentSubmitter for MockPaymentSubmitter {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn submit(
        &self,
        _token: &AuthToken,
        payload: &B2bPaymentPayload,
    ) -> Result<PaymentResult, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_payload.lock() {
            *last = Some(payload.clone());
        }

        let (code, description) = match &self.behavior {
            MockBehavior::Fail => return Err(BookingError::PaymentInitiation),
            MockBehavior::Hang => {
                hang().await;
                return Err(BookingError::PaymentInitiation);
            }
            MockBehavior::Reject { code, description } => (code.clone(), description.clone()),
            MockBehavior::Accept => (
                "0".to_string(),
                "Accept the service request successfully.".to_string(),
            ),
        };

        Ok(PaymentResult {
            originator_conversation_id: format!("mock_orig_{}", uuid::Uuid::new_v4()),
            conversation_id: format!("mock_conv_{}", uuid::Uuid::new_v4()),
            response_code: code,
            response_description: description,
        })
    }
}
