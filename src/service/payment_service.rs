use crate::config::MpesaConfig;
use crate::domain::booking::FlowStage;
use crate::domain::payment::{PaymentOutcome, PaymentRequest};
use crate::error::BookingError;
use crate::gateways::mock::{MockBehavior, MockPaymentSubmitter, MockTokenSource};
use crate::gateways::mpesa::{MpesaPaymentSubmitter, MpesaTokenAcquirer};
use crate::gateways::{B2bPaymentPayload, PaymentSubmitter, TokenSource};
use crate::service::cancel::CancelSignal;
use std::sync::Arc;
use tokio::sync::watch;

/// Two-stage pipeline: acquire a token, then submit the payment with it.
/// No token is cached between calls.
#[derive(Clone)]
pub struct PaymentService {
    pub config: Arc<MpesaConfig>,
    pub token_source: Arc<dyn TokenSource>,
    pub submitter: Arc<dyn PaymentSubmitter>,
}

impl PaymentService {
    pub fn new(
        config: MpesaConfig,
        token_source: Arc<dyn TokenSource>,
        submitter: Arc<dyn PaymentSubmitter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            token_source,
            submitter,
        }
    }

    pub fn mpesa(config: MpesaConfig, client: reqwest::Client) -> Self {
        let token_source = Arc::new(MpesaTokenAcquirer::from_config(&config, client.clone()));
        let submitter = Arc::new(MpesaPaymentSubmitter::from_config(&config, client));
        Self::new(config, token_source, submitter)
    }

    pub fn mock(config: MpesaConfig, behavior: MockBehavior) -> Self {
        let token_source = Arc::new(MockTokenSource::new(behavior.clone()));
        let submitter = Arc::new(MockPaymentSubmitter::new(behavior));
        Self::new(config, token_source, submitter)
    }

    pub async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentOutcome, BookingError> {
        let (stage, _) = watch::channel(FlowStage::Idle);
        self.initiate(request, &mut CancelSignal::never(), &stage).await
    }

    /// Runs both stages in order, publishing each `FlowStage` on `stage`.
    /// A fired `cancel` ends the attempt as `Canceled` and skips any later stage.
    pub async fn initiate(
        &self,
        request: &PaymentRequest,
        cancel: &mut CancelSignal,
        stage: &watch::Sender<FlowStage>,
    ) -> Result<PaymentOutcome, BookingError> {
        advance(stage, FlowStage::TokenRequested);
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            r = self.token_source.acquire() => Some(r),
        };
        let token = match acquired {
            None => return Err(canceled(stage, request)),
            Some(Ok(token)) => token,
            Some(Err(e)) => {
                advance(stage, FlowStage::AuthFailed);
                return Err(e);
            }
        };
        advance(stage, FlowStage::TokenObtained);

        let payload = B2bPaymentPayload::build(&self.config, request);
        advance(stage, FlowStage::PaymentRequested);
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            r = self.submitter.submit(&token, &payload) => Some(r),
        };
        let result = match submitted {
            None => return Err(canceled(stage, request)),
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                advance(stage, FlowStage::TransportFailed);
                return Err(e);
            }
        };

        let outcome = PaymentOutcome::from(result);
        match &outcome {
            PaymentOutcome::Accepted(r) => {
                advance(stage, FlowStage::Accepted);
                tracing::info!(
                    account_reference = %request.space_reference,
                    conversation_id = %r.conversation_id,
                    gateway = self.submitter.name(),
                    "payment accepted for processing"
                );
            }
            PaymentOutcome::Rejected(r) => {
                advance(stage, FlowStage::Rejected);
                tracing::info!(
                    account_reference = %request.space_reference,
                    response_code = %r.response_code,
                    description = %r.response_description,
                    gateway = self.submitter.name(),
                    "payment rejected by gateway"
                );
            }
        }
        Ok(outcome)
    }
}

fn advance(stage: &watch::Sender<FlowStage>, next: FlowStage) {
    let prev = stage.send_replace(next);
    if !prev.can_transition_to(next) {
        tracing::warn!(from = ?prev, to = ?next, "unexpected payment flow stage transition");
    }
    tracing::debug!(from = ?prev, to = ?next, "payment flow stage");
}

fn canceled(stage: &watch::Sender<FlowStage>, request: &PaymentRequest) -> BookingError {
    advance(stage, FlowStage::Canceled);
    tracing::info!(account_reference = %request.space_reference, "payment attempt canceled");
    BookingError::Canceled
}
