use crate::domain::booking::{Booking, FlowStage, DEFAULT_DURATION_HOURS, DURATION_OPTIONS};
use crate::domain::payment::{PaymentOutcome, PaymentRequest, PhoneNumber};
use crate::domain::space::ParkingSpace;
use crate::error::BookingError;
use crate::service::cancel::{cancel_pair, CancelHandle, CancelSignal};
use crate::service::payment_service::PaymentService;
use tokio::sync::watch;

/// State behind one booking view: the selected space, the chosen duration
/// and the progress of the current payment attempt.
///
/// Call [`BookingFlow::teardown`] when the view is dismissed.
pub struct BookingFlow {
    service: PaymentService,
    selected: Option<ParkingSpace>,
    duration_hours: u32,
    stage: watch::Sender<FlowStage>,
    cancel: (CancelHandle, CancelSignal),
    last_booking: Option<Booking>,
}

impl BookingFlow {
    pub fn new(service: PaymentService) -> Self {
        let (stage, _) = watch::channel(FlowStage::Idle);
        Self {
            service,
            selected: None,
            duration_hours: DEFAULT_DURATION_HOURS,
            stage,
            cancel: cancel_pair(),
            last_booking: None,
        }
    }

    pub fn select_space(&mut self, space: ParkingSpace) {
        self.selected = Some(space);
    }

    pub fn selected_space(&self) -> Option<&ParkingSpace> {
        self.selected.as_ref()
    }

    pub fn set_duration(&mut self, hours: u32) -> Result<(), BookingError> {
        if !DURATION_OPTIONS.contains(&hours) {
            return Err(BookingError::Validation(format!(
                "duration must be one of {DURATION_OPTIONS:?} hours"
            )));
        }
        self.duration_hours = hours;
        Ok(())
    }

    pub fn duration_hours(&self) -> u32 {
        self.duration_hours
    }

    pub fn total_amount(&self) -> Option<u64> {
        self.selected
            .as_ref()
            .map(|s| s.total_for(self.duration_hours))
    }

    pub fn stage(&self) -> FlowStage {
        *self.stage.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowStage> {
        self.stage.subscribe()
    }

    /// Handle that aborts the current (or next) payment attempt from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.0.clone()
    }

    pub fn last_booking(&self) -> Option<&Booking> {
        self.last_booking.as_ref()
    }

    pub async fn pay(&mut self, phone_number: &str) -> Result<PaymentOutcome, BookingError> {
        let space = self
            .selected
            .clone()
            .ok_or_else(|| BookingError::Validation("no parking space selected".to_string()))?;
        if !space.is_bookable() {
            return Err(BookingError::SpaceUnavailable(space.space_number));
        }
        let phone = PhoneNumber::parse(phone_number)?;
        let request = PaymentRequest::new(
            space.total_for(self.duration_hours),
            phone,
            space.space_number.clone(),
            self.duration_hours,
        )?;

        // A previous attempt whose future was dropped mid-flight.
        if self.stage().is_in_flight() {
            self.stage.send_replace(FlowStage::Idle);
        }

        let mut signal = self.cancel.1.clone();
        let outcome = match self.service.initiate(&request, &mut signal, &self.stage).await {
            Ok(outcome) => outcome,
            Err(BookingError::Canceled) => {
                self.cancel = cancel_pair();
                return Err(BookingError::Canceled);
            }
            Err(e) => return Err(e),
        };

        if let PaymentOutcome::Accepted(result) = &outcome {
            self.last_booking = Some(Booking::provisional(
                &space.id,
                &space.space_number,
                request.phone_number.as_str(),
                request.amount,
                request.duration_hours,
                result,
            ));
            self.selected = None;
        }
        Ok(outcome)
    }

    /// Cancels anything still holding this flow's signal and returns the
    /// flow to its initial state.
    pub fn teardown(&mut self) {
        self.cancel.0.cancel();
        self.cancel = cancel_pair();
        self.selected = None;
        self.duration_hours = DEFAULT_DURATION_HOURS;
        self.stage.send_replace(FlowStage::Idle);
    }
}
