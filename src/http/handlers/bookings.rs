use crate::domain::booking::Booking;
use crate::domain::payment::{ErrorEnvelope, PaymentOutcome};
use crate::catalog::SpaceReservation;
use crate::domain::space::Location;
use crate::error::BookingError;
use crate::service::booking_flow::BookingFlow;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub city: String,
    pub space_number: Option<String>,
    pub location: Option<Location>,
    pub phone_number: String,
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateBookingResponse {
    Accepted { booking: Booking, description: String },
    Rejected { response_code: String, description: String },
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> impl IntoResponse {
    match book(&state, req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

async fn book(
    state: &AppState,
    req: CreateBookingRequest,
) -> Result<CreateBookingResponse, (StatusCode, ErrorEnvelope)> {
    let mut flow = BookingFlow::new(state.payment_service.clone());
    if let Some(hours) = req.duration_hours {
        flow.set_duration(hours).map_err(|e| reject(&e))?;
    }

    // Resolve and reserve under one write lock so two requests cannot both
    // see the space as available.
    let (space, reservation) = {
        let mut catalog = state.catalog.write().await;
        if catalog.city(&req.city).is_none() {
            return Err(not_found(format!("unknown city {}", req.city)));
        }
        let space = match (&req.space_number, req.location) {
            (Some(number), _) => catalog
                .find_space(&req.city, number)
                .cloned()
                .ok_or_else(|| not_found(format!("unknown parking space {number}")))?,
            (None, Some(at)) if at.is_valid() => catalog
                .select_at(&req.city, at)
                .ok_or_else(|| not_found(format!("unknown city {}", req.city)))?,
            _ => {
                return Err(reject(&BookingError::Validation(
                    "space_number or a valid location is required".to_string(),
                )))
            }
        };
        let reservation = if catalog.is_listed(&req.city, &space.id) {
            catalog.reserve(&req.city, &space.id).map_err(|e| reject(&e))?;
            Some(SpaceReservation::held(state.catalog.clone(), &req.city, &space.id))
        } else {
            None
        };
        (space, reservation)
    };

    flow.select_space(space);
    let outcome = flow.pay(&req.phone_number).await;
    flow.teardown();

    match outcome {
        Ok(PaymentOutcome::Accepted(result)) => {
            if let Some(r) = reservation {
                r.confirm().await;
            }
            let booking = flow
                .last_booking()
                .cloned()
                .ok_or_else(|| reject(&BookingError::PaymentInitiation))?;
            Ok(CreateBookingResponse::Accepted {
                booking,
                description: result.response_description,
            })
        }
        Ok(PaymentOutcome::Rejected(result)) => {
            if let Some(r) = reservation {
                r.release().await;
            }
            Ok(CreateBookingResponse::Rejected {
                response_code: result.response_code,
                description: result.response_description,
            })
        }
        Err(e) => {
            if let Some(r) = reservation {
                r.release().await;
            }
            Err(reject(&e))
        }
    }
}

pub fn status_for(e: &BookingError) -> StatusCode {
    match e {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::SpaceUnavailable(_) => StatusCode::CONFLICT,
        BookingError::Authentication | BookingError::PaymentInitiation => StatusCode::BAD_GATEWAY,
        // Only reachable when a flow is driven with its cancel handle.
        BookingError::Canceled => StatusCode::REQUEST_TIMEOUT,
    }
}

fn reject(e: &BookingError) -> (StatusCode, ErrorEnvelope) {
    (status_for(e), ErrorEnvelope::from(e))
}

fn not_found(message: String) -> (StatusCode, ErrorEnvelope) {
    (
        StatusCode::NOT_FOUND,
        ErrorEnvelope {
            error: crate::domain::payment::ErrorPayload {
                code: "NOT_FOUND".to_string(),
                message,
                details: None,
            },
        },
    )
}
