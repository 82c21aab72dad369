pub mod catalog;
pub mod config;
pub mod domain {
    pub mod booking;
    pub mod payment;
    pub mod space;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod bookings;
        pub mod ops;
        pub mod spaces;
    }
}
pub mod service {
    pub mod booking_flow;
    pub mod cancel;
    pub mod payment_service;
}

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub catalog: Arc<RwLock<catalog::SpaceCatalog>>,
    pub maps_api_key: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::ops::health))
        .route("/ops/liveness", get(http::handlers::ops::liveness))
        .route("/config/maps", get(http::handlers::spaces::maps_config))
        .route("/cities", get(http::handlers::spaces::list_cities))
        .route("/cities/:city/spaces", get(http::handlers::spaces::list_spaces))
        .route("/cities/:city/select", post(http::handlers::spaces::select_space))
        .route("/bookings", post(http::handlers::bookings::create_booking))
        .with_state(state)
}
