use crate::domain::space::{Location, ParkingSpace};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CityView {
    pub name: String,
    pub center: Location,
    pub space_count: usize,
}

pub async fn list_cities(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog.read().await;
    let resp: Vec<CityView> = catalog
        .cities()
        .map(|c| CityView {
            name: c.name.clone(),
            center: c.center,
            space_count: c.spaces.len(),
        })
        .collect();
    (axum::http::StatusCode::OK, Json(resp)).into_response()
}

pub async fn list_spaces(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> impl IntoResponse {
    let catalog = state.catalog.read().await;
    match catalog.city(&city) {
        Some(c) => (axum::http::StatusCode::OK, Json(c.spaces.clone())).into_response(),
        None => not_found(&city),
    }
}

pub async fn select_space(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Json(at): Json<Location>,
) -> impl IntoResponse {
    if !at.is_valid() {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": {"code": "VALIDATION_FAILED", "message": "invalid coordinates"}})),
        )
            .into_response();
    }

    let catalog = state.catalog.read().await;
    match catalog.select_at(&city, at) {
        Some(space) => (axum::http::StatusCode::OK, Json::<ParkingSpace>(space)).into_response(),
        None => not_found(&city),
    }
}

pub async fn maps_config(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({"maps_api_key": state.maps_api_key})),
    )
        .into_response()
}

fn not_found(city: &str) -> axum::response::Response {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": {"code": "NOT_FOUND", "message": format!("unknown city {city}")}})),
    )
        .into_response()
}
