mod common;

use common::{config, spawn_gateway, GatewayScript};
use parking_payments::catalog::SpaceCatalog;
use parking_payments::gateways::mock::MockBehavior;
use parking_payments::service::payment_service::PaymentService;
use parking_payments::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

async fn spawn_app(service: PaymentService) -> String {
    let state = AppState {
        payment_service: service,
        catalog: Arc::new(RwLock::new(SpaceCatalog::seeded())),
        maps_api_key: Some("maps-key".to_string()),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, parking_payments::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn lists_cities_and_spaces() {
    let base = spawn_app(PaymentService::mock(config("http://unused"), MockBehavior::Accept)).await;
    let client = reqwest::Client::new();

    let cities: serde_json::Value = client
        .get(format!("{base}/cities"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cities.as_array().unwrap().len(), 4);

    let spaces: serde_json::Value = client
        .get(format!("{base}/cities/Mombasa/spaces"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(spaces[0]["space_number"], "M1");
    assert_eq!(spaces[0]["status"], "available");

    let missing = client
        .get(format!("{base}/cities/Atlantis/spaces"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn select_snaps_to_nearby_space() {
    let base = spawn_app(PaymentService::mock(config("http://unused"), MockBehavior::Accept)).await;
    let client = reqwest::Client::new();

    let near: serde_json::Value = client
        .post(format!("{base}/cities/Nairobi/select"))
        .json(&json!({"lat": -1.29205, "lng": 36.8219}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(near["space_number"], "A1");

    let far: serde_json::Value = client
        .post(format!("{base}/cities/Nairobi/select"))
        .json(&json!({"lat": -1.31, "lng": 36.80}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(far["space_number"], "New");
    assert_eq!(far["price_per_hour"], 100);
}

#[tokio::test]
async fn booking_runs_payment_and_marks_space_booked() {
    let gw = spawn_gateway(GatewayScript::default()).await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/bookings"))
        .json(&json!({
            "city": "Nairobi",
            "space_number": "A1",
            "phone_number": "254712345678",
            "duration_hours": 3
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ACCEPTED");
    assert_eq!(body["booking"]["amount"], 300);
    assert_eq!(body["booking"]["payment_status"], "PENDING");
    assert_eq!(gw.recorded.payment_body()["Amount"], "300");

    let again = client
        .post(format!("{base}/bookings"))
        .json(&json!({
            "city": "Nairobi",
            "space_number": "A1",
            "phone_number": "254712345678"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 409);
    let err: serde_json::Value = again.json().await.unwrap();
    assert_eq!(err["error"]["code"], "SPACE_UNAVAILABLE");
}

#[tokio::test]
async fn rejected_booking_surfaces_gateway_description() {
    let gw = spawn_gateway(GatewayScript {
        response_code: "1".to_string(),
        response_description: "Request cancelled by user".to_string(),
        ..GatewayScript::default()
    })
    .await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{base}/bookings"))
        .json(&json!({
            "city": "Mombasa",
            "space_number": "M1",
            "phone_number": "254712345678"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "REJECTED");
    assert_eq!(body["description"], "Request cancelled by user");
}

#[tokio::test]
async fn malformed_phone_is_rejected_before_any_gateway_call() {
    let gw = spawn_gateway(GatewayScript::default()).await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/bookings"))
        .json(&json!({
            "city": "Nairobi",
            "space_number": "A1",
            "phone_number": "0712345678"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(gw.recorded.auth_calls(), 0);
}

#[tokio::test]
async fn auth_failure_maps_to_bad_gateway() {
    let gw = spawn_gateway(GatewayScript {
        auth_status: 500,
        ..GatewayScript::default()
    })
    .await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/bookings"))
        .json(&json!({
            "city": "Nairobi",
            "location": {"lat": -1.31, "lng": 36.80},
            "phone_number": "254712345678"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let err: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "AUTHENTICATION_FAILED");
    assert_eq!(err["error"]["message"], "Failed to get M-Pesa authorization token");
    assert_eq!(gw.recorded.payment_calls(), 0);
}

async fn book_space(client: &reqwest::Client, base: &str, city: &str, number: &str) -> reqwest::Response {
    client
        .post(format!("{base}/bookings"))
        .json(&json!({
            "city": city,
            "space_number": number,
            "phone_number": "254712345678"
        }))
        .send()
        .await
        .unwrap()
}

async fn space_status(client: &reqwest::Client, base: &str, city: &str, number: &str) -> String {
    let spaces: serde_json::Value = client
        .get(format!("{base}/cities/{city}/spaces"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    spaces
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["space_number"] == number)
        .map(|s| s["status"].as_str().unwrap().to_string())
        .unwrap()
}

#[tokio::test]
async fn concurrent_bookings_of_one_space_pay_once() {
    let gw = spawn_gateway(GatewayScript {
        auth_delay: Duration::from_millis(300),
        ..GatewayScript::default()
    })
    .await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;
    let client = reqwest::Client::new();

    let (a, b) = tokio::join!(
        book_space(&client, &base, "Nairobi", "A1"),
        book_space(&client, &base, "Nairobi", "A1"),
    );
    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 409]);
    assert_eq!(gw.recorded.auth_calls(), 1);
    assert_eq!(gw.recorded.payment_calls(), 1);
    assert_eq!(space_status(&client, &base, "Nairobi", "A1").await, "booked");
}

#[tokio::test]
async fn space_is_reserved_while_payment_is_in_flight() {
    let gw = spawn_gateway(GatewayScript {
        auth_delay: Duration::from_millis(500),
        ..GatewayScript::default()
    })
    .await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;
    let client = reqwest::Client::new();

    let pending = tokio::spawn({
        let client = client.clone();
        let base = base.clone();
        async move { book_space(&client, &base, "Mombasa", "M1").await.status() }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(space_status(&client, &base, "Mombasa", "M1").await, "reserved");

    assert_eq!(pending.await.unwrap(), 200);
    assert_eq!(space_status(&client, &base, "Mombasa", "M1").await, "booked");
}

#[tokio::test]
async fn rejected_payment_releases_space() {
    let gw = spawn_gateway(GatewayScript {
        response_code: "1".to_string(),
        response_description: "Insufficient funds".to_string(),
        ..GatewayScript::default()
    })
    .await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;
    let client = reqwest::Client::new();

    let first = book_space(&client, &base, "Nairobi", "A1").await;
    assert_eq!(first.status(), 200);
    assert_eq!(space_status(&client, &base, "Nairobi", "A1").await, "available");

    // Still bookable, so the second attempt reaches the gateway too.
    let second = book_space(&client, &base, "Nairobi", "A1").await;
    assert_eq!(second.status(), 200);
    assert_eq!(gw.recorded.payment_calls(), 2);
}

#[tokio::test]
async fn failed_payment_releases_space() {
    let gw = spawn_gateway(GatewayScript {
        auth_status: 401,
        ..GatewayScript::default()
    })
    .await;
    let base = spawn_app(PaymentService::mpesa(config(&gw.base_url()), reqwest::Client::new())).await;
    let client = reqwest::Client::new();

    let resp = book_space(&client, &base, "Nairobi", "A1").await;
    assert_eq!(resp.status(), 502);
    assert_eq!(space_status(&client, &base, "Nairobi", "A1").await, "available");

    let resp = book_space(&client, &base, "Nairobi", "A1").await;
    assert_eq!(resp.status(), 502);
    assert_eq!(gw.recorded.auth_calls(), 2);
}
