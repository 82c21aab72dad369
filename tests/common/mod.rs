#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_payments::config::MpesaConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct GatewayScript {
    pub auth_status: u16,
    pub payment_status: u16,
    pub response_code: String,
    pub response_description: String,
    pub auth_delay: Duration,
    pub payment_delay: Duration,
}

impl Default for GatewayScript {
    fn default() -> Self {
        Self {
            auth_status: 200,
            payment_status: 200,
            response_code: "0".to_string(),
            response_description: "Accepted".to_string(),
            auth_delay: Duration::ZERO,
            payment_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Default)]
pub struct Recorded {
    pub auth_calls: Arc<AtomicUsize>,
    pub payment_calls: Arc<AtomicUsize>,
    pub auth_header: Arc<Mutex<Option<String>>>,
    pub grant_type: Arc<Mutex<Option<String>>>,
    pub payment_auth_header: Arc<Mutex<Option<String>>>,
    pub payment_content_type: Arc<Mutex<Option<String>>>,
    pub payment_body: Arc<Mutex<Option<serde_json::Value>>>,
}

impl Recorded {
    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn payment_calls(&self) -> usize {
        self.payment_calls.load(Ordering::SeqCst)
    }

    pub fn payment_body(&self) -> serde_json::Value {
        self.payment_body.lock().unwrap().clone().unwrap_or_default()
    }
}

#[derive(Clone)]
struct MockGatewayState {
    script: GatewayScript,
    recorded: Recorded,
}

pub struct MockGateway {
    pub addr: SocketAddr,
    pub recorded: Recorded,
}

impl MockGateway {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn_gateway(script: GatewayScript) -> MockGateway {
    let recorded = Recorded::default();
    let state = MockGatewayState {
        script,
        recorded: recorded.clone(),
    };
    let app = Router::new()
        .route("/oauth/v1/generate", get(auth))
        .route("/mpesa/b2b/v1/paymentrequest", post(payment))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockGateway { addr, recorded }
}

async fn auth(
    State(state): State<MockGatewayState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.recorded.auth_calls.fetch_add(1, Ordering::SeqCst);
    *state.recorded.grant_type.lock().unwrap() = query.get("grant_type").cloned();
    *state.recorded.auth_header.lock().unwrap() = header(&headers, "authorization");

    if !state.script.auth_delay.is_zero() {
        tokio::time::sleep(state.script.auth_delay).await;
    }

    let status = StatusCode::from_u16(state.script.auth_status).unwrap();
    if !status.is_success() {
        return (status, Json(serde_json::json!({"errorMessage": "Invalid credentials"}))).into_response();
    }
    (
        status,
        Json(serde_json::json!({"access_token": "tok123", "expires_in": "3599"})),
    )
        .into_response()
}

async fn payment(
    State(state): State<MockGatewayState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.recorded.payment_calls.fetch_add(1, Ordering::SeqCst);
    *state.recorded.payment_auth_header.lock().unwrap() = header(&headers, "authorization");
    *state.recorded.payment_content_type.lock().unwrap() = header(&headers, "content-type");
    *state.recorded.payment_body.lock().unwrap() = Some(body);

    if !state.script.payment_delay.is_zero() {
        tokio::time::sleep(state.script.payment_delay).await;
    }

    let status = StatusCode::from_u16(state.script.payment_status).unwrap();
    if !status.is_success() {
        return (status, Json(serde_json::json!({"errorMessage": "Internal error"}))).into_response();
    }
    (
        status,
        Json(serde_json::json!({
            "OriginatorConversationID": "x",
            "ConversationID": "y",
            "ResponseCode": state.script.response_code,
            "ResponseDescription": state.script.response_description,
        })),
    )
        .into_response()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

pub fn config(base_url: &str) -> MpesaConfig {
    MpesaConfig {
        auth_url: format!("{base_url}/oauth/v1/generate"),
        payment_url: format!("{base_url}/mpesa/b2b/v1/paymentrequest"),
        basic_auth: "c2VjcmV0".to_string(),
        initiator: "api_user".to_string(),
        security_credential: "cred".to_string(),
        command_id: "BusinessBuyGoods".to_string(),
        identifier_type: "4".to_string(),
        short_code: "600000".to_string(),
        till_number: "174379".to_string(),
        queue_timeout_url: "https://parking.test/mpesa/queue".to_string(),
        result_url: "https://parking.test/mpesa/result".to_string(),
        timeout_ms: 2_000,
    }
}
