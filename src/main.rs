use parking_payments::catalog::SpaceCatalog;
use parking_payments::config::AppConfig;
use parking_payments::gateways::mock::MockBehavior;
use parking_payments::service::payment_service::PaymentService;
use parking_payments::AppState;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let payment_service = match cfg.mock_behavior.as_deref() {
        Some(behavior) => {
            tracing::warn!(behavior, "using mock M-Pesa gateway");
            PaymentService::mock(cfg.mpesa.clone(), MockBehavior::parse(behavior))
        }
        None => {
            cfg.mpesa.validate()?;
            PaymentService::mpesa(cfg.mpesa.clone(), reqwest::Client::new())
        }
    };

    let state = AppState {
        payment_service,
        catalog: Arc::new(RwLock::new(SpaceCatalog::seeded())),
        maps_api_key: cfg.maps_api_key.clone(),
    };

    let app = parking_payments::router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
