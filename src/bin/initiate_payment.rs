use anyhow::{bail, Context, Result};
use parking_payments::config::AppConfig;
use parking_payments::domain::payment::{PaymentOutcome, PaymentRequest, PhoneNumber};
use parking_payments::service::payment_service::PaymentService;
use tracing_subscriber::EnvFilter;

// usage: initiate_payment <amount> <phone> <space_reference> [duration_hours]
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!("usage: initiate_payment <amount> <phone> <space_reference> [duration_hours]");
    }
    let amount = args[0].parse::<u64>().context("amount must be a whole number")?;
    let phone = PhoneNumber::parse(&args[1])?;
    let duration = match args.get(3) {
        Some(raw) => raw.parse::<u32>().context("duration must be a whole number of hours")?,
        None => 1,
    };
    let request = PaymentRequest::new(amount, phone, args[2].clone(), duration)?;

    let cfg = AppConfig::from_env();
    cfg.mpesa.validate()?;
    let service = PaymentService::mpesa(cfg.mpesa, reqwest::Client::new());

    match service.initiate_payment(&request).await? {
        PaymentOutcome::Accepted(r) => {
            println!(
                "accepted: {} (originator={}, conversation={})",
                r.response_description, r.originator_conversation_id, r.conversation_id
            );
        }
        PaymentOutcome::Rejected(r) => {
            println!("rejected [{}]: {}", r.response_code, r.response_description);
        }
    }
    Ok(())
}
