use anyhow::Result;
use dotenvy::dotenv;

use tamagocho_backend::core::{config::Settings, init_logger, log_payment_configuration};
use tamagocho_backend::ledger::Ledger;
use tamagocho_backend::payments::{PaymentService, YooKassa};
use tamagocho_backend::webapp::{run_server, AppState};

/// Main entry point for the Mini App backend
///
/// # Errors
/// Returns an error if initialization fails (logging, config, socket bind).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger("tamagocho-backend.log")?;

    let settings = Settings::from_env()?;
    log_payment_configuration(&settings);

    let gateway = match (&settings.yk_shop_id, &settings.yk_secret_key) {
        (Some(shop_id), Some(secret_key)) => {
            Some(YooKassa::new(shop_id.clone(), secret_key.clone())?)
        }
        _ => None,
    };

    let ledger = Ledger::new();
    let payments = PaymentService::new(gateway, settings.return_url(), ledger.clone());

    let state = AppState {
        ledger,
        payments,
        bot_token: settings.bot_token.clone(),
        owner_id: settings.owner_id,
    };

    run_server(&settings, state).await
}
