//! Logging initialization and startup configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Payment credentials validation and logging
//! - Startup diagnostics

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::Settings;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs payment-provider configuration at application startup
///
/// Validates and logs:
/// - YK_SHOP_ID / YK_SECRET_KEY presence
/// - PUBLIC_BASE for return-URL construction
/// - OWNER_ID for admin endpoints
pub fn log_payment_configuration(settings: &Settings) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("💳 Payment Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match (&settings.yk_shop_id, &settings.yk_secret_key) {
        (Some(shop_id), Some(_)) => {
            log::info!("✅ YooKassa configured (shop id: {})", shop_id);
            log::info!("   Gem pack purchases are enabled");
        }
        (Some(_), None) => {
            log::warn!("⚠️  YK_SHOP_ID is set but YK_SECRET_KEY is missing");
            log::warn!("   /api/create-payment will answer 500");
        }
        (None, Some(_)) => {
            log::warn!("⚠️  YK_SECRET_KEY is set but YK_SHOP_ID is missing");
            log::warn!("   /api/create-payment will answer 500");
        }
        (None, None) => {
            log::warn!("⚠️  YooKassa not configured - payments disabled");
            log::warn!("   Set YK_SHOP_ID and YK_SECRET_KEY to enable");
        }
    }

    if settings.public_base.is_empty() {
        log::warn!("⚠️  PUBLIC_BASE not set - payment return URL falls back to https://t.me");
    } else {
        log::info!("✅ PUBLIC_BASE: {}", settings.public_base);
    }

    if settings.owner_id == 0 {
        log::warn!("⚠️  OWNER_ID not set - admin endpoints are unusable");
    } else {
        log::info!("✅ OWNER_ID: {}", settings.owner_id);
    }

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
