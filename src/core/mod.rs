//! Core utilities, configuration, and common functionality

pub mod config;
pub mod logging;

// Re-exports for convenience
pub use config::Settings;
pub use logging::{init_logger, log_payment_configuration};
