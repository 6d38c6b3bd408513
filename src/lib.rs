//! Tamagocho backend - Telegram Mini App game-economy service
//!
//! This library provides all the core functionality for the Tamagocho
//! Mini App backend: init-data authentication, the in-memory gem ledger,
//! YooKassa payment integration, and the HTTP API.
//!
//! # Module Structure
//!
//! - `core`: Configuration and logging
//! - `telegram`: Mini App init-data verification
//! - `catalog`: Static gem-pack and premium-item reference data
//! - `ledger`: Per-user balance and inventory store
//! - `payments`: YooKassa client and payment reconciliation
//! - `webapp`: axum HTTP surface

pub mod catalog;
pub mod core;
pub mod ledger;
pub mod payments;
pub mod telegram;
pub mod webapp;

// Re-export commonly used types for convenience
pub use core::{config, Settings};
pub use ledger::{Ledger, Purchase};
pub use payments::{PaymentService, PaymentStatus, YooKassa};
pub use webapp::{create_router, run_server, AppState};
