//! Telegram Mini App integration — init-data authentication

pub mod webapp_auth;

pub use webapp_auth::{extract_user_id, verify_init_data, AuthError};
