//! YooKassa API client for creating redirect-based payments.
//!
//! Calls POST {base}/v3/payments with HTTP Basic auth (shop id + secret
//! key) and a fresh Idempotence-Key per request so the provider can
//! deduplicate transport-level retries.
//! API reference: https://yookassa.ru/developers/api

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config;

const DEFAULT_BASE_URL: &str = "https://api.yookassa.ru";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Provider answered with a client/server error; body kept verbatim.
    #[error("YooKassa returned status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A payment session created at the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPayment {
    /// Provider-assigned payment id.
    pub id: String,
    pub confirmation: Confirmation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Confirmation {
    pub confirmation_url: String,
}

#[derive(Serialize)]
struct PaymentRequest<'a> {
    amount: Amount,
    capture: bool,
    description: &'a str,
    confirmation: ConfirmationRequest<'a>,
    metadata: &'a Value,
}

#[derive(Serialize)]
struct Amount {
    value: String,
    currency: &'static str,
}

#[derive(Serialize)]
struct ConfirmationRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    return_url: &'a str,
}

/// YooKassa client bound to one shop's credentials.
#[derive(Clone)]
pub struct YooKassa {
    http: reqwest::Client,
    base_url: String,
    shop_id: String,
    secret_key: String,
}

impl YooKassa {
    pub fn new(shop_id: String, secret_key: String) -> Result<Self, GatewayError> {
        Self::with_base_url(shop_id, secret_key, DEFAULT_BASE_URL.to_string())
    }

    /// Client against a non-default API host (tests point this at a mock).
    pub fn with_base_url(
        shop_id: String,
        secret_key: String,
        base_url: String,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            shop_id,
            secret_key,
        })
    }

    /// Creates a redirect payment for `amount_rub` rubles.
    ///
    /// The amount is rendered in YooKassa's major-unit decimal form with
    /// exactly two fractional digits ("99.00"). `metadata` is echoed back
    /// by the provider in webhook events.
    pub async fn create_payment(
        &self,
        amount_rub: u64,
        description: &str,
        metadata: &Value,
        return_url: &str,
    ) -> Result<CreatedPayment, GatewayError> {
        let idempotence_key = Uuid::new_v4().to_string();

        let payload = PaymentRequest {
            amount: Amount {
                value: format!("{}.00", amount_rub),
                currency: "RUB",
            },
            capture: true,
            description,
            confirmation: ConfirmationRequest {
                kind: "redirect",
                return_url,
            },
            metadata,
        };

        let response = self
            .http
            .post(format!("{}/v3/payments", self.base_url))
            .basic_auth(&self.shop_id, Some(&self.secret_key))
            .header("Idempotence-Key", &idempotence_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            log::error!("YooKassa payment creation failed: {} {}", status, body);
            return Err(GatewayError::Api { status, body });
        }

        let created: CreatedPayment = response.json().await?;
        log::info!(
            "Created YooKassa payment {} ({} RUB, idempotence key {})",
            created.id,
            amount_rub,
            idempotence_key
        );
        Ok(created)
    }
}
