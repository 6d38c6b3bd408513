//! Shared helpers for integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use serde_json::Value;
use sha2::Sha256;

use tamagocho_backend::ledger::Ledger;
use tamagocho_backend::payments::{PaymentService, YooKassa};
use tamagocho_backend::webapp::{create_router, AppState};

type HmacSha256 = Hmac<Sha256>;

pub const BOT_TOKEN: &str = "123456:integration-test-token";
pub const OWNER_ID: i64 = 999;

/// Builds a router with a fresh ledger and no payment gateway.
pub fn test_router() -> Router {
    test_router_with_gateway(None)
}

/// Builds a router whose payment service talks to `gateway` (a wiremock
/// double in tests that exercise payment creation).
pub fn test_router_with_gateway(gateway: Option<YooKassa>) -> Router {
    let ledger = Ledger::new();
    let payments = PaymentService::new(gateway, "https://t.me".to_string(), ledger.clone());
    create_router(AppState {
        ledger,
        payments,
        bot_token: BOT_TOKEN.to_string(),
        owner_id: OWNER_ID,
    })
}

/// Produces a correctly signed init-data string, the same way Telegram
/// signs Mini App launch payloads.
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let mut sorted: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    sorted.sort();

    let data_check_string = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut secret_key_mac = HmacSha256::new_from_slice(b"WebAppData").unwrap();
    secret_key_mac.update(bot_token.as_bytes());
    let secret_key = secret_key_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).unwrap();
    mac.update(data_check_string.as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                k,
                url::form_urlencoded::byte_serialize(v.as_bytes()).collect::<String>()
            )
        })
        .collect();
    encoded.push(format!("hash={}", hash));
    encoded.join("&")
}

/// Signed init data for a plain user with the given id.
pub fn init_data_for(uid: i64) -> String {
    let user = format!(r#"{{"id":{},"first_name":"Test"}}"#, uid);
    sign_init_data(&[("user", &user), ("auth_date", "1700000000")], BOT_TOKEN)
}

/// POST request with a JSON body and optional init-data header.
pub fn post_json(path: &str, init_data: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(init_data) = init_data {
        builder = builder.header("x-telegram-init-data", init_data);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
