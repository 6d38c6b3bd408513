//! YooKassa client and payment round-trip tests against a mock provider.
//!
//! Run with: cargo test --test gateway_test

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tamagocho_backend::ledger::Ledger;
use tamagocho_backend::payments::{GatewayError, PaymentService, PaymentStatus, YooKassa};

use common::{body_json, init_data_for, post_json, test_router_with_gateway};

fn yookassa_for(server: &MockServer) -> YooKassa {
    YooKassa::with_base_url(
        "shop-123".to_string(),
        "secret-key".to_string(),
        server.uri(),
    )
    .unwrap()
}

fn created_payment_body(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "status": "pending",
        "amount": {"value": "99.00", "currency": "RUB"},
        "confirmation": {
            "type": "redirect",
            "confirmation_url": format!("https://yookassa.example/confirm/{}", id)
        }
    })
}

#[tokio::test]
async fn test_create_payment_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(header_exists("Idempotence-Key"))
        .and(header_exists("Authorization"))
        .and(body_partial_json(json!({
            "amount": {"value": "99.00", "currency": "RUB"},
            "capture": true,
            "confirmation": {"type": "redirect", "return_url": "https://t.me"},
            "metadata": {"uid": 42, "pack_id": "gems_100"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_payment_body("pay_42")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = yookassa_for(&server);
    let created = gateway
        .create_payment(
            99,
            "Tamagocho: 100 Gems",
            &json!({"uid": 42, "pack_id": "gems_100"}),
            "https://t.me",
        )
        .await
        .unwrap();

    assert_eq!(created.id, "pay_42");
    assert_eq!(
        created.confirmation.confirmation_url,
        "https://yookassa.example/confirm/pay_42"
    );
}

#[tokio::test]
async fn test_create_payment_provider_error_is_propagated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"type": "error", "code": "invalid_credentials"})),
        )
        .mount(&server)
        .await;

    let gateway = yookassa_for(&server);
    let err = gateway
        .create_payment(99, "desc", &json!({}), "https://t.me")
        .await
        .unwrap_err();

    match err {
        GatewayError::Api { status, body } => {
            assert_eq!(status.as_u16(), 401);
            assert!(body.contains("invalid_credentials"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_payment_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_payment_body("pay_rt")))
        .mount(&server)
        .await;

    let ledger = Ledger::new();
    let payments = PaymentService::new(
        Some(yookassa_for(&server)),
        "https://t.me".to_string(),
        ledger.clone(),
    );

    // Create: record is pending, ledger untouched.
    let requested = payments.request_payment(42, "gems_100").await.unwrap();
    assert_eq!(requested.payment_id, "pay_rt");

    let view = payments.check_status("pay_rt").await.unwrap();
    assert_eq!(view.status, PaymentStatus::Pending);
    assert_eq!(view.gems, 0);

    // Webhook arrives: succeeded, credited once even when redelivered.
    let event = json!({
        "event": "payment.succeeded",
        "object": {
            "id": "pay_rt",
            "metadata": {"uid": 42, "pack_id": "gems_100"}
        }
    });
    payments.on_provider_event(&event).await;
    payments.on_provider_event(&event).await;

    let view = payments.check_status("pay_rt").await.unwrap();
    assert_eq!(view.status, PaymentStatus::Succeeded);
    assert_eq!(view.gems, 100);

    let (gems, _) = ledger.balance(42).await;
    assert_eq!(gems, 100);
}

#[tokio::test]
async fn test_create_payment_defaults_to_gems_100_pack() {
    let server = MockServer::start().await;

    // The mock only matches a gems_100 creation (99.00 RUB); a request for
    // any other pack would miss it and fail the expect(1) check.
    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .and(body_partial_json(json!({
            "amount": {"value": "99.00", "currency": "RUB"},
            "metadata": {"uid": 42, "pack_id": "gems_100"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_payment_body("pay_default")))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_router_with_gateway(Some(yookassa_for(&server)));

    // No `pack` field in the body at all.
    let response = app
        .oneshot(post_json(
            "/api/create-payment",
            Some(&init_data_for(42)),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["payment_id"], "pay_default");
}

#[tokio::test]
async fn test_gateway_failure_leaves_no_record() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let ledger = Ledger::new();
    let payments = PaymentService::new(
        Some(yookassa_for(&server)),
        "https://t.me".to_string(),
        ledger.clone(),
    );

    assert!(payments.request_payment(42, "gems_100").await.is_err());

    // No phantom record, no phantom gems.
    let (gems, _) = ledger.balance(42).await;
    assert_eq!(gems, 0);
}

#[tokio::test]
async fn test_create_payment_endpoint_with_mock_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_payment_body("pay_api")))
        .mount(&server)
        .await;

    let app = test_router_with_gateway(Some(yookassa_for(&server)));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/create-payment",
            Some(&init_data_for(42)),
            json!({"pack": "gems_100"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["payment_id"], "pay_api");
    assert_eq!(
        body["confirmation_url"],
        "https://yookassa.example/confirm/pay_api"
    );

    // Immediately after creation the payment reads as pending.
    let response = app
        .oneshot(post_json(
            "/api/check-payment",
            None,
            json!({"payment_id": "pay_api"}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["gems"], 0);
}
