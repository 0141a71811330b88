//! Checkout and payment-retry flow tests.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use lustre_integration_tests::{TestApp, Visitor, notifications, wishlist_item};
use serde_json::{Value, json};

async fn at_payment_stage(shopper: &mut Visitor) {
    let (status, _) = shopper.post_empty("/checkout/advance").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = shopper.post_empty("/checkout/advance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "payment");
}

async fn pay(shopper: &mut Visitor) -> Value {
    let (status, body) = shopper
        .post(
            "/checkout/pay",
            json!({"amount": "1249.00", "description": "Solitaire ring"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn gateway_fails(shopper: &mut Visitor, body: &Value, message: &str) -> Value {
    let reference = body["reference"].as_str().unwrap();
    let (status, body) = shopper
        .get(&format!(
            "/checkout/return?reference={reference}&status=failure&message={message}"
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn test_successful_payment() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();
    at_payment_stage(&mut shopper).await;

    let body = pay(&mut shopper).await;
    assert_eq!(body["status"], "processing");
    let redirect = body["redirect_url"].as_str().unwrap();
    assert!(redirect.starts_with("https://pay.example.com/hosted?"));
    assert!(redirect.contains("amount=1249.00"));

    let reference = body["reference"].as_str().unwrap();
    let (status, body) = shopper
        .get(&format!("/checkout/return?reference={reference}&status=success"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["retry_count"], 0);
    assert_eq!(notifications(&body), vec!["Payment successful"]);

    let (status, _) = shopper.post_empty("/checkout/back").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_three_failures_remove_retry() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();
    at_payment_stage(&mut shopper).await;

    let mut body = pay(&mut shopper).await;
    body = gateway_fails(&mut shopper, &body, "Card%20declined").await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["retry_count"], 1);
    assert_eq!(body["last_error"], "Card declined");
    assert_eq!(body["actions"]["retry"], true);

    for expected in [2, 3] {
        let (status, retried) = shopper.post_empty("/checkout/retry").await;
        assert_eq!(status, StatusCode::OK, "{retried}");
        assert_eq!(retried["status"], "processing");
        assert_ne!(retried["reference"], body["reference"]);
        body = gateway_fails(&mut shopper, &retried, "Insufficient%20funds").await;
        assert_eq!(body["retry_count"], expected);
    }

    assert_eq!(body["actions"]["retry"], false);
    assert_eq!(body["actions"]["back_to_checkout"], true);
    assert_eq!(body["retries_remaining"], 0);
    assert_eq!(notifications(&body).len(), 2);

    let (status, rejected) = shopper.post_empty("/checkout/retry").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(rejected["error"].as_str().unwrap().contains("no longer available"));

    let (status, body) = shopper.post_empty("/checkout/back-to-checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
    assert_eq!(body["retry_count"], 3);
    assert_eq!(body["actions"]["pay"], true);
}

#[tokio::test]
async fn test_return_with_stale_reference_rejected() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();
    at_payment_stage(&mut shopper).await;
    let first = pay(&mut shopper).await;
    gateway_fails(&mut shopper, &first, "declined").await;
    shopper.post_empty("/checkout/retry").await;

    let stale = first["reference"].as_str().unwrap();
    let (status, _) = shopper
        .get(&format!("/checkout/return?reference={stale}&status=success"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = shopper.get("/checkout").await;
    assert_eq!(body["status"], "processing");
}

#[tokio::test]
async fn test_pay_requires_payment_stage() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();

    let (status, body) = shopper
        .post(
            "/checkout/pay",
            json!({"amount": "10.00", "description": "Chain"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("cart"));
}

#[tokio::test]
async fn test_pay_rejects_invalid_amount_without_state_change() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();
    at_payment_stage(&mut shopper).await;

    let (status, _) = shopper
        .post(
            "/checkout/pay",
            json!({"amount": "0", "description": "Chain"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shopper
        .post(
            "/checkout/pay",
            json!({"amount": "10.00", "currency": "EUR", "description": "Chain"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = shopper.get("/checkout").await;
    assert_eq!(body["status"], "idle");
}

#[tokio::test]
async fn test_restart_clears_session() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();
    at_payment_stage(&mut shopper).await;
    let body = pay(&mut shopper).await;
    gateway_fails(&mut shopper, &body, "declined").await;

    let (status, body) = shopper.post_empty("/checkout/restart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "cart");
    assert_eq!(body["status"], "idle");
    assert_eq!(body["retry_count"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_advances_apply_in_turn() {
    let app = TestApp::spawn().await;
    let mut shopper = app.visitor();
    // Any saved change issues the session cookie.
    shopper
        .post("/wishlist", wishlist_item(1, "Ring", "100.00", "100.00"))
        .await;

    let first = {
        let mut tab = shopper.clone();
        tokio::spawn(async move { tab.post_empty("/checkout/advance").await })
    };
    let second = {
        let mut tab = shopper.clone();
        tokio::spawn(async move { tab.post_empty("/checkout/advance").await })
    };
    assert_eq!(first.await.unwrap().0, StatusCode::OK);
    assert_eq!(second.await.unwrap().0, StatusCode::OK);

    let (_, body) = shopper.get("/checkout").await;
    assert_eq!(body["stage"], "payment");
}
