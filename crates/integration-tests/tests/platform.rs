//! Health checks, security headers, catalog and webhooks.

#![allow(clippy::unwrap_used)]

use adire_integration_tests::{TestApp, sign_webhook};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_health_and_headers() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");

    assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_and_shipping() {
    let app = TestApp::spawn().await;

    let products: Value = app.get("/api/products").await.json().await.unwrap();
    assert_eq!(products.as_array().unwrap().len(), 2);

    let response = app.get("/api/products/adire-kaftan").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.get("/api/products/missing").await.status(), StatusCode::NOT_FOUND);

    let rates: Value = app
        .get("/api/shipping?type=international")
        .await
        .json()
        .await
        .unwrap();
    assert!(
        rates
            .as_array()
            .unwrap()
            .iter()
            .all(|rate| rate["location_type"] == "international")
    );
    assert_eq!(
        app.get("/api/shipping?type=orbital").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_webhook_signature_checked() {
    let app = TestApp::spawn().await;
    let body = serde_json::to_vec(&json!({
        "event": "charge.success",
        "data": {
            "status": "success",
            "reference": "REF-ORPHAN",
            "amount": 3_050_000,
            "currency": "NGN",
        },
    }))
    .unwrap();

    let response = app
        .client
        .post(app.url("/api/webhooks/paystack"))
        .header("content-type", "application/json")
        .header("x-paystack-signature", "00")
        .body(body.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .post(app.url("/api/webhooks/paystack"))
        .header("content-type", "application/json")
        .header("x-paystack-signature", sign_webhook(&body))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["received"], true);

    assert!(app.database.orders().list_recent(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_accepts_other_signed_events() {
    let app = TestApp::spawn().await;
    let body = serde_json::to_vec(&json!({
        "event": "refund.processed",
        "data": {
            "transaction_reference": "REF-X",
            "amount": 500_000,
            "status": "processed",
        },
    }))
    .unwrap();

    let response = app
        .client
        .post(app.url("/api/webhooks/paystack"))
        .header("content-type", "application/json")
        .header("x-paystack-signature", sign_webhook(&body))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["received"], true);
}
