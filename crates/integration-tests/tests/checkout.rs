//! Cart, checkout and payment callback flows.

#![allow(clippy::unwrap_used)]

use adire_integration_tests::TestApp;
use adire_storefront::db::Database;
use reqwest::StatusCode;
use serde_json::{Value, json};

fn amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().expect("numeric string"),
        other => other.as_f64().expect("number"),
    }
}

async fn fill_cart(app: &TestApp) {
    let response = app
        .post("/api/cart/add", &json!({ "product_id": "adire-kaftan", "quantity": 2 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cart: Value = app
        .post("/api/cart/add", &json!({ "product_id": "ankara-tote" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 3);
    assert!((amount(&cart["total"]) - 25_000.0).abs() < f64::EPSILON);
}

async fn complete_details(app: &TestApp) -> Value {
    let response = app
        .put(
            "/api/checkout",
            &json!({
                "country": "Nigeria",
                "state": "FCT",
                "address": "14 Aminu Kano Crescent, Wuse II",
                "phone": "+2348031234567",
                "location_type": "domestic",
                "location_id": "abuja",
                "policy_agreed": true,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_paid_checkout_creates_order_and_empties_cart() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", "Ada Obi").await;
    fill_cart(&app).await;

    let summary = complete_details(&app).await;
    assert_eq!(summary["phase"], "ready");
    assert!((amount(&summary["shipping_fee"]) - 5_500.0).abs() < f64::EPSILON);
    assert!((amount(&summary["total"]) - 30_500.0).abs() < f64::EPSILON);
    assert_eq!(summary["prompts"], json!([]));

    let payment: Value = app
        .post("/api/checkout/payment", &json!({ "reference": "REF123" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(payment["reference"], "REF123");
    assert_eq!(payment["amount"], 3_050_000);
    assert_eq!(payment["widget"]["currency"], "NGN");
    assert_eq!(payment["widget"]["email"], "ada@example.com");

    app.providers.succeed_payment("REF123", 3_050_000);

    let response = app
        .post("/api/checkout/callback", &json!({ "reference": "REF123" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    let order = &body["order"];
    assert_eq!(order["payment_reference"], "REF123");
    assert!((amount(&order["total_amount"]) - 30_500.0).abs() < f64::EPSILON);
    assert_eq!(order["customer_email"], "ada@example.com");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"]["phase"], "paid");

    let cart: Value = app.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["lines"], json!([]));
    assert_eq!(cart["item_count"], 0);

    let orders = app.database.orders().list_recent(10, 0).await.unwrap();
    assert_eq!(orders.len(), 1);

    let confirmations: Vec<Value> = app
        .providers
        .sent_emails()
        .into_iter()
        .filter(|email| email["subject"].as_str().unwrap_or_default().contains("REF123"))
        .collect();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0]["to"], json!(["ada@example.com"]));
}

#[tokio::test]
async fn test_replayed_callback_returns_same_order() {
    let app = TestApp::spawn().await;
    app.register("tunde@example.com", "Tunde Bello").await;
    fill_cart(&app).await;
    complete_details(&app).await;

    app.post("/api/checkout/payment", &json!({ "reference": "REF-REPLAY" }))
        .await;
    app.providers.succeed_payment("REF-REPLAY", 3_050_000);

    let first: Value = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-REPLAY" }))
        .await
        .json()
        .await
        .unwrap();
    let second = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-REPLAY" }))
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second: Value = second.json().await.unwrap();

    assert_eq!(first["order"]["id"], second["order"]["id"]);
    assert_eq!(app.database.orders().list_recent(10, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_order_write_reports_reference_and_keeps_cart() {
    let app = TestApp::spawn().await;
    app.register("bisi@example.com", "Bisi Ade").await;
    fill_cart(&app).await;
    complete_details(&app).await;

    app.post("/api/checkout/payment", &json!({ "reference": "REF-NOSAVE" }))
        .await;
    app.providers.succeed_payment("REF-NOSAVE", 3_050_000);

    let Database::Memory(store) = &app.database else {
        unreachable!("test app uses the in-memory store")
    };
    store.set_read_only(true);

    let response = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-NOSAVE" }))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("REF-NOSAVE"));
    assert!(message.contains("contact support"));
    assert!(body.get("order").is_none());

    store.set_read_only(false);

    let cart: Value = app.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 3);
    let summary: Value = app.get("/api/checkout").await.json().await.unwrap();
    assert_eq!(summary["phase"], "processing");
    assert!(app.database.orders().list_recent(10, 0).await.unwrap().is_empty());
    assert!(app.providers.sent_emails().iter().all(|email| {
        !email["subject"].as_str().unwrap_or_default().contains("REF-NOSAVE")
    }));
}

#[tokio::test]
async fn test_confirmation_email_failure_still_completes_order() {
    let app = TestApp::spawn().await;
    app.register("ngozi@example.com", "Ngozi Okafor").await;
    fill_cart(&app).await;
    complete_details(&app).await;

    app.post("/api/checkout/payment", &json!({ "reference": "REF-NOMAIL" }))
        .await;
    app.providers.succeed_payment("REF-NOMAIL", 3_050_000);
    app.providers.reject_emails(true);

    let response = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-NOMAIL" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["order"]["payment_reference"], "REF-NOMAIL");
    assert_eq!(body["summary"]["phase"], "paid");

    let orders = app.database.orders().list_recent(10, 0).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].payment_reference, "REF-NOMAIL");

    let cart: Value = app.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_cancel_returns_processing_checkout_to_ready() {
    let app = TestApp::spawn().await;
    app.register("kemi@example.com", "Kemi Lawal").await;
    fill_cart(&app).await;
    complete_details(&app).await;

    app.post("/api/checkout/payment", &json!({ "reference": "REF-CLOSED" }))
        .await;
    let summary: Value = app.get("/api/checkout").await.json().await.unwrap();
    assert_eq!(summary["phase"], "processing");

    let response = app.post("/api/checkout/cancel", &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["phase"], "ready");

    app.providers.succeed_payment("REF-CLOSED", 3_050_000);
    let response = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-CLOSED" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(app.database.orders().list_recent(10, 0).await.unwrap().is_empty());

    let cart: Value = app.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 3);
}

#[tokio::test]
async fn test_unverified_payment_keeps_cart() {
    let app = TestApp::spawn().await;
    app.register("chioma@example.com", "Chioma Eze").await;
    fill_cart(&app).await;
    complete_details(&app).await;

    app.post("/api/checkout/payment", &json!({ "reference": "REF-FAILED" }))
        .await;
    app.providers.stage("REF-FAILED", "failed", 3_050_000);

    let response = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-FAILED" }))
        .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let cart: Value = app.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 3);
    assert!(app.database.orders().list_recent(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_underpaid_transaction_is_rejected() {
    let app = TestApp::spawn().await;
    app.register("emeka@example.com", "Emeka Nwosu").await;
    fill_cart(&app).await;
    complete_details(&app).await;

    app.post("/api/checkout/payment", &json!({ "reference": "REF-SHORT" }))
        .await;
    app.providers.succeed_payment("REF-SHORT", 100);

    let response = app
        .post("/api/checkout/callback", &json!({ "reference": "REF-SHORT" }))
        .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert!(app.database.orders().list_recent(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_lists_prompts_for_guest() {
    let app = TestApp::spawn().await;

    let summary: Value = app.get("/api/checkout").await.json().await.unwrap();
    assert_eq!(summary["phase"], "incomplete");
    let prompts = summary["prompts"].as_array().unwrap();
    assert_eq!(prompts[0], "Please sign in to continue");
    assert!(prompts.contains(&json!("Your cart is empty")));
    assert!(prompts.contains(&json!("Please select a shipping location")));

    let response = app.post("/api/checkout/payment", &json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please sign in to continue");

    let response = app
        .post("/api/checkout/payment", &json!({ "reference": "bad ref!" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_changing_location_type_clears_selection() {
    let app = TestApp::spawn().await;

    app.put(
        "/api/checkout",
        &json!({ "location_type": "domestic", "location_id": "lagos-island" }),
    )
    .await;
    let summary: Value = app
        .put("/api/checkout", &json!({ "location_type": "international" }))
        .await
        .json()
        .await
        .unwrap();

    assert!(amount(&summary["shipping_fee"]).abs() < f64::EPSILON);
    assert!(
        summary["prompts"]
            .as_array()
            .unwrap()
            .contains(&json!("Please select a shipping location"))
    );

    let response = app
        .put("/api/checkout", &json!({ "location_id": "abuja" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_quantity_controls() {
    let app = TestApp::spawn().await;

    app.post("/api/cart/add", &json!({ "product_id": "ankara-tote" }))
        .await;
    app.post("/api/cart/increment", &json!({ "id": "ankara-tote" }))
        .await;
    let cart: Value = app
        .post("/api/cart/decrement", &json!({ "id": "ankara-tote" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 1);

    let cart: Value = app
        .post("/api/cart/decrement", &json!({ "id": "ankara-tote" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 1);

    let response = app
        .post("/api/cart/add", &json!({ "product_id": "no-such-thing" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let cart: Value = app
        .post("/api/cart/remove", &json!({ "id": "ankara-tote" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cart["lines"], json!([]));
}
