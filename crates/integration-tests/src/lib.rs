//! Integration test harness for the Adire storefront.
//!
//! Each [`TestApp`] runs the real router on an ephemeral port, backed by the
//! in-memory store and a fixed catalog. Paystack and the email API are
//! replaced by a local fake so payments can be staged and sent emails
//! inspected.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p adire-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use hmac::{Hmac, Mac};
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::{Value, json};
use sha2::Sha512;

use adire_core::{Email, Naira};
use adire_storefront::catalog::{Catalog, Product};
use adire_storefront::config::{
    CatalogConfig, EmailConfig, PaystackConfig, StorefrontConfig,
};
use adire_storefront::db::Database;
use adire_storefront::state::AppState;

/// Paystack secret used by every test app.
pub const PAYSTACK_SECRET: &str = "sk_test_9f8e7d6c5b4a3210fedcba98";

/// Account allowed to list orders.
pub const ADMIN_EMAIL: &str = "owner@adire.ng";

/// Where contact messages are forwarded.
pub const STORE_INBOX: &str = "hello@adire.ng";

/// Shared state of the fake Paystack and email API.
#[derive(Clone, Default)]
pub struct FakeProviders {
    transactions: Arc<Mutex<HashMap<String, Value>>>,
    emails: Arc<Mutex<Vec<Value>>>,
    reject_emails: Arc<AtomicBool>,
}

impl FakeProviders {
    /// Stage a successful NGN charge for `reference`.
    pub fn succeed_payment(&self, reference: &str, amount_kobo: i64) {
        self.stage(reference, "success", amount_kobo);
    }

    /// Stage a transaction in any provider state.
    pub fn stage(&self, reference: &str, status: &str, amount_kobo: i64) {
        let transaction = json!({
            "status": status,
            "reference": reference,
            "amount": amount_kobo,
            "currency": "NGN",
            "channel": "card",
        });
        self.transactions
            .lock()
            .expect("transactions lock")
            .insert(reference.to_string(), transaction);
    }

    /// Make the email API answer every send with a 500.
    pub fn reject_emails(&self, reject: bool) {
        self.reject_emails.store(reject, Ordering::SeqCst);
    }

    /// Every email the storefront sent, oldest first.
    #[must_use]
    pub fn sent_emails(&self) -> Vec<Value> {
        self.emails.lock().expect("emails lock").clone()
    }

    async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/transaction/verify/{reference}", get(fake_verify))
            .route("/emails", post(fake_send_email))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake provider");
        let addr = listener.local_addr().expect("fake provider address");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("fake provider stopped");
        });

        format!("http://{addr}")
    }
}

async fn fake_verify(
    State(fake): State<FakeProviders>,
    Path(reference): Path<String>,
) -> (StatusCode, Json<Value>) {
    let transaction = fake
        .transactions
        .lock()
        .expect("transactions lock")
        .get(&reference)
        .cloned();

    match transaction {
        Some(data) => (
            StatusCode::OK,
            Json(json!({ "status": true, "message": "Verification successful", "data": data })),
        ),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": false, "message": "Transaction reference not found" })),
        ),
    }
}

async fn fake_send_email(
    State(fake): State<FakeProviders>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if fake.reject_emails.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Mail provider unavailable" })),
        );
    }

    let mut emails = fake.emails.lock().expect("emails lock");
    emails.push(body);
    (
        StatusCode::OK,
        Json(json!({ "id": format!("email-{}", emails.len()) })),
    )
}

/// A running storefront.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub providers: FakeProviders,
    pub database: Database,
}

impl TestApp {
    /// Start a storefront with a fresh store and cookie jar.
    pub async fn spawn() -> Self {
        let providers = FakeProviders::default();
        let provider_url = providers.spawn().await;

        let config = test_config(&provider_url);
        let database = Database::memory();
        let state = AppState::with_catalog(config, database.clone(), test_catalog())
            .expect("Failed to build app state");
        let app = adire_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr = listener.local_addr().expect("storefront address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("storefront stopped");
        });

        Self {
            address: format!("http://{addr}"),
            client: new_client(),
            providers,
            database,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT failed")
    }

    /// Register and sign in this app's client.
    pub async fn register(&self, email: &str, name: &str) -> Value {
        let response = self
            .post(
                "/api/auth/register",
                &json!({ "email": email, "password": "kampala-indigo-42", "name": name }),
            )
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("register body")
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

fn test_config(provider_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        paystack: PaystackConfig {
            secret_key: SecretString::from(PAYSTACK_SECRET),
            public_key: "pk_test_0123456789abcdef".to_string(),
            base_url: provider_url.to_string(),
        },
        catalog: CatalogConfig::Static(PathBuf::from("unused.json")),
        email: Some(EmailConfig {
            api_key: SecretString::from("re_test_5d1c9a7f3e2b8046"),
            api_url: provider_url.to_string(),
            from: "Adire <orders@adire.ng>".to_string(),
            store_inbox: Some(STORE_INBOX.to_string()),
        }),
        admin_emails: vec![Email::parse(ADMIN_EMAIL).expect("admin email")],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

fn product(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price: Naira::from_whole(price),
        description: None,
        images: vec![format!("https://cdn.adire.ng/products/{id}.jpg")],
    }
}

fn test_catalog() -> Catalog {
    Catalog::from_products(vec![
        product("adire-kaftan", "Adire Kaftan", 10_000),
        product("ankara-tote", "Ankara Tote", 5_000),
    ])
}

/// Hex HMAC-SHA512 of `body` under the test Paystack secret.
#[must_use]
pub fn sign_webhook(body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(PAYSTACK_SECRET.as_bytes()).expect("HMAC accepts any key");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
