//! Transactional email over an HTTP email API.
//!
//! One JSON `POST {api_url}/emails` per message (Resend-compatible), with
//! bodies rendered from Askama HTML and plain-text templates.

use std::time::Duration;

use askama::Template;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use adire_core::{CartLine, ContactMessage, Email, Order};

use crate::config::EmailConfig;

/// HTML template for the order confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a Order,
    items: &'a [CartLine],
}

/// Plain text template for the order confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order: &'a Order,
    items: &'a [CartLine],
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: Option<&'a str>,
    store_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: Option<&'a str>,
    store_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactHtml<'a> {
    message: &'a ContactMessage,
}

#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactText<'a> {
    message: &'a ContactMessage,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailDeliveryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email API rejected the message.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// No email API key configured.
    #[error("email delivery is not configured")]
    NotConfigured,

    /// No store inbox configured for contact forwarding.
    #[error("store inbox is not configured")]
    NoInbox,
}

#[derive(Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Client for sending transactional emails.
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    from: String,
    store_inbox: Option<String>,
    store_url: String,
}

impl EmailClient {
    /// Create a new email client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &EmailConfig, store_url: &str) -> Result<Self, EmailDeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_url),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            store_inbox: config.store_inbox.clone(),
            store_url: store_url.to_string(),
        })
    }

    /// Send the confirmation for a persisted order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailDeliveryError> {
        let items = order.items.as_slice();
        let html = OrderConfirmationHtml { order, items }.render()?;
        let text = OrderConfirmationText { order, items }.render()?;
        let subject = format!("Your Adire order {} is confirmed", order.payment_reference);

        self.send(order.customer_email.as_str(), &subject, &html, &text, None)
            .await
    }

    /// Send a welcome email to a new subscriber or customer.
    ///
    /// Without a name the greeting is unaddressed.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    #[instrument(skip(self, name))]
    pub async fn send_welcome(
        &self,
        to: &Email,
        name: Option<&str>,
    ) -> Result<(), EmailDeliveryError> {
        let store_url = self.store_url.as_str();
        let html = WelcomeHtml { name, store_url }.render()?;
        let text = WelcomeText { name, store_url }.render()?;

        self.send(to.as_str(), "Welcome to Adire", &html, &text, None)
            .await
    }

    /// Forward a contact form message to the store inbox.
    ///
    /// Reply-to is the sender, so answering from the inbox reaches them.
    ///
    /// # Errors
    ///
    /// Returns `EmailDeliveryError::NoInbox` if no inbox is configured.
    #[instrument(skip(self, message))]
    pub async fn forward_contact(&self, message: &ContactMessage) -> Result<(), EmailDeliveryError> {
        let inbox = self
            .store_inbox
            .as_deref()
            .ok_or(EmailDeliveryError::NoInbox)?;

        let html = ContactHtml { message }.render()?;
        let text = ContactText { message }.render()?;

        self.send(
            inbox,
            &message.subject_line(),
            &html,
            &text,
            Some(message.email.as_str()),
        )
        .await
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<(), EmailDeliveryError> {
        let body = OutgoingEmail {
            from: &self.from,
            to: [to],
            subject,
            html,
            text,
            reply_to,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailDeliveryError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        tracing::info!(subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use adire_core::{ContactForm, Naira, OrderId, ShippingAddress};
    use adire_core::{LocationType, OrderStatus, PaymentStatus};
    use chrono::{TimeZone, Utc};

    fn order() -> Order {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        Order {
            id: OrderId::new(),
            customer_email: Email::parse("ada@example.com").unwrap(),
            customer_name: "Ada <Lovelace>".to_string(),
            customer_phone: "+2348012345678".to_string(),
            shipping_address: ShippingAddress {
                country: "Nigeria".to_string(),
                state: "FCT".to_string(),
                address: "1 Garki Way".to_string(),
            },
            shipping_location: "Abuja (FCT)".to_string(),
            shipping_location_type: LocationType::Domestic,
            shipping_provider: "GIG Logistics".to_string(),
            shipping_fee: Naira::from_whole(5_500),
            items: vec![CartLine {
                id: "adire-kaftan".to_string(),
                name: "Adire Kaftan".to_string(),
                price: Naira::from_whole(10_000),
                quantity: 2,
                image: None,
            }],
            subtotal: Naira::from_whole(20_000),
            total_amount: Naira::from_whole(25_500),
            payment_method: "card".to_string(),
            payment_reference: "REF123".to_string(),
            payment_status: PaymentStatus::Success,
            order_status: OrderStatus::Processing,
            created_at,
            estimated_delivery: created_at + chrono::Duration::days(5),
        }
    }

    #[test]
    fn test_order_confirmation_templates() {
        let order = order();
        let items = order.items.as_slice();

        let html = OrderConfirmationHtml { order: &order, items }.render().unwrap();
        assert!(html.contains("REF123"));
        assert!(html.contains("₦25,500.00"));
        assert!(html.contains("Ada &#60;Lovelace&#62;") || html.contains("Ada &lt;Lovelace&gt;"));

        let text = OrderConfirmationText { order: &order, items }.render().unwrap();
        assert!(text.contains("Adire Kaftan x 2"));
        assert!(text.contains("₦5,500.00"));
        assert!(text.contains("2026-03-06"));
    }

    #[test]
    fn test_contact_text_template() {
        let message = ContactMessage::validate(ContactForm {
            name: "Tunde".to_string(),
            email: "tunde@example.com".to_string(),
            subject: None,
            message: "Do you ship to Ibadan?".to_string(),
        })
        .unwrap();

        let text = ContactText { message: &message }.render().unwrap();
        assert!(text.contains("tunde@example.com"));
        assert!(text.contains("Do you ship to Ibadan?"));
    }

    #[test]
    fn test_welcome_greeting_with_and_without_name() {
        let store_url = "https://adire.ng";

        let html = WelcomeHtml { name: Some("Kemi"), store_url }.render().unwrap();
        assert!(html.contains("Welcome, Kemi"));
        let text = WelcomeText { name: Some("Kemi"), store_url }.render().unwrap();
        assert!(text.starts_with("Welcome, Kemi"));

        let html = WelcomeHtml { name: None, store_url }.render().unwrap();
        assert!(html.contains("Welcome to Adire</h1>"));
        let text = WelcomeText { name: None, store_url }.render().unwrap();
        assert!(text.starts_with("Welcome to Adire"));
        assert!(!text.contains("friend"));
    }

    #[test]
    fn test_outgoing_email_omits_missing_reply_to() {
        let body = OutgoingEmail {
            from: "Adire <orders@adire.ng>",
            to: ["ada@example.com"],
            subject: "Hi",
            html: "<p>Hi</p>",
            text: "Hi",
            reply_to: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"], serde_json::json!(["ada@example.com"]));
        assert!(json.get("reply_to").is_none());
    }
}
