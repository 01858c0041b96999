//! Checkout route handlers.
//!
//! Checkout progress is kept in the session next to the cart:
//!
//! ```text
//! incomplete --(details complete)--> ready --(POST /payment)--> processing
//! processing --(POST /callback, verified)--> paid
//! processing --(POST /cancel or POST /payment again)--> ready
//! ```

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use adire_core::{
    Cart, CheckoutDetails, CheckoutError, CheckoutPhase, CheckoutSession, Customer, LocationType,
    Naira, Order, OrderId,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{
    ApiJson, OptionalAuth, RequireAuth, load_cart, load_checkout, save_cart, save_checkout,
};
use crate::models::CurrentUser;
use crate::services::orders::{OrderService, is_valid_reference};
use crate::services::paystack::{
    MetadataError, PaymentMetadata, WidgetConfig, generate_reference,
};
use crate::state::AppState;

/// Checkout summary for the client.
#[derive(Debug, Serialize)]
pub struct CheckoutSummary {
    pub phase: CheckoutPhase,
    pub details: CheckoutDetails,
    pub subtotal: Naira,
    pub shipping_fee: Naira,
    pub total: Naira,
    /// Prompts for every unmet requirement, in check order.
    pub prompts: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl CheckoutSummary {
    fn new(checkout: &CheckoutSession, cart: &Cart, authenticated: bool) -> Self {
        Self {
            phase: checkout.phase(cart, authenticated),
            details: checkout.details.clone(),
            subtotal: cart.total(),
            shipping_fee: checkout.details.shipping.fee(),
            total: checkout.details.total(cart),
            prompts: checkout
                .details
                .missing(cart, authenticated)
                .iter()
                .map(adire_core::Requirement::prompt)
                .collect(),
            payment_reference: checkout.pending().map(|p| p.reference.clone()),
            order_id: checkout.paid_order(),
        }
    }
}

/// Partial update of checkout details. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutUpdate {
    pub country: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub location_type: Option<LocationType>,
    pub location_id: Option<String>,
    pub policy_agreed: Option<bool>,
}

impl CheckoutUpdate {
    fn apply(self, details: &mut CheckoutDetails) -> Result<()> {
        if let Some(country) = self.country {
            details.country = country;
        }
        if let Some(state) = self.state {
            details.state = state;
        }
        if let Some(address) = self.address {
            details.address = address;
        }
        if let Some(phone) = self.phone {
            details.phone = phone;
        }
        if let Some(location_type) = self.location_type {
            details.shipping.set_location_type(location_type);
        }
        if let Some(location_id) = self.location_id {
            details
                .shipping
                .select_location(&location_id)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        }
        if let Some(agreed) = self.policy_agreed {
            details.policy_agreed = agreed;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartPaymentRequest {
    /// Reference chosen by the client; one is generated when absent.
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartPaymentResponse {
    pub reference: String,
    /// Amount in kobo.
    pub amount: i64,
    pub widget: WidgetConfig,
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub reference: String,
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub order: Order,
    pub summary: CheckoutSummary,
}

/// Current checkout state.
///
/// GET /api/checkout
pub async fn show(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Json<CheckoutSummary>> {
    let cart = load_cart(&session).await?;
    let checkout = load_checkout(&session).await?;
    Ok(Json(CheckoutSummary::new(&checkout, &cart, user.is_some())))
}

/// Save checkout details.
///
/// PUT /api/checkout
#[instrument(skip_all)]
pub async fn update(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ApiJson(update): ApiJson<CheckoutUpdate>,
) -> Result<Json<CheckoutSummary>> {
    let cart = load_cart(&session).await?;
    let mut checkout = load_checkout(&session).await?;

    update.apply(&mut checkout.details)?;
    save_checkout(&session, &checkout).await?;

    Ok(Json(CheckoutSummary::new(&checkout, &cart, user.is_some())))
}

/// Move from ready to processing and hand the widget its configuration.
///
/// POST /api/checkout/payment
#[instrument(skip_all)]
pub async fn start_payment(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ApiJson(req): ApiJson<StartPaymentRequest>,
) -> Result<Json<StartPaymentResponse>> {
    let Some(user) = user else {
        return Err(CheckoutError::NotAuthenticated.into());
    };
    let cart = load_cart(&session).await?;
    let mut checkout = load_checkout(&session).await?;

    let reference = match req.reference {
        Some(reference) => {
            let reference = reference.trim().to_string();
            if !is_valid_reference(&reference) {
                return Err(AppError::BadRequest("Invalid payment reference".to_string()));
            }
            if state.db().orders().get_by_reference(&reference).await?.is_some() {
                return Err(AppError::Conflict(
                    "This payment reference has already been used".to_string(),
                ));
            }
            reference
        }
        None => generate_reference(),
    };

    let pending = checkout.begin_payment(&cart, true, reference)?.clone();

    let amount = pending
        .amount
        .to_kobo()
        .map_err(|e| AppError::Internal(format!("invalid payment amount: {e}")))?;

    let metadata = payment_metadata(&checkout.details, &cart, &user)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let widget = state
        .paystack()
        .widget_config(&user.email, amount, &pending.reference, metadata);

    save_checkout(&session, &checkout).await?;

    add_breadcrumb(
        "checkout",
        "Payment started",
        Some(&[("reference", pending.reference.as_str())]),
    );
    tracing::info!(reference = %pending.reference, amount_kobo = amount, "Payment started");

    Ok(Json(StartPaymentResponse {
        reference: pending.reference,
        amount,
        widget,
    }))
}

/// Payment widget success callback.
///
/// POST /api/checkout/callback
///
/// Nothing is persisted unless Paystack confirms the transaction. The cart is
/// cleared only after the order is written.
#[instrument(skip_all, fields(reference = %req.reference))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CallbackRequest>,
) -> Result<Json<CallbackResponse>> {
    let reference = req.reference.trim();
    let mut cart = load_cart(&session).await?;
    let mut checkout = load_checkout(&session).await?;

    let customer = Customer {
        email: user.email.clone(),
        name: user.name.clone(),
    };

    let outcome = OrderService::new(state.db(), state.paystack(), state.email())
        .complete_payment(&checkout, &cart, customer, reference, req.channel.as_deref())
        .await?;
    let order = outcome.into_order();

    if checkout
        .pending()
        .is_some_and(|pending| pending.reference == reference)
    {
        checkout.mark_paid(order.id);
        cart.clear();
        save_cart(&session, &cart).await?;
        save_checkout(&session, &checkout).await?;
    }

    add_breadcrumb("checkout", "Order placed", Some(&[("reference", reference)]));

    Ok(Json(CallbackResponse {
        summary: CheckoutSummary::new(&checkout, &cart, true),
        order,
    }))
}

/// The visitor closed the widget.
///
/// POST /api/checkout/cancel
pub async fn cancel(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Json<CheckoutSummary>> {
    let cart = load_cart(&session).await?;
    let mut checkout = load_checkout(&session).await?;

    checkout.cancel_payment();
    save_checkout(&session, &checkout).await?;

    Ok(Json(CheckoutSummary::new(&checkout, &cart, user.is_some())))
}

fn payment_metadata(
    details: &CheckoutDetails,
    cart: &Cart,
    user: &CurrentUser,
) -> std::result::Result<PaymentMetadata, MetadataError> {
    let mut metadata = PaymentMetadata::new();
    metadata.insert("customer_name", truncate(&user.name))?;
    metadata.insert("phone", truncate(details.phone.trim()))?;
    metadata.insert("item_count", cart.item_count().to_string())?;
    if let Some(rate) = details.shipping.rate() {
        metadata.insert("shipping_location", rate.id)?;
    }
    Ok(metadata)
}

fn truncate(value: &str) -> String {
    value
        .chars()
        .take(crate::services::paystack::MAX_METADATA_VALUE_LEN)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut details = CheckoutDetails {
            country: "Nigeria".to_string(),
            ..CheckoutDetails::default()
        };

        let update: CheckoutUpdate = serde_json::from_str(
            r#"{"state": "FCT", "location_type": "domestic", "location_id": "abuja"}"#,
        )
        .unwrap();
        update.apply(&mut details).unwrap();

        assert_eq!(details.country, "Nigeria");
        assert_eq!(details.state, "FCT");
        assert_eq!(details.shipping.fee(), Naira::from_whole(5_500));
    }

    #[test]
    fn test_update_rejects_location_of_other_type() {
        let mut details = CheckoutDetails::default();
        let update: CheckoutUpdate = serde_json::from_str(
            r#"{"location_type": "international", "location_id": "abuja"}"#,
        )
        .unwrap();

        let err = update.apply(&mut details).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(details.shipping.rate(), None);
    }
}
