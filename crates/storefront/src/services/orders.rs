//! Payment callback to persisted order.
//!
//! The sequence is linear: look for an order already written under the
//! reference, check the callback against the payment in progress, verify the
//! transaction with Paystack, draft the order, write it, then attempt the
//! confirmation email.

use tracing::instrument;

use adire_core::{Cart, CheckoutError, CheckoutSession, Customer, NewOrder, Order};
use adire_core::{PaymentConfirmation, PaymentStatus};

use crate::db::{Database, OrderInsert};
use crate::error::AppError;
use crate::services::email::EmailClient;
use crate::services::paystack::{PaystackClient, PaystackError};

/// Longest reference accepted from a client.
pub const MAX_REFERENCE_LEN: usize = 100;

/// Turns verified payments into orders.
pub struct OrderService<'a> {
    db: &'a Database,
    paystack: &'a PaystackClient,
    email: Option<&'a EmailClient>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(
        db: &'a Database,
        paystack: &'a PaystackClient,
        email: Option<&'a EmailClient>,
    ) -> Self {
        Self {
            db,
            paystack,
            email,
        }
    }

    /// Complete the payment `reference` for this checkout.
    ///
    /// Returns the existing order when the reference was already persisted
    /// for the same customer.
    ///
    /// # Errors
    ///
    /// - `AppError::Checkout` if the callback does not match the payment in progress
    /// - `AppError::PaymentNotVerified` if Paystack does not confirm the payment
    /// - `AppError::OrderNotSaved` if the order write fails
    #[instrument(skip(self, checkout, cart, customer), fields(customer = %customer.email))]
    pub async fn complete_payment(
        &self,
        checkout: &CheckoutSession,
        cart: &Cart,
        customer: Customer,
        reference: &str,
        channel: Option<&str>,
    ) -> Result<OrderInsert, AppError> {
        if let Some(order) = self.db.orders().get_by_reference(reference).await? {
            if order.customer_email != customer.email {
                return Err(CheckoutError::ReferenceMismatch.into());
            }
            tracing::info!(order_id = %order.id, "Callback repeated for persisted order");
            return Ok(OrderInsert::Existing(order));
        }

        let pending = checkout.pending_for(reference, cart)?;
        let amount_kobo = pending
            .amount
            .to_kobo()
            .map_err(|e| AppError::Internal(format!("invalid payment amount: {e}")))?;

        let transaction = self
            .paystack
            .verify(reference)
            .await
            .map_err(|e| match e {
                PaystackError::Rejected(message) => AppError::PaymentNotVerified(message),
                other => AppError::Paystack(other),
            })?;

        transaction
            .confirm(reference, amount_kobo)
            .map_err(AppError::PaymentNotVerified)?;

        let payment = PaymentConfirmation {
            reference: reference.to_string(),
            channel: transaction
                .channel
                .as_deref()
                .or(channel)
                .unwrap_or("card")
                .to_string(),
            status: PaymentStatus::from_provider(&transaction.status),
        };

        let draft = NewOrder::draft(&checkout.details, cart, customer, payment)?;

        let outcome = self.db.orders().create(draft).await.map_err(|e| {
            tracing::error!(
                error = %e,
                reference = %reference,
                "Payment verified but order write failed"
            );
            AppError::OrderNotSaved {
                reference: reference.to_string(),
            }
        })?;

        if let OrderInsert::Created(order) = &outcome {
            tracing::info!(order_id = %order.id, total = %order.total_amount, "Order created");
            self.notify(order).await;
        }

        Ok(outcome)
    }

    /// Send the confirmation email, logging failures.
    pub async fn notify(&self, order: &Order) {
        let Some(email) = self.email else {
            tracing::warn!(order_id = %order.id, "Email not configured; confirmation not sent");
            return;
        };

        if let Err(e) = email.send_order_confirmation(order).await {
            tracing::error!(order_id = %order.id, error = %e, "Failed to send order confirmation");
        }
    }
}

/// Whether a client-chosen reference is acceptable to Paystack.
#[must_use]
pub fn is_valid_reference(reference: &str) -> bool {
    (1..=MAX_REFERENCE_LEN).contains(&reference.len())
        && reference
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'=' | b'_'))
}
