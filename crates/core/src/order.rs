//! Order records.
//!
//! An order is written exactly once, after its payment has been verified,
//! and is never updated afterwards by the storefront.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::checkout::{CheckoutDetails, CheckoutError};
use crate::shipping::LocationType;
use crate::types::{Email, Naira, OrderId, OrderStatus, PaymentStatus};

/// Where the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub country: String,
    pub state: String,
    pub address: String,
}

/// The signed-in customer placing the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub email: Email,
    pub name: String,
}

/// What the payment provider confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub reference: String,
    /// Payment channel, e.g. `card` or `bank_transfer`.
    pub channel: String,
    pub status: PaymentStatus,
}

/// An order ready to be written. The store assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_email: Email,
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: ShippingAddress,
    /// Shipping table location id.
    pub shipping_location: String,
    pub shipping_location_type: LocationType,
    pub shipping_provider: String,
    pub shipping_fee: Naira,
    /// Cart lines as they were when payment was taken.
    pub items: Vec<CartLine>,
    pub subtotal: Naira,
    pub total_amount: Naira,
    pub payment_method: String,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
}

impl NewOrder {
    /// Build an order from a completed checkout.
    ///
    /// Field values are trimmed. Totals are taken from the cart and the
    /// shipping table, never from the caller.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotReady`] if the details or cart would not
    /// pass the checkout gate.
    pub fn draft(
        details: &CheckoutDetails,
        cart: &Cart,
        customer: Customer,
        payment: PaymentConfirmation,
    ) -> Result<Self, CheckoutError> {
        let missing = details.missing(cart, true);
        let rate = match details.shipping.rate() {
            Some(rate) if missing.is_empty() => rate,
            _ => return Err(CheckoutError::NotReady(missing)),
        };

        let subtotal = cart.total();
        let shipping_fee = rate.fee();

        Ok(Self {
            customer_email: customer.email,
            customer_name: customer.name.trim().to_string(),
            customer_phone: details.phone.trim().to_string(),
            shipping_address: ShippingAddress {
                country: details.country.trim().to_string(),
                state: details.state.trim().to_string(),
                address: details.address.trim().to_string(),
            },
            shipping_location: rate.id.to_string(),
            shipping_location_type: rate.location_type,
            shipping_provider: rate.provider.to_string(),
            shipping_fee,
            items: cart.lines().to_vec(),
            subtotal,
            total_amount: subtotal + shipping_fee,
            payment_method: payment.channel,
            payment_reference: payment.reference,
            payment_status: payment.status,
        })
    }

    /// Delivery estimate for an order placed at `created_at`.
    #[must_use]
    pub fn estimated_delivery(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(self.shipping_location_type.delivery_days())
    }

    /// Attach the store-assigned id and timestamp.
    #[must_use]
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        let estimated_delivery = self.estimated_delivery(created_at);
        Order {
            id,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            shipping_address: self.shipping_address,
            shipping_location: self.shipping_location,
            shipping_location_type: self.shipping_location_type,
            shipping_provider: self.shipping_provider,
            shipping_fee: self.shipping_fee,
            items: self.items,
            subtotal: self.subtotal,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference,
            payment_status: self.payment_status,
            order_status: OrderStatus::Processing,
            created_at,
            estimated_delivery,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_email: Email,
    pub customer_name: String,
    pub customer_phone: String,
    pub shipping_address: ShippingAddress,
    pub shipping_location: String,
    pub shipping_location_type: LocationType,
    pub shipping_provider: String,
    pub shipping_fee: Naira,
    pub items: Vec<CartLine>,
    pub subtotal: Naira,
    pub total_amount: Naira,
    pub payment_method: String,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }
}
