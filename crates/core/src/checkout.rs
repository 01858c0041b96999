//! Checkout workflow.
//!
//! A checkout moves through four phases:
//!
//! ```text
//! Incomplete --(details + cart + sign-in)--> Ready
//! Ready --(payment triggered)--> Processing
//! Processing --(payment confirmed)--> Paid
//! Processing --(widget closed / re-triggered)--> Ready
//! ```
//!
//! `Incomplete` and `Ready` are derived from the current details, cart, and
//! sign-in state. `Processing` and `Paid` are recorded in the
//! [`CheckoutSession`] because they depend on what the payment provider did.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::Cart;
use crate::shipping::ShippingSelection;
use crate::types::{Naira, OrderId};

/// Something the visitor still has to provide before paying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    SignIn,
    CartItems,
    Country,
    State,
    Address,
    Phone,
    ShippingLocation,
    PolicyAgreement,
}

impl Requirement {
    /// The message shown to the visitor for this requirement.
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::SignIn => "Please sign in to continue",
            Self::CartItems => "Your cart is empty",
            Self::Country => "Please select your country",
            Self::State => "Please enter your state",
            Self::Address => "Please enter your delivery address",
            Self::Phone => "Please enter your phone number",
            Self::ShippingLocation => "Please select a shipping location",
            Self::PolicyAgreement => "Please accept the shipping and returns policy",
        }
    }
}

/// Contact and delivery details collected on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub country: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub shipping: ShippingSelection,
    pub policy_agreed: bool,
}

impl CheckoutDetails {
    /// Every unmet requirement, in the order the form presents them.
    #[must_use]
    pub fn missing(&self, cart: &Cart, authenticated: bool) -> Vec<Requirement> {
        let checks = [
            (authenticated, Requirement::SignIn),
            (!cart.is_empty(), Requirement::CartItems),
            (is_filled(&self.country), Requirement::Country),
            (is_filled(&self.state), Requirement::State),
            (is_filled(&self.address), Requirement::Address),
            (is_filled(&self.phone), Requirement::Phone),
            (self.shipping.rate().is_some(), Requirement::ShippingLocation),
            (self.policy_agreed, Requirement::PolicyAgreement),
        ];

        checks
            .into_iter()
            .filter_map(|(met, requirement)| (!met).then_some(requirement))
            .collect()
    }

    /// Whether the visitor may trigger payment.
    #[must_use]
    pub fn is_ready(&self, cart: &Cart, authenticated: bool) -> bool {
        self.missing(cart, authenticated).is_empty()
    }

    /// Cart total plus the shipping fee.
    #[must_use]
    pub fn total(&self, cart: &Cart) -> Naira {
        cart.total() + self.shipping.fee()
    }
}

fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Where a checkout currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Incomplete,
    Ready,
    Processing,
    Paid,
}

/// A payment the visitor has been sent to the widget for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Reference shared with the payment provider.
    pub reference: String,
    /// Amount requested when the widget was opened.
    pub amount: Naira,
}

/// Errors from checkout transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The visitor is not signed in.
    #[error("{}", Requirement::SignIn.prompt())]
    NotAuthenticated,
    /// Required details are missing.
    #[error("{}", .0.first().map_or("Checkout is incomplete", Requirement::prompt))]
    NotReady(Vec<Requirement>),
    /// A callback arrived but no payment was started.
    #[error("no payment is in progress")]
    NoPaymentInProgress,
    /// A callback carried a reference other than the one issued.
    #[error("payment reference does not match the payment in progress")]
    ReferenceMismatch,
    /// The cart changed after the widget was opened.
    #[error("your cart changed during payment; please review and pay again")]
    CartChanged,
}

/// Per-visitor checkout state kept in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub details: CheckoutDetails,
    pending: Option<PendingPayment>,
    paid_order: Option<OrderId>,
}

impl CheckoutSession {
    /// The current phase for this cart and sign-in state.
    ///
    /// A paid checkout stays `Paid` until something is added to the cart,
    /// which starts a fresh checkout.
    #[must_use]
    pub fn phase(&self, cart: &Cart, authenticated: bool) -> CheckoutPhase {
        if self.pending.is_some() {
            CheckoutPhase::Processing
        } else if self.paid_order.is_some() && cart.is_empty() {
            CheckoutPhase::Paid
        } else if self.details.is_ready(cart, authenticated) {
            CheckoutPhase::Ready
        } else {
            CheckoutPhase::Incomplete
        }
    }

    /// The payment awaiting a callback, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingPayment> {
        self.pending.as_ref()
    }

    /// The order created by the last completed payment.
    #[must_use]
    pub const fn paid_order(&self) -> Option<OrderId> {
        self.paid_order
    }

    /// Move to `Processing` under a freshly issued reference.
    ///
    /// Allowed from `Ready`, and from `Processing` when the visitor closed
    /// the widget and pays again; the old reference is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotAuthenticated`] or
    /// [`CheckoutError::NotReady`] with every unmet requirement.
    pub fn begin_payment(
        &mut self,
        cart: &Cart,
        authenticated: bool,
        reference: String,
    ) -> Result<&PendingPayment, CheckoutError> {
        if !authenticated {
            return Err(CheckoutError::NotAuthenticated);
        }

        let missing = self.details.missing(cart, authenticated);
        if !missing.is_empty() {
            return Err(CheckoutError::NotReady(missing));
        }

        self.paid_order = None;
        Ok(self.pending.insert(PendingPayment {
            reference,
            amount: self.details.total(cart),
        }))
    }

    /// Check a payment callback against the payment in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if no payment is pending, the reference differs, or
    /// the cart total no longer matches the amount that was requested.
    pub fn pending_for(&self, reference: &str, cart: &Cart) -> Result<&PendingPayment, CheckoutError> {
        let pending = self
            .pending
            .as_ref()
            .ok_or(CheckoutError::NoPaymentInProgress)?;

        if pending.reference != reference {
            return Err(CheckoutError::ReferenceMismatch);
        }

        if self.details.total(cart) != pending.amount {
            return Err(CheckoutError::CartChanged);
        }

        Ok(pending)
    }

    /// Record that the pending payment produced `order_id`.
    pub fn mark_paid(&mut self, order_id: OrderId) {
        self.pending = None;
        self.paid_order = Some(order_id);
        self.details.policy_agreed = false;
    }

    /// Abandon the payment in progress, returning to `Ready`/`Incomplete`.
    pub fn cancel_payment(&mut self) {
        self.pending = None;
    }
}
