//! Adire Core - Domain types and storefront rules.
//!
//! This crate provides the types and pure business rules shared by every
//! Adire component:
//! - `storefront` - Public JSON API for the shop (catalog, cart, checkout)
//! - `cli` - Command-line tools for migrations and order listings
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no database access,
//! no HTTP clients. Everything here is synchronous and deterministic given its
//! inputs, which keeps the checkout workflow testable without a server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, and statuses
//! - [`cart`] - Session-scoped cart with derived totals
//! - [`shipping`] - Static shipping-rate table and location selection
//! - [`checkout`] - Checkout details, readiness gate, and phase transitions
//! - [`order`] - Order records and drafting from a paid checkout
//! - [`contact`] - Contact form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod contact;
pub mod order;
pub mod shipping;
pub mod types;

pub use cart::{Cart, CartLine};
pub use checkout::{
    CheckoutDetails, CheckoutError, CheckoutPhase, CheckoutSession, PendingPayment, Requirement,
};
pub use contact::{ContactError, ContactForm, ContactMessage};
pub use order::{Customer, NewOrder, Order, PaymentConfirmation, ShippingAddress};
pub use shipping::{LocationType, ShippingRate, ShippingSelection};
pub use types::*;
