//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Email/password accounts (Argon2id)
//! - `email` - Transactional email over an HTTP API
//! - `newsletter` - Newsletter sign-ups
//! - `orders` - Verified payment to persisted order
//! - `paystack` - Paystack transactions API and webhook signatures

pub mod auth;
pub mod email;
pub mod newsletter;
pub mod orders;
pub mod paystack;
