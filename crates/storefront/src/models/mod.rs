//! Domain models for storefront.
//!
//! Order, cart and checkout types live in `adire-core`; the types here are
//! specific to storage and sessions in this service.

pub mod session;
pub mod subscriber;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use subscriber::NewsletterSubscriber;
pub use user::User;
