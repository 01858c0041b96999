//! Status enums for orders and subscribers.
//!
//! Statuses are stored as lowercase text in the document store and
//! serialized the same way over the API.

use serde::{Deserialize, Serialize};

/// Payment status as reported by the payment provider's verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The charge succeeded.
    Success,
    /// The charge has not completed yet.
    Pending,
    /// The payer abandoned the payment.
    Abandoned,
    /// The charge failed.
    Failed,
    /// The charge was reversed.
    Reversed,
}

impl PaymentStatus {
    /// Map a provider status string; unknown values are treated as failures.
    #[must_use]
    pub fn from_provider(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "pending" | "ongoing" | "processing" | "queued" => Self::Pending,
            "abandoned" => Self::Abandoned,
            "reversed" => Self::Reversed,
            _ => Self::Failed,
        }
    }

    /// Stable lowercase name used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Abandoned => "abandoned",
            Self::Failed => "failed",
            Self::Reversed => "reversed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "pending" => Ok(Self::Pending),
            "abandoned" => Ok(Self::Abandoned),
            "failed" => Ok(Self::Failed),
            "reversed" => Ok(Self::Reversed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Fulfillment status of an order.
///
/// New orders are always `Processing`; later states are set by staff tooling
/// outside this codebase and only ever read here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Stable lowercase name used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Newsletter subscriber status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberStatus {
    #[default]
    Active,
    Unsubscribed,
}

impl SubscriberStatus {
    /// Stable lowercase name used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Unsubscribed => "unsubscribed",
        }
    }
}

impl std::str::FromStr for SubscriberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "unsubscribed" => Ok(Self::Unsubscribed),
            _ => Err(format!("invalid subscriber status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_from_provider() {
        assert_eq!(PaymentStatus::from_provider("success"), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_provider("SUCCESS "), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_provider("ongoing"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_provider("abandoned"), PaymentStatus::Abandoned);
        assert_eq!(PaymentStatus::from_provider("reversed"), PaymentStatus::Reversed);
        assert_eq!(PaymentStatus::from_provider("weird"), PaymentStatus::Failed);
    }

    #[test]
    fn test_status_storage_names_round_trip() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!("active".parse::<SubscriberStatus>(), Ok(SubscriberStatus::Active));
        assert!("gone".parse::<SubscriberStatus>().is_err());
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Processing);
    }
}
