//! Static shipping-rate table.
//!
//! Every deliverable location has a fixed provider and flat fee. The fee of a
//! [`ShippingSelection`] is always looked up from this table and can never be
//! set directly.

use serde::{Deserialize, Serialize};

use crate::types::Naira;

/// Whether a location is inside Nigeria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Domestic,
    International,
}

impl LocationType {
    /// Days added to the order date for the delivery estimate.
    #[must_use]
    pub const fn delivery_days(&self) -> i64 {
        match self {
            Self::Domestic => 5,
            Self::International => 10,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::International => "international",
        }
    }
}

impl std::str::FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domestic" => Ok(Self::Domestic),
            "international" => Ok(Self::International),
            _ => Err(format!("invalid location type: {s}")),
        }
    }
}

/// One row of the shipping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingRate {
    pub id: &'static str,
    pub name: &'static str,
    pub location_type: LocationType,
    pub provider: &'static str,
    #[serde(rename = "fee", serialize_with = "serialize_fee")]
    pub fee_naira: i64,
}

impl ShippingRate {
    /// The flat fee for this location.
    #[must_use]
    pub fn fee(&self) -> Naira {
        Naira::from_whole(self.fee_naira)
    }
}

fn serialize_fee<S: serde::Serializer>(fee: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    Naira::from_whole(*fee).serialize(serializer)
}

const DOMESTIC_PROVIDER: &str = "GIG Logistics";
const INTERNATIONAL_PROVIDER: &str = "DHL Express";

const fn domestic(id: &'static str, name: &'static str, fee_naira: i64) -> ShippingRate {
    ShippingRate {
        id,
        name,
        location_type: LocationType::Domestic,
        provider: DOMESTIC_PROVIDER,
        fee_naira,
    }
}

const fn international(id: &'static str, name: &'static str, fee_naira: i64) -> ShippingRate {
    ShippingRate {
        id,
        name,
        location_type: LocationType::International,
        provider: INTERNATIONAL_PROVIDER,
        fee_naira,
    }
}

/// All shipping rates, domestic first.
pub static SHIPPING_TABLE: &[ShippingRate] = &[
    domestic("lagos-island", "Lagos Island", 3_000),
    domestic("lagos-mainland", "Lagos Mainland", 3_500),
    domestic("abuja", "Abuja (FCT)", 5_500),
    domestic("port-harcourt", "Port Harcourt", 5_500),
    domestic("other-states", "Other States", 7_000),
    international("ghana", "Ghana", 25_000),
    international("united-kingdom", "United Kingdom", 45_000),
    international("united-states", "United States", 55_000),
    international("canada", "Canada", 55_000),
    international("rest-of-world", "Rest of World", 65_000),
];

/// Look up a rate by location id.
#[must_use]
pub fn rate(location_id: &str) -> Option<&'static ShippingRate> {
    SHIPPING_TABLE.iter().find(|rate| rate.id == location_id)
}

/// All rates of one location type.
pub fn rates_for(location_type: LocationType) -> impl Iterator<Item = &'static ShippingRate> {
    SHIPPING_TABLE
        .iter()
        .filter(move |rate| rate.location_type == location_type)
}

/// Error selecting a shipping location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShippingError {
    /// No location type has been chosen yet.
    #[error("choose domestic or international shipping first")]
    NoLocationType,
    /// The id is not in the table for the chosen location type.
    #[error("unknown shipping location: {0}")]
    UnknownLocation(String),
}

/// The visitor's shipping choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSelection {
    location_type: Option<LocationType>,
    location_id: Option<String>,
}

impl ShippingSelection {
    /// Choose domestic or international shipping.
    ///
    /// Switching to a different type clears the selected location.
    pub fn set_location_type(&mut self, location_type: LocationType) {
        if self.location_type != Some(location_type) {
            self.location_id = None;
        }
        self.location_type = Some(location_type);
    }

    /// Choose a location from the current type's table.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::NoLocationType`] if no type is set, or
    /// [`ShippingError::UnknownLocation`] if the id is not a rate of that type.
    pub fn select_location(&mut self, location_id: &str) -> Result<(), ShippingError> {
        let location_type = self.location_type.ok_or(ShippingError::NoLocationType)?;
        match rate(location_id) {
            Some(rate) if rate.location_type == location_type => {
                self.location_id = Some(rate.id.to_string());
                Ok(())
            }
            _ => Err(ShippingError::UnknownLocation(location_id.to_string())),
        }
    }

    /// The chosen location type, if any.
    #[must_use]
    pub const fn location_type(&self) -> Option<LocationType> {
        self.location_type
    }

    /// The selected table row, if a valid location is chosen.
    #[must_use]
    pub fn rate(&self) -> Option<&'static ShippingRate> {
        self.location_id.as_deref().and_then(rate)
    }

    /// The shipping fee, zero until a location is chosen.
    #[must_use]
    pub fn fee(&self) -> Naira {
        self.rate().map_or(Naira::ZERO, ShippingRate::fee)
    }
}
