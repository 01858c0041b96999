//! Shipping table route.

use axum::{Json, extract::Query};
use serde::Deserialize;

use adire_core::{LocationType, ShippingRate, shipping};

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct ShippingQuery {
    #[serde(rename = "type")]
    pub location_type: Option<String>,
}

/// Shipping rates, optionally for one location type.
///
/// GET /api/shipping?type=domestic|international
pub async fn index(Query(query): Query<ShippingQuery>) -> Result<Json<Vec<ShippingRate>>> {
    let rates = match query.location_type.as_deref() {
        None | Some("") => shipping::SHIPPING_TABLE.to_vec(),
        Some(raw) => {
            let location_type = raw
                .parse::<LocationType>()
                .map_err(|_| AppError::BadRequest(format!("Unknown location type: {raw}")))?;
            shipping::rates_for(location_type).cloned().collect()
        }
    };

    Ok(Json(rates))
}
