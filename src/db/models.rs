//! Database rows for tours and their options.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.

use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::pricing::entity::{EntityPricing, PricingRecord, Tour, TourOption, DEFAULT_CURRENCY};

/// Tour from tours
#[derive(Debug, Clone, FromRow)]
pub struct TourRow {
    pub id: Uuid,
    pub title: String,
    pub currency: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub max_group_size: Option<i32>,
    pub group_price: Option<Decimal>,
    /// jsonb holding either an array of tiers or a JSON-encoded string of one
    pub group_pricing_tiers: Option<serde_json::Value>,
}

/// Option from tour_options
#[derive(Debug, Clone, FromRow)]
pub struct TourOptionRow {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub title: String,
    pub currency: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub max_group_size: Option<i32>,
    pub group_price: Option<Decimal>,
    pub group_pricing_tiers: Option<serde_json::Value>,
    pub sort_order: i32,
}

fn pricing_from_columns(
    currency: Option<String>,
    price_per_unit: Option<Decimal>,
    max_group_size: Option<i32>,
    group_price: Option<Decimal>,
    group_pricing_tiers: Option<serde_json::Value>,
) -> EntityPricing {
    EntityPricing::from(PricingRecord {
        price_per_unit,
        currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        max_group_size: max_group_size.and_then(|m| u32::try_from(m).ok()),
        group_price,
        group_pricing_tiers,
    })
}

impl TourOptionRow {
    pub fn into_option(self) -> TourOption {
        TourOption {
            id: self.id,
            title: self.title,
            pricing: pricing_from_columns(
                self.currency,
                self.price_per_unit,
                self.max_group_size,
                self.group_price,
                self.group_pricing_tiers,
            ),
        }
    }
}

impl TourRow {
    /// Assemble the tour snapshot with its options, in display order.
    pub fn into_tour(self, mut options: Vec<TourOptionRow>) -> Tour {
        options.sort_by_key(|o| o.sort_order);
        Tour {
            id: self.id,
            title: self.title,
            pricing: pricing_from_columns(
                self.currency,
                self.price_per_unit,
                self.max_group_size,
                self.group_price,
                self.group_pricing_tiers,
            ),
            options: options
                .into_iter()
                .filter(|o| o.tour_id == self.id)
                .map(TourOptionRow::into_option)
                .collect(),
        }
    }
}

/// Pricing columns as written back by a save.
#[derive(Debug, Clone)]
pub struct PricingColumns {
    pub currency: String,
    pub price_per_unit: Option<Decimal>,
    pub max_group_size: Option<i32>,
    pub group_price: Option<Decimal>,
    pub group_pricing_tiers: Option<serde_json::Value>,
}

impl PricingColumns {
    pub fn from_pricing(pricing: &EntityPricing) -> Result<Self, serde_json::Error> {
        let group_pricing_tiers = if pricing.schedule.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&pricing.schedule)?)
        };

        Ok(Self {
            currency: pricing.currency.clone(),
            price_per_unit: pricing.price_per_unit,
            max_group_size: pricing.max_group_size.and_then(|m| i32::try_from(m).ok()),
            group_price: pricing.group_price,
            group_pricing_tiers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn tour_row(tiers: Option<serde_json::Value>) -> TourRow {
        TourRow {
            id: Uuid::from_u128(10),
            title: "Tea Estates".to_string(),
            currency: None,
            price_per_unit: Some(dec!(700)),
            max_group_size: Some(12),
            group_price: None,
            group_pricing_tiers: tiers,
        }
    }

    fn option_row(sort_order: i32, id: u128) -> TourOptionRow {
        TourOptionRow {
            id: Uuid::from_u128(id),
            tour_id: Uuid::from_u128(10),
            title: format!("Option {}", id),
            currency: Some("INR".to_string()),
            price_per_unit: None,
            max_group_size: None,
            group_price: None,
            group_pricing_tiers: Some(json!("[{\"minPeople\":1,\"maxPeople\":2,\"price\":\"900\"}]")),
            sort_order,
        }
    }

    #[test]
    fn test_into_tour_orders_options_and_defaults_currency() {
        let tour = tour_row(None).into_tour(vec![option_row(2, 22), option_row(1, 21)]);
        assert_eq!(tour.pricing.currency, DEFAULT_CURRENCY);
        assert_eq!(tour.pricing.max_group_size, Some(12));
        assert_eq!(tour.options[0].id, Uuid::from_u128(21));
        assert_eq!(tour.options[1].pricing.schedule.tiers()[0].price, Some(dec!(900)));
    }

    #[test]
    fn test_malformed_stored_tiers_are_dropped() {
        let tour = tour_row(Some(json!({"oops": true}))).into_tour(vec![]);
        assert!(tour.pricing.schedule.is_empty());
        assert_eq!(tour.pricing.price_per_unit, Some(dec!(700)));
    }

    #[test]
    fn test_pricing_columns_store_array_or_null() {
        let tour = tour_row(Some(json!([{"minPeople": 1, "maxPeople": 4, "price": 100}]))).into_tour(vec![]);
        let columns = PricingColumns::from_pricing(&tour.pricing).unwrap();
        assert_eq!(
            columns.group_pricing_tiers,
            Some(json!([{"minPeople": 1, "maxPeople": 4, "price": "100"}]))
        );

        let columns = PricingColumns::from_pricing(&EntityPricing::default()).unwrap();
        assert!(columns.group_pricing_tiers.is_none());
    }
}
