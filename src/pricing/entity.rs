//! Priceable entities: tours, their options, and the main-tour view.
//!
//! A tour exclusively owns its options. Either may carry a tier schedule, a
//! legacy `{groupPrice, maxGroupSize}` pair, a flat per-unit price, or some
//! mix left over from older records. Options carrying none of these inherit
//! from their tour at resolution time.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::schedule::PriceSchedule;
use super::tier::{decode_tiers, lenient_amount, MAX_CAPACITY};

/// Currency assumed for records that never stored one.
pub const DEFAULT_CURRENCY: &str = "INR";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Pricing fields exactly as they sit in storage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRecord {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price_per_unit: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub max_group_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub group_price: Option<Decimal>,
    #[serde(default)]
    pub group_pricing_tiers: Option<Value>,
}

/// Pricing fields after the boundary decode.
///
/// Malformed stored tiers decode to an empty schedule, so resolution moves on
/// to the next source instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PricingRecord")]
pub struct EntityPricing {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_per_unit: Option<Decimal>,
    pub currency: String,
    pub max_group_size: Option<u32>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub group_price: Option<Decimal>,
    #[serde(rename = "groupPricingTiers")]
    pub schedule: PriceSchedule,
}

impl Default for EntityPricing {
    fn default() -> Self {
        Self {
            price_per_unit: None,
            currency: default_currency(),
            max_group_size: None,
            group_price: None,
            schedule: PriceSchedule::default(),
        }
    }
}

impl From<PricingRecord> for EntityPricing {
    fn from(record: PricingRecord) -> Self {
        let schedule = match decode_tiers(record.group_pricing_tiers) {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::warn!("Ignoring stored tiers: {}", e);
                PriceSchedule::default()
            }
        };

        let currency = if record.currency.trim().is_empty() {
            default_currency()
        } else {
            record.currency
        };

        Self {
            price_per_unit: record.price_per_unit,
            currency,
            max_group_size: record.max_group_size,
            group_price: record.group_price,
            schedule,
        }
    }
}

/// The pre-tier `{groupPrice, maxGroupSize}` shape: one total for a group of
/// up to `max_group_size` people.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyGroupPrice {
    pub total: Decimal,
    pub max_group_size: Option<u32>,
}

impl LegacyGroupPrice {
    pub fn covers(&self, group_size: u32) -> bool {
        self.max_group_size.map_or(true, |max| group_size <= max)
    }
}

impl EntityPricing {
    pub fn has_schedule(&self) -> bool {
        !self.schedule.is_empty()
    }

    /// Legacy group total, if one is recorded with a positive amount.
    pub fn legacy_group_price(&self) -> Option<LegacyGroupPrice> {
        self.group_price
            .filter(|p| *p > Decimal::ZERO)
            .map(|total| LegacyGroupPrice {
                total,
                max_group_size: self.max_group_size,
            })
    }

    /// Flat per-unit price, if positive.
    pub fn unit_price(&self) -> Option<Decimal> {
        self.price_per_unit.filter(|p| *p > Decimal::ZERO)
    }

    /// Whether any pricing source is recorded at all.
    pub fn has_any_pricing(&self) -> bool {
        self.has_schedule() || self.legacy_group_price().is_some() || self.unit_price().is_some()
    }

    /// Capacity cap used for authoring: the declared maximum, or the domain
    /// maximum when none is declared.
    pub fn cap(&self) -> u32 {
        self.max_group_size.unwrap_or(MAX_CAPACITY).clamp(1, MAX_CAPACITY)
    }
}

/// Which kind of entity a price belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Tour,
    Option,
    /// The tour's own pricing presented as one of its options.
    MainTour,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tour => "tour",
            EntityKind::Option => "option",
            EntityKind::MainTour => "main_tour",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a priceable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub id: Uuid,
    pub kind: EntityKind,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Anything the resolver can price.
pub trait Priceable {
    fn entity_ref(&self) -> EntityRef;
    fn pricing(&self) -> &EntityPricing;
}

/// An alternative way to book a tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourOption {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub pricing: EntityPricing,
}

impl Priceable for TourOption {
    fn entity_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id,
            kind: EntityKind::Option,
        }
    }

    fn pricing(&self) -> &EntityPricing {
        &self.pricing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub pricing: EntityPricing,
    #[serde(default)]
    pub options: Vec<TourOption>,
}

impl Priceable for Tour {
    fn entity_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id,
            kind: EntityKind::Tour,
        }
    }

    fn pricing(&self) -> &EntityPricing {
        &self.pricing
    }
}

impl Tour {
    pub fn has_own_pricing(&self) -> bool {
        self.pricing.has_any_pricing()
    }

    pub fn option(&self, option_id: Uuid) -> Option<&TourOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// The tour's own pricing viewed as an option. Borrows the tour, so it
    /// always reflects the current fields.
    pub fn main_tour_option(&self) -> MainTourOption<'_> {
        MainTourOption { tour: self }
    }

    /// Every way to book this tour, as one uniform list.
    ///
    /// With explicit options the main-tour entry leads the list only when
    /// the tour has pricing of its own. Without options the tour itself is
    /// the only entry.
    pub fn bookable_options(&self) -> Vec<BookableOption<'_>> {
        if self.options.is_empty() {
            return vec![BookableOption::MainTour(self.main_tour_option())];
        }

        let mut list = Vec::with_capacity(self.options.len() + 1);
        if self.has_own_pricing() {
            list.push(BookableOption::MainTour(self.main_tour_option()));
        }
        list.extend(
            self.options
                .iter()
                .map(|option| BookableOption::Option { tour: self, option }),
        );
        list
    }

    /// Look up one entry of [`Tour::bookable_options`] by id. The tour's own
    /// id selects the main-tour entry.
    pub fn bookable_option(&self, id: Uuid) -> Option<BookableOption<'_>> {
        if id == self.id {
            return Some(BookableOption::MainTour(self.main_tour_option()));
        }
        self.option(id)
            .map(|option| BookableOption::Option { tour: self, option })
    }
}

/// Synthetic option standing for "just the base tour". Never stored.
#[derive(Debug, Clone, Copy)]
pub struct MainTourOption<'a> {
    tour: &'a Tour,
}

impl<'a> MainTourOption<'a> {
    pub fn tour(&self) -> &'a Tour {
        self.tour
    }
}

impl Priceable for MainTourOption<'_> {
    fn entity_ref(&self) -> EntityRef {
        EntityRef {
            id: self.tour.id,
            kind: EntityKind::MainTour,
        }
    }

    fn pricing(&self) -> &EntityPricing {
        &self.tour.pricing
    }
}

/// One entry of a tour's bookable list.
#[derive(Debug, Clone, Copy)]
pub enum BookableOption<'a> {
    MainTour(MainTourOption<'a>),
    Option {
        tour: &'a Tour,
        option: &'a TourOption,
    },
}

impl<'a> BookableOption<'a> {
    /// The tour to fall back on during resolution.
    pub fn parent(&self) -> Option<&'a Tour> {
        match *self {
            BookableOption::MainTour(_) => None,
            BookableOption::Option { tour, .. } => Some(tour),
        }
    }

    pub fn title(&self) -> &'a str {
        match *self {
            BookableOption::MainTour(main) => &main.tour().title,
            BookableOption::Option { option, .. } => &option.title,
        }
    }
}

impl Priceable for BookableOption<'_> {
    fn entity_ref(&self) -> EntityRef {
        match self {
            BookableOption::MainTour(main) => main.entity_ref(),
            BookableOption::Option { option, .. } => option.entity_ref(),
        }
    }

    fn pricing(&self) -> &EntityPricing {
        match self {
            BookableOption::MainTour(main) => main.pricing(),
            BookableOption::Option { option, .. } => option.pricing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn tour_json(options: Value) -> Value {
        json!({
            "id": "6a2f41a8-9f7e-4c5b-8a44-000000000001",
            "title": "Old Town Walk",
            "currency": "INR",
            "maxGroupSize": 10,
            "groupPricingTiers": [{"minPeople": 1, "maxPeople": 10, "price": "1000"}],
            "options": options,
        })
    }

    #[test]
    fn test_tour_decodes_with_nested_options() {
        let tour: Tour = serde_json::from_value(tour_json(json!([{
            "id": "6a2f41a8-9f7e-4c5b-8a44-000000000002",
            "title": "With lunch",
            "currency": "INR",
            "groupPricingTiers": "[{\"minPeople\":1,\"maxPeople\":4,\"price\":1500}]"
        }])))
        .unwrap();

        assert_eq!(tour.pricing.schedule.len(), 1);
        assert_eq!(tour.options.len(), 1);
        assert_eq!(tour.options[0].pricing.schedule.tiers()[0].price, Some(dec!(1500)));
    }

    #[test]
    fn test_malformed_tiers_decode_to_empty_schedule() {
        let pricing: EntityPricing = serde_json::from_value(json!({
            "currency": "USD",
            "pricePerUnit": 500,
            "groupPricingTiers": "{broken"
        }))
        .unwrap();

        assert!(!pricing.has_schedule());
        assert_eq!(pricing.unit_price(), Some(dec!(500)));
        assert_eq!(pricing.currency, "USD");
    }

    #[test]
    fn test_missing_currency_defaults() {
        let pricing: EntityPricing = serde_json::from_value(json!({"pricePerUnit": "250"})).unwrap();
        assert_eq!(pricing.currency, DEFAULT_CURRENCY);
        assert_eq!(pricing.price_per_unit, Some(dec!(250)));
    }

    #[test]
    fn test_blank_amounts_read_as_unset() {
        let pricing: EntityPricing = serde_json::from_value(json!({
            "currency": "INR",
            "pricePerUnit": "",
            "groupPrice": "n/a"
        }))
        .unwrap();
        assert_eq!(pricing.price_per_unit, None);
        assert_eq!(pricing.group_price, None);
        assert!(!pricing.has_any_pricing());
    }

    #[test]
    fn test_legacy_group_price_covers_up_to_max() {
        let pricing = EntityPricing {
            group_price: Some(dec!(8200)),
            max_group_size: Some(10),
            ..EntityPricing::default()
        };
        let legacy = pricing.legacy_group_price().unwrap();
        assert!(legacy.covers(10));
        assert!(!legacy.covers(11));
    }

    #[test]
    fn test_cap_defaults_to_domain_maximum() {
        assert_eq!(EntityPricing::default().cap(), MAX_CAPACITY);
        let pricing = EntityPricing {
            max_group_size: Some(6),
            ..EntityPricing::default()
        };
        assert_eq!(pricing.cap(), 6);
    }

    #[test]
    fn test_bookable_options_lead_with_main_tour_when_priced() {
        let tour: Tour = serde_json::from_value(tour_json(json!([
            {"id": "6a2f41a8-9f7e-4c5b-8a44-000000000002", "title": "Private"}
        ])))
        .unwrap();

        let list = tour.bookable_options();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].entity_ref().kind, EntityKind::MainTour);
        assert_eq!(list[0].entity_ref().id, tour.id);
        assert!(list[0].parent().is_none());
        assert_eq!(list[1].entity_ref().kind, EntityKind::Option);
        assert_eq!(list[1].parent().map(|t| t.id), Some(tour.id));
    }

    #[test]
    fn test_bookable_options_skip_main_tour_without_own_pricing() {
        let mut tour: Tour = serde_json::from_value(tour_json(json!([
            {"id": "6a2f41a8-9f7e-4c5b-8a44-000000000002", "title": "Private", "pricePerUnit": 900}
        ])))
        .unwrap();
        tour.pricing = EntityPricing::default();

        let list = tour.bookable_options();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title(), "Private");
    }

    #[test]
    fn test_main_tour_view_tracks_tour_fields() {
        let mut tour: Tour = serde_json::from_value(tour_json(json!([]))).unwrap();
        tour.pricing.currency = "EUR".to_string();

        let view = tour.main_tour_option();
        assert_eq!(view.pricing().currency, "EUR");
        assert_eq!(view.pricing(), &tour.pricing);
    }

    #[test]
    fn test_bookable_option_lookup() {
        let tour: Tour = serde_json::from_value(tour_json(json!([
            {"id": "6a2f41a8-9f7e-4c5b-8a44-000000000002", "title": "Private"}
        ])))
        .unwrap();

        let main = tour.bookable_option(tour.id).unwrap();
        assert_eq!(main.entity_ref().kind, EntityKind::MainTour);

        let option_id = tour.options[0].id;
        let option = tour.bookable_option(option_id).unwrap();
        assert_eq!(option.entity_ref().id, option_id);

        assert!(tour.bookable_option(Uuid::nil()).is_none());
    }
}
