//! Quotes: point-in-time resolved prices.
//!
//! A quote is never cached between requests. The booking path recomputes it
//! from a fresh snapshot and checks it against what the customer was shown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::format_amount;
use super::entity::{EntityKind, Priceable};
use super::resolver::{resolve, Provenance, Unresolvable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub entity_id: Uuid,
    pub entity_kind: EntityKind,
    pub group_size: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub provenance: Provenance,
    pub resolved_at: DateTime<Utc>,
}

impl Quote {
    /// Same entity, size, price and currency. The timestamp is ignored.
    pub fn matches(&self, other: &Quote) -> bool {
        self.entity_id == other.entity_id
            && self.entity_kind == other.entity_kind
            && self.group_size == other.group_size
            && self.price == other.price
            && self.currency == other.currency
    }

    /// Price with its currency symbol.
    pub fn display_price(&self) -> String {
        format_amount(self.price, &self.currency)
    }
}

/// Resolve and stamp a quote with the current time.
pub fn make_quote(
    entity: &dyn Priceable,
    parent: Option<&dyn Priceable>,
    group_size: u32,
) -> Result<Quote, Unresolvable> {
    make_quote_at(entity, parent, group_size, Utc::now())
}

/// Resolve and stamp a quote with a given time.
pub fn make_quote_at(
    entity: &dyn Priceable,
    parent: Option<&dyn Priceable>,
    group_size: u32,
    resolved_at: DateTime<Utc>,
) -> Result<Quote, Unresolvable> {
    let resolution = resolve(entity, parent, group_size)?;
    let entity_ref = entity.entity_ref();

    Ok(Quote {
        entity_id: entity_ref.id,
        entity_kind: entity_ref.kind,
        group_size,
        price: resolution.price,
        currency: resolution.currency,
        provenance: resolution.provenance,
        resolved_at,
    })
}

/// The price a customer was shown no longer matches the recomputed quote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("quoted {quoted_price} {quoted_currency} but current price is {current_price} {current_currency}")]
pub struct QuoteMismatch {
    pub quoted_price: Decimal,
    pub quoted_currency: String,
    pub current_price: Decimal,
    pub current_currency: String,
}

/// Check a displayed price against a quote recomputed at booking time.
pub fn verify_charge(
    current: &Quote,
    quoted_price: Decimal,
    quoted_currency: &str,
) -> Result<(), QuoteMismatch> {
    if current.price == quoted_price && current.currency.eq_ignore_ascii_case(quoted_currency) {
        return Ok(());
    }
    Err(QuoteMismatch {
        quoted_price,
        quoted_currency: quoted_currency.to_string(),
        current_price: current.price,
        current_currency: current.currency.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::entity::{EntityPricing, Tour};
    use crate::pricing::schedule::PriceSchedule;
    use crate::pricing::tier::Tier;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tour() -> Tour {
        Tour {
            id: Uuid::from_u128(7),
            title: "Fort Kochi".to_string(),
            pricing: EntityPricing {
                currency: "USD".to_string(),
                schedule: PriceSchedule::from_tiers(vec![Tier::priced(1, 4, dec!(120)), Tier::priced(5, 8, dec!(200))]),
                ..EntityPricing::default()
            },
            options: vec![],
        }
    }

    #[test]
    fn test_make_quote_stamps_fields() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let t = tour();
        let quote = make_quote_at(&t, None, 6, at).unwrap();

        assert_eq!(quote.entity_id, t.id);
        assert_eq!(quote.entity_kind, EntityKind::Tour);
        assert_eq!(quote.group_size, 6);
        assert_eq!(quote.price, dec!(200));
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.resolved_at, at);
        assert_eq!(quote.display_price(), "$200");
    }

    #[test]
    fn test_requotes_match_regardless_of_time() {
        let t = tour();
        let first = make_quote_at(&t, None, 3, Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()).unwrap();
        let second = make_quote(&t, None, 3).unwrap();
        assert!(first.matches(&second));
    }

    #[test]
    fn test_make_quote_unresolvable() {
        assert!(make_quote(&tour(), None, 9).is_err());
    }

    #[test]
    fn test_quote_serializes_price_as_number() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let quote = make_quote_at(&tour(), None, 2, at).unwrap();
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["price"], serde_json::json!(120.0));
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["entityKind"], "tour");
        assert_eq!(json["provenance"], "own_schedule");
    }

    #[test]
    fn test_verify_charge() {
        let quote = make_quote(&tour(), None, 2).unwrap();
        assert!(verify_charge(&quote, dec!(120.00), "usd").is_ok());

        let err = verify_charge(&quote, dec!(100), "USD").unwrap_err();
        assert_eq!(err.current_price, dec!(120));
        assert!(verify_charge(&quote, dec!(120), "INR").is_err());
    }
}
