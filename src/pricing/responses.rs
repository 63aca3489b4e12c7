//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::calculators::{currency_symbol, format_amount};
use super::entity::EntityKind;
use super::quote::Quote;
use super::schedule::PriceSchedule;

/// Price shown to a customer: `{ price, currency }`
#[derive(Debug, Clone, Serialize)]
pub struct PriceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub symbol: &'static str,
    pub display: String,
}

impl PriceResponse {
    pub fn new(price: Decimal, currency: &str) -> Self {
        Self {
            price,
            currency: currency.to_string(),
            symbol: currency_symbol(currency),
            display: format_amount(price, currency),
        }
    }
}

/// Response for a quote
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    pub symbol: &'static str,
    pub display: String,
    /// Priced by per-unit fallback; the record should be re-authored
    pub degraded: bool,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            symbol: currency_symbol(&quote.currency),
            display: quote.display_price(),
            degraded: quote.provenance.is_degraded(),
            quote,
        }
    }
}

/// One entry of a tour's bookable list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookableOptionResponse {
    pub id: Uuid,
    pub kind: EntityKind,
    pub title: String,
    pub max_group_size: u32,
    pub starting_group_size: u32,
    /// `None` renders as "pricing unavailable"
    pub starting_price: Option<PriceResponse>,
    /// Tiers the booking panel should offer
    pub tiers: PriceSchedule,
}

/// Response for a tour's bookable options
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookableOptionsResponse {
    pub tour_id: Uuid,
    pub options: Vec<BookableOptionResponse>,
}

/// Response for schedule validation and editing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub tiers: PriceSchedule,
    pub max_group_size: u32,
    pub complete: bool,
}

/// Generic pricing error response
#[derive(Debug, Serialize)]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
