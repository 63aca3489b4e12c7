//! Pricing service functions with database access.
//!
//! These functions load tour snapshots (through the cache for display reads,
//! straight from storage for bookings), run them through the engine, and
//! hand validated pricing back to storage.

use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::db;
use crate::error::AppError;

use super::entity::{EntityPricing, PricingRecord, Priceable, Tour, DEFAULT_CURRENCY};
use super::quote::{make_quote, verify_charge, Quote, QuoteMismatch};
use super::requests::{BookingChargeRequest, QuoteRequest, SavePricingRequest};
use super::resolver::{resolve_starting_price, starting_group_size, Unresolvable};
use super::responses::{BookableOptionResponse, BookableOptionsResponse, PriceResponse};
use super::schedule::{PriceSchedule, ScheduleError};
use super::tier::{amount_from_value, decode_tiers, TierParseError, MAX_CAPACITY};

/// Pricing error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Parse(#[from] TierParseError),

    #[error(transparent)]
    Unresolvable(#[from] Unresolvable),

    #[error(transparent)]
    QuoteMismatch(#[from] QuoteMismatch),

    #[error("tour {tour_id} has no option {option_id}")]
    UnknownOption { tour_id: Uuid, option_id: Uuid },

    #[error("{field}: {reason}")]
    InvalidAmount { field: &'static str, reason: String },

    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },
}

impl PricingError {
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingError::Schedule(_) => "schedule",
            PricingError::Parse(_) => "parse",
            PricingError::Unresolvable(_) => "unresolvable",
            PricingError::QuoteMismatch(_) => "quote_mismatch",
            PricingError::UnknownOption { .. } => "unknown_option",
            PricingError::InvalidAmount { .. } => "parse",
            PricingError::NegativeAmount { .. } => "negative_amount",
        }
    }

    /// Structured details for the error response body
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            PricingError::Unresolvable(e) => Some(json!({
                "entityId": e.entity.id,
                "entityKind": e.entity.kind,
                "groupSize": e.group_size,
                "reason": e.reason.to_string(),
            })),
            PricingError::QuoteMismatch(e) => Some(json!({
                "quotedPrice": e.quoted_price.to_string(),
                "quotedCurrency": e.quoted_currency,
                "currentPrice": e.current_price.to_string(),
                "currentCurrency": e.current_currency,
            })),
            _ => None,
        }
    }
}

// ==================== pure helpers ====================

/// Quote one entry of a tour's bookable list.
///
/// `option_id` of `None` (or the tour's own id) quotes the main tour.
pub fn quote_for(tour: &Tour, option_id: Option<Uuid>, group_size: u32) -> Result<Quote, PricingError> {
    let id = option_id.unwrap_or(tour.id);
    let entry = tour.bookable_option(id).ok_or(PricingError::UnknownOption {
        tour_id: tour.id,
        option_id: id,
    })?;
    let parent = entry.parent().map(|t| t as &dyn Priceable);

    let quote = make_quote(&entry, parent, group_size)?;
    if quote.provenance.is_degraded() {
        warn!("Quote for {} on tour {} used per-unit fallback", id, tour.id);
    }
    Ok(quote)
}

/// Bookable list with starting prices, for display.
///
/// Entries that cannot be priced are listed with no starting price.
pub fn bookable_listing(tour: &Tour) -> BookableOptionsResponse {
    let options = tour
        .bookable_options()
        .into_iter()
        .map(|entry| {
            let parent = entry.parent().map(|t| t as &dyn Priceable);
            let starting_price = match resolve_starting_price(&entry, parent) {
                Ok(resolution) => Some(PriceResponse::new(resolution.price, &resolution.currency)),
                Err(e) => {
                    debug!("No starting price: {}", e);
                    None
                }
            };

            let own = entry.pricing();
            let tiers = if own.has_schedule() {
                own.schedule.clone()
            } else {
                parent
                    .map(|p| p.pricing().schedule.clone())
                    .unwrap_or_else(PriceSchedule::default)
            };

            let entity = entry.entity_ref();
            BookableOptionResponse {
                id: entity.id,
                kind: entity.kind,
                title: entry.title().to_string(),
                max_group_size: own
                    .max_group_size
                    .or_else(|| parent.and_then(|p| p.pricing().max_group_size))
                    .unwrap_or(MAX_CAPACITY),
                starting_group_size: starting_group_size(&entry, parent),
                starting_price,
                tiers,
            }
        })
        .collect();

    BookableOptionsResponse {
        tour_id: tour.id,
        options,
    }
}

fn strict_amount(field: &'static str, value: &Value) -> Result<Option<Decimal>, PricingError> {
    let amount = amount_from_value(value).map_err(|reason| PricingError::InvalidAmount { field, reason })?;
    if amount.is_some_and(|a| a < Decimal::ZERO) {
        return Err(PricingError::NegativeAmount { field });
    }
    Ok(amount)
}

/// Strict decode and validation of pricing submitted for saving.
///
/// Unlike reads, malformed tiers and amounts are an error here, and a tiered
/// entity must have a complete schedule inside its cap.
pub fn prepare_pricing(request: SavePricingRequest) -> Result<EntityPricing, PricingError> {
    let price_per_unit = strict_amount("pricePerUnit", &request.price_per_unit)?;
    let group_price = strict_amount("groupPrice", &request.group_price)?;
    let schedule = decode_tiers(request.group_pricing_tiers)?;

    if let Some(cap) = request.max_group_size {
        if !(1..=MAX_CAPACITY).contains(&cap) {
            return Err(ScheduleError::InvalidCap { cap }.into());
        }
    }

    let mut pricing = EntityPricing::from(PricingRecord {
        price_per_unit,
        currency: request.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        max_group_size: request.max_group_size,
        group_price,
        group_pricing_tiers: None,
    });
    pricing.schedule = schedule;

    if pricing.has_schedule() {
        pricing.schedule.validate(pricing.cap())?;
        if !pricing.schedule.is_complete() {
            return Err(ScheduleError::Incomplete.into());
        }
    }

    Ok(pricing)
}

// ==================== database-backed services ====================

/// Load a tour snapshot for display, through the cache
pub async fn load_tour_cached(pool: &PgPool, cache: &AppCache, tour_id: Uuid) -> Result<Arc<Tour>, AppError> {
    if let Some(cached) = cache.tours.get(&tour_id).await {
        debug!("Cache HIT for tour: {}", tour_id);
        return Ok(cached);
    }

    debug!("Cache MISS for tour: {}", tour_id);
    let tour = Arc::new(db::load_tour(pool, tour_id).await?);
    cache.tours.insert(tour_id, tour.clone()).await;
    Ok(tour)
}

/// List a tour's bookable options with starting prices
pub async fn list_bookable_options(
    pool: &PgPool,
    cache: &AppCache,
    tour_id: Uuid,
) -> Result<BookableOptionsResponse, AppError> {
    let tour = load_tour_cached(pool, cache, tour_id).await?;
    Ok(bookable_listing(&tour))
}

/// Quote for the booking panel
pub async fn quote(pool: &PgPool, cache: &AppCache, request: &QuoteRequest) -> Result<Quote, AppError> {
    let tour = load_tour_cached(pool, cache, request.tour_id).await?;
    Ok(quote_for(&tour, request.option_id, request.group_size)?)
}

/// Re-derive the charge for a booking from a fresh snapshot and check it
/// against the price the customer saw.
pub async fn booking_charge(pool: &PgPool, request: &BookingChargeRequest) -> Result<Quote, AppError> {
    let tour = db::load_tour(pool, request.tour_id).await?;
    let quote = quote_for(&tour, request.option_id, request.group_size)?;

    verify_charge(&quote, request.price, &request.currency).map_err(|e| {
        warn!("Booking charge rejected for tour {}: {}", request.tour_id, e);
        PricingError::from(e)
    })?;

    info!(
        "Booking charge confirmed: {} {} for {} people on tour {}",
        quote.price, quote.currency, quote.group_size, request.tour_id
    );
    Ok(quote)
}

/// Validate and save a tour's own pricing
pub async fn save_tour_pricing(
    pool: &PgPool,
    cache: &AppCache,
    tour_id: Uuid,
    request: SavePricingRequest,
) -> Result<EntityPricing, AppError> {
    let pricing = prepare_pricing(request)?;
    db::update_tour_pricing(pool, tour_id, &pricing).await?;
    cache.invalidate_tour(tour_id).await;
    info!("Saved pricing for tour {} ({} tiers)", tour_id, pricing.schedule.len());
    Ok(pricing)
}

/// Validate and save one option's pricing
pub async fn save_option_pricing(
    pool: &PgPool,
    cache: &AppCache,
    tour_id: Uuid,
    option_id: Uuid,
    request: SavePricingRequest,
) -> Result<EntityPricing, AppError> {
    let pricing = prepare_pricing(request)?;
    db::update_option_pricing(pool, tour_id, option_id, &pricing).await?;
    cache.invalidate_tour(tour_id).await;
    info!(
        "Saved pricing for option {} of tour {} ({} tiers)",
        option_id,
        tour_id,
        pricing.schedule.len()
    );
    Ok(pricing)
}
