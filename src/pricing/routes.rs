//! HTTP handlers exposing the pricing engine to the booking API and the
//! authoring UI.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::editor;
use super::entity::EntityPricing;
use super::requests::{BookingChargeRequest, EditScheduleRequest, QuoteRequest, SavePricingRequest, ScheduleRequest};
use super::responses::{BookableOptionsResponse, QuoteResponse, ScheduleResponse};
use super::schedule::ScheduleError;
use super::services::{self, PricingError};
use super::tier::{decode_tiers, MAX_CAPACITY};

/// Pricing routes, mounted under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tours/:tour_id/options", get(list_options))
        .route("/api/tours/:tour_id/pricing", put(save_tour_pricing))
        .route("/api/tours/:tour_id/options/:option_id/pricing", put(save_option_pricing))
        .route("/api/pricing/quote", post(quote))
        .route("/api/pricing/booking-charge", post(booking_charge))
        .route("/api/pricing/schedules/validate", post(validate_schedule))
        .route("/api/pricing/schedules/edit", post(edit_schedule))
}

async fn list_options(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<BookableOptionsResponse>> {
    let listing = services::list_bookable_options(&state.db, &state.cache, tour_id).await?;
    Ok(Json(listing))
}

async fn quote(State(state): State<AppState>, Json(request): Json<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    let quote = services::quote(&state.db, &state.cache, &request).await?;
    Ok(Json(quote.into()))
}

async fn booking_charge(
    State(state): State<AppState>,
    Json(request): Json<BookingChargeRequest>,
) -> Result<Json<QuoteResponse>> {
    let quote = services::booking_charge(&state.db, &request).await?;
    Ok(Json(quote.into()))
}

fn checked_cap(cap: u32) -> std::result::Result<u32, PricingError> {
    if (1..=MAX_CAPACITY).contains(&cap) {
        Ok(cap)
    } else {
        Err(ScheduleError::InvalidCap { cap }.into())
    }
}

async fn validate_schedule(Json(request): Json<ScheduleRequest>) -> Result<Json<ScheduleResponse>> {
    let cap = checked_cap(request.max_group_size)?;
    let schedule = decode_tiers(request.tiers).map_err(PricingError::from)?;
    schedule.validate(cap).map_err(PricingError::from)?;

    Ok(Json(ScheduleResponse {
        complete: schedule.is_complete(),
        tiers: schedule,
        max_group_size: cap,
    }))
}

async fn edit_schedule(Json(request): Json<EditScheduleRequest>) -> Result<Json<ScheduleResponse>> {
    let cap = checked_cap(request.max_group_size)?;
    let schedule = decode_tiers(request.tiers).map_err(PricingError::from)?;
    schedule.validate(cap).map_err(PricingError::from)?;
    let (schedule, cap) = editor::apply(&schedule, cap, &request.op);

    Ok(Json(ScheduleResponse {
        complete: schedule.is_complete(),
        tiers: schedule,
        max_group_size: cap,
    }))
}

async fn save_tour_pricing(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
    Json(request): Json<SavePricingRequest>,
) -> Result<Json<EntityPricing>> {
    let pricing = services::save_tour_pricing(&state.db, &state.cache, tour_id, request).await?;
    Ok(Json(pricing))
}

async fn save_option_pricing(
    State(state): State<AppState>,
    Path((tour_id, option_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SavePricingRequest>,
) -> Result<Json<EntityPricing>> {
    let pricing = services::save_option_pricing(&state.db, &state.cache, tour_id, option_id, request).await?;
    Ok(Json(pricing))
}
