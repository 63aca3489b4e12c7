//! Request DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::editor::EditOp;

/// Request to quote a tour (or one of its options) for a group
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub tour_id: Uuid,
    /// Absent, or the tour's own id, selects the main tour
    #[serde(default)]
    pub option_id: Option<Uuid>,
    pub group_size: u32,
}

/// Request to confirm the charge for a booking being submitted
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingChargeRequest {
    pub tour_id: Uuid,
    #[serde(default)]
    pub option_id: Option<Uuid>,
    pub group_size: u32,
    /// Price the customer was shown
    pub price: Decimal,
    pub currency: String,
}

/// A schedule being authored, tiers in either stored form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub tiers: Option<serde_json::Value>,
    pub max_group_size: u32,
}

/// One authoring edit applied to a schedule
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditScheduleRequest {
    #[serde(default)]
    pub tiers: Option<serde_json::Value>,
    pub max_group_size: u32,
    pub op: EditOp,
}

/// Pricing submitted from the authoring UI for saving.
///
/// Amounts stay raw here so a save can reject what a read would skip.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePricingRequest {
    #[serde(default)]
    pub price_per_unit: serde_json::Value,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub max_group_size: Option<u32>,
    #[serde(default)]
    pub group_price: serde_json::Value,
    #[serde(default)]
    pub group_pricing_tiers: Option<serde_json::Value>,
}
