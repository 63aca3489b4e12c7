//! Authoring transforms over tier schedules.
//!
//! Every function takes a schedule by reference and returns a new one; none
//! of them can produce overlapping tiers. Gaps are allowed while authoring.
//! Out-of-range indexes and edits with nowhere to go return the input
//! unchanged.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::entity::EntityPricing;
use super::schedule::PriceSchedule;
use super::tier::{Tier, MAX_CAPACITY};

/// Default width of an appended tier, in people beyond its lower bound.
const APPEND_SPAN: u32 = 3;

fn effective_cap(cap: u32) -> u32 {
    cap.clamp(1, MAX_CAPACITY)
}

/// Add a tier after the last one: `[last.max + 1, min(that + 3, cap)]`,
/// unpriced. No-op once the schedule reaches `cap`.
pub fn append_tier(schedule: &PriceSchedule, cap: u32) -> PriceSchedule {
    let cap = effective_cap(cap);
    let min_size = match schedule.largest_size() {
        Some(max) => max.saturating_add(1),
        None => 1,
    };
    if min_size > cap {
        debug!("append_tier: schedule already reaches cap {}", cap);
        return schedule.clone();
    }

    let mut tiers = schedule.tiers().to_vec();
    tiers.push(Tier::unpriced(min_size, (min_size + APPEND_SPAN).min(cap)));
    PriceSchedule::from_sorted(tiers)
}

/// Move a tier's lower bound, clamped to `[prev.max + 1, tier.max - 1]`
/// (the floor is 1 for the first tier).
pub fn resize_lower_bound(schedule: &PriceSchedule, index: usize, new_min: u32, cap: u32) -> PriceSchedule {
    let tiers = schedule.tiers();
    let Some(tier) = tiers.get(index) else {
        debug!("resize_lower_bound: no tier at {}", index);
        return schedule.clone();
    };

    let floor = index
        .checked_sub(1)
        .map_or(1, |prev| tiers[prev].max_size.saturating_add(1))
        .max(1);
    let ceiling = tier.max_size.saturating_sub(1).min(effective_cap(cap));
    if ceiling < floor {
        return schedule.clone();
    }

    let mut tiers = tiers.to_vec();
    tiers[index].min_size = new_min.clamp(floor, ceiling);
    PriceSchedule::from_sorted(tiers)
}

/// Move a tier's upper bound, clamped to
/// `[tier.min + 1, min(cap, next.min - 1)]`.
pub fn resize_upper_bound(schedule: &PriceSchedule, index: usize, new_max: u32, cap: u32) -> PriceSchedule {
    let tiers = schedule.tiers();
    let Some(tier) = tiers.get(index) else {
        debug!("resize_upper_bound: no tier at {}", index);
        return schedule.clone();
    };

    let floor = tier.min_size.saturating_add(1);
    let cap = effective_cap(cap);
    let ceiling = tiers
        .get(index + 1)
        .map_or(cap, |next| next.min_size.saturating_sub(1))
        .min(cap);
    if ceiling < floor {
        return schedule.clone();
    }

    let mut tiers = tiers.to_vec();
    tiers[index].max_size = new_max.clamp(floor, ceiling);
    PriceSchedule::from_sorted(tiers)
}

/// Drop one tier. Neighbours keep their ranges.
pub fn remove_tier(schedule: &PriceSchedule, index: usize) -> PriceSchedule {
    if index >= schedule.len() {
        debug!("remove_tier: no tier at {}", index);
        return schedule.clone();
    }
    let mut tiers = schedule.tiers().to_vec();
    tiers.remove(index);
    PriceSchedule::from_sorted(tiers)
}

/// Shrink or grow the overall cap. Tiers starting past the new cap are
/// dropped; the rest have their upper bound clamped to it.
pub fn set_cap(schedule: &PriceSchedule, new_cap: u32) -> PriceSchedule {
    let cap = effective_cap(new_cap);
    let tiers = schedule
        .tiers()
        .iter()
        .filter(|t| t.min_size <= cap)
        .map(|t| Tier::new(t.min_size, t.max_size.min(cap), t.price))
        .collect();
    PriceSchedule::from_sorted(tiers)
}

/// Set or clear one tier's price.
pub fn set_price(schedule: &PriceSchedule, index: usize, price: Option<Decimal>) -> PriceSchedule {
    if index >= schedule.len() {
        debug!("set_price: no tier at {}", index);
        return schedule.clone();
    }
    let mut tiers = schedule.tiers().to_vec();
    tiers[index].price = price;
    PriceSchedule::from_sorted(tiers)
}

/// One authoring edit, as posted by the authoring UI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditOp {
    Append,
    ResizeLower { index: usize, min_size: u32 },
    ResizeUpper { index: usize, max_size: u32 },
    Remove { index: usize },
    SetPrice {
        index: usize,
        #[serde(default, deserialize_with = "super::tier::lenient_amount")]
        price: Option<Decimal>,
    },
    SetCap { cap: u32 },
}

/// Apply one edit. Returns the new schedule and the cap in force after it.
pub fn apply(schedule: &PriceSchedule, cap: u32, op: &EditOp) -> (PriceSchedule, u32) {
    match *op {
        EditOp::Append => (append_tier(schedule, cap), cap),
        EditOp::ResizeLower { index, min_size } => (resize_lower_bound(schedule, index, min_size, cap), cap),
        EditOp::ResizeUpper { index, max_size } => (resize_upper_bound(schedule, index, max_size, cap), cap),
        EditOp::Remove { index } => (remove_tier(schedule, index), cap),
        EditOp::SetPrice { index, price } => (set_price(schedule, index, price), cap),
        EditOp::SetCap { cap: new_cap } => (set_cap(schedule, new_cap), effective_cap(new_cap)),
    }
}

/// How an entity is priced while authoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingMode {
    PerUnit,
    Tiered,
}

/// Current mode: tiered while a schedule exists.
pub fn pricing_mode(pricing: &EntityPricing) -> PricingMode {
    if pricing.has_schedule() {
        PricingMode::Tiered
    } else {
        PricingMode::PerUnit
    }
}

/// Switch an entity's pricing mode.
///
/// Switching to tiered starts an empty schedule and makes sure a cap is
/// declared. Switching to per-unit discards the schedule.
pub fn switch_pricing_mode(pricing: &EntityPricing, mode: PricingMode) -> EntityPricing {
    let mut next = pricing.clone();
    match mode {
        PricingMode::Tiered => {
            if pricing_mode(pricing) == PricingMode::Tiered {
                return next;
            }
            next.schedule = PriceSchedule::default();
            next.max_group_size = Some(pricing.cap());
        }
        PricingMode::PerUnit => {
            next.schedule = PriceSchedule::default();
        }
    }
    next
}
