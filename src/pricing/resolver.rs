//! Price resolution for a priceable entity and a group size.
//!
//! Sources are consulted in a fixed order, first success wins:
//!
//! 1. The entity's own tier schedule.
//! 2. The parent tour's schedule, when the entity is an option with no
//!    schedule of its own.
//! 3. The legacy `{groupPrice, maxGroupSize}` total. Group-total display
//!    only; never consulted for a per-size quote or a starting price.
//! 4. The flat per-unit price times the group size, entity first, then
//!    parent. Only when neither entity nor parent has a schedule.
//!
//! Every display and booking path goes through this module so the order
//! lives in one place.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::calculators::per_unit_total;
use super::entity::{EntityPricing, EntityRef, Priceable};
use super::tier::Tier;

/// Which source produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    OwnSchedule,
    ParentSchedule,
    LegacyGroupPrice,
    PerUnitFallback,
}

impl Provenance {
    /// Prices derived from per-unit multiplication come from records that
    /// predate tiered pricing and should be re-authored.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Provenance::PerUnitFallback)
    }
}

/// A resolved price and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub price: Decimal,
    pub currency: String,
    pub provenance: Provenance,
    /// The tier that matched, for schedule-sourced prices.
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvableReason {
    /// Group size below one.
    InvalidGroupSize,
    /// A schedule applies but no tier covers the group size.
    NoMatchingTier,
    /// The covering tier has no usable price.
    UnpricedTier,
    /// No pricing source is recorded.
    NoPricing,
    /// The per-unit total is too large to represent.
    Overflow,
}

impl fmt::Display for UnresolvableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnresolvableReason::InvalidGroupSize => "group size must be at least 1",
            UnresolvableReason::NoMatchingTier => "no tier covers this group size",
            UnresolvableReason::UnpricedTier => "the matching tier has no price",
            UnresolvableReason::NoPricing => "no pricing is configured",
            UnresolvableReason::Overflow => "the total is too large",
        };
        f.write_str(text)
    }
}

/// No pricing source yielded a usable positive price.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no price for {entity} with {group_size} people: {reason}")]
pub struct Unresolvable {
    pub entity: EntityRef,
    pub group_size: u32,
    pub reason: UnresolvableReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    PerSize,
    GroupTotal,
}

/// Price to charge `group_size` people for `entity`.
pub fn resolve(
    entity: &dyn Priceable,
    parent: Option<&dyn Priceable>,
    group_size: u32,
) -> Result<Resolution, Unresolvable> {
    resolve_in(entity, parent, group_size, Context::PerSize)
}

/// "Starting from" price: [`resolve`] at the smallest size the applicable
/// schedule covers, or at one unit when there is no schedule.
pub fn resolve_starting_price(
    entity: &dyn Priceable,
    parent: Option<&dyn Priceable>,
) -> Result<Resolution, Unresolvable> {
    resolve(entity, parent, starting_group_size(entity, parent))
}

/// Group size used for the "starting from" price.
pub fn starting_group_size(entity: &dyn Priceable, parent: Option<&dyn Priceable>) -> u32 {
    applicable_schedule(entity.pricing(), parent.map(|p| p.pricing()))
        .and_then(|(owner, _)| owner.schedule.smallest_size())
        .unwrap_or(1)
}

/// Total for a whole group, for displays that show a group total.
///
/// Same order as [`resolve`], except that a legacy group price is consulted
/// after the schedules.
pub fn resolve_group_total(
    entity: &dyn Priceable,
    parent: Option<&dyn Priceable>,
    group_size: u32,
) -> Result<Resolution, Unresolvable> {
    resolve_in(entity, parent, group_size, Context::GroupTotal)
}

fn resolve_in(
    entity: &dyn Priceable,
    parent: Option<&dyn Priceable>,
    group_size: u32,
    context: Context,
) -> Result<Resolution, Unresolvable> {
    let unresolvable = |reason| Unresolvable {
        entity: entity.entity_ref(),
        group_size,
        reason,
    };

    if group_size == 0 {
        return Err(unresolvable(UnresolvableReason::InvalidGroupSize));
    }

    let own = entity.pricing();
    let parent_pricing = parent.map(|p| p.pricing());

    // Steps 1 and 2
    let schedule = applicable_schedule(own, parent_pricing);
    let mut failure = UnresolvableReason::NoPricing;
    if let Some((schedule_owner, provenance)) = schedule {
        match schedule_owner.schedule.find(group_size) {
            Some(tier) => match tier.usable_price() {
                Some(price) => {
                    return Ok(Resolution {
                        price,
                        currency: schedule_owner.currency.clone(),
                        provenance,
                        tier: Some(tier.clone()),
                    });
                }
                None => failure = UnresolvableReason::UnpricedTier,
            },
            None => failure = UnresolvableReason::NoMatchingTier,
        }
        debug!("{} has no tier price for {} people ({})", entity.entity_ref(), group_size, failure);
    }

    // Step 3
    if context == Context::GroupTotal {
        let legacy = own
            .legacy_group_price()
            .map(|l| (l, own))
            .or_else(|| parent_pricing.and_then(|p| p.legacy_group_price().map(|l| (l, p))));
        if let Some((legacy, owner)) = legacy {
            if legacy.covers(group_size) {
                return Ok(Resolution {
                    price: legacy.total,
                    currency: owner.currency.clone(),
                    provenance: Provenance::LegacyGroupPrice,
                    tier: None,
                });
            }
        }
    }

    // Step 4
    if schedule.is_none() {
        let unit = own
            .unit_price()
            .map(|u| (u, own))
            .or_else(|| parent_pricing.and_then(|p| p.unit_price().map(|u| (u, p))));
        if let Some((unit_price, owner)) = unit {
            let Some(price) = per_unit_total(unit_price, group_size) else {
                warn!("{} per-unit total overflows ({} x {})", entity.entity_ref(), unit_price, group_size);
                return Err(unresolvable(UnresolvableReason::Overflow));
            };
            if price > Decimal::ZERO {
                warn!(
                    "{} priced by per-unit fallback ({} x {}); record predates tiered pricing",
                    entity.entity_ref(),
                    unit_price,
                    group_size
                );
                return Ok(Resolution {
                    price,
                    currency: owner.currency.clone(),
                    provenance: Provenance::PerUnitFallback,
                    tier: None,
                });
            }
        }
    }

    Err(unresolvable(failure))
}

/// The schedule in force: the entity's own when non-empty, else the parent's.
fn applicable_schedule<'a>(
    own: &'a EntityPricing,
    parent: Option<&'a EntityPricing>,
) -> Option<(&'a EntityPricing, Provenance)> {
    if own.has_schedule() {
        return Some((own, Provenance::OwnSchedule));
    }
    parent
        .filter(|p| p.has_schedule())
        .map(|p| (p, Provenance::ParentSchedule))
}
