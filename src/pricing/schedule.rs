//! Ordered tier collections and the checks run before one is persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tier::{Tier, MAX_CAPACITY};

/// Why a schedule cannot be persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("tier {first} ({first_max} people max) overlaps tier {second} (from {second_min} people)")]
    Overlap {
        first: usize,
        second: usize,
        first_max: u32,
        second_min: u32,
    },

    #[error("tier {index} goes up to {max_size} people but the group cap is {cap}")]
    OutOfCap { index: usize, max_size: u32, cap: u32 },

    #[error("tier {index} has an invalid range {min_size}-{max_size}")]
    InvalidRange {
        index: usize,
        min_size: u32,
        max_size: u32,
    },

    #[error("tier {index} has a negative price")]
    NegativePrice { index: usize },

    #[error("group cap {cap} is outside 1..={max}", max = MAX_CAPACITY)]
    InvalidCap { cap: u32 },

    #[error("tiered pricing needs at least one tier and a price on every tier")]
    Incomplete,
}

/// An entity's tiers, kept sorted ascending by `min_size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct PriceSchedule {
    tiers: Vec<Tier>,
}

impl PriceSchedule {
    /// Build a schedule from tiers in any order.
    pub fn from_tiers(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by_key(|t| t.min_size);
        Self { tiers }
    }

    /// Callers guarantee `tiers` is already ascending by `min_size`.
    pub(crate) fn from_sorted(tiers: Vec<Tier>) -> Self {
        debug_assert!(tiers.windows(2).all(|w| w[0].min_size <= w[1].min_size));
        Self { tiers }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// First tier covering `group_size`, scanning in ascending order.
    pub fn find(&self, group_size: u32) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.contains(group_size))
    }

    /// Smallest group size the schedule prices.
    pub fn smallest_size(&self) -> Option<u32> {
        self.tiers.first().map(|t| t.min_size)
    }

    /// Largest group size the schedule prices.
    pub fn largest_size(&self) -> Option<u32> {
        self.tiers.last().map(|t| t.max_size)
    }

    /// Reject overlapping ranges, ranges past `cap`, and malformed tiers.
    pub fn validate(&self, cap: u32) -> Result<(), ScheduleError> {
        validate(self, cap)
    }

    pub fn is_complete(&self) -> bool {
        is_complete(self)
    }
}

impl From<Vec<Tier>> for PriceSchedule {
    fn from(tiers: Vec<Tier>) -> Self {
        Self::from_tiers(tiers)
    }
}

impl From<PriceSchedule> for Vec<Tier> {
    fn from(schedule: PriceSchedule) -> Self {
        schedule.tiers
    }
}

/// Check a schedule against a capacity cap before it is saved.
///
/// Gaps between tiers are accepted here; they only make some sizes
/// unpriceable.
pub fn validate(schedule: &PriceSchedule, cap: u32) -> Result<(), ScheduleError> {
    if !(1..=MAX_CAPACITY).contains(&cap) {
        return Err(ScheduleError::InvalidCap { cap });
    }

    for (index, tier) in schedule.tiers.iter().enumerate() {
        if tier.min_size < 1 || tier.max_size < tier.min_size {
            return Err(ScheduleError::InvalidRange {
                index,
                min_size: tier.min_size,
                max_size: tier.max_size,
            });
        }
        if tier.max_size > cap {
            return Err(ScheduleError::OutOfCap {
                index,
                max_size: tier.max_size,
                cap,
            });
        }
        if tier.price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(ScheduleError::NegativePrice { index });
        }
    }

    // Sorted by min_size, so any overlap shows up between neighbours.
    for (index, pair) in schedule.tiers.windows(2).enumerate() {
        if pair[0].max_size >= pair[1].min_size {
            return Err(ScheduleError::Overlap {
                first: index,
                second: index + 1,
                first_max: pair[0].max_size,
                second_min: pair[1].min_size,
            });
        }
    }

    Ok(())
}

/// True when there is at least one tier and every tier has a price.
pub fn is_complete(schedule: &PriceSchedule) -> bool {
    !schedule.tiers.is_empty() && schedule.tiers.iter().all(|t| t.price.is_some())
}
