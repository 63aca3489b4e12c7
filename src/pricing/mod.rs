//! Tiered group-pricing engine for tours and tour options.
//!
//! The engine modules (`tier`, `schedule`, `editor`, `entity`, `resolver`,
//! `quote`) are pure and synchronous. `services` and `routes` connect them to
//! storage and to the booking API.

pub mod calculators;
pub mod editor;
pub mod entity;
pub mod quote;
pub mod requests;
pub mod resolver;
pub mod responses;
pub mod routes;
pub mod schedule;
pub mod services;
pub mod tier;

// Re-export commonly used items
pub use calculators::{currency_symbol, round_money};
pub use editor::EditOp;
pub use entity::{EntityKind, EntityPricing, Priceable, Tour, TourOption};
pub use quote::{make_quote, Quote};
pub use resolver::{resolve, resolve_group_total, resolve_starting_price, Provenance, Resolution, Unresolvable};
pub use routes::router;
pub use schedule::{PriceSchedule, ScheduleError};
pub use services::PricingError;
pub use tier::{Tier, TierSource};
