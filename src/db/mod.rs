//! Storage for tour and option records.
//!
//! The pricing engine never touches this module; services load snapshots
//! through it and hand validated pricing back for saving.

pub mod models;
pub mod queries;

pub use queries::{load_tour, update_option_pricing, update_tour_pricing};
