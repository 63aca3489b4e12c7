//! In-memory caching using moka
//!
//! Holds tour snapshots for display reads (listings, option prices, quotes
//! on the booking panel). Booking submission always reads storage directly,
//! so a stale entry can at worst produce a quote that fails verification.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::pricing::entity::Tour;

/// Application cache holding tour snapshots
#[derive(Clone)]
pub struct AppCache {
    /// Tours with their options (tour id -> Tour)
    pub tours: Cache<Uuid, Arc<Tour>>,
}

impl AppCache {
    /// Create a new cache instance with the given capacity and TTL
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            tours: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .time_to_idle(ttl / 2)
                .build(),
        }
    }

    /// Cache statistics reported by the health endpoint
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            tours_size: self.tours.entry_count(),
        }
    }

    /// Invalidate one tour after its pricing (or an option's) changed
    pub async fn invalidate_tour(&self, tour_id: Uuid) {
        self.tours.invalidate(&tour_id).await;
        info!("Cache invalidated for tour: {}", tour_id);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        // 1000 tours, 5 min TTL
        Self::new(1000, Duration::from_secs(5 * 60))
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub tours_size: u64,
}
