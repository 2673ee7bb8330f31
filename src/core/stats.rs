use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// Where a generation is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Current generation, handed out by checkout
    Live,
    /// Replaced by a newer generation; still valid for readers holding it
    Superseded,
    /// Usage drained after supersession and the index view is closed
    Released,
}

/// Snapshot of one generation for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearcherStats {
    pub generation: u64,
    pub lifecycle: Lifecycle,
    pub usage: usize,
    pub created_at: DateTime<Utc>,

    // Cache metrics
    pub cached_term_fields: usize,
    pub cached_decoded_fields: usize,
    pub cached_field_values: usize,
    pub tracked_facets: usize,
    pub has_full_term_data: bool,
}

/// Snapshot of a holder for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderStats {
    pub index_name: String,
    pub swaps: u64,
    pub current: SearcherStats,
    pub low_memory_handlers: usize,
}
