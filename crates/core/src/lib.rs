//! MarketPulse Core - temporal correctness layer for the dashboard.
//!
//! Market session state and countdowns, plus a TTL cache with per-feed
//! refresh gating. Storage is abstracted behind `KeyValueStore` and
//! implemented by the `storage-sqlite` crate.

pub mod cache;
pub mod errors;
pub mod freshness;
pub mod sessions;
pub mod utils;

pub use cache::{FreshnessCache, KeyValueStore};
pub use freshness::{FeedId, FeedRefresher, RefreshOutcome, RefreshPolicy, RefreshTrigger};
pub use sessions::{MarketId, MarketSessionService, MarketSessionServiceTrait, Region};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
