//! Freshness module - per-feed refresh gating on top of the TTL cache.

mod feed_refresher;
mod freshness_gate;
mod freshness_model;


pub use feed_refresher::FeedRefresher;
pub use freshness_gate::{iso_week_key, should_refresh};
pub use freshness_model::{FeedId, RefreshOutcome, RefreshPolicy, RefreshTrigger, FEED_KEY_PREFIX};
