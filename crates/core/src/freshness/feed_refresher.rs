//! Gated feed refresh with stale-serve fallback.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use super::freshness_gate;
use super::freshness_model::{FeedId, RefreshOutcome, RefreshPolicy, RefreshTrigger};
use crate::cache::FreshnessCache;
use crate::errors::{Error, Result};
use crate::utils::time_utils::Clock;

/// Decides when feeds are re-fetched and keeps their last good value.
///
/// Each feed's value lives in the cache under `feed:<id>` with no expiry, so
/// the last good value outlives any outage. The entry's creation time doubles
/// as the last successful fetch time.
#[derive(Clone)]
pub struct FeedRefresher {
    cache: FreshnessCache,
    clock: Arc<dyn Clock>,
}

impl FeedRefresher {
    pub fn new(cache: FreshnessCache, clock: Arc<dyn Clock>) -> Self {
        FeedRefresher { cache, clock }
    }

    /// Time of the last successful fetch, if any value is retained.
    pub async fn last_fetch(&self, feed: FeedId) -> Option<DateTime<Utc>> {
        self.cache
            .peek::<serde_json::Value>(&feed.cache_key())
            .await
            .map(|cached| cached.created_at)
    }

    /// Whether an automatic refresh of `feed` under `policy` is due now.
    pub async fn should_refresh(&self, feed: FeedId, policy: RefreshPolicy) -> bool {
        let last_fetch = self.last_fetch(feed).await;
        freshness_gate::should_refresh(last_fetch, self.clock.now(), policy)
    }

    /// Feeds among `feeds` whose default policy says they are due.
    pub async fn due_feeds(&self, feeds: &[FeedId]) -> Vec<FeedId> {
        let checks = feeds
            .iter()
            .map(|feed| async move { (*feed, self.should_refresh(*feed, feed.default_policy()).await) });
        join_all(checks)
            .await
            .into_iter()
            .filter_map(|(feed, due)| due.then_some(feed))
            .collect()
    }

    /// Refreshes `feed` through `fetch` unless the gate says the stored value
    /// is still fresh.
    ///
    /// Manual triggers always fetch. When the fetch fails the last good value
    /// is served and the last-fetch time is left untouched. Errors only when
    /// the fetch fails and nothing was ever stored.
    pub async fn refresh<T, F, Fut, E>(
        &self,
        feed: FeedId,
        policy: RefreshPolicy,
        trigger: RefreshTrigger,
        fetch: F,
    ) -> Result<RefreshOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let key = feed.cache_key();
        let now = self.clock.now();
        let previous = match self.cache.peek::<T>(&key).await {
            Some(cached)
                if trigger == RefreshTrigger::Automatic
                    && !freshness_gate::should_refresh(Some(cached.created_at), now, policy) =>
            {
                debug!("{} is fresh under {}, skipping fetch", feed, policy);
                return Ok(RefreshOutcome::Fresh(cached.value));
            }
            other => other,
        };

        match fetch().await {
            Ok(value) => {
                if let Err(e) = self.cache.set_retained(&key, &value).await {
                    warn!("Fetched {} but could not store it: {}", feed, e);
                }
                info!("Refreshed {} ({:?})", feed, trigger);
                Ok(RefreshOutcome::Fetched(value))
            }
            Err(e) => match previous {
                Some(cached) => {
                    warn!(
                        "Fetch of {} failed: {}. Serving value from {}.",
                        feed, e, cached.created_at
                    );
                    Ok(RefreshOutcome::StaleServed {
                        value: cached.value,
                        error: e.to_string(),
                    })
                }
                None => Err(Error::Fetch(format!("{}: {}", feed, e))),
            },
        }
    }

    /// `refresh` with the feed's default policy.
    pub async fn refresh_default<T, F, Fut, E>(
        &self,
        feed: FeedId,
        trigger: RefreshTrigger,
        fetch: F,
    ) -> Result<RefreshOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        self.refresh(feed, feed.default_policy(), trigger, fetch)
            .await
    }

    /// Drops the stored value so the next refresh is unconditional.
    pub async fn invalidate(&self, feed: FeedId) {
        self.cache.delete(&feed.cache_key()).await;
    }
}
