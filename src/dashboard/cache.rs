//! Memoization of data-source queries.

use crate::core::TimeSeries;
use crate::dashboard::config::CacheConfig;
use crate::dashboard::source::SeriesQuery;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct CacheEntry {
    series: TimeSeries,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Query results keyed by [`SeriesQuery`], each valid for `ttl` after it was fetched.
///
/// At most `max_entries` series are held; inserting beyond that evicts the entry fetched
/// longest ago.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: HashMap<SeriesQuery, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Cached series for `query`, dropping it if it has expired.
    pub fn get(&mut self, query: &SeriesQuery) -> Option<TimeSeries> {
        match self.entries.get(query) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                self.hits += 1;
                debug!(%query, "query cache hit");
                Some(entry.series.clone())
            }
            Some(_) => {
                self.entries.remove(query);
                self.misses += 1;
                debug!(%query, "query cache entry expired");
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, query: SeriesQuery, series: TimeSeries) {
        if !self.entries.contains_key(&query) && self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                info!(query = %key, "evicting oldest cached series");
                self.entries.remove(&key);
            }
        }
        self.entries.insert(
            query,
            CacheEntry {
                series,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Cached series for `query`, or the result of `fetch` which is then cached.
    ///
    /// Fetch failures are returned as they are and nothing is cached.
    pub fn get_or_fetch<F>(&mut self, query: &SeriesQuery, fetch: F) -> Result<TimeSeries>
    where
        F: FnOnce(&SeriesQuery) -> Result<TimeSeries>,
    {
        if let Some(series) = self.get(query) {
            return Ok(series);
        }
        let series = fetch(query)?;
        info!(%query, len = series.len(), "fetched series from data source");
        self.insert(query.clone(), series.clone());
        Ok(series)
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}
