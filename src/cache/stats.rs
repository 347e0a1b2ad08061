//! Hit/miss and remote-read counters for observability.

use std::time::Instant;

/// Counters accumulated across the cache tiers and the collector.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Individual read slots issued against the remote
    pub remote_reads: u64,
    /// Round trips (batch executions) against the remote
    pub batch_round_trips: u64,
    pub last_reset: Instant,
}

impl CacheStats {
    pub fn new(now: Instant) -> Self {
        Self {
            cache_hits: 0,
            cache_misses: 0,
            remote_reads: 0,
            batch_round_trips: 0,
            last_reset: now,
        }
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    /// Record one executed batch carrying `slots` read requests.
    pub fn record_round_trip(&mut self, slots: usize) {
        self.batch_round_trips += 1;
        self.remote_reads += slots as u64;
    }

    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}
