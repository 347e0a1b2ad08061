//! Tracker configuration with documented constants
//!
//! All cadences and ceilings are collected here with explanations of
//! their purpose and how they interact with each other.

use std::time::Duration;

/// Configuration for the cache tiers and refresh gates
///
/// These values mirror the cadence of a 60 Hz ingest loop. Tightening a
/// TTL trades extra round trips for freshness; loosening it trades the
/// other way.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    // === SLOW TIER ===
    /// Minimum interval between attribute-tier batch refreshes
    ///
    /// Health, identity links and network ids change rarely compared to
    /// positions, so they ride a multi-second gate instead of the hot
    /// per-tick path. The gate advances even when the batch fails, so a
    /// flaky remote cannot cause a retry storm.
    pub slow_refresh_interval: Duration,

    // === FAST TIER ===
    /// Age past which a position record is marked invalid
    ///
    /// Positions are rewritten every tick while the entity is visible,
    /// so a large age only occurs when the entity has genuinely left
    /// the frame. This is deliberately looser than the transform TTLs.
    pub position_stale_after: Duration,

    /// Hard ceiling past which position and attribute records are erased
    ///
    /// Separates "too old to trust" (the stale window above) from "too
    /// old to keep at all". Without it, entities that disappear with no
    /// removal signal would accumulate forever.
    pub purge_after: Duration,

    // === TRANSFORM TIER ===
    /// Freshness window for head-only transform lookups
    ///
    /// Short because the head marker tracks a moving target at frame
    /// rate and a single-joint read is cheap to repeat.
    pub head_ttl: Duration,

    /// Freshness window for full-skeleton transform lookups
    ///
    /// Looser than `head_ttl`: a full-skeleton read is several slots per
    /// entity and the figure visually tolerates a few more milliseconds
    /// of staleness.
    pub skeleton_ttl: Duration,

    /// Minimum interval between head-cache eviction sweeps
    pub head_sweep_interval: Duration,

    /// Hard ceiling past which head transform records are erased
    pub head_purge_after: Duration,

    /// Minimum interval between skeleton-cache eviction sweeps
    pub skeleton_sweep_interval: Duration,

    /// Hard ceiling past which skeleton transform records are erased
    pub skeleton_purge_after: Duration,

    // === COLLECTION ===
    /// Maximum entities enumerated per tick; overflow is discarded
    pub max_entities: usize,

    // === OBSERVABILITY ===
    /// Minimum interval between stats log lines
    pub stats_log_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            slow_refresh_interval: Duration::from_secs(5),
            position_stale_after: Duration::from_secs(10),
            purge_after: Duration::from_secs(15),
            head_ttl: Duration::from_millis(10),
            skeleton_ttl: Duration::from_millis(45),
            head_sweep_interval: Duration::from_secs(2),
            head_purge_after: Duration::from_secs(10),
            skeleton_sweep_interval: Duration::from_secs(3),
            skeleton_purge_after: Duration::from_secs(15),
            max_entities: 110,
            stats_log_interval: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_ceilings_above_ttls() {
        let cfg = TrackerConfig::default();
        assert!(cfg.purge_after > cfg.position_stale_after);
        assert!(cfg.head_purge_after > cfg.head_ttl);
        assert!(cfg.skeleton_purge_after > cfg.skeleton_ttl);
        assert!(cfg.skeleton_ttl > cfg.head_ttl);
    }
}
