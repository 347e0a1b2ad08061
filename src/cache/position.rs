//! Fast tier: per-frame position records
//!
//! Fully rewritten from collector output every tick. Entities missing
//! from a tick are left in place so a transient enumeration miss does
//! not blank them; they age out instead.

use ahash::AHashMap;
use glam::Vec3;
use std::time::{Duration, Instant};

use crate::core::types::EntityId;

#[derive(Debug, Clone, Copy)]
pub struct PositionRecord {
    pub position: Vec3,
    pub last_update: Instant,
    pub valid: bool,
}

impl PositionRecord {
    /// Fresh enough to use without any fallback reasoning.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.valid && now.duration_since(self.last_update) < ttl
    }
}

#[derive(Debug, Default)]
pub struct PositionCache {
    records: AHashMap<EntityId, PositionRecord>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self {
            records: AHashMap::with_capacity(256),
        }
    }

    /// Overwrite/create a record for every entity present this tick.
    ///
    /// Ids absent this tick are not touched; their prior position stays
    /// available until the aging sweep retires it.
    pub fn apply_frame(&mut self, ids: &[EntityId], positions: &[Vec3], now: Instant) {
        for (&id, &position) in ids.iter().zip(positions) {
            self.records.insert(
                id,
                PositionRecord {
                    position,
                    last_update: now,
                    valid: true,
                },
            );
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&PositionRecord> {
        self.records.get(&id)
    }

    /// All entities whose record still carries the valid flag.
    pub fn valid_ids(&self) -> Vec<EntityId> {
        self.records
            .iter()
            .filter(|(_, record)| record.valid)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Mark records past `stale_after` invalid without removing them.
    pub fn age_sweep(&mut self, now: Instant, stale_after: Duration) {
        for record in self.records.values_mut() {
            if now.duration_since(record.last_update) > stale_after {
                record.valid = false;
            }
        }
    }

    /// Erase records past the hard `ceiling`.
    pub fn purge(&mut self, now: Instant, ceiling: Duration) {
        self.records
            .retain(|_, record| now.duration_since(record.last_update) <= ceiling);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
