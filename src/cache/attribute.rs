//! Slow tier: health, identity link and network id
//!
//! Refreshed on a multi-second gate, never per tick. One batched pass
//! reads health and identity-link for every tracked entity; a second
//! pass correlates network ids for entities whose link resolved, since
//! that address depends on the first pass's result.

use ahash::AHashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::stats::CacheStats;
use crate::core::layout::WorldLayout;
use crate::core::types::EntityId;
use crate::gateway::{RemoteMemoryGateway, ScatterBatch};

#[derive(Debug, Clone, Copy)]
pub struct AttributeRecord {
    pub health: f32,
    pub identity_link: u64,
    pub net_id: i32,
    pub last_update: Instant,
}

#[derive(Debug)]
pub struct AttributeCache {
    records: AHashMap<EntityId, AttributeRecord>,
    last_slow_update: Instant,
}

impl AttributeCache {
    pub fn new(now: Instant) -> Self {
        Self {
            records: AHashMap::with_capacity(256),
            last_slow_update: now,
        }
    }

    /// Run the slow refresh if the gate has elapsed.
    ///
    /// Returns whether the gate fired so the caller can amortize other
    /// interval-bound work (the transform bulk refresh) on the same
    /// cadence. The gate advances even when the round trip fails —
    /// records keep their prior values and the next attempt waits a full
    /// interval.
    pub fn maybe_refresh<G: RemoteMemoryGateway>(
        &mut self,
        gateway: &mut G,
        layout: &WorldLayout,
        ids: &[EntityId],
        now: Instant,
        interval: Duration,
        stats: &mut CacheStats,
    ) -> bool {
        if now.duration_since(self.last_slow_update) < interval {
            return false;
        }
        self.last_slow_update = now;

        if ids.is_empty() {
            return true;
        }

        // Pass 1: health + identity link for every tracked entity.
        let mut batch = ScatterBatch::with_capacity(ids.len() * 2);
        let slots: Vec<_> = ids
            .iter()
            .map(|id| {
                (
                    batch.push_f32(id.field(layout.health_offset)),
                    batch.push_u64(id.field(layout.identity_link_offset)),
                )
            })
            .collect();
        stats.record_round_trip(batch.len());
        let results = match gateway.execute(&batch) {
            Ok(r) => r,
            Err(err) => {
                debug!("slow refresh skipped, transport error: {err}");
                return true;
            }
        };

        let mut links: Vec<(EntityId, f32, u64)> = Vec::with_capacity(ids.len());
        for (&id, &(health_slot, link_slot)) in ids.iter().zip(&slots) {
            // A failed health slot leaves that entity's record as-is.
            let Some(health) = results.read_f32(health_slot) else {
                continue;
            };
            let link = results.read_u64(link_slot).unwrap_or(0);
            links.push((id, health, link));
        }

        // Pass 2: network ids, only where the link resolved.
        let mut batch = ScatterBatch::with_capacity(links.len());
        let net_slots: Vec<_> = links
            .iter()
            .map(|&(_, _, link)| {
                (link != 0).then(|| batch.push_i32(link.wrapping_add(layout.net_id_offset)))
            })
            .collect();
        let net_results = if batch.is_empty() {
            None
        } else {
            stats.record_round_trip(batch.len());
            gateway.execute(&batch).ok()
        };

        for (&(id, health, link), &net_slot) in links.iter().zip(&net_slots) {
            let net_id = net_slot
                .and_then(|slot| net_results.as_ref()?.read_i32(slot))
                .unwrap_or(0);
            self.records.insert(
                id,
                AttributeRecord {
                    health,
                    identity_link: link,
                    net_id,
                    last_update: now,
                },
            );
        }

        debug!(
            entities = links.len(),
            "slow tier refreshed attribute records"
        );
        true
    }

    pub fn get(&self, id: EntityId) -> Option<&AttributeRecord> {
        self.records.get(&id)
    }

    /// Diagnostic overwrite of one entity's health.
    pub fn set_health(&mut self, id: EntityId, health: f32, now: Instant) {
        if let Some(record) = self.records.get_mut(&id) {
            record.health = health;
            record.last_update = now;
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

    pub fn clear(&mut self, now: Instant) {
        self.records.clear();
        self.last_slow_update = now;
    }
}
