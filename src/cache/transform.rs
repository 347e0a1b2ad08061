//! Pose tier: transform matrices and world-space joints
//!
//! Two sub-caches with independent TTLs share one implementation: the
//! head profile caches the matrix plus the head joint on a very short
//! window, the skeleton profile caches every tracked joint on a looser
//! one. Joint offsets come back from the remote in local space and are
//! transformed through the entity's own matrix before caching, so
//! readers only ever see world-space points.

use ahash::AHashMap;
use glam::{Mat4, Vec3};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::cache::stats::CacheStats;
use crate::core::layout::WorldLayout;
use crate::core::types::{EntityId, TransformProfile, JOINT_SLOTS};
use crate::gateway::{BatchResults, RemoteMemoryGateway, ScatterBatch, SlotId};

#[derive(Debug, Clone, Copy)]
pub struct TransformRecord {
    pub matrix: Mat4,
    /// World-space joint positions, indexed by joint id; slots the
    /// profile does not track stay zeroed.
    pub joints: [Vec3; JOINT_SLOTS],
    pub last_update: Instant,
    pub valid: bool,
}

impl TransformRecord {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.valid && now.duration_since(self.last_update) < ttl
    }

    pub fn head(&self) -> Vec3 {
        self.joints[crate::core::types::HEAD_JOINT]
    }
}

#[derive(Debug)]
pub struct TransformCache {
    head: AHashMap<EntityId, TransformRecord>,
    skeleton: AHashMap<EntityId, TransformRecord>,
    last_head_sweep: Instant,
    last_skeleton_sweep: Instant,
}

impl TransformCache {
    pub fn new(now: Instant) -> Self {
        Self {
            head: AHashMap::with_capacity(256),
            skeleton: AHashMap::with_capacity(256),
            last_head_sweep: now,
            last_skeleton_sweep: now,
        }
    }

    fn records(&self, profile: TransformProfile) -> &AHashMap<EntityId, TransformRecord> {
        match profile {
            TransformProfile::Head => &self.head,
            TransformProfile::Skeleton => &self.skeleton,
        }
    }

    fn records_mut(
        &mut self,
        profile: TransformProfile,
    ) -> &mut AHashMap<EntityId, TransformRecord> {
        match profile {
            TransformProfile::Head => &mut self.head,
            TransformProfile::Skeleton => &mut self.skeleton,
        }
    }

    /// Read-only lookup; freshness is the caller's judgment via
    /// [`TransformRecord::is_fresh`].
    pub fn peek(&self, id: EntityId, profile: TransformProfile) -> Option<&TransformRecord> {
        self.records(profile).get(&id)
    }

    /// Single-entity lookup with refresh-on-miss.
    ///
    /// A hit within `ttl` returns the cached record without touching the
    /// remote. A miss issues one batched round trip carrying the matrix
    /// plus every joint the profile tracks. When the refresh fails, the
    /// stale record (if any) is returned as a last-resort fallback.
    pub fn fetch<G: RemoteMemoryGateway>(
        &mut self,
        gateway: &mut G,
        layout: &WorldLayout,
        id: EntityId,
        profile: TransformProfile,
        now: Instant,
        ttl: Duration,
        stats: &mut CacheStats,
        force_refresh: bool,
    ) -> Option<TransformRecord> {
        if !force_refresh {
            if let Some(record) = self.records(profile).get(&id) {
                if record.is_fresh(now, ttl) {
                    stats.record_hit();
                    return Some(*record);
                }
            }
        }
        stats.record_miss();

        let mut batch = ScatterBatch::with_capacity(1 + profile.joints().len());
        let matrix_slot = batch.push_mat4(id.field(layout.matrix_offset));
        let joint_slots: Vec<(usize, SlotId)> = profile
            .joints()
            .iter()
            .map(|&joint| (joint, batch.push_vec3(layout.joint_addr(id.addr(), joint))))
            .collect();
        stats.record_round_trip(batch.len());

        let results = match gateway.execute(&batch) {
            Ok(r) => r,
            Err(err) => {
                debug!("transform refresh failed for {id}: {err}");
                return self.records(profile).get(&id).copied();
            }
        };

        match build_record(&results, matrix_slot, &joint_slots, now) {
            Some(record) => {
                self.records_mut(profile).insert(id, record);
                Some(record)
            }
            // Partial slot failure: the cached record stays authoritative.
            None => self.records(profile).get(&id).copied(),
        }
    }

    /// Bulk refresh over every entity whose record is missing or stale.
    ///
    /// Issues exactly two round trips regardless of entity count: one
    /// carrying every entity's matrix, one carrying every entity's joint
    /// offsets. Fresh entities are counted as hits and skipped.
    pub fn refresh_many<G: RemoteMemoryGateway>(
        &mut self,
        gateway: &mut G,
        layout: &WorldLayout,
        ids: &[EntityId],
        profile: TransformProfile,
        now: Instant,
        ttl: Duration,
        stats: &mut CacheStats,
    ) {
        let stale: Vec<EntityId> = ids
            .iter()
            .filter(|&&id| {
                let fresh = self
                    .records(profile)
                    .get(&id)
                    .is_some_and(|record| record.is_fresh(now, ttl));
                if fresh {
                    stats.record_hit();
                } else {
                    stats.record_miss();
                }
                !fresh
            })
            .copied()
            .collect();
        if stale.is_empty() {
            return;
        }

        // Pass 1: every matrix in one round trip.
        let mut batch = ScatterBatch::with_capacity(stale.len());
        let matrix_slots: Vec<SlotId> = stale
            .iter()
            .map(|id| batch.push_mat4(id.field(layout.matrix_offset)))
            .collect();
        stats.record_round_trip(batch.len());
        let matrices = match gateway.execute(&batch) {
            Ok(r) => r,
            Err(err) => {
                debug!("bulk transform refresh failed: {err}");
                return;
            }
        };

        // Pass 2: every joint offset of every entity in one round trip.
        let mut batch = ScatterBatch::with_capacity(stale.len() * profile.joints().len());
        let joint_slots: Vec<Vec<(usize, SlotId)>> = stale
            .iter()
            .map(|id| {
                profile
                    .joints()
                    .iter()
                    .map(|&joint| (joint, batch.push_vec3(layout.joint_addr(id.addr(), joint))))
                    .collect()
            })
            .collect();
        stats.record_round_trip(batch.len());
        let offsets = match gateway.execute(&batch) {
            Ok(r) => r,
            Err(err) => {
                debug!("bulk joint refresh failed: {err}");
                return;
            }
        };

        let mut refreshed = 0usize;
        for ((&id, &matrix_slot), slots) in stale.iter().zip(&matrix_slots).zip(&joint_slots) {
            // Merge matrix and joint results exactly as the single path does.
            let merged = build_record_split(&matrices, matrix_slot, &offsets, slots, now);
            if let Some(record) = merged {
                self.records_mut(profile).insert(id, record);
                refreshed += 1;
            }
        }
        debug!(profile = ?profile, refreshed, of = stale.len(), "bulk transform refresh");
    }

    /// Evict records past the hard `ceiling`, at most once per `interval`.
    pub fn sweep(
        &mut self,
        profile: TransformProfile,
        now: Instant,
        interval: Duration,
        ceiling: Duration,
    ) {
        let last = match profile {
            TransformProfile::Head => &mut self.last_head_sweep,
            TransformProfile::Skeleton => &mut self.last_skeleton_sweep,
        };
        if now.duration_since(*last) < interval {
            return;
        }
        *last = now;
        self.records_mut(profile)
            .retain(|_, record| now.duration_since(record.last_update) <= ceiling);
    }

    pub fn len(&self, profile: TransformProfile) -> usize {
        self.records(profile).len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.skeleton.is_empty()
    }

    pub fn clear(&mut self) {
        self.head.clear();
        self.skeleton.clear();
    }
}

fn transform_joints(
    matrix: Mat4,
    offsets: impl Iterator<Item = (usize, Vec3)>,
) -> [Vec3; JOINT_SLOTS] {
    let mut joints = [Vec3::ZERO; JOINT_SLOTS];
    for (joint, offset) in offsets {
        // Local joint offset through the entity's own matrix, as a point.
        joints[joint] = matrix.transform_point3(offset);
    }
    joints
}

fn build_record(
    results: &BatchResults,
    matrix_slot: SlotId,
    joint_slots: &[(usize, SlotId)],
    now: Instant,
) -> Option<TransformRecord> {
    build_record_split(results, matrix_slot, results, joint_slots, now)
}

/// Assemble a record from a matrix slot and joint slots, which may live
/// in the same batch (single path) or two batches (bulk path). Any
/// absent slot abandons the record so a garbage read never lands in the
/// cache.
fn build_record_split(
    matrix_results: &BatchResults,
    matrix_slot: SlotId,
    joint_results: &BatchResults,
    joint_slots: &[(usize, SlotId)],
    now: Instant,
) -> Option<TransformRecord> {
    let matrix = matrix_results.read_mat4(matrix_slot)?;
    let mut offsets = Vec::with_capacity(joint_slots.len());
    for &(joint, slot) in joint_slots {
        offsets.push((joint, joint_results.read_vec3(slot)?));
    }
    Some(TransformRecord {
        matrix,
        joints: transform_joints(matrix, offsets.into_iter()),
        last_update: now,
        valid: true,
    })
}
