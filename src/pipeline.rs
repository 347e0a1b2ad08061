//! Tick pipeline: collection, cache refresh gates, render dispatch
//!
//! One owned context drives everything; there is no global state and no
//! background thread. All remote reads happen synchronously on the tick
//! thread, and a tick that encounters only failures produces an empty
//! render pass — the loop always continues.

use std::time::Instant;

use tracing::{debug, info};

use crate::cache::{
    AttributeCache, AttributeRecord, CacheStats, PositionCache, PositionRecord, TransformCache,
    TransformRecord,
};
use crate::collect::FrameCollector;
use crate::core::config::TrackerConfig;
use crate::core::layout::WorldLayout;
use crate::core::types::{EntityId, TransformProfile};
use crate::gateway::RemoteMemoryGateway;
use crate::project::Viewport;
use crate::render::{EntityView, RenderMode, RenderStyle, SceneContext, Shape};

/// Owned tracking context: gateway, layout, the three cache tiers, and
/// the presentation mode.
pub struct Tracker<G: RemoteMemoryGateway> {
    gateway: G,
    layout: WorldLayout,
    config: TrackerConfig,
    style: RenderStyle,
    mode: RenderMode,
    viewport: Viewport,
    collector: FrameCollector,
    positions: PositionCache,
    attributes: AttributeCache,
    transforms: TransformCache,
    stats: CacheStats,
    last_stats_log: Instant,
}

impl<G: RemoteMemoryGateway> Tracker<G> {
    pub fn new(
        gateway: G,
        layout: WorldLayout,
        config: TrackerConfig,
        viewport: Viewport,
        now: Instant,
    ) -> Self {
        let collector = FrameCollector::new(config.max_entities);
        Self {
            gateway,
            layout,
            config,
            style: RenderStyle::default(),
            mode: RenderMode::HeadMarker,
            viewport,
            collector,
            positions: PositionCache::new(),
            attributes: AttributeCache::new(now),
            transforms: TransformCache::new(now),
            stats: CacheStats::new(now),
            last_stats_log: now,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    pub fn style_mut(&mut self) -> &mut RenderStyle {
        &mut self.style
    }

    /// Mutable access to the gateway, for drivers and tests that own
    /// the synthetic world behind it.
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Run one tick: enumerate, refresh tiers in order, describe shapes.
    ///
    /// Ordering within the tick is fixed: positions become current
    /// before the slow gate and the transform refresh run, and both run
    /// before dispatch reads anything — they are all keyed on this
    /// tick's valid-id set.
    pub fn tick(&mut self, now: Instant) -> Vec<Shape> {
        let Some(frame) = self
            .collector
            .collect(&mut self.gateway, &self.layout, &mut self.stats)
        else {
            debug!("tick abandoned before collection, caches untouched");
            return Vec::new();
        };

        self.positions.apply_frame(&frame.ids, &frame.positions, now);
        self.positions.age_sweep(now, self.config.position_stale_after);

        let valid_ids = self.positions.valid_ids();
        let slow_fired = self.attributes.maybe_refresh(
            &mut self.gateway,
            &self.layout,
            &valid_ids,
            now,
            self.config.slow_refresh_interval,
            &mut self.stats,
        );
        if slow_fired {
            // Amortize the expensive pose reads on the slow cadence too,
            // then let the hard-ceiling purges ride the same gate.
            self.refresh_transforms(&valid_ids, now);
            self.positions.purge(now, self.config.purge_after);
            self.attributes.purge(now, self.config.purge_after);
        }

        self.refresh_transforms(&frame.ids, now);

        let scene = SceneContext {
            view_matrix: frame.view_matrix,
            viewport: self.viewport,
            local_position: frame.local_position,
        };
        let profile = self.mode.profile();
        let ttl = self.profile_ttl(profile);
        let mut shapes = Vec::new();
        for &id in &valid_ids {
            let transform = self.transforms.peek(id, profile);
            let entity = EntityView {
                id,
                position: self.positions.get(id),
                attributes: self.attributes.get(id),
                transform,
                transform_fresh: transform.is_some_and(|record| record.is_fresh(now, ttl)),
            };
            shapes.extend(self.mode.describe(&entity, &scene, &self.style));
        }

        self.transforms.sweep(
            TransformProfile::Head,
            now,
            self.config.head_sweep_interval,
            self.config.head_purge_after,
        );
        self.transforms.sweep(
            TransformProfile::Skeleton,
            now,
            self.config.skeleton_sweep_interval,
            self.config.skeleton_purge_after,
        );

        self.log_stats(now);
        shapes
    }

    fn profile_ttl(&self, profile: TransformProfile) -> std::time::Duration {
        match profile {
            TransformProfile::Head => self.config.head_ttl,
            TransformProfile::Skeleton => self.config.skeleton_ttl,
        }
    }

    fn refresh_transforms(&mut self, ids: &[EntityId], now: Instant) {
        if ids.is_empty() {
            return;
        }
        let profile = self.mode.profile();
        let ttl = self.profile_ttl(profile);
        self.transforms.refresh_many(
            &mut self.gateway,
            &self.layout,
            ids,
            profile,
            now,
            ttl,
            &mut self.stats,
        );
    }

    /// Clear every tier unconditionally and restart the slow gate.
    pub fn manual_reset(&mut self, now: Instant) {
        info!("manual cache reset");
        self.positions.clear();
        self.attributes.clear(now);
        self.transforms.clear();
    }

    // Read-only accessors for the drawing subsystem and diagnostics.

    pub fn position(&self, id: EntityId) -> Option<&PositionRecord> {
        self.positions.get(id)
    }

    pub fn attributes(&self, id: EntityId) -> Option<&AttributeRecord> {
        self.attributes.get(id)
    }

    /// Record plus its staleness-aware validity bit.
    pub fn transform(
        &self,
        id: EntityId,
        profile: TransformProfile,
        now: Instant,
    ) -> Option<(&TransformRecord, bool)> {
        let record = self.transforms.peek(id, profile)?;
        Some((record, record.is_fresh(now, self.profile_ttl(profile))))
    }

    /// All entities currently eligible for rendering.
    pub fn valid_ids(&self) -> Vec<EntityId> {
        self.positions.valid_ids()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self, now: Instant) {
        self.stats.reset(now);
    }

    fn log_stats(&mut self, now: Instant) {
        if now.duration_since(self.last_stats_log) < self.config.stats_log_interval {
            return;
        }
        self.last_stats_log = now;
        debug!(
            hit_ratio_pct = self.stats.hit_ratio() * 100.0,
            remote_reads = self.stats.remote_reads,
            round_trips = self.stats.batch_round_trips,
            tracked = self.positions.len(),
            head_cache = self.transforms.len(TransformProfile::Head),
            skeleton_cache = self.transforms.len(TransformProfile::Skeleton),
            "cache stats"
        );
    }
}
