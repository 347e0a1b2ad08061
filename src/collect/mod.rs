//! Per-tick entity enumeration over batched reads
//!
//! Walks a short fixed pointer chain — roster root, roster interface,
//! entity list — then filters the list down to live tracked entities and
//! reads their positions. Each chain level depends on the previous
//! level's result, so each level is one batched pass of its own, but all
//! entities within a level ride the same round trip.

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::cache::stats::CacheStats;
use crate::core::layout::WorldLayout;
use crate::core::types::EntityId;
use crate::gateway::{RemoteMemoryGateway, ScatterBatch};

/// Everything one tick's enumeration produced.
///
/// The view matrix and local position ride along from the first chain
/// pass so the render layer never issues its own round trip for them.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub ids: Vec<EntityId>,
    pub positions: Vec<Vec3>,
    pub view_matrix: Mat4,
    pub local_position: Vec3,
}

#[derive(Debug, Clone)]
pub struct FrameCollector {
    max_entities: usize,
}

impl FrameCollector {
    pub fn new(max_entities: usize) -> Self {
        Self { max_entities }
    }

    /// Enumerate the current frame's entities and raw positions.
    ///
    /// Returns `None` when an early chain level fails to resolve; the
    /// caller abandons the tick, leaves every cache untouched, and skips
    /// rendering. Nothing here is fatal.
    pub fn collect<G: RemoteMemoryGateway>(
        &self,
        gateway: &mut G,
        layout: &WorldLayout,
        stats: &mut CacheStats,
    ) -> Option<FrameSnapshot> {
        // Pass 1: view matrix, local position, roster interface pointer.
        let mut batch = ScatterBatch::with_capacity(3);
        let view_slot = batch.push_mat4(layout.view_matrix_addr());
        let local_slot = batch.push_vec3(layout.local_entity.wrapping_add(layout.position_offset));
        let interface_slot = batch.push_u64(layout.roster_root);
        stats.record_round_trip(batch.len());
        let results = match gateway.execute(&batch) {
            Ok(r) => r,
            Err(err) => {
                debug!("frame collection abandoned: {err}");
                return None;
            }
        };

        let view_matrix = results.read_mat4(view_slot)?;
        let local_position = results.read_vec3(local_slot).unwrap_or(Vec3::ZERO);
        let interface = match results.read_u64(interface_slot) {
            Some(addr) if addr != 0 => addr,
            _ => {
                debug!("roster interface unresolved, skipping tick");
                return None;
            }
        };

        // Pass 2: entity-list base pointer.
        let mut batch = ScatterBatch::with_capacity(1);
        let list_slot = batch.push_u64(interface.wrapping_add(layout.roster_list_offset));
        stats.record_round_trip(batch.len());
        let results = gateway.execute(&batch).ok()?;
        let list_base = match results.read_u64(list_slot) {
            Some(addr) if addr != 0 => addr,
            _ => {
                debug!("entity list unresolved, skipping tick");
                return None;
            }
        };

        // Pass 3: every slot pointer in one request.
        let mut batch = ScatterBatch::with_capacity(1);
        let slots = batch.push(list_base, (self.max_entities * 8) as u32);
        stats.record_round_trip(batch.len());
        let results = gateway.execute(&batch).ok()?;
        let raw_pointers = results.read_addr_array(slots, self.max_entities)?;

        // Null slots and the local entity never count as candidates.
        let candidates: Vec<EntityId> = raw_pointers
            .into_iter()
            .filter(|&ptr| ptr != 0 && ptr != layout.local_entity)
            .map(EntityId::from_addr)
            .collect();
        if candidates.is_empty() {
            return Some(FrameSnapshot {
                ids: Vec::new(),
                positions: Vec::new(),
                view_matrix,
                local_position,
            });
        }

        // Pass 4: one discriminating identity-link read per candidate.
        let mut batch = ScatterBatch::with_capacity(candidates.len());
        let marker_slots: Vec<_> = candidates
            .iter()
            .map(|id| batch.push_u64(id.field(layout.identity_link_offset)))
            .collect();
        stats.record_round_trip(batch.len());
        let results = gateway.execute(&batch).ok()?;

        let valid: Vec<EntityId> = candidates
            .iter()
            .zip(&marker_slots)
            .filter_map(|(&id, &slot)| match results.read_u64(slot) {
                Some(link) if link != 0 => Some(id),
                _ => None,
            })
            .collect();
        if valid.is_empty() {
            return Some(FrameSnapshot {
                ids: Vec::new(),
                positions: Vec::new(),
                view_matrix,
                local_position,
            });
        }

        // Pass 5: positions for exactly the surviving set.
        let mut batch = ScatterBatch::with_capacity(valid.len());
        let position_slots: Vec<_> = valid
            .iter()
            .map(|id| batch.push_vec3(id.field(layout.position_offset)))
            .collect();
        stats.record_round_trip(batch.len());
        let results = gateway.execute(&batch).ok()?;

        let mut ids = Vec::with_capacity(valid.len());
        let mut positions = Vec::with_capacity(valid.len());
        for (&id, &slot) in valid.iter().zip(&position_slots) {
            // A failed position slot drops that entity for this tick only.
            if let Some(position) = results.read_vec3(slot) {
                ids.push(id);
                positions.push(position);
            }
        }

        Some(FrameSnapshot {
            ids,
            positions,
            view_matrix,
            local_position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::InMemoryGateway;
    use std::time::Instant;

    fn seed_world(gw: &mut InMemoryGateway, layout: &WorldLayout, entities: &[(u64, Vec3)]) {
        let interface = 0x3000u64;
        let list = 0x4000u64;
        gw.write_u64(layout.roster_root, interface);
        gw.write_u64(interface + layout.roster_list_offset, list);
        gw.write_mat4(layout.view_matrix_addr(), Mat4::IDENTITY);
        gw.write_vec3(
            layout.local_entity + layout.position_offset,
            Vec3::new(5.0, 5.0, 0.0),
        );

        let mut slots = vec![0u64; 110];
        for (i, (base, position)) in entities.iter().enumerate() {
            slots[i] = *base;
            gw.write_u64(base + layout.identity_link_offset, 0x9000 + i as u64 * 0x100);
            gw.write_vec3(base + layout.position_offset, *position);
        }
        for (i, slot) in slots.iter().enumerate() {
            gw.write_u64(list + i as u64 * 8, *slot);
        }
    }

    #[test]
    fn collects_live_entities_and_positions() {
        let layout = WorldLayout::default();
        let mut gw = InMemoryGateway::new();
        let mut stats = CacheStats::new(Instant::now());
        seed_world(
            &mut gw,
            &layout,
            &[(0x20_0000, Vec3::new(1.0, 2.0, 3.0)), (0x21_0000, Vec3::ONE)],
        );

        let frame = FrameCollector::new(110)
            .collect(&mut gw, &layout, &mut stats)
            .unwrap();
        assert_eq!(frame.ids.len(), 2);
        assert_eq!(frame.positions[0], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(frame.local_position, Vec3::new(5.0, 5.0, 0.0));
        // Five passes: chain roots, list base, slots, markers, positions.
        assert_eq!(stats.batch_round_trips, 5);
    }

    #[test]
    fn self_entity_is_always_excluded() {
        let layout = WorldLayout::default();
        let mut gw = InMemoryGateway::new();
        let mut stats = CacheStats::new(Instant::now());
        seed_world(
            &mut gw,
            &layout,
            &[(layout.local_entity, Vec3::ZERO), (0x21_0000, Vec3::ONE)],
        );

        let frame = FrameCollector::new(110)
            .collect(&mut gw, &layout, &mut stats)
            .unwrap();
        assert_eq!(frame.ids, vec![EntityId::from_addr(0x21_0000)]);
    }

    #[test]
    fn entities_without_identity_link_are_filtered() {
        let layout = WorldLayout::default();
        let mut gw = InMemoryGateway::new();
        let mut stats = CacheStats::new(Instant::now());
        seed_world(&mut gw, &layout, &[(0x20_0000, Vec3::ONE)]);
        gw.write_u64(0x20_0000 + layout.identity_link_offset, 0);

        let frame = FrameCollector::new(110)
            .collect(&mut gw, &layout, &mut stats)
            .unwrap();
        assert!(frame.ids.is_empty());
    }

    #[test]
    fn broken_chain_abandons_the_tick() {
        let layout = WorldLayout::default();
        let mut gw = InMemoryGateway::new();
        let mut stats = CacheStats::new(Instant::now());
        seed_world(&mut gw, &layout, &[(0x20_0000, Vec3::ONE)]);
        gw.write_u64(layout.roster_root, 0);

        assert!(FrameCollector::new(110)
            .collect(&mut gw, &layout, &mut stats)
            .is_none());
    }

    #[test]
    fn enumeration_is_capped_at_max_entities() {
        let layout = WorldLayout::default();
        let mut gw = InMemoryGateway::new();
        let mut stats = CacheStats::new(Instant::now());
        let entities: Vec<(u64, Vec3)> = (0..8)
            .map(|i| (0x20_0000 + i as u64 * 0x1_0000, Vec3::ONE))
            .collect();
        seed_world(&mut gw, &layout, &entities);

        let frame = FrameCollector::new(4)
            .collect(&mut gw, &layout, &mut stats)
            .unwrap();
        assert_eq!(frame.ids.len(), 4);
    }
}
