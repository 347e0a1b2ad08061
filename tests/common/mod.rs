//! Shared synthetic-world fixture for the integration suites.

use glam::{Mat4, Vec3, Vec4};

use sightline::core::layout::WorldLayout;
use sightline::core::types::{EntityId, SKELETON_JOINTS};
use sightline::gateway::memory::InMemoryGateway;

pub const ROSTER_INTERFACE: u64 = 0x3000;
pub const ROSTER_LIST: u64 = 0x4000;
pub const ROSTER_SLOTS: usize = 110;

/// A camera at the origin looking down +x: clip depth is world x,
/// world y/z land on the screen axes.
pub fn camera_matrix() -> Mat4 {
    Mat4::from_cols(
        Vec4::ZERO,
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(1.0, 0.0, 0.0, 0.0),
    )
}

pub struct TestWorld {
    pub layout: WorldLayout,
    pub gateway: InMemoryGateway,
    pub ids: Vec<EntityId>,
}

impl TestWorld {
    /// Build a world of `count` live entities in front of the camera.
    pub fn new(count: usize) -> Self {
        let layout = WorldLayout::default();
        let mut gateway = InMemoryGateway::new();

        gateway.write_u64(layout.roster_root, ROSTER_INTERFACE);
        gateway.write_u64(ROSTER_INTERFACE + layout.roster_list_offset, ROSTER_LIST);
        gateway.write_mat4(layout.view_matrix_addr(), camera_matrix());
        gateway.write_vec3(layout.local_entity + layout.position_offset, Vec3::ZERO);

        let mut ids = Vec::with_capacity(count);
        for i in 0..ROSTER_SLOTS {
            let slot_addr = ROSTER_LIST + i as u64 * 8;
            if i >= count {
                gateway.write_u64(slot_addr, 0);
                continue;
            }
            let base = 0x20_0000u64 + i as u64 * 0x1_0000;
            let identity = 0x8_0000u64 + i as u64 * 0x100;
            gateway.write_u64(slot_addr, base);
            gateway.write_u64(base + layout.identity_link_offset, identity);
            gateway.write_i32(identity + layout.net_id_offset, i as i32 + 1);
            gateway.write_f32(base + layout.health_offset, 100.0);

            let position = Vec3::new(30.0 + i as f32 * 5.0, i as f32, 0.0);
            gateway.write_vec3(base + layout.position_offset, position);
            gateway.write_mat4(base + layout.matrix_offset, Mat4::from_translation(position));
            for joint in SKELETON_JOINTS {
                gateway.write_vec3(
                    layout.joint_addr(base, joint),
                    Vec3::new(0.0, 0.0, 0.1 * joint as f32),
                );
            }
            ids.push(EntityId::from_addr(base));
        }

        Self {
            layout,
            gateway,
            ids,
        }
    }

    /// Empty the roster without breaking the pointer chain.
    pub fn clear_roster(gateway: &mut InMemoryGateway) {
        for i in 0..ROSTER_SLOTS {
            gateway.write_u64(ROSTER_LIST + i as u64 * 8, 0);
        }
    }

    /// Break the pointer chain at its first level.
    pub fn break_chain(gateway: &mut InMemoryGateway, layout: &WorldLayout) {
        gateway.write_u64(layout.roster_root, 0);
    }
}
