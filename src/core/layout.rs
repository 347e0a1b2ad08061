//! Remote memory layout table
//!
//! All address arithmetic against the remote process is driven by this
//! table. The defaults describe the synthetic world used by the demo
//! binary and the test suites; a real deployment loads its own table
//! from TOML, one per remote build.

use serde::Deserialize;
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::RemoteAddr;

/// Field offsets and root addresses for one remote build.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    /// Address holding the roster-interface pointer
    pub roster_root: RemoteAddr,
    /// Offset from the roster interface to the entity-list pointer
    pub roster_list_offset: u64,
    /// Address of the viewport block
    pub viewport_addr: RemoteAddr,
    /// Offset from the viewport block to the view matrix
    pub view_matrix_offset: u64,
    /// Base address of the local (self) entity, always excluded
    pub local_entity: RemoteAddr,
    /// Offset from an entity base to its world position (3 floats)
    pub position_offset: u64,
    /// Offset from an entity base to its health value
    pub health_offset: u64,
    /// Offset from an entity base to its identity-link pointer
    pub identity_link_offset: u64,
    /// Offset from the identity block to the network id
    pub net_id_offset: u64,
    /// Offset from an entity base to its 4x4 transform matrix
    pub matrix_offset: u64,
    /// Offset from an entity base to the joint-offset array
    pub joint_array_offset: u64,
    /// Stride between joint slots in the joint-offset array
    pub joint_stride: u64,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            roster_root: 0x1000,
            roster_list_offset: 0x100,
            viewport_addr: 0x2000,
            view_matrix_offset: 0x24C,
            local_entity: 0x10_0000,
            position_offset: 0x90,
            health_offset: 0x280,
            identity_link_offset: 0x10A8,
            net_id_offset: 0x7C,
            matrix_offset: 0x60,
            joint_array_offset: 0x410,
            joint_stride: 0x10,
        }
    }
}

impl WorldLayout {
    /// Parse a layout table from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a layout table from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Address of one joint slot within an entity's joint array.
    pub fn joint_addr(&self, entity_base: RemoteAddr, joint: usize) -> RemoteAddr {
        entity_base
            .wrapping_add(self.joint_array_offset)
            .wrapping_add(self.joint_stride * joint as u64)
    }

    /// Address of the view matrix.
    pub fn view_matrix_addr(&self) -> RemoteAddr {
        self.viewport_addr.wrapping_add(self.view_matrix_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_addresses_follow_the_stride() {
        let layout = WorldLayout::default();
        let base = 0x5000;
        assert_eq!(layout.joint_addr(base, 0), base + 0x410);
        assert_eq!(layout.joint_addr(base, 3), base + 0x410 + 0x30);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let layout = WorldLayout::from_toml_str("health_offset = 0x300\n").unwrap();
        assert_eq!(layout.health_offset, 0x300);
        assert_eq!(layout.position_offset, WorldLayout::default().position_offset);
    }
}
