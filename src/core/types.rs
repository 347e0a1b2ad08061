//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Raw address in the remote process's address space
pub type RemoteAddr = u64;

/// Opaque handle identifying one tracked entity.
///
/// Wraps the entity's remote base address. The wrapper keeps address
/// arithmetic contained in the layout/collector layers and gives the
/// caches a typed, comparable key without implying any ownership of
/// remote memory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display(fmt = "entity@{:#x}", _0)]
pub struct EntityId(RemoteAddr);

impl EntityId {
    pub fn from_addr(addr: RemoteAddr) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> RemoteAddr {
        self.0
    }

    /// Address of a field at `offset` from the entity's base.
    pub fn field(&self, offset: u64) -> RemoteAddr {
        self.0.wrapping_add(offset)
    }
}

/// Number of joint slots carried per entity (indices 0..=8)
pub const JOINT_SLOTS: usize = 9;

/// Joint index used as the head anchor
pub const HEAD_JOINT: usize = 0;

/// Joints required to draw the skeleton figure
pub const SKELETON_JOINTS: [usize; 7] = [0, 3, 4, 5, 6, 7, 8];

/// Joint pairs connected by skeleton segments: head to neck, neck to
/// spine and both shoulders, shoulders to hands.
pub const SKELETON_LINKS: [(usize, usize); 6] =
    [(0, 7), (7, 6), (7, 5), (7, 8), (8, 3), (8, 4)];

/// Which slice of pose data a transform lookup wants.
///
/// The two profiles carry independent TTLs: head lookups are cheap and
/// refreshed aggressively, full-skeleton reads cost more per call and
/// tolerate slightly more staleness on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformProfile {
    /// Transform matrix plus the head joint only
    Head,
    /// Transform matrix plus every joint in [`SKELETON_JOINTS`]
    Skeleton,
}

impl TransformProfile {
    /// Joint indices this profile reads and caches.
    pub fn joints(&self) -> &'static [usize] {
        match self {
            TransformProfile::Head => &SKELETON_JOINTS[..1],
            TransformProfile::Skeleton => &SKELETON_JOINTS,
        }
    }
}
