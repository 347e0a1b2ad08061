//! Presentation-mode dispatch
//!
//! Boundary to the excluded drawing subsystem: each mode turns one
//! entity's cached, already-transformed state into a list of drawable
//! shapes. No retries live here — a missing cache tier simply skips
//! that entity for the tick.

pub mod colors;

use glam::{Mat4, Vec2, Vec3};

use crate::cache::{AttributeRecord, PositionRecord, TransformRecord};
use crate::core::types::{EntityId, TransformProfile, HEAD_JOINT, SKELETON_JOINTS, SKELETON_LINKS};
use crate::project::{project, Viewport};
use crate::render::colors::Color;

/// Drawable primitives handed to the drawing subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle {
        center: Vec2,
        radius: f32,
        thickness: f32,
        color: Color,
    },
    Disc {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Segment {
        from: Vec2,
        to: Vec2,
        thickness: f32,
        color: Color,
    },
    Label {
        anchor: Vec2,
        text: String,
        color: Color,
    },
}

/// Presentation mode, switched by configuration rather than data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    HeadMarker,
    Skeleton,
}

impl RenderMode {
    /// The transform profile this mode consumes.
    pub fn profile(&self) -> TransformProfile {
        match self {
            RenderMode::HeadMarker => TransformProfile::Head,
            RenderMode::Skeleton => TransformProfile::Skeleton,
        }
    }
}

/// Visual configuration shared by both modes.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub marker_color: Color,
    pub skeleton_color: Color,
    pub line_thickness: f32,
    pub show_net_id: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            marker_color: colors::MARKER,
            skeleton_color: colors::SKELETON,
            line_thickness: 2.0,
            show_net_id: false,
        }
    }
}

/// Everything the dispatcher knows about one entity this tick. Each
/// tier may independently be absent.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub id: EntityId,
    pub position: Option<&'a PositionRecord>,
    pub attributes: Option<&'a AttributeRecord>,
    pub transform: Option<&'a TransformRecord>,
    /// Whether `transform` is within its profile's TTL.
    pub transform_fresh: bool,
}

/// Per-tick view context shared by every entity.
#[derive(Debug, Clone, Copy)]
pub struct SceneContext {
    pub view_matrix: Mat4,
    pub viewport: Viewport,
    pub local_position: Vec3,
}

/// Approximate vertical offset from an entity's origin to its head,
/// used when only a stale position is available.
const HEAD_FALLBACK_RISE: f32 = 1.0;

const HEAD_MARKER_RADIUS: f32 = 4.0;
const HEAD_MARKER_THICKNESS: f32 = 2.0;

/// Head indicator size scaled by distance: closer targets get a larger
/// ring, clamped to keep far targets visible and near ones sane.
fn head_radius(distance: f32) -> f32 {
    let factor = (50.0 / distance).clamp(0.2, 2.0);
    (HEAD_MARKER_RADIUS * factor).clamp(1.0, 8.0)
}

impl RenderMode {
    /// Project one entity and describe it as drawable shapes.
    pub fn describe(&self, entity: &EntityView, scene: &SceneContext, style: &RenderStyle) -> Vec<Shape> {
        match self {
            RenderMode::HeadMarker => describe_head_marker(entity, scene, style),
            RenderMode::Skeleton => describe_skeleton(entity, scene, style),
        }
    }
}

fn entity_health(entity: &EntityView) -> f32 {
    entity.attributes.map_or(100.0, |record| record.health)
}

/// Best-available head position: fresh transform first, then the cached
/// position raised to head height. A stale position is still a usable
/// approximation — degraded continuity beats a blinking marker.
fn head_world(entity: &EntityView) -> Option<Vec3> {
    if entity.transform_fresh {
        if let Some(transform) = entity.transform {
            return Some(transform.head());
        }
    }
    if let Some(position) = entity.position {
        return Some(position.position + Vec3::Z * HEAD_FALLBACK_RISE);
    }
    entity.transform.map(TransformRecord::head)
}

fn net_id_label(entity: &EntityView, anchor: Vec2, style: &RenderStyle, out: &mut Vec<Shape>) {
    if !style.show_net_id {
        return;
    }
    let Some(attributes) = entity.attributes else {
        return;
    };
    if attributes.net_id <= 0 {
        return;
    }
    out.push(Shape::Label {
        anchor: anchor + Vec2::new(0.0, 10.0),
        text: format!("ID: {}", attributes.net_id),
        color: colors::LABEL,
    });
}

fn describe_head_marker(
    entity: &EntityView,
    scene: &SceneContext,
    style: &RenderStyle,
) -> Vec<Shape> {
    let Some(world) = head_world(entity) else {
        return Vec::new();
    };
    let Some(center) = project(world, scene.view_matrix, scene.viewport) else {
        return Vec::new();
    };

    let health = entity_health(entity);
    let color = colors::health_tint(style.marker_color, colors::CRITICAL_MARKER, health);

    let mut shapes = vec![Shape::Circle {
        center,
        radius: HEAD_MARKER_RADIUS,
        thickness: HEAD_MARKER_THICKNESS,
        color,
    }];
    net_id_label(entity, center, style, &mut shapes);
    shapes
}

fn describe_skeleton(entity: &EntityView, scene: &SceneContext, style: &RenderStyle) -> Vec<Shape> {
    // Skeleton mode has no position fallback: without joints there is
    // nothing honest to draw.
    let Some(transform) = entity.transform else {
        return Vec::new();
    };

    let health = entity_health(entity);
    let color = colors::health_tint(style.skeleton_color, colors::CRITICAL_SKELETON, health);

    let mut thickness = style.line_thickness;
    if health > 75.0 {
        thickness *= 1.2;
    } else if health < 25.0 {
        thickness *= 0.8;
    }

    let mut screen = [None::<Vec2>; crate::core::types::JOINT_SLOTS];
    for &joint in &SKELETON_JOINTS {
        screen[joint] = project(transform.joints[joint], scene.view_matrix, scene.viewport);
    }

    let mut shapes = Vec::new();
    for &(a, b) in &SKELETON_LINKS {
        let (Some(from), Some(to)) = (screen[a], screen[b]) else {
            continue;
        };
        shapes.push(Shape::Segment {
            from,
            to,
            thickness,
            color,
        });
        if health > 0.0 {
            let joint_radius = thickness * 0.75;
            shapes.push(Shape::Disc {
                center: from,
                radius: joint_radius,
                color,
            });
            shapes.push(Shape::Disc {
                center: to,
                radius: joint_radius,
                color,
            });
        }
    }

    if let Some(head) = screen[HEAD_JOINT] {
        let distance = scene.local_position.distance(transform.head());
        let radius = head_radius(distance);
        shapes.push(Shape::Circle {
            center: head,
            radius,
            thickness: (radius * 0.25).max(1.0),
            color,
        });
        net_id_label(entity, head, style, &mut shapes);
    }

    shapes
}
