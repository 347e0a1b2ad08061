//! Color definitions for the presentation boundary

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Default head-marker color
pub const MARKER: Color = Color::new(0, 255, 0, 255);

/// Default skeleton color
pub const SKELETON: Color = Color::new(255, 0, 0, 255);

/// Below half health
pub const INJURED: Color = Color::new(255, 255, 0, 255);

/// Critical health in marker mode
pub const CRITICAL_MARKER: Color = Color::new(255, 0, 0, 255);

/// Critical health in skeleton mode
pub const CRITICAL_SKELETON: Color = Color::new(255, 100, 0, 255);

/// No health left
pub const DEAD: Color = Color::new(100, 100, 100, 255);

/// Label text
pub const LABEL: Color = Color::new(255, 255, 255, 255);

/// Tint a base color by health tier. The critical tier differs between
/// the two presentation modes, so callers pass their own.
pub fn health_tint(base: Color, critical: Color, health: f32) -> Color {
    if health <= 0.0 {
        DEAD
    } else if health < 25.0 {
        critical
    } else if health < 50.0 {
        INJURED
    } else {
        base
    }
}
