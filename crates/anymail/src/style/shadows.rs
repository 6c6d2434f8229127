//! Shadow presets and corner radii.

use iced::{Color, Shadow, Vector};

use super::palette;

/// Corner radii.
pub mod radius {
    pub const SMALL: f32 = 4.0;
    pub const MEDIUM: f32 = 6.0;
    pub const LARGE: f32 = 8.0;
}

pub fn none() -> Shadow {
    Shadow::default()
}

pub const fn card() -> Shadow {
    Shadow {
        color: palette::current().shadow,
        offset: Vector::new(0.0, 4.0),
        blur_radius: 16.0,
    }
}

/// Colored aura around primary buttons.
pub const fn glow(color: Color) -> Shadow {
    Shadow {
        color: Color::from_rgba(color.r, color.g, color.b, 0.3),
        offset: Vector::new(0.0, 2.0),
        blur_radius: 12.0,
    }
}
