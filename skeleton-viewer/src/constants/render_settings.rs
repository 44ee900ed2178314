use bevy::color::Color;

use crate::engine::render::dof_post_processing::DepthOfFieldSettings;

/// Bokeh composite defaults. Focal depth and clip planes are replaced every frame.
pub const DEFAULT_DOF_SETTINGS: DepthOfFieldSettings = DepthOfFieldSettings {
    rings: 3,
    samples: 4,
    focal_depth: 100.0,
    f_stop: 2.2,
    max_blur: 1.0,
    bias: 0.5,
    gain: 2.0,
    fringe: 0.7,
    vignetting: 0.0,
    threshold: 0.5,
    znear: 0.1,
    zfar: 10_000.0,
};

pub const DEFAULT_RADIUS_SCALE: f32 = 1.0;
pub const DEFAULT_MIN_RADIUS: Option<f32> = None;

pub const BACKGROUND_COLOUR: Color = Color::BLACK;
