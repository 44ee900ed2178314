//! Rendering for skeleton imposters and the depth of field composite.
//!
//! Custom materials expand imposter quads on the GPU; a per-frame plan decides
//! whether the scene is composited through the bokeh post-process or drawn directly.

/// Depth of field post-processing over the colour target and the depth prepass.
///
/// Fullscreen bokeh pass focused on the orbit target distance.
pub mod dof_post_processing;

/// Per-frame pass list built from scene entries with a depth capability.
pub mod frame_plan;

/// Particle, cone and synapse materials with their vertex layouts.
pub mod materials;
