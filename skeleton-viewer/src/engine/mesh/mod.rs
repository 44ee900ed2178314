//! Mesh generation for skeleton and synapse imposters.
//!
//! Builds CPU-side attribute buffers and converts them into triangle-list
//! meshes whose vertices the imposter shaders expand into screen-aligned quads.

/// Custom vertex attributes shared by the imposter materials.
pub mod attributes;

/// Process-wide type label range driving the abstraction boundary.
pub mod labels;

/// Particle and cone imposter buffers built from a parsed skeleton.
///
/// One sphere imposter per node, one six-vertex cone per parent link.
pub mod skeleton_mesh;

/// Synapse sprite buffers decoded from the page's flat coordinate list.
pub mod synapse_mesh;
