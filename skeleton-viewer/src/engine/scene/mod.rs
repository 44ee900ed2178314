//! Scene graph for loaded skeletons, the synapse cloud, the key light and the
//! on-top overlay.
//!
//! Every top-level renderable carries a `SceneEntry` marker; entries that can
//! draw into the depth pass also carry a `DepthMaterial` capability.

/// Camera-mounted light driving imposter shading.
pub mod lights;

/// Overlay camera and the never-occluded active synapse marker.
pub mod overlay;

/// Skeleton entry entities with particle and cone imposter children.
pub mod skeleton_scene;

/// Synapse sprite cloud entity and attribute refresh.
pub mod synapse_cloud;
