//! Viewer camera: orbit controls and canvas sizing.
//!
//! Orbit state is kept in a plain resource so pose changes can be tested
//! without a running app; systems translate input and push poses to the camera.

/// Orbit controller resource, input system and camera pose application.
pub mod orbit_camera;

/// Canvas size resource with debounced resize requests from the page.
pub mod viewport;
