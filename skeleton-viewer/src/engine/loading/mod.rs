//! Loading pipeline from page data through the skeleton fetch to a framed scene.
//!
//! Page data arrives through the asset server; the skeleton and navigation
//! lookups arrive as text fetches completed outside the frame loop.

/// Non-blocking text fetches with a completion queue drained once per frame.
///
/// Fetches in a browser via `window.fetch`; native builds read the endpoint
/// paths from files under the local server root.
pub mod fetch;

/// `page_data.json` loading and scene state seeding.
///
/// Creates synapse state, section colouring and the saved camera pose, then
/// requests the skeleton.
pub mod page_loader;

/// Loading progress tracking resource for state transitions.
pub mod progress;

/// SWC fetch handling: parse, measure, build imposter buffers and frame the camera.
pub mod skeleton_loader;
