//! Asset parsing for neuron skeletons and page state.
//!
//! Handles SWC text decoding, spatial bounds for camera framing,
//! and the JSON page data the proofreading page hands to the viewer.

/// Axis aligned bounds, bounding sphere fit and camera framing distance.
pub mod bounds;

/// Page data asset: sections, synapse cloud, saved camera and viewer settings.
pub mod page_data;

/// SWC skeleton text parser and immutable node map.
pub mod swc;
