//! Proofreading interactions driven by the page: synapse labelling, section
//! colouring and navigation, plus the supporting refocus and storage helpers.

/// Section lock check and first-page lookup behind `navigate_to_section`.
pub mod navigation;

/// Deferred refocus for commands that arrive before the camera is framed.
pub mod refocus;

/// Section highlight, grey-out and abstraction recolouring of skeleton buffers.
///
/// A full rewrite of every mutable attribute per change; cones follow their child node.
pub mod section_colouring;

/// Tab-lifetime key/value storage for synapse labels.
pub mod session_store;

/// Synapse label map, selection and per-synapse overrides.
pub mod synapse_labels;
