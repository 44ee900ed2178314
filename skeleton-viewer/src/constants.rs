/// Server endpoints, asset paths and the embedding canvas.
pub mod path;

/// Default post-processing and imposter sizing.
pub mod render_settings;
