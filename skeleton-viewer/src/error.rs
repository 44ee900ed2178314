use thiserror::Error;

use crate::engine::assets::swc::SwcParseError;

/// Whether a failed fetch should interrupt the user or only be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPriority {
    /// Load the viewer cannot work without (the skeleton itself).
    Primary,
    /// Navigation lookups and polling.
    Background,
}

#[derive(Error, Debug, Clone)]
pub enum ViewerError {
    #[error("Skeleton parse failure: {0}")]
    ParseFailure(#[from] SwcParseError),

    #[error("Skeleton file contained no nodes")]
    EmptySkeleton,

    #[error("Fetch of {url} failed: {reason}")]
    FetchFailure {
        url: String,
        reason: String,
        priority: FetchPriority,
    },

    #[error("Scene object not found: {0}")]
    MissingSceneObject(&'static str),

    #[error("Orbit controller not initialised")]
    UninitializedController,

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Unexpected response payload: {0}")]
    Payload(String),
}

impl ViewerError {
    /// True for failures that must be surfaced to the user rather than only logged.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ViewerError::FetchFailure {
                priority: FetchPriority::Primary,
                ..
            }
        )
    }
}
