use bevy::prelude::*;

#[derive(Resource, Default, Debug)]
pub struct LoadingProgress {
    pub page_data_loaded: bool,
    pub skeleton_requested: bool,
    /// Skeleton fetch finished, parsed or not, or was never started.
    pub skeleton_settled: bool,
}

impl LoadingProgress {
    pub fn is_complete(&self) -> bool {
        self.page_data_loaded && self.skeleton_settled
    }
}
