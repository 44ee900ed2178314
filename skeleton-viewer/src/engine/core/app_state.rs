use bevy::prelude::*;

use crate::engine::loading::progress::LoadingProgress;
use crate::rpc::web_rpc::WebRpcInterface;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
}

/// Mirror loading milestones to the page so it can drop its spinner.
pub fn update_loading_frontend(
    loading_progress: Res<LoadingProgress>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !loading_progress.is_changed() {
        return;
    }

    rpc_interface.send_notification(
        "loading_progress",
        serde_json::json!({
            "page_data_loaded": loading_progress.page_data_loaded,
            "skeleton_requested": loading_progress.skeleton_requested,
            "skeleton_settled": loading_progress.skeleton_settled,
        }),
    );
}

// Final transition to running state
pub fn transition_to_running(
    loading_progress: Res<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if loading_progress.is_complete() {
        println!("→ Scene ready, transitioning to Running state");
        next_state.set(AppState::Running);
    }
}
