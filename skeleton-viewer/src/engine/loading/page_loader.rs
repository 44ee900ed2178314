use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::constants::path::PAGE_DATA_PATH;
use crate::engine::assets::page_data::PageData;
use crate::engine::camera::orbit_camera::OrbitController;
use crate::engine::loading::fetch::{FetchQueue, FetchRequest};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::render::frame_plan::PostProcessing;
use crate::engine::render::materials::SynapseCloudMaterial;
use crate::engine::scene::synapse_cloud::spawn_synapse_cloud;
use crate::tools::refocus::{RefocusRetry, request_refocus};
use crate::tools::section_colouring::{SectionAssignment, SectionColouringState};
use crate::tools::session_store::SessionStorage;
use crate::tools::synapse_labels::SynapseCloudState;

#[derive(Resource, Default)]
pub struct PageDataLoader {
    handle: Option<Handle<PageData>>,
}

pub fn start_loading(mut page_loader: ResMut<PageDataLoader>, asset_server: Res<AssetServer>) {
    page_loader.handle = Some(asset_server.load(PAGE_DATA_PATH));
}

/// Synapse state for a freshly loaded page. Labels persisted earlier in the
/// session are restored, unless this is the session's first visit.
pub fn synapse_state_for_page(page: &PageData, storage: &SessionStorage) -> SynapseCloudState {
    let mut state = match SynapseCloudState::from_page(page) {
        Ok(state) => state,
        Err(e) => {
            error!("Synapse cloud discarded: {}", e);
            SynapseCloudState::default()
        }
    };

    if page.initial_load {
        if let Err(e) = state.clear_labels(storage.0.as_ref()) {
            warn!("Persisted synapse labels not cleared: {}", e);
        }
    } else {
        match state.restore_labels(storage.0.as_ref()) {
            Ok(restored) if restored > 0 => info!("Restored {} synapse labels", restored),
            Ok(_) => {}
            Err(e) => warn!("Persisted synapse labels ignored: {}", e),
        }
    }
    state
}

pub fn load_page_data_system(
    mut loading_progress: ResMut<LoadingProgress>,
    page_loader: Res<PageDataLoader>,
    pages: Res<Assets<PageData>>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
    mut controller: ResMut<OrbitController>,
    mut retry: ResMut<RefocusRetry>,
    mut post_processing: ResMut<PostProcessing>,
    storage: Res<SessionStorage>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut synapse_materials: ResMut<Assets<SynapseCloudMaterial>>,
    fetch_queue: Res<FetchQueue>,
) {
    if loading_progress.page_data_loaded {
        return;
    }
    let Some(handle) = &page_loader.handle else {
        return;
    };

    let page = match pages.get(handle) {
        Some(page) => page.clone(),
        None => match asset_server.get_load_state(handle.id()) {
            Some(LoadState::Failed(e)) => {
                warn!("Page data unavailable ({}), using defaults", e);
                PageData::default()
            }
            _ => return,
        },
    };
    loading_progress.page_data_loaded = true;
    println!("✓ Page data loaded");

    let settings = page.viewer.clone();
    controller.set_fov(settings.fov, settings.max_volume_size);
    if let Some(saved) = &page.camera {
        controller.restore_pose(saved);
    }
    post_processing.enabled = settings.post_processing;

    let synapses = synapse_state_for_page(&page, &storage);
    // Usually before any framing, so this waits on the retry.
    if let Some(point) = synapses.first_active_position() {
        request_refocus(&mut controller, &mut retry, point);
    }
    spawn_synapse_cloud(
        &mut commands,
        &mut meshes,
        &mut synapse_materials,
        synapses.buffer(),
    );

    commands.insert_resource(SectionAssignment {
        sections: page.sections.clone(),
    });
    commands.insert_resource(SectionColouringState {
        active_section: page.active_section,
        abstraction_threshold: settings.abstraction_threshold.clamp(0.0, 1.0),
        ..SectionColouringState::default()
    });
    commands.insert_resource(synapses);
    commands.insert_resource(settings);

    if page.neuron_ready {
        fetch_queue.start(FetchRequest::Skeleton);
        loading_progress.skeleton_requested = true;
    } else {
        info!("Neuron not ready, skipping skeleton fetch");
        loading_progress.skeleton_settled = true;
    }

    commands.insert_resource(page);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::session_store::MemorySessionStore;
    use crate::tools::synapse_labels::{SynapseColour, SynapseKey, SynapseLabel, SynapseUpdate};

    fn page(initial_load: bool) -> PageData {
        PageData {
            initial_load,
            synapse_cloud: vec![0.0, 0.0, 0.0, 4.0, 4.0, 4.0],
            synapse_ids: Some(vec!["s1".into(), "s2".into()]),
            active_synapse_ids: vec!["s2".into()],
            ..PageData::default()
        }
    }

    fn labelled_storage() -> SessionStorage {
        let store = MemorySessionStore::default();
        let mut state = SynapseCloudState::from_page(&page(false)).unwrap();
        state
            .update(&SynapseUpdate {
                key: SynapseKey::Id("s1".into()),
                position: None,
                colour: Some(SynapseColour::Label(SynapseLabel::Red)),
                size: None,
                persist: true,
            })
            .unwrap();
        state.persist_labels(&store).unwrap();
        SessionStorage(Box::new(store))
    }

    #[test]
    fn later_visits_restore_labels() {
        let storage = labelled_storage();
        let state = synapse_state_for_page(&page(false), &storage);
        assert_eq!(state.label(0), SynapseLabel::Red);
        assert_eq!(state.active_indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn initial_visit_clears_labels() {
        let storage = labelled_storage();
        let state = synapse_state_for_page(&page(true), &storage);
        assert_eq!(state.label(0), SynapseLabel::Yellow);

        let reloaded = synapse_state_for_page(&page(false), &storage);
        assert_eq!(reloaded.label(0), SynapseLabel::Yellow);
    }

    #[test]
    fn malformed_cloud_leaves_an_empty_state() {
        let broken = PageData {
            synapse_cloud: vec![1.0, 2.0],
            ..PageData::default()
        };
        let storage = SessionStorage(Box::new(MemorySessionStore::default()));
        let state = synapse_state_for_page(&broken, &storage);
        assert!(state.is_empty());
    }
}
