// Standard library and external crates
use bevy::asset::AssetMetaCheck;
use bevy::core_pipeline::prepass::DepthPrepass;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

use constants::camera::{DEFAULT_FOV_DEGREES, DEFAULT_MAX_VOLUME_SIZE, MIN_ORBIT_DISTANCE};

// Crate engine modules
use crate::constants::render_settings::{BACKGROUND_COLOUR, DEFAULT_DOF_SETTINGS};
use crate::engine::assets::page_data::{PageData, ViewerSettings};
use crate::engine::camera::orbit_camera::{
    MainCamera, OrbitController, apply_camera_pose, handle_camera_commands,
    orbit_camera_controller,
};
use crate::engine::camera::viewport::{
    PendingResize, Viewport, apply_pending_resize, handle_viewport_commands,
};
use crate::engine::core::app_state::{AppState, transition_to_running, update_loading_frontend};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::fetch::{FetchCompleted, FetchQueue, drain_fetch_completions};
use crate::engine::loading::page_loader::{PageDataLoader, load_page_data_system, start_loading};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::skeleton_loader::{handle_reload_commands, handle_skeleton_fetch};
use crate::engine::mesh::labels::LabelRange;
use crate::engine::render::dof_post_processing::{DepthOfFieldPlugin, sync_depth_of_field};
use crate::engine::render::frame_plan::{
    FramePlan, PostProcessing, handle_post_processing_commands, sync_depth_prepass,
    update_frame_plan,
};
use crate::engine::render::materials::ImposterMaterialPlugin;
use crate::engine::scene::lights::{spawn_headlight, sync_imposter_light};
use crate::engine::scene::overlay::{
    spawn_overlay_camera, sync_overlay_projection, update_active_marker,
};
use crate::engine::scene::skeleton_scene::{LoadedSkeletons, create_imposter_materials};
use crate::engine::scene::synapse_cloud::refresh_synapse_cloud;

// Crate tools modules
use crate::tools::{
    navigation::{handle_navigation_commands, handle_navigation_fetches},
    refocus::{RefocusRetry, retry_refocus},
    section_colouring::{
        SectionAssignment, SectionColouringState, apply_section_colouring,
        handle_section_commands,
    },
    session_store::SessionStorage,
    synapse_labels::{SynapseCloudState, handle_synapse_commands},
};

// Web RPC modules
use crate::rpc::web_rpc::WebRpcPlugin;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        // Registers PageData as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<PageData>::new(&["json"]))
        .add_plugins(ImposterMaterialPlugin)
        .add_plugins(DepthOfFieldPlugin)
        .add_plugins(WebRpcPlugin)
        .insert_resource(ClearColor(BACKGROUND_COLOUR));

    // Initialise resources early
    app.init_resource::<LoadingProgress>()
        .init_resource::<PageDataLoader>()
        .init_resource::<FetchQueue>()
        .init_resource::<ViewerSettings>()
        .init_resource::<Viewport>()
        .init_resource::<PendingResize>()
        .init_resource::<LabelRange>()
        .init_resource::<LoadedSkeletons>()
        .init_resource::<PostProcessing>()
        .init_resource::<FramePlan>()
        .init_resource::<SectionAssignment>()
        .init_resource::<SectionColouringState>()
        .init_resource::<SynapseCloudState>()
        .init_resource::<SessionStorage>()
        .init_resource::<RefocusRetry>()
        .insert_resource(OrbitController::new(
            DEFAULT_FOV_DEGREES,
            DEFAULT_MAX_VOLUME_SIZE,
        ))
        .add_event::<FetchCompleted>();

    app.add_systems(Startup, (setup, create_imposter_materials, start_loading).chain());

    // Fetch results and loading milestones.
    app.add_systems(
        Update,
        (
            drain_fetch_completions,
            load_page_data_system.run_if(in_state(AppState::Loading)),
            handle_skeleton_fetch,
            handle_navigation_fetches,
            update_loading_frontend,
            transition_to_running.run_if(in_state(AppState::Loading)),
        )
            .chain()
            .in_set(ViewerSet::Load),
    );

    // Page commands, then user input.
    app.add_systems(
        Update,
        (
            (
                handle_viewport_commands,
                handle_camera_commands,
                handle_section_commands,
                handle_synapse_commands,
                handle_post_processing_commands,
                handle_navigation_commands,
                handle_reload_commands,
            ),
            orbit_camera_controller.run_if(in_state(AppState::Running)),
            retry_refocus,
        )
            .chain()
            .in_set(ViewerSet::Commands),
    );

    // Push state into meshes, cameras and the frame plan.
    app.add_systems(
        Update,
        (
            (
                apply_section_colouring,
                refresh_synapse_cloud,
                update_active_marker,
            ),
            apply_pending_resize,
            apply_camera_pose,
            (sync_overlay_projection, sync_depth_of_field, sync_imposter_light),
            update_frame_plan,
            sync_depth_prepass,
        )
            .chain()
            .in_set(ViewerSet::Apply),
    );

    app.configure_sets(
        Update,
        (ViewerSet::Load, ViewerSet::Commands, ViewerSet::Apply).chain(),
    );

    app
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
enum ViewerSet {
    Load,
    Commands,
    Apply,
}

// Startup system that only handles basic initialisation
fn setup(mut commands: Commands) {
    println!("=== SKELETON VIEWER ===");

    let main_camera = commands
        .spawn((
            Camera3d::default(),
            Projection::Perspective(PerspectiveProjection {
                fov: DEFAULT_FOV_DEGREES.to_radians(),
                ..default()
            }),
            Transform::from_xyz(0.0, 0.0, MIN_ORBIT_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
            // The composite samples a single-sample depth texture.
            Msaa::Off,
            DepthPrepass,
            DEFAULT_DOF_SETTINGS,
            MainCamera,
        ))
        .id();

    spawn_headlight(&mut commands, main_camera);
    spawn_overlay_camera(&mut commands, main_camera);
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
