use bevy::prelude::*;
use bevy::window::RequestRedraw;

use constants::palette::NODE_TYPE_PALETTE;

use crate::engine::assets::bounds::{
    BoundingSphere, compute_bounding_box, compute_bounding_sphere,
};
use crate::engine::assets::page_data::{PageData, ViewerSettings};
use crate::engine::assets::swc::{SkeletonMap, parse_swc};
use crate::engine::camera::orbit_camera::OrbitController;
use crate::engine::loading::fetch::{FetchCompleted, FetchQueue, FetchRequest};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::mesh::labels::LabelRange;
use crate::engine::mesh::skeleton_mesh::{SkeletonGeometry, SkeletonStyle, build_skeleton};
use crate::engine::scene::skeleton_scene::{
    ImposterMaterials, LoadedSkeletons, despawn_skeletons, spawn_skeleton,
};
use crate::error::ViewerError;
use crate::rpc::commands::ViewerCommand;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::refocus::{RefocusRetry, request_refocus};
use crate::tools::section_colouring::{SectionAssignment, SectionColouringState};
use crate::tools::synapse_labels::SynapseCloudState;

/// A parsed skeleton with its buffers and framing, ready to spawn.
#[derive(Debug)]
pub struct PreparedSkeleton {
    pub nodes: SkeletonMap,
    pub geometry: SkeletonGeometry,
    pub sphere: BoundingSphere,
    /// Abstraction boundary position in [0, 1] after the label range grew.
    pub abstraction_position: f32,
}

/// Parse SWC text and build imposter buffers against the session label range.
pub fn prepare_skeleton(
    text: &str,
    settings: &ViewerSettings,
    label_range: &mut LabelRange,
    abstraction_threshold: f32,
) -> Result<PreparedSkeleton, ViewerError> {
    let nodes = parse_swc(text)?.require_nodes()?;
    let bounding_box = compute_bounding_box(&nodes);
    let sphere = compute_bounding_sphere(&nodes, &bounding_box);

    let style = SkeletonStyle {
        palette: NODE_TYPE_PALETTE,
        radius_scale: settings.radius_scale,
        min_radius: settings.min_radius,
        colour_override: settings.colour_override,
    };
    let (geometry, abstraction_position) =
        build_skeleton(&nodes, &style, label_range, abstraction_threshold);

    Ok(PreparedSkeleton {
        nodes,
        geometry,
        sphere,
        abstraction_position,
    })
}

/// Where the first framing settles: the first active synapse, else the
/// active section's first node.
pub fn page_focus_point(
    synapses: &SynapseCloudState,
    assignment: &SectionAssignment,
    active_section: Option<usize>,
    nodes: &SkeletonMap,
) -> Option<Vec3> {
    synapses.first_active_position().or_else(|| {
        active_section
            .and_then(|section| assignment.first_node(section))
            .and_then(|node| nodes.node_at(node))
            .map(|node| node.position)
    })
}

pub fn handle_reload_commands(
    mut events: EventReader<ViewerCommand>,
    fetch_queue: Res<FetchQueue>,
) {
    for command in events.read() {
        if matches!(command, ViewerCommand::ReloadSkeleton) {
            info!("Reloading skeleton");
            fetch_queue.start(FetchRequest::Skeleton);
        }
    }
}

/// Replace the scene skeleton with a freshly fetched one and frame the camera on it.
pub fn handle_skeleton_fetch(
    mut completed: EventReader<FetchCompleted>,
    mut loading_progress: ResMut<LoadingProgress>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Res<ImposterMaterials>,
    mut loaded: ResMut<LoadedSkeletons>,
    mut label_range: ResMut<LabelRange>,
    mut colouring: ResMut<SectionColouringState>,
    mut controller: ResMut<OrbitController>,
    mut retry: ResMut<RefocusRetry>,
    synapses: Res<SynapseCloudState>,
    assignment: Res<SectionAssignment>,
    settings: Res<ViewerSettings>,
    page: Option<Res<PageData>>,
    mut redraw: EventWriter<RequestRedraw>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for FetchCompleted(completion) in completed.read() {
        if completion.request != FetchRequest::Skeleton {
            continue;
        }
        loading_progress.skeleton_settled = true;

        let prepared = completion.result.clone().and_then(|text| {
            prepare_skeleton(
                &text,
                &settings,
                &mut label_range,
                colouring.abstraction_threshold,
            )
        });

        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                error!("Skeleton not loaded: {}", e);
                if e.is_blocking() {
                    rpc_interface.send_notification(
                        "alert",
                        serde_json::json!({ "message": e.to_string() }),
                    );
                }
                continue;
            }
        };

        println!(
            "✓ Skeleton parsed: {} nodes, bounding radius {:.1}",
            prepared.nodes.len(),
            prepared.sphere.radius
        );
        debug!("Node types: {:?}", prepared.nodes.type_counts());

        let first_load = loaded.entries.is_empty();
        let focus = page_focus_point(
            &synapses,
            &assignment,
            colouring.active_section,
            &prepared.nodes,
        );
        despawn_skeletons(&mut commands, &mut loaded);

        let sphere = prepared.sphere;
        let node_count = prepared.nodes.len();
        spawn_skeleton(
            &mut commands,
            &mut meshes,
            &materials,
            &mut loaded,
            prepared.nodes,
            prepared.geometry,
            sphere,
        );

        colouring.abstraction_threshold = 1.0 - prepared.abstraction_position;

        let saved_pose = page.as_ref().is_some_and(|page| page.camera.is_some());
        if !(first_load && saved_pose) {
            controller.reset_around(&sphere, settings.front_to_back, settings.max_volume_size);
        }
        if let Some(point) = focus.filter(|_| first_load) {
            retry.cancel();
            request_refocus(&mut controller, &mut retry, point);
        }

        rpc_interface.send_notification(
            "abstraction_position",
            serde_json::json!({ "position": prepared.abstraction_position }),
        );
        rpc_interface.send_notification(
            "skeleton_loaded",
            serde_json::json!({
                "nodes": node_count,
                "center": sphere.center.to_array(),
                "radius": sphere.radius,
            }),
        );
        redraw.write(RequestRedraw);
    }
}
