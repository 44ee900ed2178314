use bevy::prelude::*;
use bevy::render::view::{NoFrustumCulling, RenderLayers};

use crate::engine::camera::orbit_camera::MainCamera;
use crate::engine::render::materials::SynapseCloudMaterial;
use crate::tools::synapse_labels::SynapseCloudState;

/// Layer drawn after the scene with a fresh depth buffer, so nothing occludes it.
pub const ON_TOP_LAYER: usize = 1;

#[derive(Component)]
pub struct OverlayCamera;

/// Sprites of the active synapses, drawn on top of the skeleton.
#[derive(Component)]
pub struct ActiveSynapseMarker;

pub fn spawn_overlay_camera(commands: &mut Commands, main_camera: Entity) {
    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        Msaa::Off,
        RenderLayers::layer(ON_TOP_LAYER),
        Transform::default(),
        OverlayCamera,
        ChildOf(main_camera),
    ));
}

pub fn sync_overlay_projection(
    main: Query<&Projection, (With<MainCamera>, Changed<Projection>)>,
    mut overlays: Query<&mut Projection, (With<OverlayCamera>, Without<MainCamera>)>,
) {
    let Ok(projection) = main.single() else {
        return;
    };

    for mut overlay in &mut overlays {
        *overlay = projection.clone();
    }
}

/// Rebuild the on-top marker from the current active synapses.
pub fn update_active_marker(
    mut commands: Commands,
    state: Res<SynapseCloudState>,
    mut markers: Query<(&Mesh3d, &mut Visibility), With<ActiveSynapseMarker>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<SynapseCloudMaterial>>,
) {
    if !state.is_changed() {
        return;
    }

    let marker = state.active_marker();

    match markers.single_mut() {
        Ok((mesh_handle, mut visibility)) => {
            if marker.is_empty() {
                *visibility = Visibility::Hidden;
            } else {
                if let Some(mesh) = meshes.get_mut(&mesh_handle.0) {
                    *mesh = marker.mesh();
                }
                *visibility = Visibility::Inherited;
            }
        }
        Err(_) if !marker.is_empty() => {
            commands.spawn((
                ActiveSynapseMarker,
                Mesh3d(meshes.add(marker.mesh())),
                MeshMaterial3d(materials.add(SynapseCloudMaterial {
                    outline: Vec4::new(2.0, 0.0, 0.0, 0.0),
                })),
                Transform::default(),
                RenderLayers::layer(ON_TOP_LAYER),
                NoFrustumCulling,
            ));
        }
        Err(_) => {}
    }
}
