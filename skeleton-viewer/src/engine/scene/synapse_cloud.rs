use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;

use super::skeleton_scene::SceneEntry;
use crate::engine::mesh::synapse_mesh::SynapseBuffer;
use crate::engine::render::materials::SynapseCloudMaterial;
use crate::tools::synapse_labels::SynapseCloudState;

#[derive(Component)]
pub struct SynapseCloud;

/// Spawn the synapse sprites. The cloud never joins the depth pass.
pub fn spawn_synapse_cloud(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<SynapseCloudMaterial>,
    buffer: &SynapseBuffer,
) -> Option<Entity> {
    if buffer.is_empty() {
        info!("Page has no synapses, skipping synapse cloud");
        return None;
    }

    let entity = commands
        .spawn((
            SceneEntry,
            SynapseCloud,
            Mesh3d(meshes.add(buffer.mesh())),
            MeshMaterial3d(materials.add(SynapseCloudMaterial::default())),
            Transform::default(),
            NoFrustumCulling,
        ))
        .id();

    println!("✓ Synapse cloud spawned with {} synapses", buffer.len());
    Some(entity)
}

/// Re-upload synapse attributes after any label, selection or position change.
pub fn refresh_synapse_cloud(
    state: Res<SynapseCloudState>,
    clouds: Query<&Mesh3d, With<SynapseCloud>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if !state.is_changed() {
        return;
    }

    for mesh_handle in &clouds {
        if let Some(mesh) = meshes.get_mut(&mesh_handle.0) {
            state.buffer().write_state(mesh);
        }
    }
}
