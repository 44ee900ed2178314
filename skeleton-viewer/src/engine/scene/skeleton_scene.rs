use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;

use crate::engine::assets::bounds::BoundingSphere;
use crate::engine::assets::swc::SkeletonMap;
use crate::engine::mesh::skeleton_mesh::SkeletonGeometry;
use crate::engine::render::frame_plan::DepthMaterial;
use crate::engine::render::materials::{ConeImposterMaterial, ParticleImposterMaterial};

/// Top-level renderable in the scene, visited by the frame planner.
#[derive(Component)]
pub struct SceneEntry;

/// One loaded skeleton. Owns its node map and the CPU copy of its buffers.
#[derive(Component, Debug)]
pub struct SkeletonEntry {
    /// Load order; entry 0 is the neuron under review.
    pub index: usize,
    pub nodes: SkeletonMap,
    pub geometry: SkeletonGeometry,
    pub sphere: BoundingSphere,
}

#[derive(Component)]
pub struct SkeletonParticles;

#[derive(Component)]
pub struct SkeletonCones;

/// Skeleton entries in load order.
#[derive(Resource, Debug, Default)]
pub struct LoadedSkeletons {
    pub entries: Vec<Entity>,
}

impl LoadedSkeletons {
    pub fn first(&self) -> Option<Entity> {
        self.entries.first().copied()
    }
}

/// Shared imposter materials, created once at startup.
#[derive(Resource, Debug, Clone)]
pub struct ImposterMaterials {
    pub particles: Handle<ParticleImposterMaterial>,
    pub cones: Handle<ConeImposterMaterial>,
}

pub fn create_imposter_materials(
    mut commands: Commands,
    mut particle_materials: ResMut<Assets<ParticleImposterMaterial>>,
    mut cone_materials: ResMut<Assets<ConeImposterMaterial>>,
) {
    commands.insert_resource(ImposterMaterials {
        particles: particle_materials.add(ParticleImposterMaterial::default()),
        cones: cone_materials.add(ConeImposterMaterial::default()),
    });
}

/// Spawn a skeleton entry with a particle child and, when it has links, a cone child.
pub fn spawn_skeleton(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &ImposterMaterials,
    loaded: &mut LoadedSkeletons,
    nodes: SkeletonMap,
    geometry: SkeletonGeometry,
    sphere: BoundingSphere,
) -> Entity {
    let particle_mesh = meshes.add(geometry.particle_mesh());
    let cone_mesh = geometry.cone_mesh().map(|mesh| meshes.add(mesh));
    let node_count = geometry.particles.len();
    let cone_groups = geometry.cones.group_count();

    let index = loaded.entries.len();
    let entry = commands
        .spawn((
            SceneEntry,
            SkeletonEntry {
                index,
                nodes,
                geometry,
                sphere,
            },
            Transform::default(),
            Visibility::default(),
        ))
        .id();

    // Imposter quads are expanded on the GPU, so mesh bounds are too small to cull with.
    let particles = commands
        .spawn((
            Mesh3d(particle_mesh),
            MeshMaterial3d(materials.particles.clone()),
            Transform::default(),
            SkeletonParticles,
            NoFrustumCulling,
            ChildOf(entry),
        ))
        .id();

    let cones = cone_mesh.map(|mesh| {
        commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(materials.cones.clone()),
                Transform::default(),
                SkeletonCones,
                NoFrustumCulling,
                ChildOf(entry),
            ))
            .id()
    });

    commands
        .entity(entry)
        .insert(DepthMaterial { particles, cones });
    loaded.entries.push(entry);

    println!(
        "✓ Skeleton {} spawned: {} particles, {} cones",
        index, node_count, cone_groups
    );
    entry
}

/// Remove every skeleton entry with its imposter children.
pub fn despawn_skeletons(commands: &mut Commands, loaded: &mut LoadedSkeletons) {
    for entry in loaded.entries.drain(..) {
        commands.entity(entry).despawn();
    }
}
