use bevy::pbr::{MaterialPipeline, MaterialPipelineKey};
use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy::render::mesh::MeshVertexBufferLayoutRef;
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, ShaderRef, SpecializedMeshPipelineError,
};

use crate::engine::mesh::attributes::{
    ATTRIBUTE_ABSTRACTION, ATTRIBUTE_ALPHA, ATTRIBUTE_COLOUR, ATTRIBUTE_CORNER,
    ATTRIBUTE_GREY_OUT, ATTRIBUTE_LABEL, ATTRIBUTE_NORMAL_A, ATTRIBUTE_NORMAL_B,
    ATTRIBUTE_POINT_SIZE, ATTRIBUTE_RADIUS,
};

const PARTICLE_SHADER_PATH: &str = "shaders/skeleton_particle.wgsl";
const CONE_SHADER_PATH: &str = "shaders/skeleton_cone.wgsl";
const SYNAPSE_SHADER_PATH: &str = "shaders/synapse_cloud.wgsl";

/// Light direction (xyz) and ambient term (w) shared by both imposter shaders.
pub const IMPOSTER_LIGHT: Vec4 = Vec4::new(0.3, 0.6, 0.75, 0.35);

/// Colour of greyed out sections (rgb) and their opacity (w).
pub const GREY_OUT_COLOUR: Vec4 = Vec4::new(0.55, 0.55, 0.55, 1.0);

/// Ray-traced sphere per node. The prepass variant writes the sphere depth.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct ParticleImposterMaterial {
    #[uniform(0)]
    pub light: Vec4,
    #[uniform(1)]
    pub grey_colour: Vec4,
}

impl Default for ParticleImposterMaterial {
    fn default() -> Self {
        Self {
            light: IMPOSTER_LIGHT,
            grey_colour: GREY_OUT_COLOUR,
        }
    }
}

impl Material for ParticleImposterMaterial {
    fn vertex_shader() -> ShaderRef {
        PARTICLE_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        PARTICLE_SHADER_PATH.into()
    }

    fn prepass_vertex_shader() -> ShaderRef {
        PARTICLE_SHADER_PATH.into()
    }

    fn prepass_fragment_shader() -> ShaderRef {
        PARTICLE_SHADER_PATH.into()
    }

    // Mask keeps the fragment stage in the depth prepass so discarded corners stay empty.
    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Mask(0.5)
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            ATTRIBUTE_CORNER.at_shader_location(1),
            ATTRIBUTE_RADIUS.at_shader_location(2),
            ATTRIBUTE_LABEL.at_shader_location(3),
            ATTRIBUTE_ABSTRACTION.at_shader_location(4),
            ATTRIBUTE_GREY_OUT.at_shader_location(5),
            ATTRIBUTE_COLOUR.at_shader_location(6),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}

/// Ray-traced truncated cone between a node and its parent.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct ConeImposterMaterial {
    #[uniform(0)]
    pub light: Vec4,
    #[uniform(1)]
    pub grey_colour: Vec4,
}

impl Default for ConeImposterMaterial {
    fn default() -> Self {
        Self {
            light: IMPOSTER_LIGHT,
            grey_colour: GREY_OUT_COLOUR,
        }
    }
}

impl Material for ConeImposterMaterial {
    fn vertex_shader() -> ShaderRef {
        CONE_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        CONE_SHADER_PATH.into()
    }

    fn prepass_vertex_shader() -> ShaderRef {
        CONE_SHADER_PATH.into()
    }

    fn prepass_fragment_shader() -> ShaderRef {
        CONE_SHADER_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Mask(0.5)
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
            ATTRIBUTE_NORMAL_A.at_shader_location(2),
            ATTRIBUTE_NORMAL_B.at_shader_location(3),
            ATTRIBUTE_RADIUS.at_shader_location(4),
            ATTRIBUTE_LABEL.at_shader_location(5),
            ATTRIBUTE_ABSTRACTION.at_shader_location(6),
            ATTRIBUTE_GREY_OUT.at_shader_location(7),
            ATTRIBUTE_COLOUR.at_shader_location(8),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}

/// Screen-space synapse sprites, alpha blended and kept out of the depth pass.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone, Default)]
pub struct SynapseCloudMaterial {
    /// Extra pixel ring drawn around each sprite (x), unused (yzw).
    #[uniform(0)]
    pub outline: Vec4,
}

impl Material for SynapseCloudMaterial {
    fn vertex_shader() -> ShaderRef {
        SYNAPSE_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        SYNAPSE_SHADER_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            ATTRIBUTE_CORNER.at_shader_location(1),
            ATTRIBUTE_COLOUR.at_shader_location(2),
            ATTRIBUTE_POINT_SIZE.at_shader_location(3),
            ATTRIBUTE_ALPHA.at_shader_location(4),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}

/// Registers the imposter and synapse materials.
pub struct ImposterMaterialPlugin;

impl Plugin for ImposterMaterialPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            MaterialPlugin::<ParticleImposterMaterial> {
                shadows_enabled: false,
                ..default()
            },
            MaterialPlugin::<ConeImposterMaterial> {
                shadows_enabled: false,
                ..default()
            },
            MaterialPlugin::<SynapseCloudMaterial> {
                prepass_enabled: false,
                shadows_enabled: false,
                ..default()
            },
        ));
    }
}
