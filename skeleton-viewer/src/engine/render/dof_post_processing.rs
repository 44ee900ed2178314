use bevy::{
    core_pipeline::{
        core_3d::graph::{Core3d, Node3d},
        fullscreen_vertex_shader::fullscreen_shader_vertex_state,
        prepass::ViewPrepassTextures,
    },
    ecs::query::QueryItem,
    prelude::*,
    render::{
        RenderApp,
        extract_component::{
            ComponentUniforms, DynamicUniformIndex, ExtractComponent, ExtractComponentPlugin,
            UniformComponentPlugin,
        },
        extract_resource::ExtractResourcePlugin,
        render_graph::{
            NodeRunError, RenderGraphApp, RenderGraphContext, RenderLabel, ViewNode, ViewNodeRunner,
        },
        render_resource::{
            binding_types::{sampler, texture_2d, texture_depth_2d, uniform_buffer},
            *,
        },
        renderer::{RenderContext, RenderDevice},
        view::ViewTarget,
    },
};

use super::frame_plan::FramePlan;
use crate::engine::camera::orbit_camera::{MainCamera, OrbitController};

const DOF_SHADER_PATH: &str = "shaders/dof_postprocess.wgsl";

pub struct DepthOfFieldPlugin;

impl Plugin for DepthOfFieldPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ExtractComponentPlugin::<DepthOfFieldSettings>::default(),
            UniformComponentPlugin::<DepthOfFieldSettings>::default(),
            ExtractResourcePlugin::<FramePlan>::default(),
        ));

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .add_render_graph_node::<ViewNodeRunner<DepthOfFieldNode>>(Core3d, DepthOfFieldLabel)
            .add_render_graph_edges(
                Core3d,
                (
                    Node3d::Tonemapping,
                    DepthOfFieldLabel,
                    Node3d::EndMainPassPostProcessing,
                ),
            );
    }

    fn finish(&self, app: &mut App) {
        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app.init_resource::<DepthOfFieldPipeline>();
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
struct DepthOfFieldLabel;

/// Bokeh composite parameters, uploaded as a per-view uniform.
#[derive(Component, Debug, Default, Clone, Copy, ExtractComponent, ShaderType)]
pub struct DepthOfFieldSettings {
    /// Sample rings around each pixel.
    pub rings: u32,
    /// Samples on the first ring; each further ring adds this many.
    pub samples: u32,
    /// View distance that is perfectly sharp.
    pub focal_depth: f32,
    pub f_stop: f32,
    /// Largest blur radius in pixels.
    pub max_blur: f32,
    pub bias: f32,
    /// Highlight gain applied to bright samples.
    pub gain: f32,
    /// Chromatic fringe strength.
    pub fringe: f32,
    /// 0 or 1.
    pub vignetting: f32,
    /// Luminance above which highlights are boosted.
    pub threshold: f32,
    pub znear: f32,
    pub zfar: f32,
}

/// Keep the focus on the orbit target and the clip planes in step with the camera.
pub fn sync_depth_of_field(
    controller: Res<OrbitController>,
    mut settings: Query<&mut DepthOfFieldSettings, With<MainCamera>>,
) {
    if !controller.is_changed() {
        return;
    }

    for mut dof in &mut settings {
        dof.focal_depth = controller.distance();
        dof.znear = controller.near();
        dof.zfar = controller.far();
    }
}

#[derive(Default)]
struct DepthOfFieldNode;

impl ViewNode for DepthOfFieldNode {
    type ViewQuery = (
        &'static ViewTarget,
        &'static ViewPrepassTextures,
        &'static DepthOfFieldSettings,
        &'static DynamicUniformIndex<DepthOfFieldSettings>,
    );

    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        (view_target, prepass_textures, _dof_settings, settings_index): QueryItem<Self::ViewQuery>,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let composites = world
            .get_resource::<FramePlan>()
            .is_some_and(FramePlan::composites);
        if !composites {
            return Ok(());
        }

        let Some(depth_view) = prepass_textures.depth_view() else {
            return Ok(());
        };

        let dof_pipeline = world.resource::<DepthOfFieldPipeline>();
        let pipeline_cache = world.resource::<PipelineCache>();

        let Some(pipeline) = pipeline_cache.get_render_pipeline(dof_pipeline.pipeline_id) else {
            return Ok(());
        };

        let settings_uniforms = world.resource::<ComponentUniforms<DepthOfFieldSettings>>();
        let Some(settings_binding) = settings_uniforms.uniforms().binding() else {
            return Ok(());
        };

        let post_process = view_target.post_process_write();

        let bind_group = render_context.render_device().create_bind_group(
            "dof_post_process_bind_group",
            &dof_pipeline.layout,
            &BindGroupEntries::sequential((
                post_process.source,
                &dof_pipeline.sampler,
                depth_view,
                settings_binding.clone(),
            )),
        );

        let mut render_pass = render_context.begin_tracked_render_pass(RenderPassDescriptor {
            label: Some("dof_post_process_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: post_process.destination,
                resolve_target: None,
                ops: Operations::default(),
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_render_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[settings_index.index()]);
        render_pass.draw(0..3, 0..1);

        Ok(())
    }
}

#[derive(Resource)]
struct DepthOfFieldPipeline {
    layout: BindGroupLayout,
    sampler: Sampler,
    pipeline_id: CachedRenderPipelineId,
}

impl FromWorld for DepthOfFieldPipeline {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();

        let layout = render_device.create_bind_group_layout(
            "dof_post_process_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: true }),
                    sampler(SamplerBindingType::Filtering),
                    texture_depth_2d(),
                    uniform_buffer::<DepthOfFieldSettings>(true),
                ),
            ),
        );

        let sampler = render_device.create_sampler(&SamplerDescriptor {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..default()
        });

        let shader = world.load_asset(DOF_SHADER_PATH);

        let pipeline_id =
            world
                .resource_mut::<PipelineCache>()
                .queue_render_pipeline(RenderPipelineDescriptor {
                    label: Some("dof_post_process_pipeline".into()),
                    layout: vec![layout.clone()],
                    vertex: fullscreen_shader_vertex_state(),
                    fragment: Some(FragmentState {
                        shader,
                        shader_defs: vec![],
                        entry_point: "fragment".into(),
                        targets: vec![Some(ColorTargetState {
                            format: TextureFormat::bevy_default(),
                            blend: None,
                            write_mask: ColorWrites::ALL,
                        })],
                    }),
                    primitive: PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: MultisampleState::default(),
                    push_constant_ranges: vec![],
                    zero_initialize_workgroup_memory: false,
                });

        Self {
            layout,
            sampler,
            pipeline_id,
        }
    }
}
