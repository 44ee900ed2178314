use bevy::core_pipeline::prepass::DepthPrepass;
use bevy::prelude::*;
use bevy::render::extract_resource::ExtractResource;

use crate::engine::camera::orbit_camera::MainCamera;
use crate::engine::scene::skeleton_scene::SceneEntry;
use crate::rpc::commands::ViewerCommand;

/// Which half of a skeleton entry a depth pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLayer {
    Particles,
    Cones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Scene into the colour target.
    Colour,
    /// One depth-capable mesh into the depth target.
    Depth { entry: Entity, layer: DepthLayer },
    /// Bokeh composite of colour and depth to the screen.
    Composite,
    /// Scene straight to the screen.
    Direct,
}

/// Scene entries that can draw into the depth target, with the meshes that do.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthMaterial {
    pub particles: Entity,
    pub cones: Option<Entity>,
}

/// Whether the depth of field composite runs. Toggled by the page.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessing {
    pub enabled: bool,
}

impl Default for PostProcessing {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Ordered passes for the current frame, extracted for the composite node.
#[derive(Resource, ExtractResource, Debug, Clone, Default, PartialEq, Eq)]
pub struct FramePlan {
    pub passes: Vec<RenderPass>,
}

impl FramePlan {
    pub fn composites(&self) -> bool {
        self.passes.contains(&RenderPass::Composite)
    }

    pub fn depth_passes(&self) -> impl Iterator<Item = (Entity, DepthLayer)> + '_ {
        self.passes.iter().filter_map(|pass| match pass {
            RenderPass::Depth { entry, layer } => Some((*entry, *layer)),
            _ => None,
        })
    }
}

/// Build the pass list for one frame.
///
/// Entries without a `DepthMaterial` are drawn in the colour pass only.
pub fn plan_frame<'a>(
    post_processing: bool,
    entries: impl IntoIterator<Item = (Entity, Option<&'a DepthMaterial>)>,
) -> FramePlan {
    if !post_processing {
        return FramePlan {
            passes: vec![RenderPass::Direct],
        };
    }

    let mut passes = vec![RenderPass::Colour];
    for (entry, depth) in entries {
        let Some(depth) = depth else {
            continue;
        };
        passes.push(RenderPass::Depth {
            entry,
            layer: DepthLayer::Particles,
        });
        if depth.cones.is_some() {
            passes.push(RenderPass::Depth {
                entry,
                layer: DepthLayer::Cones,
            });
        }
    }
    passes.push(RenderPass::Composite);

    FramePlan { passes }
}

pub fn handle_post_processing_commands(
    mut events: EventReader<ViewerCommand>,
    mut post_processing: ResMut<PostProcessing>,
) {
    for command in events.read() {
        if let ViewerCommand::SetPostProcessing(enabled) = command {
            if post_processing.enabled != *enabled {
                info!("Post-processing {}", if *enabled { "enabled" } else { "disabled" });
                post_processing.enabled = *enabled;
            }
        }
    }
}

pub fn update_frame_plan(
    post_processing: Res<PostProcessing>,
    entries: Query<(Entity, Option<&DepthMaterial>), With<SceneEntry>>,
    mut plan: ResMut<FramePlan>,
) {
    let next = plan_frame(post_processing.enabled, entries.iter());
    if *plan != next {
        *plan = next;
    }
}

/// Only pay for the depth prepass while the plan composites.
pub fn sync_depth_prepass(
    mut commands: Commands,
    plan: Res<FramePlan>,
    cameras: Query<(Entity, Has<DepthPrepass>), With<MainCamera>>,
) {
    if !plan.is_changed() {
        return;
    }

    for (camera, has_prepass) in &cameras {
        match (plan.composites(), has_prepass) {
            (true, false) => {
                commands.entity(camera).insert(DepthPrepass);
            }
            (false, true) => {
                commands.entity(camera).remove::<DepthPrepass>();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn disabled_post_processing_renders_direct() {
        let depth = DepthMaterial {
            particles: entity(2),
            cones: None,
        };
        let plan = plan_frame(false, [(entity(1), Some(&depth))]);
        assert_eq!(plan.passes, vec![RenderPass::Direct]);
        assert!(!plan.composites());
    }

    #[test]
    fn enabled_plan_wraps_depth_passes() {
        let with_cones = DepthMaterial {
            particles: entity(11),
            cones: Some(entity(12)),
        };
        let particles_only = DepthMaterial {
            particles: entity(21),
            cones: None,
        };
        let plan = plan_frame(
            true,
            [
                (entity(10), Some(&with_cones)),
                (entity(30), None),
                (entity(20), Some(&particles_only)),
            ],
        );

        assert_eq!(
            plan.passes,
            vec![
                RenderPass::Colour,
                RenderPass::Depth {
                    entry: entity(10),
                    layer: DepthLayer::Particles
                },
                RenderPass::Depth {
                    entry: entity(10),
                    layer: DepthLayer::Cones
                },
                RenderPass::Depth {
                    entry: entity(20),
                    layer: DepthLayer::Particles
                },
                RenderPass::Composite,
            ]
        );
        assert_eq!(plan.depth_passes().count(), 3);
    }

    #[test]
    fn empty_scene_still_composites() {
        let plan = plan_frame(true, std::iter::empty());
        assert_eq!(plan.passes, vec![RenderPass::Colour, RenderPass::Composite]);
    }
}
