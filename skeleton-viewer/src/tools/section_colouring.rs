use std::collections::BTreeSet;

use bevy::prelude::*;
use bevy::window::RequestRedraw;

use constants::palette::{ACTIVE_SECTION_COLOUR, section_colour};

use super::refocus::{RefocusRetry, request_refocus};
use crate::engine::camera::orbit_camera::OrbitController;
use crate::engine::mesh::labels::LabelRange;
use crate::engine::mesh::skeleton_mesh::{SkeletonGeometry, VERTICES_PER_QUAD};
use crate::engine::render::frame_plan::DepthMaterial;
use crate::engine::scene::skeleton_scene::{LoadedSkeletons, SkeletonEntry};
use crate::rpc::commands::ViewerCommand;
use crate::rpc::web_rpc::WebRpcInterface;

/// Node indices per section for the neuron under review.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SectionAssignment {
    pub sections: Vec<Vec<usize>>,
}

impl SectionAssignment {
    pub fn first_node(&self, section: usize) -> Option<usize> {
        self.sections.get(section).and_then(|nodes| nodes.first()).copied()
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SectionColouringState {
    pub active_section: Option<usize>,
    /// Sections drawn greyed out.
    pub suppressed: BTreeSet<usize>,
    /// Slider position in [0, 1]; 1 shows every label.
    pub abstraction_threshold: f32,
}

impl Default for SectionColouringState {
    fn default() -> Self {
        Self {
            active_section: None,
            suppressed: BTreeSet::new(),
            abstraction_threshold: 1.0,
        }
    }
}

/// Full set of mutable attributes for one skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourBuffers {
    pub particle_colours: Vec<[f32; 3]>,
    pub particle_grey: Vec<f32>,
    /// Per cone vertex, six per group.
    pub cone_colours: Vec<[f32; 3]>,
    pub cone_grey: Vec<f32>,
    pub abstraction: f32,
}

impl ColourBuffers {
    pub fn apply_to(self, geometry: &mut SkeletonGeometry) {
        let particle_count = geometry.particles.len();
        let cone_count = geometry.cones.len();
        geometry.particles.colours = self.particle_colours;
        geometry.particles.grey_out = self.particle_grey;
        geometry.particles.abstraction = vec![self.abstraction; particle_count];
        geometry.cones.colours = self.cone_colours;
        geometry.cones.grey_out = self.cone_grey;
        geometry.cones.abstraction = vec![self.abstraction; cone_count];
    }
}

/// Recompute colour, grey-out and abstraction for every particle and cone.
///
/// Nodes in a section take that section's colour, or the highlight colour
/// when it is the active section. Suppressed sections are greyed out. Nodes in
/// no section keep their palette colour. A cone takes its child node's values.
pub fn recolour(
    geometry: &SkeletonGeometry,
    assignment: &SectionAssignment,
    state: &SectionColouringState,
    abstraction: f32,
) -> ColourBuffers {
    let node_count = geometry.particles.len();
    let mut particle_colours = geometry.particles.base_colours.clone();
    let mut particle_grey = vec![0.0; node_count];

    for (section, nodes) in assignment.sections.iter().enumerate() {
        let colour = if state.active_section == Some(section) {
            ACTIVE_SECTION_COLOUR
        } else {
            section_colour(section)
        };
        let grey = if state.suppressed.contains(&section) {
            1.0
        } else {
            0.0
        };

        for &node in nodes.iter().filter(|node| **node < node_count) {
            particle_colours[node] = colour;
            particle_grey[node] = grey;
        }
    }

    let mut cone_colours = Vec::with_capacity(geometry.cones.len());
    let mut cone_grey = Vec::with_capacity(geometry.cones.len());
    for &child in &geometry.cones.child_indices {
        for _ in 0..VERTICES_PER_QUAD {
            cone_colours.push(particle_colours[child]);
            cone_grey.push(particle_grey[child]);
        }
    }

    ColourBuffers {
        particle_colours,
        particle_grey,
        cone_colours,
        cone_grey,
        abstraction,
    }
}

pub fn handle_section_commands(
    mut events: EventReader<ViewerCommand>,
    mut state: ResMut<SectionColouringState>,
    assignment: Res<SectionAssignment>,
    loaded: Res<LoadedSkeletons>,
    entries: Query<&SkeletonEntry>,
    mut controller: ResMut<OrbitController>,
    mut retry: ResMut<RefocusRetry>,
) {
    for command in events.read() {
        match command {
            ViewerCommand::GreyOutSections(sections) => {
                state.suppressed = sections.clone();
            }
            ViewerCommand::SetAbstractionThreshold(threshold) => {
                state.abstraction_threshold = threshold.clamp(0.0, 1.0);
            }
            ViewerCommand::SelectSection(section) => {
                state.active_section = *section;
                let Some(section) = *section else {
                    continue;
                };

                let first_node = assignment.first_node(section);
                let point = loaded
                    .first()
                    .and_then(|entry| entries.get(entry).ok())
                    .zip(first_node)
                    .and_then(|(entry, node)| entry.nodes.node_at(node))
                    .map(|node| node.position);

                match point {
                    Some(point) => {
                        if request_refocus(controller.bypass_change_detection(), &mut retry, point)
                        {
                            controller.set_changed();
                        }
                    }
                    None => warn!("Section {} has no node to focus on", section),
                }
            }
            _ => {}
        }
    }
}

/// Rewrite skeleton attributes after a section, grey-out or abstraction change.
pub fn apply_section_colouring(
    state: Res<SectionColouringState>,
    assignment: Res<SectionAssignment>,
    label_range: Res<LabelRange>,
    loaded: Res<LoadedSkeletons>,
    mut entries: Query<(&mut SkeletonEntry, &DepthMaterial)>,
    mesh_handles: Query<&Mesh3d>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut redraw: EventWriter<RequestRedraw>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !(state.is_changed() || assignment.is_changed() || loaded.is_changed()) {
        return;
    }

    let Some(abstraction) = label_range.boundary(state.abstraction_threshold) else {
        return;
    };
    let unassigned = SectionAssignment::default();

    for (mut entry, depth) in &mut entries {
        // Sections index the neuron under review only.
        let sections = if entry.index == 0 {
            assignment.as_ref()
        } else {
            &unassigned
        };
        let buffers = recolour(&entry.geometry, sections, &state, abstraction);
        buffers.apply_to(&mut entry.geometry);

        if let Some(mesh) = mesh_handles
            .get(depth.particles)
            .ok()
            .and_then(|handle| meshes.get_mut(&handle.0))
        {
            entry.geometry.write_particle_state(mesh);
        }

        if let Some(mesh) = depth
            .cones
            .and_then(|cones| mesh_handles.get(cones).ok())
            .and_then(|handle| meshes.get_mut(&handle.0))
        {
            entry.geometry.write_cone_state(mesh);
        }
    }

    if let Some(position) = label_range.normalised(abstraction) {
        rpc_interface.send_notification(
            "abstraction_position",
            serde_json::json!({ "position": position }),
        );
    }
    redraw.write(RequestRedraw);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::swc::parse_swc;
    use crate::engine::mesh::skeleton_mesh::{SkeletonStyle, build_skeleton};

    const PALETTE: &[[f32; 3]] = &[[0.5, 0.5, 0.5]];

    fn geometry() -> SkeletonGeometry {
        let nodes = parse_swc(
            "1 0 0 0 0 1 -1\n\
             2 0 10 0 0 1 1\n\
             3 1 0 10 0 1 1\n\
             4 1 0 0 10 1 1\n",
        )
        .unwrap();
        let style = SkeletonStyle {
            palette: PALETTE,
            radius_scale: 1.0,
            min_radius: None,
            colour_override: None,
        };
        build_skeleton(&nodes, &style, &mut LabelRange::default(), 1.0).0
    }

    fn assignment() -> SectionAssignment {
        SectionAssignment {
            sections: vec![vec![0, 1], vec![2, 3]],
        }
    }

    #[test]
    fn suppressed_sections_are_greyed() {
        let geometry = geometry();
        let state = SectionColouringState {
            suppressed: BTreeSet::from([1]),
            ..SectionColouringState::default()
        };
        let buffers = recolour(&geometry, &assignment(), &state, 0.0);

        assert_eq!(buffers.particle_grey, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(buffers.particle_colours[0], section_colour(0));
        assert_eq!(buffers.particle_colours[2], section_colour(1));
    }

    #[test]
    fn active_section_is_highlighted() {
        let geometry = geometry();
        let state = SectionColouringState {
            active_section: Some(0),
            ..SectionColouringState::default()
        };
        let buffers = recolour(&geometry, &assignment(), &state, 0.0);
        assert_eq!(buffers.particle_colours[1], ACTIVE_SECTION_COLOUR);
        assert_eq!(buffers.particle_colours[3], section_colour(1));
    }

    #[test]
    fn cones_inherit_child_node_values() {
        let geometry = geometry();
        let state = SectionColouringState {
            suppressed: BTreeSet::from([1]),
            ..SectionColouringState::default()
        };
        let buffers = recolour(&geometry, &assignment(), &state, 0.0);

        assert_eq!(buffers.cone_grey.len(), 18);
        // Groups are nodes 2, 3, 4 (indices 1, 2, 3).
        assert!(buffers.cone_grey[..6].iter().all(|g| *g == 0.0));
        assert!(buffers.cone_grey[6..].iter().all(|g| *g == 1.0));
        assert!(buffers.cone_colours[6..12].iter().all(|c| *c == section_colour(1)));
    }

    #[test]
    fn unassigned_nodes_keep_palette_and_abstraction_is_uniform() {
        let mut geometry = geometry();
        let partial = SectionAssignment {
            sections: vec![vec![3, 99]],
        };
        let buffers = recolour(
            &geometry,
            &partial,
            &SectionColouringState::default(),
            0.75,
        );
        assert_eq!(buffers.particle_colours[0], PALETTE[0]);
        assert_eq!(buffers.particle_colours[3], section_colour(0));

        buffers.apply_to(&mut geometry);
        assert!(geometry.particles.abstraction.iter().all(|a| *a == 0.75));
        assert!(geometry.cones.abstraction.iter().all(|a| *a == 0.75));
    }

    #[test]
    fn recolour_is_a_full_rewrite() {
        let mut geometry = geometry();
        let greyed = SectionColouringState {
            suppressed: BTreeSet::from([0, 1]),
            ..SectionColouringState::default()
        };
        recolour(&geometry, &assignment(), &greyed, 0.0).apply_to(&mut geometry);

        let cleared = recolour(
            &geometry,
            &assignment(),
            &SectionColouringState::default(),
            0.0,
        );
        assert!(cleared.particle_grey.iter().all(|g| *g == 0.0));
        assert!(cleared.cone_grey.iter().all(|g| *g == 0.0));
    }
}
