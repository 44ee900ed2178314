use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;

use super::attributes::{
    ATTRIBUTE_ABSTRACTION, ATTRIBUTE_COLOUR, ATTRIBUTE_CORNER, ATTRIBUTE_GREY_OUT, ATTRIBUTE_LABEL,
    ATTRIBUTE_NORMAL_A, ATTRIBUTE_NORMAL_B, ATTRIBUTE_RADIUS,
};
use super::labels::LabelRange;
use crate::engine::assets::swc::{NodeId, SkeletonMap};

/// Vertices emitted per imposter quad (two triangles).
pub const VERTICES_PER_QUAD: usize = 6;

/// Corner of each particle quad vertex, expanded by radius in the vertex shader.
const QUAD_CORNERS: [[f32; 2]; VERTICES_PER_QUAD] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Cone quad layout: u picks the side, v picks the end (0 child, 1 parent).
const CONE_UVS: [[f32; 2]; VERTICES_PER_QUAD] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

/// Inputs that shape how a skeleton looks, independent of its nodes.
#[derive(Debug, Clone)]
pub struct SkeletonStyle<'a> {
    pub palette: &'a [[f32; 3]],
    pub radius_scale: f32,
    pub min_radius: Option<f32>,
    /// Replaces palette lookup for the whole skeleton.
    pub colour_override: Option<[f32; 3]>,
}

impl SkeletonStyle<'_> {
    pub fn effective_radius(&self, radius: f32) -> f32 {
        let scaled = radius * self.radius_scale;
        match self.min_radius {
            Some(floor) => scaled.max(floor),
            None => scaled,
        }
    }

    pub fn colour_for(&self, node_type: i32) -> [f32; 3] {
        if let Some(colour) = self.colour_override {
            return colour;
        }
        usize::try_from(node_type)
            .ok()
            .and_then(|index| self.palette.get(index))
            .or_else(|| self.palette.first())
            .copied()
            .unwrap_or([1.0, 1.0, 1.0])
    }
}

/// One sphere imposter per node.
#[derive(Debug, Clone, Default)]
pub struct ParticleBuffer {
    pub node_ids: Vec<NodeId>,
    pub positions: Vec<Vec3>,
    pub radii: Vec<f32>,
    pub labels: Vec<f32>,
    pub abstraction: Vec<f32>,
    pub grey_out: Vec<f32>,
    pub colours: Vec<[f32; 3]>,
    /// Colours from the palette, kept so recolouring can restore them.
    pub base_colours: Vec<[f32; 3]>,
}

impl ParticleBuffer {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Six vertices per parented node, linking child and parent spheres.
#[derive(Debug, Clone, Default)]
pub struct ConeBuffer {
    pub positions: Vec<Vec3>,
    pub radii: Vec<f32>,
    pub normals_a: Vec<Vec3>,
    pub normals_b: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub labels: Vec<f32>,
    pub abstraction: Vec<f32>,
    pub grey_out: Vec<f32>,
    pub colours: Vec<[f32; 3]>,
    /// Particle index of the child node of each quad group.
    pub child_indices: Vec<usize>,
}

impl ConeBuffer {
    /// Vertex count (six per group).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.child_indices.len()
    }
}

/// CPU side copy of a skeleton's imposter buffers.
#[derive(Debug, Clone, Default)]
pub struct SkeletonGeometry {
    pub particles: ParticleBuffer,
    pub cones: ConeBuffer,
}

/// Build particle and cone imposter buffers for `nodes`.
///
/// Widens `label_range` with every node type. Returns the geometry and the
/// normalised position of the abstraction boundary within the widened range,
/// for the page's abstraction slider.
pub fn build_skeleton(
    nodes: &SkeletonMap,
    style: &SkeletonStyle,
    label_range: &mut LabelRange,
    abstraction_threshold: f32,
) -> (SkeletonGeometry, f32) {
    let previous_boundary = label_range.boundary(abstraction_threshold);
    for node in nodes.ordered_nodes() {
        label_range.widen(node.node_type);
    }

    // Keep the absolute boundary stable when a later skeleton widens the range.
    let boundary = previous_boundary
        .or_else(|| label_range.boundary(abstraction_threshold))
        .unwrap_or(0.0);
    let normalised_position = match previous_boundary {
        Some(boundary) => label_range.normalised(boundary).unwrap_or(0.0),
        None => 1.0 - abstraction_threshold.clamp(0.0, 1.0),
    };

    let mut particles = ParticleBuffer::default();
    let mut index_of: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());

    for node in nodes.ordered_nodes() {
        let colour = style.colour_for(node.node_type);
        index_of.insert(node.id, particles.len());
        particles.node_ids.push(node.id);
        particles.positions.push(node.position);
        particles.radii.push(style.effective_radius(node.radius));
        particles.labels.push(node.node_type as f32);
        particles.abstraction.push(boundary);
        particles.grey_out.push(0.0);
        particles.colours.push(colour);
        particles.base_colours.push(colour);
    }

    let mut cones = ConeBuffer::default();
    for node in nodes.ordered_nodes() {
        let Some(parent) = nodes.parent_of(node) else {
            continue;
        };
        let Some(&child_index) = index_of.get(&node.id) else {
            continue;
        };

        let child_radius = style.effective_radius(node.radius);
        let parent_radius = style.effective_radius(parent.radius);
        let axis = parent.position - node.position;
        let colour = particles.colours[child_index];

        for uv in CONE_UVS {
            let at_parent = uv[1] > 0.5;
            cones.positions.push(if at_parent {
                parent.position
            } else {
                node.position
            });
            cones.radii.push(if at_parent {
                parent_radius
            } else {
                child_radius
            });
            cones.normals_a.push(axis);
            cones.normals_b.push(-axis);
            cones.uvs.push(uv);
            cones.labels.push(node.node_type as f32);
            cones.abstraction.push(boundary);
            cones.grey_out.push(0.0);
            cones.colours.push(colour);
        }
        cones.child_indices.push(child_index);
    }

    (SkeletonGeometry { particles, cones }, normalised_position)
}

fn expand<T: Copy>(values: &[T], repeat: usize) -> Vec<T> {
    values
        .iter()
        .flat_map(|value| std::iter::repeat_n(*value, repeat))
        .collect()
}

impl SkeletonGeometry {
    /// Particle mesh with each particle expanded to a screen-aligned quad.
    pub fn particle_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );

        let positions: Vec<[f32; 3]> = self
            .particles
            .positions
            .iter()
            .map(|p| p.to_array())
            .collect();
        let corners: Vec<[f32; 2]> = (0..self.particles.len())
            .flat_map(|_| QUAD_CORNERS)
            .collect();

        mesh.insert_attribute(
            Mesh::ATTRIBUTE_POSITION,
            expand(&positions, VERTICES_PER_QUAD),
        );
        mesh.insert_attribute(ATTRIBUTE_CORNER, corners);
        mesh.insert_attribute(
            ATTRIBUTE_RADIUS,
            expand(&self.particles.radii, VERTICES_PER_QUAD),
        );
        mesh.insert_attribute(
            ATTRIBUTE_LABEL,
            expand(&self.particles.labels, VERTICES_PER_QUAD),
        );
        self.write_particle_state(&mut mesh);
        mesh
    }

    /// Cone mesh, or `None` when no node has a parent.
    pub fn cone_mesh(&self) -> Option<Mesh> {
        if self.cones.is_empty() {
            return None;
        }

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        let to_arrays =
            |values: &[Vec3]| -> Vec<[f32; 3]> { values.iter().map(|v| v.to_array()).collect() };

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, to_arrays(&self.cones.positions));
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.cones.uvs.clone());
        mesh.insert_attribute(ATTRIBUTE_NORMAL_A, to_arrays(&self.cones.normals_a));
        mesh.insert_attribute(ATTRIBUTE_NORMAL_B, to_arrays(&self.cones.normals_b));
        mesh.insert_attribute(ATTRIBUTE_RADIUS, self.cones.radii.clone());
        mesh.insert_attribute(ATTRIBUTE_LABEL, self.cones.labels.clone());
        self.write_cone_state(&mut mesh);
        Some(mesh)
    }

    /// Rewrite the mutable particle attributes. Reinserting marks the mesh for re-upload.
    pub fn write_particle_state(&self, mesh: &mut Mesh) {
        mesh.insert_attribute(
            ATTRIBUTE_ABSTRACTION,
            expand(&self.particles.abstraction, VERTICES_PER_QUAD),
        );
        mesh.insert_attribute(
            ATTRIBUTE_GREY_OUT,
            expand(&self.particles.grey_out, VERTICES_PER_QUAD),
        );
        mesh.insert_attribute(
            ATTRIBUTE_COLOUR,
            expand(&self.particles.colours, VERTICES_PER_QUAD),
        );
    }

    pub fn write_cone_state(&self, mesh: &mut Mesh) {
        mesh.insert_attribute(ATTRIBUTE_ABSTRACTION, self.cones.abstraction.clone());
        mesh.insert_attribute(ATTRIBUTE_GREY_OUT, self.cones.grey_out.clone());
        mesh.insert_attribute(ATTRIBUTE_COLOUR, self.cones.colours.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::swc::parse_swc;

    const PALETTE: &[[f32; 3]] = &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    fn style() -> SkeletonStyle<'static> {
        SkeletonStyle {
            palette: PALETTE,
            radius_scale: 1.0,
            min_radius: None,
            colour_override: None,
        }
    }

    fn scenario() -> SkeletonMap {
        parse_swc(
            "1 0 0 0 0 1 -1\n\
             2 0 10 0 0 1 1\n\
             3 1 0 10 0 1 1\n\
             4 1 0 0 10 1 1\n",
        )
        .unwrap()
    }

    #[test]
    fn buffer_sizes_follow_node_and_parent_counts() {
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&scenario(), &style(), &mut range, 1.0);

        assert_eq!(geometry.particles.len(), 4);
        assert_eq!(geometry.cones.len(), 18);
        assert_eq!(geometry.cones.group_count(), 3);
        assert_eq!(geometry.cones.labels.len(), 18);
        assert_eq!(geometry.cones.normals_a.len(), 18);
    }

    #[test]
    fn roots_only_produce_no_cones() {
        let nodes = parse_swc("1 0 0 0 0 1 -1\n2 0 5 5 5 1 -1\n").unwrap();
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&nodes, &style(), &mut range, 1.0);
        assert_eq!(geometry.particles.len(), 2);
        assert!(geometry.cones.is_empty());
        assert!(geometry.cone_mesh().is_none());
    }

    #[test]
    fn palette_lookup_falls_back_to_first_entry() {
        let nodes = parse_swc("1 1 0 0 0 1 -1\n2 7 1 0 0 1 1\n3 -2 2 0 0 1 2\n").unwrap();
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&nodes, &style(), &mut range, 1.0);
        assert_eq!(geometry.particles.colours[0], PALETTE[1]);
        assert_eq!(geometry.particles.colours[1], PALETTE[0]);
        assert_eq!(geometry.particles.colours[2], PALETTE[0]);
    }

    #[test]
    fn colour_override_replaces_palette() {
        let mut override_style = style();
        override_style.colour_override = Some([0.2, 0.3, 0.4]);
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&scenario(), &override_style, &mut range, 1.0);
        assert!(geometry.particles.colours.iter().all(|c| *c == [0.2, 0.3, 0.4]));
        assert!(geometry.cones.colours.iter().all(|c| *c == [0.2, 0.3, 0.4]));
    }

    #[test]
    fn radius_is_scaled_then_floored() {
        let nodes = parse_swc("1 0 0 0 0 0.1 -1\n2 0 1 0 0 4 1\n").unwrap();
        let mut floored = style();
        floored.radius_scale = 0.5;
        floored.min_radius = Some(0.25);
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&nodes, &floored, &mut range, 1.0);
        assert_eq!(geometry.particles.radii, vec![0.25, 2.0]);
        // Child end of the cone uses the child's radius, parent end the parent's.
        assert_eq!(geometry.cones.radii[0], 2.0);
        assert_eq!(geometry.cones.radii[2], 0.25);
    }

    #[test]
    fn cone_vertices_link_child_and_parent() {
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&scenario(), &style(), &mut range, 1.0);
        let child = Vec3::new(10.0, 0.0, 0.0);
        let parent = Vec3::ZERO;

        let group = &geometry.cones.positions[0..VERTICES_PER_QUAD];
        assert_eq!(group, &[child, child, parent, parent, child, parent]);
        assert_eq!(geometry.cones.normals_a[0], parent - child);
        assert_eq!(geometry.cones.normals_b[0], child - parent);
        assert_eq!(&geometry.cones.uvs[0..VERTICES_PER_QUAD], &CONE_UVS);
    }

    #[test]
    fn meshes_expand_particles_to_quads() {
        let mut range = LabelRange::default();
        let (geometry, _) = build_skeleton(&scenario(), &style(), &mut range, 1.0);
        let particle_mesh = geometry.particle_mesh();
        assert_eq!(particle_mesh.count_vertices(), 4 * VERTICES_PER_QUAD);
        let cone_mesh = geometry.cone_mesh().unwrap();
        assert_eq!(cone_mesh.count_vertices(), 18);
        assert!(cone_mesh.attribute(ATTRIBUTE_GREY_OUT).is_some());
    }

    #[test]
    fn second_skeleton_keeps_absolute_boundary() {
        let mut range = LabelRange::default();
        let first = parse_swc("1 0 0 0 0 1 -1\n2 4 1 0 0 1 1\n").unwrap();
        let (geometry, position) = build_skeleton(&first, &style(), &mut range, 0.5);
        assert_eq!(position, 0.5);
        assert_eq!(geometry.particles.abstraction[0], 2.0);

        let second = parse_swc("1 8 0 0 0 1 -1\n").unwrap();
        let (geometry, position) = build_skeleton(&second, &style(), &mut range, 0.5);
        assert_eq!(position, 0.25);
        assert_eq!(geometry.particles.abstraction[0], 2.0);
        assert_eq!(range.max(), Some(8));
    }
}
