use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;

use constants::synapse::{DEFAULT_SYNAPSE_SIZE, SYNAPSE_YELLOW};

use super::attributes::{ATTRIBUTE_ALPHA, ATTRIBUTE_COLOUR, ATTRIBUTE_CORNER, ATTRIBUTE_POINT_SIZE};
use super::skeleton_mesh::VERTICES_PER_QUAD;
use crate::error::ViewerError;

const SPRITE_CORNERS: [[f32; 2]; VERTICES_PER_QUAD] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Per-synapse render attributes, parallel arrays in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynapseBuffer {
    pub positions: Vec<Vec3>,
    pub colours: Vec<[f32; 3]>,
    /// Sprite diameter in pixels.
    pub sizes: Vec<f32>,
    pub alphas: Vec<f32>,
}

impl SynapseBuffer {
    /// Decode the page's flat `[x, y, z, x, y, z, ...]` coordinate list.
    pub fn from_flat_coordinates(coordinates: &[f32]) -> Result<Self, ViewerError> {
        let points: &[[f32; 3]] = bytemuck::try_cast_slice(coordinates).map_err(|_| {
            ViewerError::Payload(format!(
                "synapse coordinate count {} is not a multiple of 3",
                coordinates.len()
            ))
        })?;

        let count = points.len();
        Ok(Self {
            positions: points.iter().map(|p| Vec3::from_array(*p)).collect(),
            colours: vec![SYNAPSE_YELLOW; count],
            sizes: vec![DEFAULT_SYNAPSE_SIZE; count],
            alphas: vec![1.0; count],
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );

        let positions: Vec<[f32; 3]> = self
            .positions
            .iter()
            .flat_map(|p| std::iter::repeat_n(p.to_array(), VERTICES_PER_QUAD))
            .collect();
        let corners: Vec<[f32; 2]> = (0..self.len()).flat_map(|_| SPRITE_CORNERS).collect();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(ATTRIBUTE_CORNER, corners);
        self.write_state(&mut mesh);
        mesh
    }

    /// Rewrite every mutable attribute, including positions.
    pub fn write_state(&self, mesh: &mut Mesh) {
        let positions: Vec<[f32; 3]> = self
            .positions
            .iter()
            .flat_map(|p| std::iter::repeat_n(p.to_array(), VERTICES_PER_QUAD))
            .collect();
        let per_vertex = |values: &[f32]| -> Vec<f32> {
            values
                .iter()
                .flat_map(|v| std::iter::repeat_n(*v, VERTICES_PER_QUAD))
                .collect()
        };
        let colours: Vec<[f32; 3]> = self
            .colours
            .iter()
            .flat_map(|c| std::iter::repeat_n(*c, VERTICES_PER_QUAD))
            .collect();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(ATTRIBUTE_COLOUR, colours);
        mesh.insert_attribute(ATTRIBUTE_POINT_SIZE, per_vertex(&self.sizes));
        mesh.insert_attribute(ATTRIBUTE_ALPHA, per_vertex(&self.alphas));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_coordinates_become_points() {
        let buffer =
            SynapseBuffer::from_flat_coordinates(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.positions[1], Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(buffer.colours[0], SYNAPSE_YELLOW);
        assert_eq!(buffer.alphas, vec![1.0, 1.0]);
    }

    #[test]
    fn ragged_coordinates_are_rejected() {
        let result = SynapseBuffer::from_flat_coordinates(&[0.0, 1.0]);
        assert!(matches!(result, Err(ViewerError::Payload(_))));
    }

    #[test]
    fn mesh_has_six_vertices_per_synapse() {
        let buffer = SynapseBuffer::from_flat_coordinates(&[0.0; 9]).unwrap();
        let mesh = buffer.mesh();
        assert_eq!(mesh.count_vertices(), 18);
        assert!(mesh.attribute(ATTRIBUTE_ALPHA).is_some());
    }
}
