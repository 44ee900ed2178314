use bevy::prelude::*;

use super::swc::SkeletonMap;

/// Axis aligned extents of a skeleton, including node radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl BoundingBox {
    /// Inverted sentinel box. Any expansion replaces it.
    pub const EMPTY: Self = Self {
        min_x: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        min_y: f32::INFINITY,
        max_y: f32::NEG_INFINITY,
        min_z: f32::INFINITY,
        max_z: f32::NEG_INFINITY,
    };

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_z > self.max_z
    }

    pub fn expand(&mut self, position: Vec3, radius: f32) {
        self.min_x = self.min_x.min(position.x - radius);
        self.max_x = self.max_x.max(position.x + radius);
        self.min_y = self.min_y.min(position.y - radius);
        self.max_y = self.max_y.max(position.y + radius);
        self.min_z = self.min_z.min(position.z - radius);
        self.max_z = self.max_z.max(position.z + radius);
    }

    /// Calculate center point for camera framing.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.max_x + self.min_x) * 0.5,
            (self.max_y + self.min_y) * 0.5,
            (self.max_z + self.min_z) * 0.5,
        )
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Box covering every node expanded by its radius.
/// Returns `BoundingBox::EMPTY` when there are no nodes.
pub fn compute_bounding_box(nodes: &SkeletonMap) -> BoundingBox {
    let mut bounds = BoundingBox::EMPTY;
    for node in nodes.ordered_nodes() {
        bounds.expand(node.position, node.radius);
    }
    bounds
}

/// Incremental sphere fit seeded with the sphere inscribed in `bounding_box`.
///
/// Single pass: whenever a node's far edge pokes out, the sphere grows to the
/// average of its radius and that edge distance and slides toward the node by
/// the growth. Not minimal, but deterministic for the node order and always
/// enclosing.
pub fn compute_bounding_sphere(nodes: &SkeletonMap, bounding_box: &BoundingBox) -> BoundingSphere {
    if bounding_box.is_empty() {
        return BoundingSphere {
            center: Vec3::ZERO,
            radius: 0.0,
        };
    }

    let half_extents = bounding_box.size() * 0.5;
    let mut center = bounding_box.center();
    let mut radius = half_extents.min_element();

    for node in nodes.ordered_nodes() {
        let offset = node.position - center;
        let distance = offset.length();
        let far_edge = distance + node.radius;
        if far_edge <= radius {
            continue;
        }

        let new_radius = (radius + far_edge) * 0.5;
        if distance > f32::EPSILON {
            center += offset / distance * (new_radius - radius);
        }
        radius = new_radius;
    }

    BoundingSphere { center, radius }
}

/// Camera position that fits `sphere` in a `fov_degrees` frustum, on the sphere's z axis.
///
/// `front_to_back` places the camera on the -z side looking toward +z. The z
/// coordinate never drops below `-max_volume_size / 2`, beyond which the orbit
/// dolly locks up.
pub fn compute_camera_position(
    fov_degrees: f32,
    sphere: &BoundingSphere,
    front_to_back: bool,
    max_volume_size: f32,
) -> Vec3 {
    let half_fov = (fov_degrees * 0.5).to_radians();
    let distance = sphere.radius / half_fov.sin();

    let z = if front_to_back {
        sphere.center.z - distance
    } else {
        sphere.center.z + distance
    };

    Vec3::new(
        sphere.center.x,
        sphere.center.y,
        z.max(-max_volume_size * 0.5),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::swc::{SkeletonNode, parse_swc};

    const EPSILON: f32 = 1e-3;

    fn scenario() -> SkeletonMap {
        parse_swc(
            "1 0 0 0 0 1 -1\n\
             2 0 10 0 0 1 1\n\
             3 1 0 10 0 1 1\n\
             4 1 0 0 10 1 1\n",
        )
        .unwrap()
    }

    fn scattered() -> SkeletonMap {
        // Deterministic pseudo-random cloud with varying radii.
        let mut seed: u32 = 17;
        let mut next = move || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            ((seed >> 8) % 10_000) as f32 / 100.0 - 50.0
        };
        SkeletonMap::from_nodes((0..200).map(|i| SkeletonNode {
            id: i,
            node_type: (i % 4) as i32,
            position: Vec3::new(next() * 3.0, next(), next() * 0.5),
            radius: (next() + 50.0) * 0.05,
            parent: (i > 0).then_some(i - 1),
            sample: i,
        }))
    }

    #[test]
    fn bounding_box_matches_four_node_scenario() {
        let bounds = compute_bounding_box(&scenario());
        assert_eq!(bounds.min_x, -1.0);
        assert_eq!(bounds.max_x, 11.0);
        assert_eq!(bounds.min_y, -1.0);
        assert_eq!(bounds.max_y, 11.0);
        assert_eq!(bounds.min_z, -1.0);
        assert_eq!(bounds.max_z, 11.0);
    }

    #[test]
    fn bounding_box_covers_every_node() {
        let nodes = scattered();
        let bounds = compute_bounding_box(&nodes);
        for node in nodes.ordered_nodes() {
            assert!(bounds.min_x <= node.position.x - node.radius);
            assert!(bounds.max_x >= node.position.x + node.radius);
            assert!(bounds.min_y <= node.position.y - node.radius);
            assert!(bounds.max_y >= node.position.y + node.radius);
            assert!(bounds.min_z <= node.position.z - node.radius);
            assert!(bounds.max_z >= node.position.z + node.radius);
        }
    }

    #[test]
    fn empty_map_gives_sentinel_box() {
        let bounds = compute_bounding_box(&SkeletonMap::default());
        assert!(bounds.is_empty());
        assert_eq!(bounds.min_x, f32::INFINITY);
        assert_eq!(bounds.max_z, f32::NEG_INFINITY);
    }

    #[test]
    fn bounding_sphere_encloses_every_node() {
        for nodes in [scenario(), scattered()] {
            let bounds = compute_bounding_box(&nodes);
            let sphere = compute_bounding_sphere(&nodes, &bounds);
            for node in nodes.ordered_nodes() {
                let reach = sphere.center.distance(node.position) + node.radius;
                assert!(
                    reach <= sphere.radius + EPSILON,
                    "node {} reaches {} beyond radius {}",
                    node.id,
                    reach,
                    sphere.radius
                );
            }
        }
    }

    #[test]
    fn bounding_sphere_is_deterministic() {
        let nodes = scattered();
        let bounds = compute_bounding_box(&nodes);
        assert_eq!(
            compute_bounding_sphere(&nodes, &bounds),
            compute_bounding_sphere(&nodes, &bounds)
        );
    }

    #[test]
    fn camera_distance_fits_sphere_in_fov() {
        let sphere = BoundingSphere {
            center: Vec3::new(1.0, 2.0, 3.0),
            radius: 10.0,
        };
        let position = compute_camera_position(60.0, &sphere, false, 1_000.0);
        assert!((position.z - 23.0).abs() < EPSILON);
        assert_eq!(position.x, 1.0);
        assert_eq!(position.y, 2.0);

        let behind = compute_camera_position(60.0, &sphere, true, 1_000.0);
        assert!((behind.z + 17.0).abs() < EPSILON);
    }

    #[test]
    fn camera_z_never_below_half_volume() {
        let sphere = BoundingSphere {
            center: Vec3::new(0.0, 0.0, -400.0),
            radius: 300.0,
        };
        for fov in [10.0, 45.0, 90.0, 170.0] {
            for front_to_back in [true, false] {
                let position = compute_camera_position(fov, &sphere, front_to_back, 1_000.0);
                assert!(position.z >= -500.0);
            }
        }
    }
}
