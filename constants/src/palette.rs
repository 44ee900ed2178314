/// Linear RGB colours indexed by SWC node type. Types past the end fall back to entry 0.
pub const NODE_TYPE_PALETTE: &[[f32; 3]] = &[
    [0.192, 1.000, 0.863], // undefined
    [0.427, 0.298, 0.910], // soma
    [0.000, 1.000, 0.000], // axon
    [1.000, 0.000, 1.000], // basal dendrite
    [1.000, 1.000, 0.000], // apical dendrite
    [0.098, 0.098, 0.443], // fork point
    [1.000, 0.294, 0.000], // end point
    [0.965, 0.565, 0.973], // custom
];

/// Per-section colours, cycled when a skeleton has more sections than entries.
pub const SECTION_PALETTE: &[[f32; 3]] = &[
    [0.894, 0.102, 0.110],
    [0.216, 0.494, 0.722],
    [0.302, 0.686, 0.290],
    [0.596, 0.306, 0.639],
    [1.000, 0.498, 0.000],
    [0.651, 0.337, 0.157],
    [0.969, 0.506, 0.749],
    [0.600, 0.600, 0.600],
];

/// Colour applied to every node of the active section.
pub const ACTIVE_SECTION_COLOUR: [f32; 3] = [1.0, 0.85, 0.1];

pub fn section_colour(section: usize) -> [f32; 3] {
    SECTION_PALETTE[section % SECTION_PALETTE.len()]
}
