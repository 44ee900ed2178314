use bevy::render::mesh::MeshVertexAttribute;
use bevy::render::render_resource::VertexFormat;

// Ids only need to be unique among attributes on the same mesh.

/// Effective imposter radius in world units.
pub const ATTRIBUTE_RADIUS: MeshVertexAttribute =
    MeshVertexAttribute::new("Radius", 1_284_331_001, VertexFormat::Float32);

/// SWC type label, carried as float for the shader comparison.
pub const ATTRIBUTE_LABEL: MeshVertexAttribute =
    MeshVertexAttribute::new("Label", 1_284_331_002, VertexFormat::Float32);

/// Label value below which elements collapse.
pub const ATTRIBUTE_ABSTRACTION: MeshVertexAttribute =
    MeshVertexAttribute::new("Abstraction", 1_284_331_003, VertexFormat::Float32);

/// 0 for normal shading, 1 for greyed out.
pub const ATTRIBUTE_GREY_OUT: MeshVertexAttribute =
    MeshVertexAttribute::new("GreyOut", 1_284_331_004, VertexFormat::Float32);

pub const ATTRIBUTE_COLOUR: MeshVertexAttribute =
    MeshVertexAttribute::new("Colour", 1_284_331_005, VertexFormat::Float32x3);

/// Quad corner in [-1, 1]^2 used to expand particles in the vertex shader.
pub const ATTRIBUTE_CORNER: MeshVertexAttribute =
    MeshVertexAttribute::new("Corner", 1_284_331_006, VertexFormat::Float32x2);

/// First billboard normal of a cone imposter (child to parent axis).
pub const ATTRIBUTE_NORMAL_A: MeshVertexAttribute =
    MeshVertexAttribute::new("NormalA", 1_284_331_007, VertexFormat::Float32x3);

/// Second billboard normal of a cone imposter (parent to child axis).
pub const ATTRIBUTE_NORMAL_B: MeshVertexAttribute =
    MeshVertexAttribute::new("NormalB", 1_284_331_008, VertexFormat::Float32x3);

/// Point size in pixels for synapse sprites.
pub const ATTRIBUTE_POINT_SIZE: MeshVertexAttribute =
    MeshVertexAttribute::new("PointSize", 1_284_331_009, VertexFormat::Float32);

pub const ATTRIBUTE_ALPHA: MeshVertexAttribute =
    MeshVertexAttribute::new("Alpha", 1_284_331_010, VertexFormat::Float32);
