//! Shared viewer constants: node type table, colour palettes, camera limits
//! and synapse presentation values.

pub mod camera;
pub mod node_type;
pub mod palette;
pub mod synapse;
