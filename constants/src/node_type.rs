/// SWC node type codes as written by common tracing tools.
pub struct NodeTypeInfo {
    pub id: i32,
    pub name: &'static str,
}

pub const NODE_TYPE_MAP: &[NodeTypeInfo] = &[
    NodeTypeInfo {
        id: 0,
        name: "undefined",
    },
    NodeTypeInfo {
        id: 1,
        name: "soma",
    },
    NodeTypeInfo {
        id: 2,
        name: "axon",
    },
    NodeTypeInfo {
        id: 3,
        name: "basal dendrite",
    },
    NodeTypeInfo {
        id: 4,
        name: "apical dendrite",
    },
    NodeTypeInfo {
        id: 5,
        name: "fork point",
    },
    NodeTypeInfo {
        id: 6,
        name: "end point",
    },
    NodeTypeInfo {
        id: 7,
        name: "custom",
    },
];

pub fn get_node_type_name(id: i32) -> String {
    NODE_TYPE_MAP
        .iter()
        .find(|t| t.id == id)
        .map_or("unknown", |t| t.name)
        .to_string()
}
