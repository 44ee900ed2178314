use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;
use thiserror::Error;

use constants::node_type::get_node_type_name;

use crate::error::ViewerError;

pub type NodeId = i64;

/// Marker that starts a comment line in SWC text.
const COMMENT_MARKER: char = '#';

/// Number of whitespace separated fields in one SWC record.
const FIELDS_PER_RECORD: usize = 7;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwcParseError {
    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("line {line}: node {id} defined twice")]
    DuplicateNode { line: usize, id: NodeId },

    #[error("node {id} references missing parent {parent}")]
    DanglingParent { id: NodeId, parent: NodeId },
}

/// Single traced sample of a neuron skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    pub id: NodeId,
    /// Semantic type label (soma, axon, dendrite, ...).
    pub node_type: i32,
    pub position: Vec3,
    pub radius: f32,
    /// `None` for roots (SWC parent `-1`).
    pub parent: Option<NodeId>,
    /// Sample number as written in the file.
    pub sample: NodeId,
}

/// Immutable node map for one loaded skeleton.
#[derive(Debug, Clone, Default)]
pub struct SkeletonMap {
    nodes: HashMap<NodeId, SkeletonNode>,
}

impl SkeletonMap {
    pub fn from_nodes(nodes: impl IntoIterator<Item = SkeletonNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SkeletonNode> {
        self.nodes.get(&id)
    }

    pub fn parent_of(&self, node: &SkeletonNode) -> Option<&SkeletonNode> {
        node.parent.and_then(|parent| self.nodes.get(&parent))
    }

    /// Node ids in ascending order. Geometry buffers and section indices use this order.
    pub fn ordered_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Nodes in `ordered_ids` order.
    pub fn ordered_nodes(&self) -> impl Iterator<Item = &SkeletonNode> {
        self.ordered_ids()
            .into_iter()
            .filter_map(move |id| self.nodes.get(&id))
    }

    /// Node at `index` within `ordered_ids`.
    pub fn node_at(&self, index: usize) -> Option<&SkeletonNode> {
        self.ordered_ids()
            .get(index)
            .and_then(|id| self.nodes.get(id))
    }

    /// Node count per SWC type name.
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(get_node_type_name(node.node_type)).or_insert(0) += 1;
        }
        counts
    }

    /// An empty map means the load produced nothing renderable.
    pub fn require_nodes(self) -> Result<Self, ViewerError> {
        if self.is_empty() {
            Err(ViewerError::EmptySkeleton)
        } else {
            Ok(self)
        }
    }
}

/// Parse SWC text into a node map.
///
/// Comment and blank lines are skipped, so empty input yields an empty map.
/// Every parent reference must resolve to a node in the same file.
pub fn parse_swc(text: &str) -> Result<SkeletonMap, SwcParseError> {
    let mut nodes: HashMap<NodeId, SkeletonNode> = HashMap::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let node = parse_record(line, line_number)?;
        if nodes.contains_key(&node.id) {
            return Err(SwcParseError::DuplicateNode {
                line: line_number,
                id: node.id,
            });
        }
        nodes.insert(node.id, node);
    }

    for node in nodes.values() {
        if let Some(parent) = node.parent {
            if !nodes.contains_key(&parent) {
                return Err(SwcParseError::DanglingParent {
                    id: node.id,
                    parent,
                });
            }
        }
    }

    Ok(SkeletonMap { nodes })
}

fn parse_record(line: &str, line_number: usize) -> Result<SkeletonNode, SwcParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < FIELDS_PER_RECORD {
        return Err(SwcParseError::MalformedLine {
            line: line_number,
            reason: format!(
                "expected {} fields, found {}",
                FIELDS_PER_RECORD,
                fields.len()
            ),
        });
    }

    let id = parse_integer(fields[0], "id", line_number)?;
    let node_type = parse_integer(fields[1], "type", line_number)? as i32;
    let x = parse_float(fields[2], "x", line_number)?;
    let y = parse_float(fields[3], "y", line_number)?;
    let z = parse_float(fields[4], "z", line_number)?;
    let radius = parse_float(fields[5], "radius", line_number)?;
    let parent = parse_integer(fields[6], "parent", line_number)?;

    if radius < 0.0 {
        return Err(SwcParseError::MalformedLine {
            line: line_number,
            reason: format!("negative radius {}", radius),
        });
    }

    Ok(SkeletonNode {
        id,
        node_type,
        position: Vec3::new(x, y, z),
        radius,
        parent: (parent >= 0).then_some(parent),
        sample: id,
    })
}

fn parse_integer(field: &str, name: &str, line_number: usize) -> Result<i64, SwcParseError> {
    // Some exporters write integral columns as "3.0".
    field
        .parse::<i64>()
        .or_else(|_| {
            field
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && v.is_finite())
                .map(|v| v as i64)
                .ok_or(())
        })
        .map_err(|_| SwcParseError::MalformedLine {
            line: line_number,
            reason: format!("{} '{}' is not an integer", name, field),
        })
}

fn parse_float(field: &str, name: &str, line_number: usize) -> Result<f32, SwcParseError> {
    field
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SwcParseError::MalformedLine {
            line: line_number,
            reason: format!("{} '{}' is not a number", name, field),
        })
}
