use serde::{Deserialize, Serialize};

use crate::models::member::Member;

/// Rendering tag carried by every node. Not interpreted by the engine.
pub const NODE_SHAPE: &str = "circularImage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub image: String,
    pub shape: String,
}

impl From<&Member> for GraphNode {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            label: member.display_name.clone(),
            image: member.image_reference.clone(),
            shape: NODE_SHAPE.to_string(),
        }
    }
}

/// Undirected weighted edge between two distinct members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Similarity graph over the population: one node per member in input
/// order, at most one edge per unordered pair, no self-loops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn isolated_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.from == n.id || e.to == n.id))
            .count()
    }
}
