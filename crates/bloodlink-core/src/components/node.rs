//! Node components: identity, tagging and collision shape.
//!
//! Topology (children, parents) and activation live in the
//! [`NodeGraph`](crate::systems::NodeGraph), not on the entity.

use serde::{Deserialize, Serialize};

/// Stable, human readable node id (entity handles are recycled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Whether a node has been reached by a committed connector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Inactive,
    Active,
}

/// Lifecycle tag on a node.
///
/// A node marked `Clearing` is being removed; connectors starting from it no
/// longer accept validity directives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeMark {
    #[default]
    Intact,
    Clearing,
}

/// Node component
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub mark: NodeMark,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            mark: NodeMark::Intact,
        }
    }

    pub fn is_clearing(&self) -> bool {
        self.mark == NodeMark::Clearing
    }
}

/// Collision layers used by spatial probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Node,
    Connector,
}

/// Circular collider used by the hit test
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f32,
    pub layer: Layer,
}

impl Collider {
    pub fn node(radius: f32) -> Self {
        Self {
            radius,
            layer: Layer::Node,
        }
    }
}
