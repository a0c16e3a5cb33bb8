//! Node graph - parent/child adjacency and activation state
//!
//! The two edge directions are stored separately and maintained by separate
//! calls; a commit runs both. Each call is idempotent and only publishes its
//! notification when it actually appended an entry.

use crate::components::{NodeId, NodeState};
use crate::systems::{EventBus, GraphEvent};
use hecs::Entity;
use std::collections::HashMap;

/// Topology of a single node
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub state: NodeState,
    /// Insertion ordered, no duplicates
    pub children: Vec<Entity>,
    /// Insertion ordered, no duplicates
    pub parents: Vec<Entity>,
}

impl GraphNode {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            state: NodeState::Inactive,
            children: Vec::new(),
            parents: Vec::new(),
        }
    }
}

/// Snapshot of a node carried by graph notifications
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub entity: Entity,
    pub id: NodeId,
    pub state: NodeState,
    pub children: Vec<NodeId>,
    pub parents: Vec<NodeId>,
}

/// Parent/child relationships between node entities (singleton, stored in engine)
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: HashMap<Entity, GraphNode>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Re-registering keeps the existing topology.
    pub fn insert(&mut self, entity: Entity, id: NodeId) {
        self.nodes.entry(entity).or_insert_with(|| GraphNode::new(id));
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.nodes.contains_key(&entity)
    }

    pub fn node(&self, entity: Entity) -> Option<&GraphNode> {
        self.nodes.get(&entity)
    }

    pub fn state(&self, entity: Entity) -> Option<NodeState> {
        self.node(entity).map(|n| n.state)
    }

    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.node(entity).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parents(&self, entity: Entity) -> &[Entity] {
        self.node(entity).map(|n| n.parents.as_slice()).unwrap_or(&[])
    }

    /// Mark a node active. Returns true if the state changed.
    pub fn activate(&mut self, entity: Entity) -> bool {
        match self.nodes.get_mut(&entity) {
            Some(node) if node.state != NodeState::Active => {
                node.state = NodeState::Active;
                true
            }
            _ => false,
        }
    }

    /// Append `child` to `parent`'s children and publish `ChildAdded` with the
    /// parent's data. No-op if the edge exists or either node is unknown.
    pub fn add_child(
        &mut self,
        parent: Entity,
        child: Entity,
        events: &EventBus<GraphEvent>,
    ) -> bool {
        if !self.nodes.contains_key(&child) {
            return false;
        }
        if !Self::append(&mut self.nodes, parent, child, |n| &mut n.children) {
            return false;
        }
        if let Some(data) = self.node_data(parent) {
            events.publish(&GraphEvent::ChildAdded(data));
        }
        true
    }

    /// Append `parent` to `child`'s parents and publish `ParentAdded` with the
    /// child's data. No-op if the edge exists or either node is unknown.
    pub fn add_parent(
        &mut self,
        child: Entity,
        parent: Entity,
        events: &EventBus<GraphEvent>,
    ) -> bool {
        if !self.nodes.contains_key(&parent) {
            return false;
        }
        if !Self::append(&mut self.nodes, child, parent, |n| &mut n.parents) {
            return false;
        }
        if let Some(data) = self.node_data(child) {
            events.publish(&GraphEvent::ParentAdded(data));
        }
        true
    }

    fn append(
        nodes: &mut HashMap<Entity, GraphNode>,
        owner: Entity,
        other: Entity,
        list: impl FnOnce(&mut GraphNode) -> &mut Vec<Entity>,
    ) -> bool {
        let Some(node) = nodes.get_mut(&owner) else {
            return false;
        };
        let entries = list(node);
        if entries.contains(&other) {
            log::debug!("edge {:?} -> {:?} already present", owner, other);
            return false;
        }
        entries.push(other);
        true
    }

    pub fn node_data(&self, entity: Entity) -> Option<NodeData> {
        let node = self.nodes.get(&entity)?;
        let ids = |list: &[Entity]| -> Vec<NodeId> {
            list.iter().filter_map(|e| self.nodes.get(e).map(|n| n.id)).collect()
        };
        Some(NodeData {
            entity,
            id: node.id,
            state: node.state,
            children: ids(&node.children),
            parents: ids(&node.parents),
        })
    }

    /// Total number of parent -> child edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.children.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.nodes.keys().copied()
    }
}
