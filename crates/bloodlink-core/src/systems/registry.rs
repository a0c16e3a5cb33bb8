//! Connection registry - which node pairs are already linked

use hecs::Entity;
use std::collections::HashSet;

/// Ordered (source, target) lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectedPair {
    pub source: Entity,
    pub target: Entity,
}

impl ConnectedPair {
    pub fn new(source: Entity, target: Entity) -> Self {
        Self { source, target }
    }

    pub fn reversed(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }
}

/// Ledger of connected pairs (singleton, stored in engine).
///
/// `record` always stores both orderings, so there is no way to reach a
/// state where only one direction of a pair is known.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    pairs: HashSet<ConnectedPair>,
    /// Nodes that have received at least one incoming connector
    linked: HashSet<Entity>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self, source: Entity, target: Entity) -> bool {
        self.pairs.contains(&ConnectedPair::new(source, target))
    }

    /// Record `source`-`target` in both directions.
    ///
    /// Returns false if the pair was already known; the registry is unchanged.
    pub fn record(&mut self, source: Entity, target: Entity) -> bool {
        let pair = ConnectedPair::new(source, target);
        let fresh = self.pairs.insert(pair);
        self.pairs.insert(pair.reversed());
        fresh
    }

    pub fn mark_linked(&mut self, target: Entity) {
        self.linked.insert(target);
    }

    pub fn is_linked(&self, node: Entity) -> bool {
        self.linked.contains(&node)
    }

    /// Number of ordered pairs (twice the number of connections)
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &ConnectedPair> {
        self.pairs.iter()
    }
}
