//! Connector component - a tentative link dragged out of a source node.

use super::common::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Lifecycle of a connector.
///
/// `Connect` is terminal: a committed connector never changes again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorState {
    /// Spawned but not yet tracking the pointer
    #[default]
    Undefined,
    /// Following the pointer, feasibility re-evaluated every tick
    NotConnect,
    /// Committed to a target node
    Connect,
}

/// Visual feasibility signal (white / red in the game)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    #[default]
    Feasible,
    Infeasible,
}

/// Connector component
#[derive(Debug, Clone, Copy)]
pub struct Connector {
    /// Node the connector was dragged out of
    pub source: Entity,
    pub start: Vec2,
    /// Pointer-tracked end; snapped to the target node on commit
    pub end: Vec2,
    pub state: ConnectorState,
    /// Externally toggled via validity directives
    pub valid: bool,
    /// Blood cost for the current length
    pub cost: f64,
    pub tint: Tint,
    /// Quad around the segment, used as the connector's own collision shape
    pub outline: [Vec2; 4],
    /// Committed target node
    pub target: Option<Entity>,
}

impl Connector {
    pub fn new(source: Entity, start: Vec2) -> Self {
        Self {
            source,
            start,
            end: start,
            state: ConnectorState::Undefined,
            valid: true,
            cost: 0.0,
            tint: Tint::Feasible,
            outline: [start; 4],
            target: None,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.state == ConnectorState::Connect
    }

    pub fn length(&self) -> f32 {
        self.start.distance(&self.end)
    }

    /// Move the free end and rebuild the outline.
    pub fn set_end(&mut self, end: Vec2, half_width: f32) {
        self.end = end;
        self.outline = segment_outline(self.start, end, half_width);
    }
}

/// Quad of the given half width around the segment `start..end`.
///
/// A zero-length segment falls back to a horizontal offset.
pub fn segment_outline(start: Vec2, end: Vec2, half_width: f32) -> [Vec2; 4] {
    let dir = (end - start).normalize();
    let offset = if dir == Vec2::ZERO {
        Vec2::new(half_width, 0.0)
    } else {
        dir.perp() * half_width
    };
    [start + offset, start - offset, end - offset, end + offset]
}
