//! Bloodlink Core - node connection engine
//!
//! Players drag connectors out of nodes; committing a connector onto another
//! node links the two as parent and child and costs blood in proportion to
//! the connector's length.
//!
//! # Architecture
//!
//! The engine uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Nodes, connectors
//! - **Components**: Pure data attached to entities (Node, Position, Collider, Connector)
//! - **Systems**: The connector state machine and the shared ledgers it
//!   commits against (blood pool, connection registry, node graph, event bus)
//!
//! # Example
//!
//! ```rust
//! use bloodlink_core::prelude::*;
//!
//! let mut engine = LinkEngine::new(LinkSettings {
//!     cost_per_unit: 2.0,
//!     starting_blood: 10,
//!     ..Default::default()
//! });
//! let a = engine.spawn_node(Vec2::new(0.0, 0.0), 0.5);
//! let b = engine.spawn_node(Vec2::new(3.0, 0.0), 0.5);
//!
//! engine.begin_connection(a).unwrap();
//! engine.update(&PointerFrame::hover(3.0, 0.0));
//! engine.update(&PointerFrame::press(3.0, 0.0));
//!
//! assert_eq!(engine.blood(), 4);
//! assert_eq!(engine.graph.children(a), &[b]);
//! ```

pub mod components;
pub mod engine;
pub mod settings;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{LinkEngine, LinkError};
    pub use crate::settings::LinkSettings;
    pub use crate::systems::{
        Directive, DirectiveOutcome, GraphEvent, HideTarget, PointerFrame, Subscription,
        TickOutcome,
    };
}
