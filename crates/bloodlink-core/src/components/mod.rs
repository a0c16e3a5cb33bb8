//! Component definitions for the ECS world.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod connector;
mod node;

pub use common::*;
pub use connector::*;
pub use node::*;
