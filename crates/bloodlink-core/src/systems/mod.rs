//! Systems - logic that operates on components and the shared ledgers

mod connector;
mod events;
mod graph;
mod hit_test;
mod pool;
mod registry;

pub use connector::*;
pub use events::*;
pub use graph::*;
pub use hit_test::*;
pub use pool::*;
pub use registry::*;
