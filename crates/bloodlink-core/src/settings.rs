//! Engine settings derived from the game state table

use bloodlink_logic::config::GameStateRow;
use serde::{Deserialize, Serialize};

/// Numbers the connection engine reads every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkSettings {
    /// Blood charged per world unit of connector length
    pub cost_per_unit: f64,
    /// Blood in the pool when the engine starts
    pub starting_blood: i64,
    /// Half width of the connector outline in world units
    pub line_half_width: f32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            cost_per_unit: 1.0,
            starting_blood: 100,
            line_half_width: 1.0,
        }
    }
}

impl LinkSettings {
    pub fn from_row(row: &GameStateRow, starting_blood: i64) -> Self {
        Self {
            cost_per_unit: row.cost_per_unit,
            starting_blood,
            ..Self::default()
        }
    }
}
