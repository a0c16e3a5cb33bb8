//! Game state table - static numeric parameters keyed by a small integer id.
//!
//! Rows come either from a tab separated text table or from a compact binary
//! blob. The text layout is
//!
//! ```text
//! #	<header lines start with '#'>
//! 	<id>	<remark>	<cost per unit>	<pool depth>
//! ```
//!
//! where the first and third columns are ignored. Binary blobs are the row
//! list encoded with `bincode`'s default options, which store integers as
//! varints.

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const COLUMN_SEPARATOR: char = '\t';
const COMMENT_PREFIX: char = '#';

/// One row of the game state table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameStateRow {
    pub id: i32,
    /// Blood charged per world unit of connector length
    pub cost_per_unit: f64,
    /// Card pool depth
    pub pool_depth: i32,
}

impl GameStateRow {
    /// Parse a single text row. `line` is only used for error reporting.
    pub fn parse(text: &str, line: usize) -> Result<Self, ConfigError> {
        let columns: Vec<&str> = text
            .split(COLUMN_SEPARATOR)
            .map(|c| c.trim().trim_matches('"').trim())
            .collect();

        Ok(Self {
            id: parse_column(&columns, 1, "id", line)?,
            cost_per_unit: parse_column(&columns, 3, "cost", line)?,
            pool_depth: parse_column(&columns, 4, "pool_depth", line)?,
        })
    }
}

fn parse_column<T: std::str::FromStr>(
    columns: &[&str],
    index: usize,
    column: &'static str,
    line: usize,
) -> Result<T, ConfigError> {
    let raw = columns
        .get(index)
        .copied()
        .filter(|c| !c.is_empty())
        .ok_or(ConfigError::MissingColumn { line, column })?;
    raw.parse().map_err(|_| ConfigError::BadNumber {
        line,
        column,
        value: raw.to_string(),
    })
}

/// Read-only lookup of game state rows by id.
#[derive(Debug, Clone, Default)]
pub struct ConfigTable {
    rows: BTreeMap<i32, GameStateRow>,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a text table. Blank lines and `#` lines are skipped.
    pub fn parse_text(text: &str) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for (index, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }
            table.insert(GameStateRow::parse(raw, index + 1)?)?;
        }
        Ok(table)
    }

    /// Decode a binary table produced by [`ConfigTable::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let rows: Vec<GameStateRow> = bincode::DefaultOptions::new().deserialize(bytes)?;
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    /// Encode the table as a compact binary blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        let rows: Vec<GameStateRow> = self.rows.values().copied().collect();
        Ok(bincode::DefaultOptions::new().serialize(&rows)?)
    }

    /// Add a row, rejecting duplicate ids and negative costs.
    pub fn insert(&mut self, row: GameStateRow) -> Result<(), ConfigError> {
        if self.rows.contains_key(&row.id) {
            return Err(ConfigError::DuplicateId(row.id));
        }
        if !(row.cost_per_unit >= 0.0) {
            return Err(ConfigError::NegativeCost(row.id));
        }
        self.rows.insert(row.id, row);
        Ok(())
    }

    pub fn get(&self, id: i32) -> Option<&GameStateRow> {
        self.rows.get(&id)
    }

    pub fn cost_per_unit(&self, id: i32) -> Option<f64> {
        self.get(id).map(|r| r.cost_per_unit)
    }

    pub fn pool_depth(&self, id: i32) -> Option<i32> {
        self.get(id).map(|r| r.pool_depth)
    }

    /// Rows in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &GameStateRow> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Errors while loading a game state table
#[derive(Debug)]
pub enum ConfigError {
    MissingColumn { line: usize, column: &'static str },
    BadNumber { line: usize, column: &'static str, value: String },
    DuplicateId(i32),
    NegativeCost(i32),
    Binary(bincode::Error),
}

impl From<bincode::Error> for ConfigError {
    fn from(e: bincode::Error) -> Self {
        ConfigError::Binary(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingColumn { line, column } => {
                write!(f, "line {}: missing column '{}'", line, column)
            }
            ConfigError::BadNumber { line, column, value } => {
                write!(f, "line {}: column '{}' is not a number: {:?}", line, column, value)
            }
            ConfigError::DuplicateId(id) => write!(f, "duplicate game state id {}", id),
            ConfigError::NegativeCost(id) => {
                write!(f, "game state {} has a negative cost per unit", id)
            }
            ConfigError::Binary(e) => write!(f, "binary table error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "#\tGameState\n#\tId\t\tCost\tPoolDepth\n\n\t1\tNormal\t2\t5\n\t2\t\"Hard\"\t3.5\t4\n";

    #[test]
    fn test_parse_text_table() {
        let table = ConfigTable::parse_text(TABLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cost_per_unit(1), Some(2.0));
        assert_eq!(table.pool_depth(1), Some(5));
        assert_eq!(table.cost_per_unit(2), Some(3.5));
        assert_eq!(table.pool_depth(2), Some(4));
        assert!(table.get(3).is_none());
    }

    #[test]
    fn test_parse_row_trims_quotes() {
        let row = GameStateRow::parse("\t\"7\"\tx\t\" 1 \"\t9", 1).unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.cost_per_unit, 1.0);
        assert_eq!(row.pool_depth, 9);
    }

    #[test]
    fn test_missing_column_reports_line() {
        let err = ConfigTable::parse_text("#header\n\t1\tNormal\t2\n").unwrap_err();
        match err {
            ConfigError::MissingColumn { line, column } => {
                assert_eq!(line, 2);
                assert_eq!(column, "pool_depth");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_bad_number() {
        let err = GameStateRow::parse("\tone\tNormal\t2\t5", 4).unwrap_err();
        assert!(matches!(err, ConfigError::BadNumber { line: 4, column: "id", .. }));
    }

    #[test]
    fn test_duplicate_and_negative_rejected() {
        let err = ConfigTable::parse_text("\t1\ta\t2\t5\n\t1\tb\t3\t5\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId(1)));

        let err = ConfigTable::parse_text("\t4\ta\t-2\t5\n").unwrap_err();
        assert!(matches!(err, ConfigError::NegativeCost(4)));
    }

    #[test]
    fn test_binary_table_matches_text_table() {
        let table = ConfigTable::parse_text(TABLE).unwrap();
        let bytes = table.to_bytes().unwrap();
        let decoded = ConfigTable::from_bytes(&bytes).unwrap();
        let a: Vec<_> = table.iter().copied().collect();
        let b: Vec<_> = decoded.iter().copied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncated_binary_rejected() {
        let table = ConfigTable::parse_text(TABLE).unwrap();
        let bytes = table.to_bytes().unwrap();
        let err = ConfigTable::from_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, ConfigError::Binary(_)));
    }
}
