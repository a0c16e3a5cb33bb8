//! Integration tests for the shipped game state table and the cost rules
//! that consume it.

use bloodlink_logic::config::ConfigTable;
use bloodlink_logic::cost::{connection_cost, debit_amount, is_feasible};

const GAME_STATE: &str = include_str!("../../../data/game_state.txt");

#[test]
fn shipped_table_parses() {
    let table = ConfigTable::parse_text(GAME_STATE).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.cost_per_unit(1), Some(2.0));
    assert_eq!(table.pool_depth(1), Some(5));
    let ids: Vec<i32> = table.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn shipped_table_survives_binary_encoding() {
    let table = ConfigTable::parse_text(GAME_STATE).unwrap();
    let decoded = ConfigTable::from_bytes(&table.to_bytes().unwrap()).unwrap();
    for row in table.iter() {
        assert_eq!(decoded.get(row.id), Some(row));
    }
}

#[test]
fn normal_state_three_unit_connector() {
    let table = ConfigTable::parse_text(GAME_STATE).unwrap();
    let per_unit = table.cost_per_unit(1).unwrap();

    let cost = connection_cost(3.0, per_unit);
    assert_eq!(cost, 6.0);
    assert!(is_feasible(true, 10, cost));
    assert_eq!(10 - debit_amount(cost), 4);
    assert!(!is_feasible(true, 5, cost));
}
