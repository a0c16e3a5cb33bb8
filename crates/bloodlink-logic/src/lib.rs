//! Pure connection logic for Bloodlink.
//!
//! This crate contains the arithmetic and data tables that are independent of
//! the ECS world. Functions take plain data and return results, so they can be
//! unit-tested without spawning a single entity.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Game state table: text and binary row parsing, lookup by id |
//! | [`cost`] | Connector length rounding, blood cost, feasibility |

pub mod config;
pub mod cost;
