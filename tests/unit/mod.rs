//! Unit test infrastructure for hsplink
//!
//! This module provides test utilities and helpers for unit testing the
//! linking engines and their statistics. Tests are organized by module:
//! - `ordering` - Comparator contracts over shuffled HSP mixes
//! - `params` - Cutoff derivation driving the engines end to end
//! - `link/` - Both linking engines through the public entry point
//! - `stats/` - Sum-statistics numerical behavior

pub mod helpers;
pub mod params;
pub mod stats;
