//! Heuristics for the coloring engine.
//!
//! This module exports the ant constructor, the reactive tabu refiner,
//! the colony cycle controller and the greedy baselines.

pub mod ant;
pub mod colony;
pub mod greedy;
pub mod tabu;

pub use ant::*;
pub use colony::*;
pub use greedy::*;
pub use tabu::*;
