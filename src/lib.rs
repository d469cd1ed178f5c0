//! ACO Register-Allocation Coloring Engine
//!
//! A graph-coloring engine for register allocation built on ant colony
//! optimization. Virtual registers are vertices of an interference
//! graph; physical-register classes are colors. The engine searches for
//! a low-conflict coloring and, when the graph is over-constrained,
//! selects vertices to spill to memory.
//!
//! # Features
//!
//! - Ant construction in saturation order guided by a pheromone matrix
//! - Reactive tabu local search refinement of every constructed coloring
//! - Alternating colony-best / cycle-best pheromone reinforcement
//! - Conflict- and cost-driven spill selection
//! - Per-vertex allow-masks for register-class and aliasing constraints
//! - Greedy DSATUR and random baselines, benchmarking tools, DIMACS input
//!
//! # Example
//!
//! ```
//! use aco_regalloc::instance::ColoringInstance;
//! use aco_regalloc::heuristics::colony::{solve, ColonyConfig};
//!
//! // a 4-cycle is 2-colorable
//! let instance = ColoringInstance::from_edges("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)], 2)?;
//! let config = ColonyConfig {
//!     max_cycles: 100,
//!     num_ants: 10,
//!     ..Default::default()
//! };
//! let coloring = solve(&instance, &config)?;
//! assert_eq!(coloring.conflicting_edges, 0);
//! # Ok::<(), aco_regalloc::instance::EngineError>(())
//! ```

pub mod benchmark;
pub mod heuristics;
pub mod instance;
pub mod solution;
pub mod spill;

pub use heuristics::colony::{solve, solve_to_completion, AntColonyColoring, ColonyConfig};
pub use instance::{ColoringInstance, EngineError};
pub use solution::Coloring;
