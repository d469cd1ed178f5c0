//! Ant-colony cycle controller for graph coloring.
//!
//! Owns the pheromone matrix and the colony-best coloring. Every cycle,
//! each ant constructs a candidate coloring ([`AntConstructor`]) and
//! refines it ([`ReactiveTabucol`]); pheromones then decay and the
//! monochromatic non-edges of the deposit source are reinforced. The
//! deposit source alternates between the colony best and the cycle best
//! in blocks of `gap` cycles (the "scheme 3" policy).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::heuristics::ant::AntConstructor;
use crate::heuristics::tabu::{ConflictRefiner, ReactiveTabucol};
use crate::instance::{ColoringInstance, EngineError};
use crate::solution::Coloring;
use crate::spill::select_spill;

/// Colony configuration parameters
#[derive(Debug, Clone)]
pub struct ColonyConfig {
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Pheromone decay multiplier per cycle (rho)
    pub rho: f64,
    /// Wall-clock cap for the whole session, in seconds
    pub max_time: f64,
    /// Wall-clock cap per tabucol refinement, in seconds
    pub max_tabucol_time: f64,
    /// Maximum number of cycles
    pub max_cycles: usize,
    /// Maximum tabucol iterations per refinement
    pub max_tabucol_cycles: usize,
    /// Number of ants per cycle
    pub num_ants: usize,
    /// Pheromone-source alternation period
    pub gap: usize,
    /// Exponent on spill costs in the spill score
    pub spill_cost_importance: f64,
    /// Random seed
    pub seed: u64,
    /// Run the per-cycle ant loop on the rayon thread pool
    pub parallel: bool,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        ColonyConfig {
            alpha: 3.0,
            beta: 16.0,
            rho: 0.7,
            max_time: 100.0,
            max_tabucol_time: 0.1,
            max_cycles: 625,
            max_tabucol_cycles: 25,
            num_ants: 80,
            gap: 25,
            spill_cost_importance: 0.0,
            seed: 42,
            parallel: false,
        }
    }
}

impl ColonyConfig {
    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("max_time", self.max_time),
            ("max_tabucol_time", self.max_tabucol_time),
            ("spill_cost_importance", self.spill_cost_importance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidParameter { name, value });
            }
        }
        if !self.rho.is_finite() || !(0.0..=1.0).contains(&self.rho) {
            return Err(EngineError::InvalidParameter {
                name: "rho",
                value: self.rho,
            });
        }
        if self.num_ants == 0 {
            return Err(EngineError::InvalidParameter {
                name: "num_ants",
                value: 0.0,
            });
        }
        if self.gap == 0 {
            return Err(EngineError::InvalidParameter {
                name: "gap",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Pheromone matrix for an instance: 1 everywhere, pinned to 0 on edges.
pub fn initial_pheromones(instance: &ColoringInstance) -> Vec<Vec<f64>> {
    let n = instance.num_vertices();
    let mut pheromones = vec![vec![1.0; n]; n];
    for u in 0..n {
        for v in 0..n {
            if instance.are_adjacent(u, v) {
                pheromones[u][v] = 0.0;
            }
        }
    }
    pheromones
}

/// Decay every entry by `rho`, then reinforce the monochromatic non-edge
/// pairs of the source coloring. Edge entries stay pinned at 0 because
/// they receive decay but never a deposit; spilled vertices deposit
/// nothing.
fn update_pheromones(
    pheromones: &mut [Vec<f64>],
    instance: &ColoringInstance,
    source: &Coloring,
    rho: f64,
) {
    let n = instance.num_vertices();
    let deposit = if source.conflicting_edges == 0 {
        1.0
    } else {
        1.0 / source.conflicting_edges as f64
    };
    for u in 0..n {
        for v in 0..n {
            pheromones[u][v] *= rho;
            if u == v || instance.are_adjacent(u, v) {
                continue;
            }
            if let (Some(a), Some(b)) = (source.colors[u], source.colors[v]) {
                if a == b {
                    pheromones[u][v] += deposit;
                }
            }
        }
    }
}

/// Ant-colony coloring engine
pub struct AntColonyColoring {
    config: ColonyConfig,
    instance: ColoringInstance,
    pheromones: Vec<Vec<f64>>,
    rng: ChaCha8Rng,
    cancel: Arc<AtomicBool>,
}

impl AntColonyColoring {
    pub fn new(instance: ColoringInstance, config: ColonyConfig) -> Self {
        let pheromones = initial_pheromones(&instance);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        AntColonyColoring {
            config,
            instance,
            pheromones,
            rng,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally settable cancel flag. The engine observes it
    /// at cycle and ant boundaries and returns the current best on
    /// cancellation.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels this engine when set to true.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Current pheromone matrix
    pub fn pheromones(&self) -> &[Vec<f64>] {
        &self.pheromones
    }

    /// Run cycles until a stopping condition and return the colony-best
    /// coloring (no spill selection; see [`solve`]).
    pub fn run(&mut self) -> Coloring {
        let start = Instant::now();
        let n = self.instance.num_vertices();
        let k = self.instance.num_colors();

        let mut best = Coloring::uncolored(n);
        best.algorithm = "ColorAnt3".to_string();

        if n == 0 || k == 0 {
            best.computation_time = start.elapsed().as_secs_f64();
            return best;
        }

        let tabucol = ReactiveTabucol::with_params(
            self.config.max_tabucol_cycles,
            self.config.max_tabucol_time,
        );
        let mut constructor = AntConstructor::new(n, k);

        let mut best_value = usize::MAX;
        let mut cycles: usize = 1;
        let mut phero_counter: i64 = 0;

        while cycles < self.config.max_cycles
            && best_value > 0
            && start.elapsed().as_secs_f64() < self.config.max_time
            && !self.cancel.load(Ordering::Relaxed)
        {
            let (ant_best, ant_best_value) = if self.config.parallel {
                self.run_ants_parallel(&tabucol)
            } else {
                self.run_ants_serial(&mut constructor, &tabucol)
            };
            let ant_best = match ant_best {
                Some(coloring) => coloring,
                None => break, // cancelled before any ant finished
            };

            if ant_best_value < best_value {
                best_value = ant_best_value;
                best.colors = ant_best.colors.clone();
                best.conflicting_edges = ant_best.conflicting_edges;
                best.conflicting_vertices = ant_best.conflicting_vertices;
                log::debug!(
                    "cycle {}: colony best now {} conflicting edges",
                    cycles,
                    best_value
                );
            }

            // scheme 3: follow the colony best in blocks of `gap` cycles,
            // the cycle best in between
            if cycles % self.config.gap == 0 {
                phero_counter = (cycles / self.config.gap) as i64;
            }
            let source = if phero_counter > 0 { &best } else { &ant_best };
            update_pheromones(
                &mut self.pheromones,
                &self.instance,
                source,
                self.config.rho,
            );
            phero_counter -= 1;
            cycles += 1;
        }

        log::debug!(
            "finished after {} cycles in {:.3}s with {} conflicting edges",
            cycles,
            start.elapsed().as_secs_f64(),
            best.conflicting_edges
        );

        best.computation_time = start.elapsed().as_secs_f64();
        best.cycles = Some(cycles);
        best
    }

    fn run_ants_serial(
        &mut self,
        constructor: &mut AntConstructor,
        tabucol: &ReactiveTabucol,
    ) -> (Option<Coloring>, usize) {
        let Self {
            config,
            instance,
            pheromones,
            rng,
            cancel,
        } = self;

        let mut ant_best: Option<Coloring> = None;
        let mut ant_best_value = usize::MAX;
        for _ in 0..config.num_ants {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let mut coloring =
                constructor.construct(instance, pheromones, config.alpha, config.beta, rng);
            tabucol.refine(instance, &mut coloring, rng);
            if coloring.conflicting_edges == 0 || coloring.conflicting_edges < ant_best_value {
                ant_best_value = coloring.conflicting_edges;
                ant_best = Some(coloring);
            }
        }
        (ant_best, ant_best_value)
    }

    fn run_ants_parallel(&mut self, tabucol: &ReactiveTabucol) -> (Option<Coloring>, usize) {
        let n = self.instance.num_vertices();
        let k = self.instance.num_colors();
        let seeds: Vec<u64> = (0..self.config.num_ants).map(|_| self.rng.gen()).collect();

        let instance = &self.instance;
        let pheromones = &self.pheromones;
        let cancel = &self.cancel;
        let alpha = self.config.alpha;
        let beta = self.config.beta;

        // ants that see the cancel flag before starting yield nothing
        let ants: Vec<Option<(usize, Coloring)>> = seeds
            .into_par_iter()
            .enumerate()
            .map_init(
                || AntConstructor::new(n, k),
                |constructor, (ant, seed)| {
                    if cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    let mut coloring =
                        constructor.construct(instance, pheromones, alpha, beta, &mut rng);
                    tabucol.refine(instance, &mut coloring, &mut rng);
                    Some((ant, coloring))
                },
            )
            .collect();

        // winner: fewest conflicting edges, ties to the first-seen ant
        match ants
            .into_iter()
            .flatten()
            .min_by_key(|(ant, coloring)| (coloring.conflicting_edges, *ant))
        {
            Some((_, coloring)) => {
                let value = coloring.conflicting_edges;
                (Some(coloring), value)
            }
            None => (None, usize::MAX),
        }
    }
}

/// Run one full coloring session: validate the configuration, run the
/// cycle controller, then apply spill selection to the colony best.
///
/// Vertices left as `None` in the result are spill decisions; the caller
/// is expected to rebuild the interference graph and re-invoke (or use
/// [`solve_to_completion`]).
pub fn solve(instance: &ColoringInstance, config: &ColonyConfig) -> Result<Coloring, EngineError> {
    config.validate()?;
    let mut colony = AntColonyColoring::new(instance.clone(), config.clone());
    let mut best = colony.run();

    // vertices with no allowed color come back as spill decisions, not
    // as the constructor's best-effort placeholder assignment
    let forced = instance.forced_spill_vertices();
    if !forced.is_empty() {
        for &v in &forced {
            best.colors[v] = None;
        }
        best.recount(instance);
    }

    select_spill(instance, &mut best, config.spill_cost_importance);
    Ok(best)
}

/// Iterate [`solve`] until no further spill is produced.
///
/// Vertices with an all-false allow-mask row are spilled up front; after
/// each session the spilled vertex is removed from the graph and the
/// reduced instance is re-colored, mirroring how a register allocator
/// re-invokes the engine after rewriting spill code.
pub fn solve_to_completion(
    instance: &ColoringInstance,
    config: &ColonyConfig,
) -> Result<Coloring, EngineError> {
    config.validate()?;
    let start = Instant::now();
    let n = instance.num_vertices();

    let mut spilled = vec![false; n];
    for v in instance.forced_spill_vertices() {
        spilled[v] = true;
    }

    let mut final_colors: Vec<Option<usize>> = vec![None; n];
    loop {
        let active: Vec<usize> = (0..n).filter(|&v| !spilled[v]).collect();
        if active.is_empty() {
            break;
        }
        let sub = instance.induced_subgraph(&active);
        let result = solve(&sub, config)?;

        let mut new_spill = false;
        for (i, &v) in active.iter().enumerate() {
            match result.colors[i] {
                Some(c) => final_colors[v] = Some(c),
                None => {
                    spilled[v] = true;
                    new_spill = true;
                    log::debug!("spilling vertex {} and re-coloring", v);
                }
            }
        }
        if !new_spill {
            break;
        }
    }

    let mut combined = Coloring::from_colors(instance, final_colors, "ColorAnt3+Spill");
    combined.computation_time = start.elapsed().as_secs_f64();
    Ok(combined)
}
