//! Reactive tabu local search over colorings.
//!
//! Refines a constructed coloring by single-vertex recolorings that
//! reduce the number of conflicting edges. Recently applied (vertex,
//! color) assignments are tabu for a tenure that adapts to the number of
//! vertices currently in conflict.

use crate::instance::ColoringInstance;
use crate::solution::Coloring;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Trait for conflict-reducing refinement methods.
pub trait ConflictRefiner {
    /// Refine `coloring` in place; returns true when the number of
    /// conflicting edges decreased.
    fn refine(
        &self,
        instance: &ColoringInstance,
        coloring: &mut Coloring,
        rng: &mut ChaCha8Rng,
    ) -> bool;

    fn name(&self) -> &str;
}

/// Tabu search with a dynamically adjusted tenure.
///
/// Each iteration picks, among vertices currently in conflict, the
/// non-tabu allowed recoloring with the best conflict delta. After a
/// move, the tenure is recomputed as `0.6 * conflicting_vertices`
/// plus a small random slack. When every move is tabu (or no vertex in
/// conflict has an allowed move), the first allowed (vertex, color) pair
/// in scan order is applied unconditionally, regardless of the current
/// coloring.
pub struct ReactiveTabucol {
    /// Maximum number of iterations per refinement
    pub max_cycles: usize,
    /// Wall-clock cap in seconds per refinement
    pub max_time: f64,
}

impl ReactiveTabucol {
    pub fn new() -> Self {
        ReactiveTabucol {
            max_cycles: 25,
            max_time: 0.1,
        }
    }

    pub fn with_params(max_cycles: usize, max_time: f64) -> Self {
        ReactiveTabucol {
            max_cycles,
            max_time,
        }
    }

    /// First allowed (vertex, color) pair in scan order; (0, 0) when the
    /// mask has no allowed entry at all.
    fn fallback_move(instance: &ColoringInstance) -> (usize, usize) {
        for v in 0..instance.num_vertices() {
            for c in 0..instance.num_colors() {
                if instance.is_allowed(v, c) {
                    return (v, c);
                }
            }
        }
        (0, 0)
    }
}

impl Default for ReactiveTabucol {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictRefiner for ReactiveTabucol {
    fn refine(
        &self,
        instance: &ColoringInstance,
        coloring: &mut Coloring,
        rng: &mut ChaCha8Rng,
    ) -> bool {
        let n = instance.num_vertices();
        let k = instance.num_colors();
        if n == 0 || k == 0 || coloring.conflicting_edges == 0 {
            return false;
        }

        let start = Instant::now();
        let initial_conflicts = coloring.conflicting_edges;

        // conflicts[c][v]: neighbors of v currently holding color c
        let mut conflicts = vec![vec![0usize; n]; k];
        for v in 0..n {
            for &u in instance.neighbors(v) {
                if let Some(cu) = coloring.colors[u] {
                    conflicts[cu][v] += 1;
                }
            }
        }

        // tabu[v][c] >= iteration forbids re-assigning c to v
        let mut tabu = vec![vec![0usize; k]; n];
        let mut tenure = n / 10;
        let mut conflicting_edges = coloring.conflicting_edges as i64;

        let mut iteration = 1usize;
        while iteration < self.max_cycles.max(1)
            && conflicting_edges > 0
            && start.elapsed().as_secs_f64() < self.max_time
        {
            // best allowed non-tabu recoloring of a conflicting vertex
            let mut best: Option<(usize, usize, i64)> = None;
            for v in 0..n {
                let Some(cv) = coloring.colors[v] else { continue };
                if conflicts[cv][v] == 0 {
                    continue;
                }
                for c in 0..k {
                    if c == cv || !instance.is_allowed(v, c) || tabu[v][c] >= iteration {
                        continue;
                    }
                    let delta = conflicts[c][v] as i64 - conflicts[cv][v] as i64;
                    if best.map_or(true, |(_, _, d)| delta < d) {
                        best = Some((v, c, delta));
                    }
                }
            }

            let (v, c, delta) = match best {
                Some(m) => m,
                None => {
                    let (v, c) = Self::fallback_move(instance);
                    let delta = conflicts[c][v] as i64
                        - coloring.colors[v].map_or(0, |cv| conflicts[cv][v]) as i64;
                    (v, c, delta)
                }
            };

            let old = coloring.colors[v];
            coloring.colors[v] = Some(c);
            conflicting_edges += delta;
            for &u in instance.neighbors(v) {
                if let Some(o) = old {
                    conflicts[o][u] -= 1;
                }
                conflicts[c][u] += 1;
            }
            tabu[v][c] = iteration + tenure;

            let vertex_conflicts = (0..n)
                .filter(|&w| match coloring.colors[w] {
                    Some(cw) => conflicts[cw][w] > 0,
                    None => false,
                })
                .count();
            tenure = (0.6 * vertex_conflicts as f64) as usize + rng.gen_range(0..10);

            iteration += 1;
        }

        coloring.conflicting_edges = conflicting_edges.max(0) as usize;
        let vertex_conflicts = (0..n)
            .filter(|&w| match coloring.colors[w] {
                Some(cw) => conflicts[cw][w] > 0,
                None => false,
            })
            .count();
        coloring.conflicting_vertices = vertex_conflicts;

        coloring.conflicting_edges < initial_conflicts
    }

    fn name(&self) -> &str {
        "ReactTabucol"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn square() -> ColoringInstance {
        ColoringInstance::from_edges("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)], 2).unwrap()
    }

    #[test]
    fn test_repairs_monochrome_square() {
        let inst = square();
        let mut coloring = Coloring::from_colors(&inst, vec![Some(0); 4], "test");
        assert_eq!(coloring.conflicting_edges, 4);

        let tabucol = ReactiveTabucol::with_params(200, 1.0);
        let improved = tabucol.refine(&inst, &mut coloring, &mut rng(1));
        assert!(improved);
        assert_eq!(coloring.conflicting_edges, 0);

        let mut checked = coloring.clone();
        checked.recount(&inst);
        assert_eq!(checked.conflicting_edges, 0);
        assert_eq!(coloring.colors[0], coloring.colors[2]);
        assert_eq!(coloring.colors[1], coloring.colors[3]);
    }

    #[test]
    fn test_noop_on_conflict_free_input() {
        let inst = square();
        let mut coloring =
            Coloring::from_colors(&inst, vec![Some(0), Some(1), Some(0), Some(1)], "test");
        let before = coloring.colors.clone();
        let tabucol = ReactiveTabucol::new();
        assert!(!tabucol.refine(&inst, &mut coloring, &mut rng(2)));
        assert_eq!(coloring.colors, before);
    }

    #[test]
    fn test_incremental_count_matches_recount() {
        let inst = ColoringInstance::random("r", 25, 3, 0.4, 5);
        let colors: Vec<Option<usize>> = (0..25).map(|v| Some(v % 3)).collect();
        let mut coloring = Coloring::from_colors(&inst, colors, "test");

        let tabucol = ReactiveTabucol::with_params(40, 1.0);
        tabucol.refine(&inst, &mut coloring, &mut rng(3));

        let mut checked = coloring.clone();
        checked.recount(&inst);
        assert_eq!(coloring.conflicting_edges, checked.conflicting_edges);
        assert_eq!(coloring.conflicting_vertices, checked.conflicting_vertices);
    }

    #[test]
    fn test_respects_allow_mask() {
        // vertex 1 may only take color 1; repairing the path keeps it there
        let inst = ColoringInstance::from_edges("path", 3, &[(0, 1), (1, 2)], 2)
            .unwrap()
            .with_allowed(vec![
                vec![true, true],
                vec![false, true],
                vec![true, true],
            ])
            .unwrap();
        let mut coloring =
            Coloring::from_colors(&inst, vec![Some(1), Some(1), Some(1)], "test");
        let tabucol = ReactiveTabucol::with_params(100, 1.0);
        tabucol.refine(&inst, &mut coloring, &mut rng(4));
        assert_eq!(coloring.conflicting_edges, 0);
        assert_eq!(coloring.colors[1], Some(1));
        assert!(coloring.mask_violations(&inst) <= 1);
    }

    #[test]
    fn test_terminates_on_infeasible_instance() {
        // K3 with a single color cannot be repaired; the iteration cap must stop it
        let inst = ColoringInstance::from_edges("k3", 3, &[(0, 1), (1, 2), (0, 2)], 1).unwrap();
        let mut coloring = Coloring::from_colors(&inst, vec![Some(0); 3], "test");
        let tabucol = ReactiveTabucol::with_params(50, 1.0);
        tabucol.refine(&inst, &mut coloring, &mut rng(6));
        assert!(coloring.conflicting_edges > 0);
        assert!(coloring.mask_violations(&inst) <= 1);
    }
}
