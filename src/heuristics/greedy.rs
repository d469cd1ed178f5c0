//! Greedy baseline constructors.
//!
//! Deterministic DSATUR and a seeded random assignment, used as
//! benchmark baselines against the colony and as cheap initial
//! colorings.

use crate::instance::ColoringInstance;
use crate::solution::Coloring;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Trait for one-shot coloring constructors.
pub trait ConstructionHeuristic {
    fn construct(&self, instance: &ColoringInstance) -> Coloring;
    fn name(&self) -> &str;
}

/// Greedy DSATUR respecting the allow-mask.
///
/// Repeatedly colors the uncolored vertex with the most distinctly
/// colored neighbors (ties by degree, then index) using the lowest
/// allowed color unused among its neighbors. When every allowed color is
/// taken the lowest allowed color is assigned anyway; when no color is
/// allowed the vertex is left uncolored.
pub struct DsaturHeuristic;

impl DsaturHeuristic {
    pub fn new() -> Self {
        DsaturHeuristic
    }
}

impl Default for DsaturHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for DsaturHeuristic {
    fn construct(&self, instance: &ColoringInstance) -> Coloring {
        let start = std::time::Instant::now();
        let n = instance.num_vertices();
        let k = instance.num_colors();

        let mut colors: Vec<Option<usize>> = vec![None; n];
        let mut neighbors_by_color = vec![vec![0usize; k]; n];
        // vertices with an empty allowed set stay uncolored
        let mut blocked = vec![false; n];

        for _ in 0..n {
            // most saturated uncolored vertex; ties by degree, then index
            let mut chosen: Option<(usize, usize, usize)> = None;
            for v in 0..n {
                if colors[v].is_some() || blocked[v] {
                    continue;
                }
                let sat = neighbors_by_color[v].iter().filter(|&&c| c > 0).count();
                let key = (sat, instance.degree(v));
                if chosen.map_or(true, |(s, d, _)| key > (s, d)) {
                    chosen = Some((key.0, key.1, v));
                }
            }
            let Some((_, _, v)) = chosen else { break };

            let free = (0..k)
                .find(|&c| instance.is_allowed(v, c) && neighbors_by_color[v][c] == 0);
            let fallback = (0..k).find(|&c| instance.is_allowed(v, c));
            let Some(c) = free.or(fallback) else {
                blocked[v] = true;
                continue;
            };

            colors[v] = Some(c);
            for &u in instance.neighbors(v) {
                neighbors_by_color[u][c] += 1;
            }
        }

        let mut coloring = Coloring::from_colors(instance, colors, self.name());
        coloring.computation_time = start.elapsed().as_secs_f64();
        coloring
    }

    fn name(&self) -> &str {
        "DSATUR"
    }
}

/// Uniform random allowed color per vertex.
pub struct RandomHeuristic {
    pub seed: u64,
}

impl RandomHeuristic {
    pub fn new(seed: u64) -> Self {
        RandomHeuristic { seed }
    }
}

impl ConstructionHeuristic for RandomHeuristic {
    fn construct(&self, instance: &ColoringInstance) -> Coloring {
        let start = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let k = instance.num_colors();

        let colors = (0..instance.num_vertices())
            .map(|v| {
                let allowed: Vec<usize> =
                    (0..k).filter(|&c| instance.is_allowed(v, c)).collect();
                if allowed.is_empty() {
                    None
                } else {
                    Some(allowed[rng.gen_range(0..allowed.len())])
                }
            })
            .collect();

        let mut coloring = Coloring::from_colors(instance, colors, self.name());
        coloring.computation_time = start.elapsed().as_secs_f64();
        coloring
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsatur_colors_bipartite_graph_without_conflicts() {
        let inst = ColoringInstance::cycle(6, 2);
        let coloring = DsaturHeuristic::new().construct(&inst);
        assert_eq!(coloring.conflicting_edges, 0);
        assert!(coloring.colors.iter().all(|c| c.is_some()));
    }

    #[test]
    fn test_dsatur_respects_mask() {
        let inst = ColoringInstance::from_edges("path", 3, &[(0, 1), (1, 2)], 2)
            .unwrap()
            .with_allowed(vec![
                vec![true, true],
                vec![false, true],
                vec![true, true],
            ])
            .unwrap();
        let coloring = DsaturHeuristic::new().construct(&inst);
        assert_eq!(coloring.mask_violations(&inst), 0);
        assert_eq!(coloring.conflicting_edges, 0);
        assert_eq!(coloring.colors[1], Some(1));
    }

    #[test]
    fn test_dsatur_leaves_unallocatable_vertex_uncolored() {
        let inst = ColoringInstance::from_edges("pair", 2, &[(0, 1)], 2)
            .unwrap()
            .with_allowed(vec![vec![false, false], vec![true, true]])
            .unwrap();
        let coloring = DsaturHeuristic::new().construct(&inst);
        assert_eq!(coloring.colors[0], None);
        assert!(coloring.colors[1].is_some());
    }

    #[test]
    fn test_random_is_seeded_and_masked() {
        let inst = ColoringInstance::random("r", 16, 3, 0.3, 2)
            .with_allowed(vec![vec![true, true, false]; 16])
            .unwrap();
        let a = RandomHeuristic::new(9).construct(&inst);
        let b = RandomHeuristic::new(9).construct(&inst);
        assert_eq!(a.colors, b.colors);
        assert_eq!(a.mask_violations(&inst), 0);
    }
}
