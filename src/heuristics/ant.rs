//! Ant construction of candidate colorings.
//!
//! Each ant builds one complete coloring from scratch: vertices are
//! selected in saturation order (most distinctly-colored neighbors
//! first) and colors are drawn from a weighted distribution combining
//! the per-ant pheromone trail, a conflict-avoiding heuristic and the
//! allow-mask.

use crate::instance::ColoringInstance;
use crate::solution::Coloring;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Additive guard on pheromone contributions so the trail stays strictly
/// positive and `powf` never sees a zero base.
const TRAIL_EPSILON: f64 = 1e-6;

/// Reusable scratch state for constructing colorings.
///
/// One constructor serves many ants: [`AntConstructor::construct`] resets
/// the buffers instead of reallocating them.
pub struct AntConstructor {
    /// trail[v][c]: running mean of pheromone between v and the vertices
    /// currently holding color c
    trail: Vec<Vec<f64>>,
    /// neighbors_by_color[v][c]: colored neighbors of v holding color c
    neighbors_by_color: Vec<Vec<usize>>,
    /// saturation[v]: number of distinct colors among v's neighbors
    saturation: Vec<usize>,
    /// num_with_color[c]: vertices currently holding color c
    num_with_color: Vec<usize>,
    /// per-color weight buffer for the roulette draw
    weights: Vec<f64>,
}

impl AntConstructor {
    pub fn new(num_vertices: usize, num_colors: usize) -> Self {
        AntConstructor {
            trail: vec![vec![1.0; num_colors]; num_vertices],
            neighbors_by_color: vec![vec![0; num_colors]; num_vertices],
            saturation: vec![0; num_vertices],
            num_with_color: vec![0; num_colors],
            weights: vec![0.0; num_colors],
        }
    }

    fn reset(&mut self) {
        for row in &mut self.trail {
            row.fill(1.0);
        }
        for row in &mut self.neighbors_by_color {
            row.fill(0);
        }
        self.saturation.fill(0);
        self.num_with_color.fill(0);
    }

    /// Build one coloring guided by the shared pheromone matrix.
    ///
    /// Every vertex receives a color. When no allowed color has positive
    /// weight the draw falls back to uniform over allowed colors; when no
    /// color is allowed at all, color 0 is assigned and the conflict is
    /// left for the refiner or the spill selector.
    pub fn construct(
        &mut self,
        instance: &ColoringInstance,
        pheromones: &[Vec<f64>],
        alpha: f64,
        beta: f64,
        rng: &mut ChaCha8Rng,
    ) -> Coloring {
        let n = instance.num_vertices();
        let k = instance.num_colors();
        self.reset();

        let mut coloring = Coloring::uncolored(n);
        if k == 0 {
            return coloring;
        }

        for _ in 0..n {
            let v = self.select_vertex(&coloring);
            let c = self.select_color(instance, v, alpha, beta, rng);

            coloring.colors[v] = Some(c);
            self.num_with_color[c] += 1;
            let m = self.num_with_color[c] as f64;
            for u in 0..n {
                self.trail[u][c] = self.trail[u][c] * (m - 1.0) / m
                    + (pheromones[u][v] + TRAIL_EPSILON) / m;
            }
            for &u in instance.neighbors(v) {
                if self.neighbors_by_color[u][c] == 0 {
                    self.saturation[u] += 1;
                }
                self.neighbors_by_color[u][c] += 1;
                if coloring.colors[u] == Some(c) {
                    coloring.conflicting_edges += 1;
                }
            }
        }

        coloring.conflicting_vertices = (0..n)
            .filter(|&v| match coloring.colors[v] {
                Some(c) => self.neighbors_by_color[v][c] > 0,
                None => false,
            })
            .count();

        coloring
    }

    /// Uncolored vertex with the highest saturation, ties broken by the
    /// lowest index.
    fn select_vertex(&self, coloring: &Coloring) -> usize {
        let mut chosen = 0;
        let mut highest: Option<usize> = None;
        for (v, color) in coloring.colors.iter().enumerate() {
            if color.is_some() {
                continue;
            }
            if highest.map_or(true, |h| self.saturation[v] > h) {
                highest = Some(self.saturation[v]);
                chosen = v;
            }
        }
        chosen
    }

    /// Roulette draw over w(v,c) = trail^alpha * (conflicts+1)^(-beta),
    /// masked by the allowed colors.
    fn select_color(
        &mut self,
        instance: &ColoringInstance,
        v: usize,
        alpha: f64,
        beta: f64,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let k = instance.num_colors();
        let mut total = 0.0;
        for c in 0..k {
            let mut w = if instance.is_allowed(v, c) {
                self.trail[v][c].powf(alpha)
                    * ((self.neighbors_by_color[v][c] + 1) as f64).powf(-beta)
            } else {
                0.0
            };
            if !w.is_finite() {
                w = 0.0;
            }
            self.weights[c] = w;
            total += w;
        }

        if total > 0.0 {
            let mut pick = rng.gen::<f64>() * total;
            for (c, &w) in self.weights.iter().enumerate() {
                pick -= w;
                if pick <= 0.0 && w > 0.0 {
                    return c;
                }
            }
            // numeric residue: last color with positive weight
            for c in (0..k).rev() {
                if self.weights[c] > 0.0 {
                    return c;
                }
            }
        }

        let allowed: Vec<usize> = (0..k).filter(|&c| instance.is_allowed(v, c)).collect();
        if allowed.is_empty() {
            0
        } else {
            allowed[rng.gen_range(0..allowed.len())]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::colony::initial_pheromones;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_construct_colors_every_vertex() {
        let inst = ColoringInstance::from_edges("k3", 3, &[(0, 1), (1, 2), (0, 2)], 3).unwrap();
        let pheromones = initial_pheromones(&inst);
        let mut ctor = AntConstructor::new(3, 3);
        let coloring = ctor.construct(&inst, &pheromones, 3.0, 16.0, &mut rng(1));
        assert!(coloring.colors.iter().all(|c| c.is_some()));
    }

    #[test]
    fn test_high_beta_avoids_conflicts_on_triangle() {
        // with three colors for K3 and beta sharply penalizing colored
        // neighbors, the ant should find a rainbow coloring
        let inst = ColoringInstance::from_edges("k3", 3, &[(0, 1), (1, 2), (0, 2)], 3).unwrap();
        let pheromones = initial_pheromones(&inst);
        let mut ctor = AntConstructor::new(3, 3);
        let coloring = ctor.construct(&inst, &pheromones, 3.0, 40.0, &mut rng(3));
        assert_eq!(coloring.conflicting_edges, 0);
    }

    #[test]
    fn test_mask_is_respected() {
        let inst = ColoringInstance::from_edges("path", 3, &[(0, 1), (1, 2)], 2)
            .unwrap()
            .with_allowed(vec![
                vec![true, false],
                vec![false, true],
                vec![true, false],
            ])
            .unwrap();
        let pheromones = initial_pheromones(&inst);
        let mut ctor = AntConstructor::new(3, 2);
        let coloring = ctor.construct(&inst, &pheromones, 3.0, 16.0, &mut rng(5));
        assert_eq!(coloring.colors, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_no_allowed_color_falls_back_to_zero() {
        let inst = ColoringInstance::from_edges("pair", 2, &[(0, 1)], 2)
            .unwrap()
            .with_allowed(vec![vec![false, false], vec![true, true]])
            .unwrap();
        let pheromones = initial_pheromones(&inst);
        let mut ctor = AntConstructor::new(2, 2);
        let coloring = ctor.construct(&inst, &pheromones, 3.0, 16.0, &mut rng(7));
        assert_eq!(coloring.colors[0], Some(0));
    }

    #[test]
    fn test_construction_is_deterministic() {
        let inst = ColoringInstance::random("r", 24, 4, 0.3, 9);
        let pheromones = initial_pheromones(&inst);
        let mut ctor = AntConstructor::new(24, 4);
        let a = ctor.construct(&inst, &pheromones, 3.0, 16.0, &mut rng(21));
        let b = ctor.construct(&inst, &pheromones, 3.0, 16.0, &mut rng(21));
        assert_eq!(a.colors, b.colors);
        assert_eq!(a.conflicting_edges, b.conflicting_edges);
    }

    #[test]
    fn test_tracked_conflicts_match_recount() {
        let inst = ColoringInstance::random("r", 30, 3, 0.4, 13);
        let pheromones = initial_pheromones(&inst);
        let mut ctor = AntConstructor::new(30, 3);
        let coloring = ctor.construct(&inst, &pheromones, 3.0, 16.0, &mut rng(17));
        let mut checked = coloring.clone();
        checked.recount(&inst);
        assert_eq!(coloring.conflicting_edges, checked.conflicting_edges);
        assert_eq!(coloring.conflicting_vertices, checked.conflicting_vertices);
    }
}
