//! Coloring representation and evaluation.
//!
//! A `Coloring` assigns each vertex either a color in `[0, K)` or `None`,
//! the spilled/uncolored sentinel. Conflict counts are cached on the
//! value and recomputed with [`Coloring::recount`]; colorings are plain
//! values and are copied when promoted to ant-best or colony-best.

use crate::instance::ColoringInstance;
use serde::{Deserialize, Serialize};

/// A (possibly partial) assignment of colors to vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coloring {
    /// Color per vertex; `None` marks a spilled or uncolored vertex
    pub colors: Vec<Option<usize>>,
    /// Number of edges whose endpoints share a color
    pub conflicting_edges: usize,
    /// Number of distinct vertices participating in at least one conflict
    pub conflicting_vertices: usize,
    /// Algorithm that produced this coloring
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of cycles run (if applicable)
    pub cycles: Option<usize>,
}

impl Coloring {
    /// Create an all-uncolored coloring over `n` vertices.
    pub fn uncolored(n: usize) -> Self {
        Coloring {
            colors: vec![None; n],
            conflicting_edges: 0,
            conflicting_vertices: 0,
            algorithm: String::new(),
            computation_time: 0.0,
            cycles: None,
        }
    }

    /// Create a coloring from an assignment and evaluate it against the
    /// instance.
    pub fn from_colors(
        instance: &ColoringInstance,
        colors: Vec<Option<usize>>,
        algorithm: &str,
    ) -> Self {
        let mut coloring = Coloring {
            colors,
            conflicting_edges: 0,
            conflicting_vertices: 0,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            cycles: None,
        };
        coloring.recount(instance);
        coloring
    }

    /// Recompute the cached conflict counts from scratch.
    pub fn recount(&mut self, instance: &ColoringInstance) {
        let counts = self.conflict_counts(instance);
        self.conflicting_edges = counts.iter().sum::<usize>() / 2;
        self.conflicting_vertices = counts.iter().filter(|&&c| c > 0).count();
    }

    /// Number of conflicting neighbors per vertex. A spilled vertex never
    /// conflicts.
    pub fn conflict_counts(&self, instance: &ColoringInstance) -> Vec<usize> {
        let n = instance.num_vertices();
        let mut counts = vec![0usize; n];
        for u in 0..n {
            let Some(cu) = self.colors[u] else { continue };
            for &v in instance.neighbors(u) {
                if v > u && self.colors[v] == Some(cu) {
                    counts[u] += 1;
                    counts[v] += 1;
                }
            }
        }
        counts
    }

    /// Whether no edge has both endpoints on the same color.
    #[inline]
    pub fn is_conflict_free(&self) -> bool {
        self.conflicting_edges == 0
    }

    /// Number of spilled/uncolored vertices.
    pub fn num_spilled(&self) -> usize {
        self.colors.iter().filter(|c| c.is_none()).count()
    }

    /// Indices of spilled/uncolored vertices.
    pub fn spilled_vertices(&self) -> Vec<usize> {
        self.colors
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(v, _)| v)
            .collect()
    }

    /// Number of colored vertices whose assignment violates the
    /// allow-mask. The refiner's all-tabu fallback may introduce at most
    /// one such vertex per call.
    pub fn mask_violations(&self, instance: &ColoringInstance) -> usize {
        self.colors
            .iter()
            .enumerate()
            .filter(|(v, c)| matches!(c, Some(c) if !instance.is_allowed(*v, *c)))
            .count()
    }
}

impl std::fmt::Display for Coloring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Coloring ({})", self.algorithm)?;
        writeln!(f, "  Conflicting edges: {}", self.conflicting_edges)?;
        writeln!(f, "  Conflicting vertices: {}", self.conflicting_vertices)?;
        writeln!(f, "  Spilled: {}", self.num_spilled())?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(cycles) = self.cycles {
            writeln!(f, "  Cycles: {}", cycles)?;
        }
        writeln!(f, "  Colors: {:?}", self.colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ColoringInstance;

    fn triangle() -> ColoringInstance {
        ColoringInstance::from_edges("k3", 3, &[(0, 1), (1, 2), (0, 2)], 3).unwrap()
    }

    #[test]
    fn test_uncolored_has_no_conflicts() {
        let inst = triangle();
        let coloring = Coloring::from_colors(&inst, vec![None; 3], "test");
        assert_eq!(coloring.conflicting_edges, 0);
        assert_eq!(coloring.num_spilled(), 3);
    }

    #[test]
    fn test_recount_monochrome_triangle() {
        let inst = triangle();
        let coloring = Coloring::from_colors(&inst, vec![Some(0); 3], "test");
        assert_eq!(coloring.conflicting_edges, 3);
        assert_eq!(coloring.conflicting_vertices, 3);
    }

    #[test]
    fn test_recount_partial_conflict() {
        let inst = triangle();
        let coloring = Coloring::from_colors(&inst, vec![Some(0), Some(0), Some(1)], "test");
        assert_eq!(coloring.conflicting_edges, 1);
        assert_eq!(coloring.conflicting_vertices, 2);
        assert_eq!(coloring.conflict_counts(&inst), vec![1, 1, 0]);
    }

    #[test]
    fn test_spilled_vertex_never_conflicts() {
        let inst = triangle();
        let coloring = Coloring::from_colors(&inst, vec![Some(0), None, Some(0)], "test");
        assert_eq!(coloring.conflicting_edges, 1);
        assert_eq!(coloring.spilled_vertices(), vec![1]);
    }

    #[test]
    fn test_mask_violations() {
        let inst = triangle()
            .with_allowed(vec![
                vec![false, true, true],
                vec![true; 3],
                vec![true; 3],
            ])
            .unwrap();
        let coloring = Coloring::from_colors(&inst, vec![Some(0), Some(1), Some(2)], "test");
        assert_eq!(coloring.mask_violations(&inst), 1);
    }
}
