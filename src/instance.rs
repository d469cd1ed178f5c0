//! Module for parsing and representing graph-coloring instances.
//!
//! An instance bundles the four immutable inputs of a coloring session:
//! the interference graph, the number of available colors, the per-vertex
//! allow-mask over colors, and the per-vertex spill costs. Instances can
//! be built programmatically, generated (random, cycle, complete), or
//! parsed from DIMACS `.col` files.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Errors raised while building instances or validating configuration.
#[derive(Debug)]
pub enum EngineError {
    /// Underlying I/O failure while reading an instance file.
    Io(std::io::Error),
    /// Malformed instance file.
    Parse { line: usize, message: String },
    /// An input collection has the wrong length.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The adjacency matrix is not symmetric.
    Asymmetric { u: usize, v: usize },
    /// The adjacency matrix has a self-loop.
    SelfLoop { vertex: usize },
    /// A numeric parameter is outside its valid range.
    InvalidParameter { name: &'static str, value: f64 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Io(e) => write!(f, "cannot read instance: {}", e),
            EngineError::Parse { line, message } => {
                write!(f, "parse error at line {}: {}", line, message)
            }
            EngineError::DimensionMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "{} has length {} but {} was expected",
                what, found, expected
            ),
            EngineError::Asymmetric { u, v } => {
                write!(f, "adjacency matrix is not symmetric at ({}, {})", u, v)
            }
            EngineError::SelfLoop { vertex } => {
                write!(f, "adjacency matrix has a self-loop at vertex {}", vertex)
            }
            EngineError::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {} = {}", name, value)
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

/// A graph-coloring instance: interference graph, color count, allow-mask
/// and spill costs.
///
/// The graph is stored both as a dense adjacency matrix (O(1) adjacency
/// tests, needed by the pheromone update) and as adjacency lists (fast
/// neighbor iteration in the constructor and refiner). Both views are
/// immutable once the instance is built.
#[derive(Debug, Clone)]
pub struct ColoringInstance {
    /// Name of the instance
    pub name: String,
    num_vertices: usize,
    num_colors: usize,
    adjacency: Vec<Vec<bool>>,
    adj_list: Vec<Vec<usize>>,
    allowed: Vec<Vec<bool>>,
    spill_costs: Vec<f64>,
}

impl ColoringInstance {
    /// Build an instance from a dense adjacency matrix.
    ///
    /// The matrix must be square, symmetric and free of self-loops. The
    /// allow-mask defaults to all-true and spill costs default to 1.0.
    pub fn from_adjacency(
        name: &str,
        adjacency: Vec<Vec<bool>>,
        num_colors: usize,
    ) -> Result<Self, EngineError> {
        let n = adjacency.len();
        for (v, row) in adjacency.iter().enumerate() {
            if row.len() != n {
                return Err(EngineError::DimensionMismatch {
                    what: "adjacency row",
                    expected: n,
                    found: row.len(),
                });
            }
            if row[v] {
                return Err(EngineError::SelfLoop { vertex: v });
            }
        }
        for u in 0..n {
            for v in u + 1..n {
                if adjacency[u][v] != adjacency[v][u] {
                    return Err(EngineError::Asymmetric { u, v });
                }
            }
        }

        let adj_list = Self::build_adj_list(&adjacency);

        Ok(ColoringInstance {
            name: name.to_string(),
            num_vertices: n,
            num_colors,
            adjacency,
            adj_list,
            allowed: vec![vec![true; num_colors]; n],
            spill_costs: vec![1.0; n],
        })
    }

    /// Build an instance from an edge list over `n` vertices.
    pub fn from_edges(
        name: &str,
        n: usize,
        edges: &[(usize, usize)],
        num_colors: usize,
    ) -> Result<Self, EngineError> {
        let mut adjacency = vec![vec![false; n]; n];
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(EngineError::DimensionMismatch {
                    what: "edge endpoint",
                    expected: n,
                    found: u.max(v),
                });
            }
            if u == v {
                return Err(EngineError::SelfLoop { vertex: u });
            }
            adjacency[u][v] = true;
            adjacency[v][u] = true;
        }
        Self::from_adjacency(name, adjacency, num_colors)
    }

    /// Replace the allow-mask. One row per vertex, one entry per color.
    pub fn with_allowed(mut self, allowed: Vec<Vec<bool>>) -> Result<Self, EngineError> {
        if allowed.len() != self.num_vertices {
            return Err(EngineError::DimensionMismatch {
                what: "allow-mask",
                expected: self.num_vertices,
                found: allowed.len(),
            });
        }
        for row in &allowed {
            if row.len() != self.num_colors {
                return Err(EngineError::DimensionMismatch {
                    what: "allow-mask row",
                    expected: self.num_colors,
                    found: row.len(),
                });
            }
        }
        self.allowed = allowed;
        Ok(self)
    }

    /// Replace the spill-cost vector. Costs must be finite and nonnegative.
    pub fn with_spill_costs(mut self, costs: Vec<f64>) -> Result<Self, EngineError> {
        if costs.len() != self.num_vertices {
            return Err(EngineError::DimensionMismatch {
                what: "spill costs",
                expected: self.num_vertices,
                found: costs.len(),
            });
        }
        for &c in &costs {
            if !c.is_finite() || c < 0.0 {
                return Err(EngineError::InvalidParameter {
                    name: "spill_cost",
                    value: c,
                });
            }
        }
        self.spill_costs = costs;
        Ok(self)
    }

    fn build_adj_list(adjacency: &[Vec<bool>]) -> Vec<Vec<usize>> {
        adjacency
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &a)| a)
                    .map(|(v, _)| v)
                    .collect()
            })
            .collect()
    }

    /// Number of vertices
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of available colors
    #[inline]
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// O(1) adjacency test
    #[inline]
    pub fn are_adjacent(&self, u: usize, v: usize) -> bool {
        self.adjacency[u][v]
    }

    /// Neighbors of vertex `v`
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adj_list[v]
    }

    /// Whether color `c` may be assigned to vertex `v`
    #[inline]
    pub fn is_allowed(&self, v: usize, c: usize) -> bool {
        self.allowed[v][c]
    }

    /// Allow-mask row of vertex `v`
    #[inline]
    pub fn allowed_row(&self, v: usize) -> &[bool] {
        &self.allowed[v]
    }

    /// Spill cost of vertex `v`
    #[inline]
    pub fn spill_cost(&self, v: usize) -> f64 {
        self.spill_costs[v]
    }

    /// Number of undirected edges
    pub fn num_edges(&self) -> usize {
        self.adj_list.iter().map(|l| l.len()).sum::<usize>() / 2
    }

    /// Degree of vertex `v`
    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.adj_list[v].len()
    }

    /// Parse an instance from a DIMACS `.col` file.
    ///
    /// Recognized lines: `c` comments, one `p edge <vertices> <edges>`
    /// header, and `e <u> <v>` edge lines with 1-indexed endpoints.
    /// Duplicate and mirrored edge lines are tolerated.
    pub fn from_file<P: AsRef<Path>>(path: P, num_colors: usize) -> Result<Self, EngineError> {
        let name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut adjacency: Option<Vec<Vec<bool>>> = None;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let lineno = lineno + 1;

            if line.is_empty() || line.starts_with('c') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('p') {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() < 2 || parts[0] != "edge" {
                    return Err(EngineError::Parse {
                        line: lineno,
                        message: format!("expected 'p edge <n> <m>', got '{}'", line),
                    });
                }
                let n: usize = parts[1].parse().map_err(|_| EngineError::Parse {
                    line: lineno,
                    message: format!("invalid vertex count '{}'", parts[1]),
                })?;
                adjacency = Some(vec![vec![false; n]; n]);
                continue;
            }

            if let Some(rest) = line.strip_prefix('e') {
                let adj = adjacency.as_mut().ok_or(EngineError::Parse {
                    line: lineno,
                    message: "edge line before problem line".to_string(),
                })?;
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() < 2 {
                    return Err(EngineError::Parse {
                        line: lineno,
                        message: format!("expected 'e <u> <v>', got '{}'", line),
                    });
                }
                let u: usize = parts[0].parse().map_err(|_| EngineError::Parse {
                    line: lineno,
                    message: format!("invalid endpoint '{}'", parts[0]),
                })?;
                let v: usize = parts[1].parse().map_err(|_| EngineError::Parse {
                    line: lineno,
                    message: format!("invalid endpoint '{}'", parts[1]),
                })?;
                let n = adj.len();
                if u == 0 || v == 0 || u > n || v > n {
                    return Err(EngineError::Parse {
                        line: lineno,
                        message: format!("endpoint out of range in '{}'", line),
                    });
                }
                if u != v {
                    adj[u - 1][v - 1] = true;
                    adj[v - 1][u - 1] = true;
                }
                continue;
            }
        }

        match adjacency {
            Some(adj) => Self::from_adjacency(&name, adj, num_colors),
            None => Err(EngineError::Parse {
                line: 0,
                message: "missing problem line".to_string(),
            }),
        }
    }

    /// Generate a seeded Erdős–Rényi random graph with the given edge
    /// density in [0, 1].
    pub fn random(name: &str, n: usize, num_colors: usize, density: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut adjacency = vec![vec![false; n]; n];
        for u in 0..n {
            for v in u + 1..n {
                if rng.gen::<f64>() < density {
                    adjacency[u][v] = true;
                    adjacency[v][u] = true;
                }
            }
        }
        let adj_list = Self::build_adj_list(&adjacency);
        ColoringInstance {
            name: name.to_string(),
            num_vertices: n,
            num_colors,
            adjacency,
            adj_list,
            allowed: vec![vec![true; num_colors]; n],
            spill_costs: vec![1.0; n],
        }
    }

    /// Generate the cycle graph C_n.
    pub fn cycle(n: usize, num_colors: usize) -> Self {
        let mut adjacency = vec![vec![false; n]; n];
        if n >= 2 {
            for v in 0..n {
                let w = (v + 1) % n;
                if v != w {
                    adjacency[v][w] = true;
                    adjacency[w][v] = true;
                }
            }
        }
        let adj_list = Self::build_adj_list(&adjacency);
        ColoringInstance {
            name: format!("cycle-{}", n),
            num_vertices: n,
            num_colors,
            adjacency,
            adj_list,
            allowed: vec![vec![true; num_colors]; n],
            spill_costs: vec![1.0; n],
        }
    }

    /// Generate the complete graph K_n.
    pub fn complete(n: usize, num_colors: usize) -> Self {
        let mut adjacency = vec![vec![false; n]; n];
        for u in 0..n {
            for v in 0..n {
                adjacency[u][v] = u != v;
            }
        }
        let adj_list = Self::build_adj_list(&adjacency);
        ColoringInstance {
            name: format!("complete-{}", n),
            num_vertices: n,
            num_colors,
            adjacency,
            adj_list,
            allowed: vec![vec![true; num_colors]; n],
            spill_costs: vec![1.0; n],
        }
    }

    /// Restrict the instance to the vertices in `keep` (in order).
    ///
    /// Allow-mask rows and spill costs follow their vertices. Used by the
    /// iterated spilling driver after a vertex is sent to memory.
    pub fn induced_subgraph(&self, keep: &[usize]) -> ColoringInstance {
        let n = keep.len();
        let mut adjacency = vec![vec![false; n]; n];
        for (i, &u) in keep.iter().enumerate() {
            for (j, &v) in keep.iter().enumerate() {
                adjacency[i][j] = self.adjacency[u][v];
            }
        }
        let adj_list = Self::build_adj_list(&adjacency);
        ColoringInstance {
            name: self.name.clone(),
            num_vertices: n,
            num_colors: self.num_colors,
            adjacency,
            adj_list,
            allowed: keep.iter().map(|&v| self.allowed[v].clone()).collect(),
            spill_costs: keep.iter().map(|&v| self.spill_costs[v]).collect(),
        }
    }

    /// Vertices whose allow-mask row is entirely false. These can never be
    /// colored and should be spilled before a session starts.
    pub fn forced_spill_vertices(&self) -> Vec<usize> {
        (0..self.num_vertices)
            .filter(|&v| !self.allowed[v].iter().any(|&a| a))
            .collect()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let degrees: Vec<usize> = (0..self.num_vertices).map(|v| self.degree(v)).collect();
        let min_degree = degrees.iter().min().copied().unwrap_or(0);
        let max_degree = degrees.iter().max().copied().unwrap_or(0);
        let avg_degree = if self.num_vertices > 0 {
            degrees.iter().sum::<usize>() as f64 / self.num_vertices as f64
        } else {
            0.0
        };
        let density = if self.num_vertices > 1 {
            2.0 * self.num_edges() as f64
                / (self.num_vertices as f64 * (self.num_vertices as f64 - 1.0))
        } else {
            0.0
        };
        let restricted_vertices = (0..self.num_vertices)
            .filter(|&v| self.allowed[v].iter().any(|&a| !a))
            .count();

        InstanceStatistics {
            name: self.name.clone(),
            num_vertices: self.num_vertices,
            num_colors: self.num_colors,
            num_edges: self.num_edges(),
            min_degree,
            max_degree,
            avg_degree,
            density,
            restricted_vertices,
            forced_spills: self.forced_spill_vertices().len(),
            total_spill_cost: self.spill_costs.iter().sum(),
        }
    }
}

/// Statistics about a coloring instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_vertices: usize,
    pub num_colors: usize,
    pub num_edges: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub restricted_vertices: usize,
    pub forced_spills: usize,
    pub total_spill_cost: f64,
}

impl fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Vertices: {}", self.num_vertices)?;
        writeln!(f, "  Edges: {}", self.num_edges)?;
        writeln!(f, "  Colors: {}", self.num_colors)?;
        writeln!(
            f,
            "  Degree: min {} / avg {:.2} / max {}",
            self.min_degree, self.avg_degree, self.max_degree
        )?;
        writeln!(f, "  Density: {:.4}", self.density)?;
        writeln!(f, "  Restricted vertices: {}", self.restricted_vertices)?;
        writeln!(f, "  Forced spills: {}", self.forced_spills)?;
        writeln!(f, "  Total spill cost: {:.2}", self.total_spill_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges() {
        let inst = ColoringInstance::from_edges("t", 3, &[(0, 1), (1, 2)], 2).unwrap();
        assert_eq!(inst.num_vertices(), 3);
        assert_eq!(inst.num_edges(), 2);
        assert!(inst.are_adjacent(0, 1));
        assert!(inst.are_adjacent(1, 0));
        assert!(!inst.are_adjacent(0, 2));
        assert_eq!(inst.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_rejects_self_loop() {
        let err = ColoringInstance::from_edges("t", 2, &[(1, 1)], 2).unwrap_err();
        assert!(matches!(err, EngineError::SelfLoop { vertex: 1 }));
    }

    #[test]
    fn test_rejects_asymmetric_matrix() {
        let adjacency = vec![
            vec![false, true, false],
            vec![false, false, false],
            vec![false, false, false],
        ];
        let err = ColoringInstance::from_adjacency("t", adjacency, 2).unwrap_err();
        assert!(matches!(err, EngineError::Asymmetric { u: 0, v: 1 }));
    }

    #[test]
    fn test_rejects_bad_mask_shape() {
        let inst = ColoringInstance::from_edges("t", 2, &[(0, 1)], 3).unwrap();
        let err = inst.with_allowed(vec![vec![true; 2]; 2]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DimensionMismatch {
                what: "allow-mask row",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_negative_spill_cost() {
        let inst = ColoringInstance::from_edges("t", 2, &[(0, 1)], 2).unwrap();
        let err = inst.with_spill_costs(vec![1.0, -3.0]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter {
                name: "spill_cost",
                ..
            }
        ));
    }

    #[test]
    fn test_generators() {
        let c5 = ColoringInstance::cycle(5, 3);
        assert_eq!(c5.num_edges(), 5);
        assert!(c5.are_adjacent(4, 0));

        let k4 = ColoringInstance::complete(4, 4);
        assert_eq!(k4.num_edges(), 6);
        assert_eq!(k4.degree(2), 3);

        let empty = ColoringInstance::random("r", 10, 3, 0.0, 7);
        assert_eq!(empty.num_edges(), 0);
        let full = ColoringInstance::random("r", 10, 3, 1.0, 7);
        assert_eq!(full.num_edges(), 45);
    }

    #[test]
    fn test_random_is_seeded() {
        let a = ColoringInstance::random("r", 20, 3, 0.5, 11);
        let b = ColoringInstance::random("r", 20, 3, 0.5, 11);
        for u in 0..20 {
            for v in 0..20 {
                assert_eq!(a.are_adjacent(u, v), b.are_adjacent(u, v));
            }
        }
    }

    #[test]
    fn test_induced_subgraph() {
        // triangle plus a pendant vertex
        let inst = ColoringInstance::from_edges("t", 4, &[(0, 1), (1, 2), (0, 2), (2, 3)], 2)
            .unwrap()
            .with_spill_costs(vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let sub = inst.induced_subgraph(&[0, 2, 3]);
        assert_eq!(sub.num_vertices(), 3);
        assert!(sub.are_adjacent(0, 1)); // old (0, 2)
        assert!(sub.are_adjacent(1, 2)); // old (2, 3)
        assert!(!sub.are_adjacent(0, 2));
        assert_eq!(sub.spill_cost(1), 3.0);
    }

    #[test]
    fn test_forced_spill_vertices() {
        let inst = ColoringInstance::from_edges("t", 3, &[(0, 1)], 2)
            .unwrap()
            .with_allowed(vec![
                vec![true, true],
                vec![false, false],
                vec![false, true],
            ])
            .unwrap();
        assert_eq!(inst.forced_spill_vertices(), vec![1]);
    }

    #[test]
    fn test_dimacs_parsing() {
        let path = std::env::temp_dir().join("aco_regalloc_test_parse.col");
        std::fs::write(
            &path,
            "c a small test graph\np edge 4 4\ne 1 2\ne 2 3\ne 3 4\ne 4 1\n",
        )
        .unwrap();
        let inst = ColoringInstance::from_file(&path, 2).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(inst.num_vertices(), 4);
        assert_eq!(inst.num_edges(), 4);
        assert!(inst.are_adjacent(0, 1));
        assert!(inst.are_adjacent(3, 0));
        assert!(!inst.are_adjacent(0, 2));
    }

    #[test]
    fn test_dimacs_rejects_missing_header() {
        let path = std::env::temp_dir().join("aco_regalloc_test_noheader.col");
        std::fs::write(&path, "e 1 2\n").unwrap();
        let err = ColoringInstance::from_file(&path, 2).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, EngineError::Parse { .. }));
    }
}
