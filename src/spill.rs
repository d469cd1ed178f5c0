//! Conflict-driven spill selection.
//!
//! After a coloring session, the vertex with the highest spill score
//! (residual conflict count scaled by its spill cost) is marked as
//! spilled. One vertex is selected per invocation; the caller removes it
//! from the interference graph and re-colors.

use crate::instance::ColoringInstance;
use crate::solution::Coloring;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Mark the vertex maximizing `conflict_count * spill_cost^importance`
/// as spilled, provided some vertex scores above zero.
///
/// With `importance` = 0 the score is the bare conflict count. Ties go to
/// the lowest vertex index. Returns the spilled vertex, or `None` when
/// the coloring is conflict-free (or every conflicting vertex has a zero
/// score).
pub fn select_spill(
    instance: &ColoringInstance,
    coloring: &mut Coloring,
    importance: f64,
) -> Option<usize> {
    let counts = coloring.conflict_counts(instance);

    let best = counts
        .iter()
        .enumerate()
        .map(|(v, &count)| {
            let mut score = count as f64 * instance.spill_cost(v).powf(importance);
            if !score.is_finite() {
                score = 0.0;
            }
            (v, score)
        })
        .max_by_key(|&(v, score)| (OrderedFloat(score), Reverse(v)))?;

    let (victim, score) = best;
    if score > 0.0 {
        log::debug!("spill selector picks vertex {} (score {:.3})", victim, score);
        coloring.colors[victim] = None;
        coloring.recount(instance);
        Some(victim)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_spill_when_conflict_free() {
        let inst = ColoringInstance::from_edges("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)], 2)
            .unwrap();
        let mut coloring =
            Coloring::from_colors(&inst, vec![Some(0), Some(1), Some(0), Some(1)], "test");
        assert_eq!(select_spill(&inst, &mut coloring, 0.0), None);
        assert_eq!(coloring.num_spilled(), 0);
    }

    #[test]
    fn test_triangle_spills_one_conflicting_vertex() {
        // K3 with two colors: vertices 0 and 1 collide, one of them goes
        let inst = ColoringInstance::from_edges("k3", 3, &[(0, 1), (1, 2), (0, 2)], 2).unwrap();
        let mut coloring =
            Coloring::from_colors(&inst, vec![Some(0), Some(0), Some(1)], "test");

        let victim = select_spill(&inst, &mut coloring, 0.0);
        assert_eq!(victim, Some(0)); // tied scores, lowest index wins
        assert_eq!(coloring.num_spilled(), 1);
        assert_eq!(coloring.conflicting_edges, 0);
        assert_ne!(coloring.colors[1], coloring.colors[2]);
    }

    #[test]
    fn test_highest_conflict_count_wins() {
        // star center collides with all three leaves
        let inst =
            ColoringInstance::from_edges("star", 4, &[(0, 1), (0, 2), (0, 3)], 1).unwrap();
        let mut coloring = Coloring::from_colors(&inst, vec![Some(0); 4], "test");

        assert_eq!(select_spill(&inst, &mut coloring, 0.0), Some(0));
        assert_eq!(coloring.conflicting_edges, 0);
    }

    #[test]
    fn test_spill_cost_breaks_ties() {
        // one edge, one color: both endpoints conflict once, but vertex 0
        // carries ten times the spill cost
        let inst = ColoringInstance::from_edges("pair", 2, &[(0, 1)], 1)
            .unwrap()
            .with_spill_costs(vec![10.0, 1.0])
            .unwrap();
        let mut coloring = Coloring::from_colors(&inst, vec![Some(0), Some(0)], "test");

        assert_eq!(select_spill(&inst, &mut coloring, 1.0), Some(0));
        assert_eq!(coloring.colors[0], None);
        assert_eq!(coloring.colors[1], Some(0));
    }

    #[test]
    fn test_zero_importance_ignores_costs() {
        let inst = ColoringInstance::from_edges("pair", 2, &[(0, 1)], 1)
            .unwrap()
            .with_spill_costs(vec![1.0, 100.0])
            .unwrap();
        let mut coloring = Coloring::from_colors(&inst, vec![Some(0), Some(0)], "test");

        // equal conflict counts, cost ignored: lowest index spills
        assert_eq!(select_spill(&inst, &mut coloring, 0.0), Some(0));
    }

    #[test]
    fn test_spilled_vertices_are_ignored() {
        let inst = ColoringInstance::from_edges("k3", 3, &[(0, 1), (1, 2), (0, 2)], 2).unwrap();
        let mut coloring = Coloring::from_colors(&inst, vec![None, Some(0), Some(1)], "test");
        assert_eq!(select_spill(&inst, &mut coloring, 0.0), None);
    }
}
