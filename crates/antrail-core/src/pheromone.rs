//! Pheromone intensity lookup for rendering.

use crate::trace::OptimizationTrace;
use crate::types::{EdgeKey, NodeId};

/// Intensity reported for edges with no recorded pheromone.
pub const BASELINE_INTENSITY: f64 = 1.0;

/// Pheromone on the `from`-`to` edge at the given iteration.
///
/// Order-independent. Falls back to [`BASELINE_INTENSITY`] when there is
/// no trace, the index is out of range, or the edge was never deposited on.
/// A recorded level of zero is returned as zero.
pub fn intensity(
    trace: Option<&OptimizationTrace>,
    iteration_index: usize,
    from: &NodeId,
    to: &NodeId,
) -> f64 {
    intensity_for_key(trace, iteration_index, &EdgeKey::between(from, to))
}

pub fn intensity_for_key(
    trace: Option<&OptimizationTrace>,
    iteration_index: usize,
    key: &EdgeKey,
) -> f64 {
    trace
        .and_then(|t| t.iteration(iteration_index))
        .and_then(|snapshot| snapshot.pheromone(key))
        .unwrap_or(BASELINE_INTENSITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::IterationSnapshot;
    use crate::types::Distance;
    use std::collections::BTreeMap;

    fn trace_with(levels: &[(&str, &str, f64)]) -> OptimizationTrace {
        let pheromone_levels: BTreeMap<_, _> = levels
            .iter()
            .map(|(a, b, v)| (EdgeKey::new(*a, *b), *v))
            .collect();
        OptimizationTrace {
            best_path: vec!["A".into(), "B".into()],
            distance: Distance::Finite(1.0),
            iterations: vec![IterationSnapshot {
                iteration: 1,
                best_distance: Distance::Finite(1.0),
                best_path: vec!["A".into(), "B".into()],
                paths: vec![],
                pheromone_levels,
            }],
            total_iterations: Some(1),
            ants_per_iteration: None,
        }
    }

    #[test]
    fn lookup_ignores_direction() {
        let trace = trace_with(&[("A", "B", 4.0)]);
        let (a, b) = (NodeId::from("A"), NodeId::from("B"));
        assert_eq!(intensity(Some(&trace), 0, &a, &b), 4.0);
        assert_eq!(intensity(Some(&trace), 0, &b, &a), 4.0);
    }

    #[test]
    fn falls_back_to_baseline() {
        let trace = trace_with(&[("A", "B", 4.0)]);
        let (a, c) = (NodeId::from("A"), NodeId::from("C"));
        assert_eq!(intensity(None, 0, &a, &c), BASELINE_INTENSITY);
        assert_eq!(intensity(Some(&trace), 7, &a, &c), BASELINE_INTENSITY);
        assert_eq!(intensity(Some(&trace), 0, &a, &c), BASELINE_INTENSITY);
    }

    #[test]
    fn zero_is_not_replaced() {
        let trace = trace_with(&[("A", "B", 0.0)]);
        assert_eq!(
            intensity(Some(&trace), 0, &NodeId::from("B"), &NodeId::from("A")),
            0.0
        );
    }
}
