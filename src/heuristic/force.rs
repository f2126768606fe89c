//! FORCE: iterative center-of-gravity placement.
//!
//! Every iteration moves each hyperedge to the mean position of its members, moves each
//! node to the mean of its hyperedges' centers, and re-ranks the nodes. The loop stops
//! when the ranking no longer changes or after the iteration bound. The best order seen
//! (by total span) is returned, and the starting order is one of the candidates.

use std::collections::HashMap;

use log::debug;

use crate::formula::Variable;
use crate::hypergraph::Hypergraph;
use crate::order::VarOrder;

#[derive(Debug, Clone, Default)]
pub struct ForceConfig {
    /// Iteration bound; `None` means `ceil(5 * ln(n))` for `n` nodes.
    pub max_iterations: Option<usize>,
}

impl ForceConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// `ceil(5 * ln(n))`, or 0 when there is nothing to reorder.
pub fn default_iteration_bound(n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    (5.0 * (n as f64).ln()).ceil() as usize
}

#[derive(Debug, Clone)]
pub struct ForceResult {
    pub order: VarOrder,
    /// Number of re-ranking iterations performed.
    pub iterations: usize,
    pub initial_span: usize,
    pub span: usize,
}

/// Sum over hyperedges of `max - min` member position; `position` is indexed by node.
fn span(hypergraph: &Hypergraph, position: &[usize]) -> usize {
    hypergraph
        .edge_members()
        .filter_map(|members| {
            let min = members.iter().map(|&m| position[m]).min()?;
            let max = members.iter().map(|&m| position[m]).max()?;
            Some(max - min)
        })
        .sum()
}

fn positions(order: &[usize]) -> Vec<usize> {
    let mut position = vec![0; order.len()];
    for (rank, &node) in order.iter().enumerate() {
        position[node] = rank;
    }
    position
}

/// Nodes sorted by ascending tentative location; equal locations keep node order.
fn rank_by_value(value: &[f64]) -> Vec<usize> {
    let mut nodes: Vec<usize> = (0..value.len()).collect();
    nodes.sort_by(|&a, &b| value[a].total_cmp(&value[b]));
    nodes
}

/// Total span of `order` over the hyperedges of `hypergraph`.
///
/// Variables of `order` that are not nodes of the hypergraph are ignored; nodes missing
/// from `order` are placed after it.
pub fn total_span(hypergraph: &Hypergraph, order: &[Variable]) -> usize {
    let rank: HashMap<&Variable, usize> = order.iter().enumerate().map(|(i, v)| (v, i)).collect();
    let position: Vec<usize> = hypergraph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, v)| rank.get(v).copied().unwrap_or(order.len() + i))
        .collect();
    span(hypergraph, &position)
}

/// Run FORCE starting from the hypergraph's node order.
pub fn force_with_stats(hypergraph: &Hypergraph, config: &ForceConfig) -> ForceResult {
    let n = hypergraph.num_nodes();
    let bound = config
        .max_iterations
        .unwrap_or_else(|| default_iteration_bound(n));

    let mut current: Vec<usize> = (0..n).collect();
    let mut position = positions(&current);
    let initial_span = span(hypergraph, &position);
    let mut best = current.clone();
    let mut best_span = initial_span;

    let mut iterations = 0;
    while iterations < bound {
        iterations += 1;

        let cog: Vec<Option<f64>> = hypergraph
            .edge_members()
            .map(|members| {
                if members.is_empty() {
                    return None;
                }
                let sum: usize = members.iter().map(|&m| position[m]).sum();
                Some(sum as f64 / members.len() as f64)
            })
            .collect();

        let value: Vec<f64> = (0..n)
            .map(|v| {
                let centers: Vec<f64> = hypergraph
                    .incident_edges(v)
                    .iter()
                    .filter_map(|&e| cog[e])
                    .collect();
                if centers.is_empty() {
                    position[v] as f64
                } else {
                    centers.iter().sum::<f64>() / centers.len() as f64
                }
            })
            .collect();

        let next = rank_by_value(&value);
        if next == current {
            debug!("force: converged after {} iterations", iterations);
            break;
        }

        current = next;
        position = positions(&current);
        let s = span(hypergraph, &position);
        debug!("force: iteration {} has span {}", iterations, s);
        if s < best_span {
            best = current.clone();
            best_span = s;
        }
    }

    let nodes = hypergraph.nodes();
    ForceResult {
        order: best.into_iter().map(|i| nodes[i].clone()).collect(),
        iterations,
        initial_span,
        span: best_span,
    }
}

pub fn force(hypergraph: &Hypergraph, config: &ForceConfig) -> VarOrder {
    force_with_stats(hypergraph, config).order
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn hypergraph(nodes: &[&str], edges: &[&[&str]]) -> Hypergraph {
        let mut hg = Hypergraph::new();
        for &x in nodes {
            hg.add_node(x).unwrap();
        }
        for (i, &members) in edges.iter().enumerate() {
            hg.add_hyperedge(format!("e{}", i), members.iter().copied()).unwrap();
        }
        hg
    }

    #[test]
    fn test_ties_follow_node_order() {
        assert_eq!(rank_by_value(&[1.0, 0.5, 1.0, 0.5]), [1, 3, 0, 2]);
        assert_eq!(rank_by_value(&[2.0, 2.0, 2.0]), [0, 1, 2]);
    }

    #[test]
    fn test_iteration_bound() {
        assert_eq!(default_iteration_bound(0), 0);
        assert_eq!(default_iteration_bound(1), 0);
        assert_eq!(default_iteration_bound(2), 4);
        assert_eq!(default_iteration_bound(3), 6);
        assert_eq!(default_iteration_bound(100), 24);
    }

    #[test]
    fn test_untangles_chain() {
        let hg = hypergraph(&["a", "c", "b"], &[&["a", "b"], &["b", "c"]]);
        let result = force_with_stats(&hg, &ForceConfig::default());
        let names: Vec<&str> = result.order.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(result.initial_span, 3);
        assert_eq!(result.span, 2);
        assert_eq!(result.iterations, 2);
        assert_eq!(total_span(&hg, &result.order), 2);
    }

    #[test]
    fn test_isolated_nodes_keep_position() {
        let hg = hypergraph(&["x", "y", "z"], &[]);
        let result = force_with_stats(&hg, &ForceConfig::default());
        let names: Vec<&str> = result.order.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["x", "y", "z"]);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_zero_iterations() {
        let hg = hypergraph(&["a", "c", "b"], &[&["a", "b"], &["b", "c"]]);
        let result = force_with_stats(&hg, &ForceConfig::default().with_max_iterations(0));
        let names: Vec<&str> = result.order.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["a", "c", "b"]);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_never_worse_than_initial() {
        let nodes: Vec<String> = (0..12).map(|i| format!("v{}", i)).collect();
        let mut hg = Hypergraph::new();
        for x in &nodes {
            hg.add_node(x.as_str()).unwrap();
        }
        for i in 0..12 {
            let a = &nodes[i];
            let b = &nodes[(i * 5 + 1) % 12];
            if a != b {
                hg.add_hyperedge(format!("e{}", i), [a, b]).unwrap();
            }
        }
        let result = force_with_stats(&hg, &ForceConfig::default());
        assert!(result.span <= result.initial_span);
        assert!(result.iterations <= default_iteration_bound(12));
        assert_eq!(total_span(&hg, &result.order), result.span);
    }
}
