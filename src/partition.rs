//! Recursive balanced bisection of hypergraphs (MINCE).
//!
//! [`mince`] splits the node set with a [`Partitioner`], recurses into both halves and
//! concatenates the resulting orders. The built-in partitioner, [`BalancedMinCut`],
//! enumerates balanced candidate cuts and keeps the one crossed by the fewest
//! hyperedges.
//!
//! # Enumeration order
//!
//! Ties between equally good cuts go to the first candidate found, so the enumeration
//! order is part of the result:
//!
//! - pivots are taken in node order; a candidate for pivot `i` never contains node `i`,
//! - for each pivot, sizes ascend through the allowed window,
//! - for each size, subsets come in lexicographic order of node positions,
//! - a candidate replaces the current best only if its cut is strictly smaller.
//!
//! Subsets already produced under an earlier pivot are not produced again, which does
//! not change the winner.
//!
//! # Cut edges
//!
//! With [`CutEdgePolicy::Retain`], a hyperedge crossing the cut is kept in every half it
//! touches, with its full member list. Members outside the half behave like fixed
//! external terminals: they always count as "outside" when the half is cut again.
//! [`CutEdgePolicy::Drop`] removes crossing hyperedges from both halves instead.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::formula::Variable;
use crate::hypergraph::Hypergraph;
use crate::order::VarOrder;

/// Number of candidate cuts between two deadline checks.
const DEADLINE_POLL_INTERVAL: u64 = 1 << 12;

/// Which subset sizes are considered as cut candidates.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CandidatePolicy {
    /// Every balanced size, `ceil(n/3) ..= floor(2n/3)`.
    Exhaustive,
    /// Sizes `n/3 ..= n/2 + 1`, intersected with the balanced window.
    #[default]
    Restricted,
}

impl CandidatePolicy {
    /// Candidate sizes for a subproblem of `n` nodes.
    pub fn sizes(&self, n: usize) -> RangeInclusive<usize> {
        let lo = n.div_ceil(3);
        let hi = 2 * n / 3;
        match self {
            CandidatePolicy::Exhaustive => lo..=hi,
            CandidatePolicy::Restricted => lo.max(n / 3)..=hi.min(n / 2 + 1),
        }
    }
}

/// What happens to hyperedges that cross a cut.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CutEdgePolicy {
    #[default]
    Retain,
    Drop,
}

#[derive(Debug, Clone, Default)]
pub struct PartitionConfig {
    pub candidates: CandidatePolicy,
    pub cut_edges: CutEdgePolicy,
    /// Wall-clock budget for the whole recursive bisection.
    pub timeout: Option<Duration>,
}

impl PartitionConfig {
    pub fn with_candidates(mut self, candidates: CandidatePolicy) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_cut_edges(mut self, cut_edges: CutEdgePolicy) -> Self {
        self.cut_edges = cut_edges;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A part of the hypergraph being bisected: some of its nodes and the hyperedges that
/// still constrain them.
#[derive(Debug, Clone)]
pub struct Subproblem<'a> {
    hypergraph: &'a Hypergraph,
    nodes: Vec<usize>,
    edges: Vec<usize>,
}

impl<'a> Subproblem<'a> {
    /// The whole hypergraph.
    pub fn root(hypergraph: &'a Hypergraph) -> Self {
        Self {
            hypergraph,
            nodes: (0..hypergraph.num_nodes()).collect(),
            edges: (0..hypergraph.num_hyperedges()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in their order within the subproblem.
    pub fn nodes(&self) -> impl Iterator<Item = &'a Variable> + '_ {
        let names = self.hypergraph.nodes();
        self.nodes.iter().map(move |&n| &names[n])
    }

    /// Hyperedges as lists of member positions within [`nodes`][Self::nodes];
    /// `None` marks a member outside the subproblem.
    pub fn hyperedges(&self) -> Vec<Vec<Option<usize>>> {
        let mut local = vec![None; self.hypergraph.num_nodes()];
        for (pos, &n) in self.nodes.iter().enumerate() {
            local[n] = Some(pos);
        }
        self.edges
            .iter()
            .map(|&e| {
                self.hypergraph
                    .edge_members_at(e)
                    .iter()
                    .map(|&m| local[m])
                    .collect()
            })
            .collect()
    }

    /// Number of hyperedges with members both inside and outside `cut`.
    pub fn cut_size(&self, cut: &[usize]) -> usize {
        let mut inside = vec![false; self.nodes.len()];
        for &pos in cut {
            inside[pos] = true;
        }
        cut_size(&self.hyperedges(), &inside)
    }

    /// Split into the side made of `cut` (positions) and its complement.
    fn split(&self, cut: &[usize], policy: CutEdgePolicy) -> (Subproblem<'a>, Subproblem<'a>) {
        let mut inside = vec![false; self.nodes.len()];
        for &pos in cut {
            inside[pos] = true;
        }
        let left: Vec<usize> = cut.iter().map(|&pos| self.nodes[pos]).collect();
        let right: Vec<usize> = (0..self.nodes.len())
            .filter(|&pos| !inside[pos])
            .map(|pos| self.nodes[pos])
            .collect();
        (self.side(left, policy), self.side(right, policy))
    }

    fn side(&self, nodes: Vec<usize>, policy: CutEdgePolicy) -> Subproblem<'a> {
        let mut member = vec![false; self.hypergraph.num_nodes()];
        for &n in &nodes {
            member[n] = true;
        }
        let edges = self
            .edges
            .iter()
            .copied()
            .filter(|&e| {
                let members = self.hypergraph.edge_members_at(e);
                match policy {
                    CutEdgePolicy::Retain => members.iter().any(|&m| member[m]),
                    CutEdgePolicy::Drop => members.iter().all(|&m| member[m]),
                }
            })
            .collect();
        Subproblem {
            hypergraph: self.hypergraph,
            nodes,
            edges,
        }
    }
}

fn cut_size(edges: &[Vec<Option<usize>>], inside: &[bool]) -> usize {
    edges
        .iter()
        .filter(|members| {
            let mut any_in = false;
            let mut any_out = false;
            for m in members.iter() {
                match m {
                    Some(pos) if inside[*pos] => any_in = true,
                    _ => any_out = true,
                }
            }
            any_in && any_out
        })
        .count()
}

/// A bisection of a subproblem.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cut {
    /// Positions (within the subproblem) of the nodes on the first side, ascending.
    pub inside: Vec<usize>,
    /// Number of hyperedges crossing the cut.
    pub size: usize,
}

/// Backend that splits one subproblem into two balanced sides.
pub trait Partitioner {
    /// Bisect `sub`, which has at least two nodes.
    fn bisect(&self, sub: &Subproblem) -> Result<Cut>;
}

/// Exact (within its candidate window) balanced min-cut search.
#[derive(Debug, Clone, Default)]
pub struct BalancedMinCut {
    pub candidates: CandidatePolicy,
    pub deadline: Option<Instant>,
}

impl BalancedMinCut {
    pub fn new(candidates: CandidatePolicy) -> Self {
        Self {
            candidates,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Partitioner for BalancedMinCut {
    fn bisect(&self, sub: &Subproblem) -> Result<Cut> {
        let n = sub.len();
        assert!(n >= 2, "bisection needs at least two nodes");

        let sizes = self.candidates.sizes(n);
        let edges = sub.hyperedges();
        let mut inside = vec![false; n];
        let mut best: Option<Cut> = None;
        let mut evaluated = 0u64;

        for pivot in 0..n {
            // Subsets missing any earlier node were produced under that node's pivot.
            let prefix: Vec<usize> = (0..pivot).collect();
            let pool: Vec<usize> = (pivot + 1..n).collect();

            for size in sizes.clone() {
                let Some(k) = size.checked_sub(prefix.len()) else {
                    continue;
                };
                if k > pool.len() {
                    continue;
                }

                let mut comb: Vec<usize> = (0..k).collect();
                loop {
                    evaluated += 1;
                    if evaluated % DEADLINE_POLL_INTERVAL == 0 {
                        if let Some(deadline) = self.deadline {
                            if Instant::now() >= deadline {
                                debug!("bisection timed out after {} candidates", evaluated);
                                return Err(Error::Timeout);
                            }
                        }
                    }

                    inside.fill(false);
                    for &p in &prefix {
                        inside[p] = true;
                    }
                    for &c in &comb {
                        inside[pool[c]] = true;
                    }
                    let size = cut_size(&edges, &inside);
                    if best.as_ref().map_or(true, |b| size < b.size) {
                        let members = prefix.iter().copied().chain(comb.iter().map(|&c| pool[c]));
                        let cut = Cut {
                            inside: members.collect(),
                            size,
                        };
                        // Nothing beats an empty cut.
                        if size == 0 {
                            return Ok(cut);
                        }
                        best = Some(cut);
                    }

                    if !next_combination(&mut comb, pool.len()) {
                        break;
                    }
                }
            }
        }

        trace!("evaluated {} candidate cuts over {} nodes", evaluated, n);
        best.ok_or_else(|| {
            Error::ResourceExhausted(format!("no balanced cut of {} nodes in sizes {:?}", n, sizes))
        })
    }
}

/// Advance `comb` (ascending indices into `0..n`) to the next combination in
/// lexicographic order. Returns `false` after the last one.
fn next_combination(comb: &mut [usize], n: usize) -> bool {
    let k = comb.len();
    let Some(i) = (0..k).rev().find(|&i| comb[i] < n - k + i) else {
        return false;
    };
    comb[i] += 1;
    for j in i + 1..k {
        comb[j] = comb[j - 1] + 1;
    }
    true
}

/// `n/3 <= k <= 2n/3`, and both sides non-empty.
pub fn is_balanced(k: usize, n: usize) -> bool {
    k > 0 && k < n && 3 * k >= n && 3 * k <= 2 * n
}

/// Order the nodes of `hypergraph` by recursive balanced bisection.
pub fn mince(hypergraph: &Hypergraph, config: &PartitionConfig) -> Result<VarOrder> {
    let deadline = config.timeout.map(|t| Instant::now() + t);
    let partitioner = BalancedMinCut::new(config.candidates).with_deadline(deadline);
    bisection_order(hypergraph, &partitioner, config.cut_edges)
}

/// Order the nodes of `hypergraph` by recursive bisection with any [`Partitioner`].
pub fn bisection_order<P: Partitioner>(
    hypergraph: &Hypergraph,
    partitioner: &P,
    cut_edges: CutEdgePolicy,
) -> Result<VarOrder> {
    let mut order = Vec::with_capacity(hypergraph.num_nodes());
    recurse(&Subproblem::root(hypergraph), partitioner, cut_edges, 0, &mut order)?;
    Ok(VarOrder::new(order))
}

fn recurse<P: Partitioner>(
    sub: &Subproblem,
    partitioner: &P,
    cut_edges: CutEdgePolicy,
    depth: usize,
    order: &mut Vec<Variable>,
) -> Result<()> {
    if sub.len() <= 1 {
        order.extend(sub.nodes().cloned());
        return Ok(());
    }

    let cut = partitioner.bisect(sub)?;
    let n = sub.len();
    if !is_balanced(cut.inside.len(), n) {
        return Err(Error::MalformedOrdering(format!(
            "partitioner returned an unbalanced cut of {} out of {} nodes",
            cut.inside.len(),
            n
        )));
    }

    let (left, right) = sub.split(&cut.inside, cut_edges);
    debug!(
        "depth {}: cut {} | {} crossed by {} hyperedges",
        depth,
        left.len(),
        right.len(),
        cut.size
    );
    recurse(&left, partitioner, cut_edges, depth + 1, order)?;
    recurse(&right, partitioner, cut_edges, depth + 1, order)
}
