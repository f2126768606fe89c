//! Structural heuristics that read the gate graph of a circuit.
//!
//! Circuits with several outputs are handled as if a virtual AND gate combined all of
//! them; the virtual gate is never added to the circuit.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::order::VarOrder;

/// Which gates in an input's transitive fan-out contribute to its weight.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FanoutWeight {
    /// Every distinct gate reachable from the input.
    #[default]
    AllGates,
    /// Reachable gates that are not outputs, without passing through an output.
    Interior,
    /// Reachable output gates.
    Outputs,
}

fn output_indices(circuit: &Circuit) -> Result<Vec<usize>> {
    let outputs: Vec<usize> = circuit
        .gates()
        .iter()
        .enumerate()
        .filter(|(_, g)| g.is_output)
        .map(|(i, _)| i)
        .collect();
    if outputs.is_empty() {
        return Err(Error::NoOutputs);
    }
    Ok(outputs)
}

/// Stable sort of the primary inputs by descending `score` (indexed by gate).
fn inputs_by_descending(circuit: &Circuit, score: &[usize]) -> VarOrder {
    let mut inputs: Vec<usize> = (0..circuit.len())
        .filter(|&i| circuit.gates()[i].kind.is_input())
        .collect();
    inputs.sort_by_key(|&i| Reverse(score[i]));
    inputs
        .into_iter()
        .map(|i| circuit.gates()[i].name.clone())
        .collect()
}

/// Fan-in depth of every gate (longest path from an input), indexed by gate.
fn fanin_depths(circuit: &Circuit, topological: &[usize]) -> Vec<usize> {
    let gates = circuit.gates();
    let mut depth = vec![0; gates.len()];
    for &i in topological {
        if gates[i].kind.is_input() {
            continue;
        }
        depth[i] = gates[i]
            .fanin
            .iter()
            .filter_map(|f| circuit.index_of(f.name()))
            .map(|j| depth[j] + 1)
            .max()
            .unwrap_or(0);
    }
    depth
}

/// Inputs reached deepest below the output come first.
///
/// Depth is counted from the output downwards: the output has depth 1, a gate one
/// level below its deepest consumer, and an input sits at the depth of its deepest
/// consumer. With several outputs, the virtual root has depth 1. Inputs that no
/// output depends on get depth 0. Ties keep declaration order.
pub fn fanin_depth(circuit: &Circuit) -> Result<VarOrder> {
    let topological = circuit.topological_order()?;
    let outputs = output_indices(circuit)?;
    let gates = circuit.gates();

    let mut depth: Vec<Option<usize>> = vec![None; gates.len()];
    if outputs.len() == 1 {
        depth[outputs[0]] = Some(1);
    } else {
        for &o in &outputs {
            depth[o] = Some(if gates[o].kind.is_input() { 1 } else { 2 });
        }
    }

    for &i in topological.iter().rev() {
        let Some(d) = depth[i] else {
            continue;
        };
        for f in &gates[i].fanin {
            let Some(j) = circuit.index_of(f.name()) else {
                continue;
            };
            let dj = if gates[j].kind.is_input() { d } else { d + 1 };
            depth[j] = Some(depth[j].map_or(dj, |old| old.max(dj)));
        }
    }

    let score: Vec<usize> = depth.into_iter().map(|d| d.unwrap_or(0)).collect();
    debug!(
        "fanin-depth: deepest input at depth {}",
        score.iter().copied().max().unwrap_or(0)
    );
    Ok(inputs_by_descending(circuit, &score))
}

/// Inputs in the order a depth-first walk from the output first reaches them.
///
/// At every gate, fan-ins are visited in descending fan-in depth (ties keep fan-in
/// order), and each gate is visited at most once. Inputs the walk never reaches follow
/// in declaration order.
pub fn fanin_dfs(circuit: &Circuit) -> Result<VarOrder> {
    let topological = circuit.topological_order()?;
    let outputs = output_indices(circuit)?;
    let gates = circuit.gates();
    let depth = fanin_depths(circuit, &topological);

    let sorted_by_depth = |mut xs: Vec<usize>| {
        xs.sort_by_key(|&j| Reverse(depth[j]));
        xs
    };
    let predecessors = |i: usize| {
        let mut seen = HashSet::new();
        let preds = gates[i]
            .fanin
            .iter()
            .filter_map(|f| circuit.index_of(f.name()))
            .filter(|&j| seen.insert(j))
            .collect();
        sorted_by_depth(preds)
    };

    let mut visited = vec![false; gates.len()];
    let mut order = Vec::new();
    // Each frame is a gate's remaining predecessors and the next one to look at.
    let mut stack: Vec<(Vec<usize>, usize)> = Vec::new();

    let mut next = None;
    if outputs.len() == 1 {
        next = Some(outputs[0]);
    } else {
        stack.push((sorted_by_depth(outputs), 0));
    }

    loop {
        if let Some(i) = next.take() {
            visited[i] = true;
            if gates[i].kind.is_input() {
                order.push(i);
            } else {
                stack.push((predecessors(i), 0));
            }
        }
        let Some((preds, pos)) = stack.last_mut() else {
            break;
        };
        if *pos < preds.len() {
            let w = preds[*pos];
            *pos += 1;
            if !visited[w] {
                next = Some(w);
            }
        } else {
            stack.pop();
        }
    }

    debug!("fanin-dfs: reached {} inputs from the output", order.len());
    for (i, gate) in gates.iter().enumerate() {
        if gate.kind.is_input() && !visited[i] {
            order.push(i);
        }
    }

    Ok(order.into_iter().map(|i| gates[i].name.clone()).collect())
}

/// Inputs with the heaviest transitive fan-out come first; ties keep declaration order.
pub fn weighted_fanout(circuit: &Circuit, weight: FanoutWeight) -> Result<VarOrder> {
    circuit.topological_order()?;
    let gates = circuit.gates();
    let consumers = circuit.consumers();

    let mut score = vec![0; gates.len()];
    for (i, gate) in gates.iter().enumerate() {
        if !gate.kind.is_input() {
            continue;
        }
        score[i] = match weight {
            FanoutWeight::AllGates => circuit.reach(i, &consumers).len(),
            FanoutWeight::Outputs => circuit
                .reach(i, &consumers)
                .into_iter()
                .filter(|&j| gates[j].is_output)
                .count(),
            FanoutWeight::Interior => {
                if gate.is_output {
                    0
                } else {
                    interior_reach(circuit, i, &consumers)
                }
            }
        };
    }

    Ok(inputs_by_descending(circuit, &score))
}

/// Number of non-output gates reachable from `start` without passing through outputs.
fn interior_reach(circuit: &Circuit, start: usize, consumers: &[Vec<usize>]) -> usize {
    let gates = circuit.gates();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut count = 0;
    while let Some(i) = queue.pop_front() {
        for &j in &consumers[i] {
            if gates[j].is_output || !visited.insert(j) {
                continue;
            }
            count += 1;
            queue.push_back(j);
        }
    }
    count
}
