//! Order-then-compile measurements for comparing heuristics on one circuit.

use std::time::{Duration, Instant};

use log::{info, warn};

use crate::circuit::Circuit;
use crate::compile::{compile, CompileConfig};
use crate::error::Result;
use crate::formula::Variable;
use crate::heuristic::{Heuristic, OrderInput};
use crate::order::VarOrder;
use crate::transform::circuit_to_cnf;

#[derive(Debug, Clone)]
pub struct Measurement {
    pub order: VarOrder,
    pub ordering_time: Duration,
    pub compile_time: Duration,
    /// Nodes reachable from the output roots, including the terminal.
    pub size: usize,
    /// All nodes the manager created.
    pub num_nodes: usize,
}

/// Order `input` with `heuristic`, then compile `circuit` under that order.
///
/// `input` is usually the circuit itself, or a formula derived from it. The order is
/// restricted to the circuit inputs before compiling, so derived variables (gate
/// variables of a Tseitin encoding) are dropped.
pub fn measure<'a>(
    heuristic: &Heuristic,
    input: impl Into<OrderInput<'a>>,
    circuit: &Circuit,
    config: &CompileConfig,
) -> Result<Measurement> {
    let input = input.into();
    let expected = input.variables();
    let start = Instant::now();
    let order = checked(heuristic.order(input)?, &expected, &circuit.inputs())?;
    let ordering_time = start.elapsed();

    let start = Instant::now();
    let compiled = compile(circuit, &order, config)?;
    let compile_time = start.elapsed();

    let measurement = Measurement {
        order,
        ordering_time,
        compile_time,
        size: compiled.size(),
        num_nodes: compiled.bdd.num_nodes(),
    };
    info!(
        "{}: size {} ({} nodes), ordered in {:?}, compiled in {:?}",
        heuristic,
        measurement.size,
        measurement.num_nodes,
        measurement.ordering_time,
        measurement.compile_time
    );
    Ok(measurement)
}

/// Order a circuit with any heuristic.
///
/// Heuristics that read clauses see the Tseitin encoding of the circuit; the result is
/// restricted to the circuit inputs.
pub fn circuit_order(heuristic: &Heuristic, circuit: &Circuit) -> Result<VarOrder> {
    let inputs = circuit.inputs();
    if heuristic.needs_clauses() {
        let cnf = circuit_to_cnf(circuit)?;
        checked(heuristic.order(&cnf)?, &cnf.variables(), &inputs)
    } else {
        checked(heuristic.order(circuit)?, &inputs, &inputs)
    }
}

/// Check that `order` is a permutation of `expected`, then restrict it to `inputs`.
fn checked(order: VarOrder, expected: &[Variable], inputs: &[Variable]) -> Result<VarOrder> {
    order.validate(expected)?;
    Ok(order.restrict_to(inputs))
}

/// Measure every heuristic on `circuit`. A failing heuristic yields its error and does
/// not stop the others.
pub fn compare(
    heuristics: &[Heuristic],
    circuit: &Circuit,
    config: &CompileConfig,
) -> Vec<(Heuristic, Result<Measurement>)> {
    let cnf = heuristics
        .iter()
        .any(Heuristic::needs_clauses)
        .then(|| circuit_to_cnf(circuit));

    heuristics
        .iter()
        .map(|h| {
            let result = match (&cnf, h.needs_clauses()) {
                (Some(Ok(f)), true) => measure(h, f, circuit, config),
                (Some(Err(e)), true) => Err(e.clone()),
                _ => measure(h, circuit, circuit, config),
            };
            if let Err(e) = &result {
                warn!("{}: {}", h, e);
            }
            (h.clone(), result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::circuit::GateKind;
    use crate::error::Error;
    use crate::heuristic::FanoutWeight;

    /// out = (a ∧ x) ∨ (b ∧ y) ∨ (c ∧ z)
    fn pairs() -> Circuit {
        let mut c = Circuit::new();
        for v in ["a", "b", "c", "x", "y", "z"] {
            c.add_input(v).unwrap();
        }
        c.add_gate("p", GateKind::And, ["a", "x"], false).unwrap();
        c.add_gate("q", GateKind::And, ["b", "y"], false).unwrap();
        c.add_gate("r", GateKind::And, ["c", "z"], false).unwrap();
        c.add_gate("out", GateKind::Or, ["p", "q", "r"], true).unwrap();
        c
    }

    #[test]
    fn test_measure_input_order() {
        let c = pairs();
        let m = measure(&Heuristic::InputOrder, &c, &c, &CompileConfig::default()).unwrap();
        assert_eq!(m.order.to_string(), "[a, b, c, x, y, z]");
        // a, b, c separated from their partners: exponential in the number of pairs
        assert_eq!(m.size, 15);
        assert!(m.num_nodes >= m.size);
    }

    #[test]
    fn test_structural_heuristic_finds_interleaving() {
        let c = pairs();
        let m = measure(&Heuristic::FaninDfs, &c, &c, &CompileConfig::default()).unwrap();
        assert_eq!(m.order.to_string(), "[a, x, b, y, c, z]");
        assert_eq!(m.size, 7);
    }

    #[test]
    fn test_circuit_order_uses_tseitin_for_clause_heuristics() {
        let c = pairs();
        for h in [Heuristic::OccurrenceCount, Heuristic::Mince(Default::default())] {
            let order = circuit_order(&h, &c).unwrap();
            assert!(order.validate(&c.inputs()).is_ok(), "{}", h);
        }
    }

    #[test]
    fn test_malformed_order_is_not_repaired() {
        let vars: Vec<Variable> = ["a", "b", "t"].into_iter().map(Variable::from).collect();
        let inputs = &vars[..2];

        let order: VarOrder = ["t", "b", "a"].into_iter().map(Variable::from).collect();
        assert_eq!(checked(order, &vars, inputs).unwrap().to_string(), "[b, a]");

        let repeated: VarOrder = ["b", "b", "a", "t"].into_iter().map(Variable::from).collect();
        assert!(matches!(
            checked(repeated, &vars, inputs),
            Err(Error::MalformedOrdering(_))
        ));
        let missing: VarOrder = ["b", "t"].into_iter().map(Variable::from).collect();
        assert!(matches!(
            checked(missing, &vars, inputs),
            Err(Error::MalformedOrdering(_))
        ));
    }

    #[test]
    fn test_compare_reports_per_heuristic() {
        let c = pairs();
        let heuristics = [
            Heuristic::InputOrder,
            Heuristic::WeightedFanout(FanoutWeight::AllGates),
            Heuristic::Force(Default::default()),
        ];
        let results = compare(&heuristics, &c, &CompileConfig::default());
        assert_eq!(results.len(), 3);
        for (h, result) in &results {
            let m = result.as_ref().unwrap();
            assert!(m.order.validate(&c.inputs()).is_ok(), "{}", h);
        }
    }

    #[test]
    fn test_compare_does_not_abort() {
        let mut c = pairs();
        c.add_gate("m", "mux".parse().unwrap(), ["a", "b", "c"], true).unwrap();
        let heuristics = [Heuristic::InputOrder, Heuristic::OccurrenceCount];
        let results = compare(&heuristics, &c, &CompileConfig::default());
        assert_eq!(results.len(), 2);
        for (_, result) in results {
            assert!(matches!(result, Err(Error::UnsupportedGateKind { .. })));
        }
    }
}
