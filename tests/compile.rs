use std::collections::HashMap;
use std::time::Duration;

use num_bigint::BigUint;
use test_log::test;

use bdd_order::circuit::{Circuit, GateKind};
use bdd_order::compile::{compile, CompileConfig};
use bdd_order::error::Error;
use bdd_order::evaluate::circuit_order;
use bdd_order::formula::{Formula, Variable};
use bdd_order::heuristic::Heuristic;
use bdd_order::order::VarOrder;
use bdd_order::transform::cnf_to_circuit;

fn order(names: &[&str]) -> VarOrder {
    names.iter().map(|&s| Variable::from(s)).collect()
}

/// `bits`-wide comparator `a > b`, built MSB first.
fn greater_than(bits: usize) -> Circuit {
    let mut c = Circuit::new();
    for i in 0..bits {
        c.add_input(format!("a{}", i)).unwrap();
    }
    for i in 0..bits {
        c.add_input(format!("b{}", i)).unwrap();
    }
    let mut terms = Vec::new();
    let mut prefix: Option<Variable> = None;
    for i in (0..bits).rev() {
        let a = Variable::new(format!("a{}", i));
        let b = Variable::new(format!("b{}", i));
        let nb = Variable::new(format!("nb{}", i));
        c.add_gate(&nb, GateKind::Not, [&b], false).unwrap();
        let gt = Variable::new(format!("gt{}", i));
        let mut fanin = vec![a.clone(), nb];
        fanin.extend(prefix.clone());
        c.add_gate(&gt, GateKind::And, fanin, false).unwrap();
        terms.push(gt);

        let eq = Variable::new(format!("eq{}", i));
        c.add_gate(&eq, GateKind::Xnor, [&a, &b], false).unwrap();
        let next = match prefix {
            None => eq,
            Some(p) => {
                let both = Variable::new(format!("pre{}", i));
                c.add_gate(&both, GateKind::And, [p, eq], false).unwrap();
                both
            }
        };
        prefix = Some(next);
    }
    c.add_gate("gt", GateKind::Or, terms, true).unwrap();
    c
}

#[test]
fn test_example_circuit() {
    let mut c = Circuit::new();
    for x in ["A", "B", "C", "D"] {
        c.add_input(x).unwrap();
    }
    c.add_gate("AND1", GateKind::And, ["A", "B"], false).unwrap();
    c.add_gate("OR1", GateKind::Or, ["AND1", "C"], true).unwrap();
    c.add_gate("NOT1", GateKind::Not, ["D"], false).unwrap();

    let compiled = compile(&c, &order(&["A", "B", "C", "D"]), &CompileConfig::default()).unwrap();
    assert_eq!(compiled.roots.len(), 1);
    assert_eq!(compiled.sat_count(compiled.roots[0]), BigUint::from(10u32));
}

#[test]
fn test_model_count_does_not_depend_on_order() {
    let c = greater_than(2);
    // a > b for 2-bit numbers: 4 * 3 / 2 pairs
    let expected = BigUint::from(6u32);
    for h in Heuristic::all() {
        let order = circuit_order(&h, &c).unwrap();
        let compiled = compile(&c, &order, &CompileConfig::default()).unwrap();
        assert_eq!(compiled.sat_count(compiled.roots[0]), expected, "{}", h);
    }
    let reversed: VarOrder = c.inputs().into_iter().rev().collect();
    let compiled = compile(&c, &reversed, &CompileConfig::default()).unwrap();
    assert_eq!(compiled.sat_count(compiled.roots[0]), expected);
}

#[test]
fn test_interleaved_comparator_is_smaller() {
    let c = greater_than(4);
    let interleaved = order(&["a3", "b3", "a2", "b2", "a1", "b1", "a0", "b0"]);
    let grouped = order(&["a3", "a2", "a1", "a0", "b3", "b2", "b1", "b0"]);
    let small = compile(&c, &interleaved, &CompileConfig::default()).unwrap();
    let large = compile(&c, &grouped, &CompileConfig::default()).unwrap();
    assert!(small.size() < large.size());
    // 16 * 15 / 2 pairs either way
    assert_eq!(small.sat_count(small.roots[0]), BigUint::from(120u32));
    assert_eq!(large.sat_count(large.roots[0]), BigUint::from(120u32));
}

#[test]
fn test_shared_gate_is_compiled_once() {
    // `s` feeds three consumers.
    let mut c = Circuit::new();
    for x in ["a", "b", "c", "d"] {
        c.add_input(x).unwrap();
    }
    c.add_gate("s", GateKind::And, ["a", "b"], false).unwrap();
    c.add_gate("g1", GateKind::Or, ["s", "c"], false).unwrap();
    c.add_gate("g2", GateKind::Xor, ["s", "d"], false).unwrap();
    c.add_gate("ns", GateKind::Not, ["s"], false).unwrap();
    c.add_gate("out", GateKind::Nand, ["g1", "g2", "ns"], true).unwrap();

    let compiled = compile(&c, &order(&["a", "b", "c", "d"]), &CompileConfig::default()).unwrap();
    // One binary operation per pair of operands; `ns` is a complement edge.
    let expected: usize = c
        .gates()
        .iter()
        .filter(|g| !matches!(g.kind, GateKind::Input | GateKind::Not | GateKind::Buf))
        .map(|g| g.fanin.len() - 1)
        .sum();
    assert_eq!(expected, 5);
    assert_eq!(compiled.bdd.stats().apply_calls, expected);
}

#[test]
fn test_factored_cnf_keeps_its_models() {
    let f = Formula::from_dimacs(&[&[1, 2, -3], &[-1, 3], &[2, 4], &[-2, -4, 5], &[3, -5]]);
    let vars = f.variables();
    let models = (0..1u32 << vars.len())
        .filter(|bits| {
            let assignment: HashMap<Variable, bool> = vars
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), bits >> i & 1 == 1))
                .collect();
            f.eval(&assignment)
        })
        .count();

    let c = cnf_to_circuit(&f).unwrap();
    let order = Heuristic::FaninDepth.order(&c).unwrap();
    let compiled = compile(&c, &order, &CompileConfig::default()).unwrap();
    assert_eq!(compiled.sat_count(compiled.roots[0]), BigUint::from(models));
}

#[test]
fn test_timeout_is_reported() {
    let c = greater_than(4);
    let config = CompileConfig::default().with_timeout(Duration::ZERO);
    let order: VarOrder = c.inputs().into_iter().collect();
    let result = compile(&c, &order, &config);
    assert!(matches!(result, Err(Error::Timeout)));
}
