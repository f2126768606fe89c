//! Conversions between CNF formulas and circuits.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::circuit::{Circuit, GateKind};
use crate::error::{Error, Result};
use crate::formula::{Formula, Literal, Variable};
use crate::heuristic::occurrence_count;

/// A wire in a circuit under construction, or a constant that has not been
/// materialised yet.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Signal {
    Const(bool),
    Wire(Variable),
}

struct Builder {
    circuit: Circuit,
    counter: usize,
    negations: HashMap<Variable, Variable>,
}

impl Builder {
    fn fresh(&mut self, prefix: &str) -> Variable {
        loop {
            self.counter += 1;
            let name = Variable::new(format!("{}{}", prefix, self.counter));
            if self.circuit.gate(name.name()).is_none() {
                return name;
            }
        }
    }

    fn gate(&mut self, prefix: &str, kind: GateKind, fanin: Vec<Variable>) -> Result<Variable> {
        let name = self.fresh(prefix);
        self.circuit.add_gate(name.clone(), kind, fanin, false)?;
        Ok(name)
    }

    /// `¬x`, with one shared NOT gate per variable.
    fn negation(&mut self, x: &Variable) -> Result<Variable> {
        if let Some(n) = self.negations.get(x) {
            return Ok(n.clone());
        }
        let n = self.gate("not_", GateKind::Not, vec![x.clone()])?;
        self.negations.insert(x.clone(), n.clone());
        Ok(n)
    }

    fn literal(&mut self, x: &Variable, positive: bool) -> Result<Signal> {
        if positive {
            Ok(Signal::Wire(x.clone()))
        } else {
            Ok(Signal::Wire(self.negation(x)?))
        }
    }

    /// AND (`identity = true`) or OR (`identity = false`) with constant folding.
    fn combine(&mut self, identity: bool, signals: Vec<Signal>) -> Result<Signal> {
        let mut wires = Vec::new();
        for s in signals {
            match s {
                Signal::Const(c) if c == identity => {}
                Signal::Const(c) => return Ok(Signal::Const(c)),
                Signal::Wire(w) => wires.push(w),
            }
        }
        match wires.len() {
            0 => Ok(Signal::Const(identity)),
            1 => Ok(Signal::Wire(wires.swap_remove(0))),
            _ => {
                let (prefix, kind) = if identity {
                    ("and_", GateKind::And)
                } else {
                    ("or_", GateKind::Or)
                };
                Ok(Signal::Wire(self.gate(prefix, kind, wires)?))
            }
        }
    }

    /// Factor `clauses` on the first variable of `order` that occurs in them.
    fn factor(&mut self, clauses: Vec<Vec<Literal>>, order: &[Variable]) -> Result<Signal> {
        if clauses.is_empty() {
            return Ok(Signal::Const(true));
        }
        if clauses.iter().any(|c| c.is_empty()) {
            return Ok(Signal::Const(false));
        }

        let present: HashSet<&Variable> = clauses.iter().flatten().map(|l| &l.variable).collect();
        let Some(pos) = order.iter().position(|v| present.contains(v)) else {
            unreachable!("every clause variable is in the order");
        };
        let x = &order[pos];
        let rest_order = &order[pos + 1..];

        let mut positive = Vec::new();
        let mut negative = Vec::new();
        let mut others = Vec::new();
        for clause in clauses {
            let has_pos = clause.iter().any(|l| &l.variable == x && l.positive);
            let has_neg = clause.iter().any(|l| &l.variable == x && !l.positive);
            match (has_pos, has_neg) {
                (true, true) => {} // tautology
                (false, false) => others.push(clause),
                (pos, _) => {
                    let residual: Vec<Literal> =
                        clause.into_iter().filter(|l| &l.variable != x).collect();
                    if pos {
                        positive.push(residual);
                    } else {
                        negative.push(residual);
                    }
                }
            }
        }

        let mut parts = Vec::with_capacity(3);
        if !positive.is_empty() {
            let lit = self.literal(x, true)?;
            let sub = self.factor(positive, rest_order)?;
            parts.push(self.combine(false, vec![lit, sub])?);
        }
        if !negative.is_empty() {
            let lit = self.literal(x, false)?;
            let sub = self.factor(negative, rest_order)?;
            parts.push(self.combine(false, vec![lit, sub])?);
        }
        parts.push(self.factor(others, rest_order)?);
        self.combine(true, parts)
    }
}

/// Factor a CNF formula into a circuit with a single output.
///
/// Variables are picked in occurrence-count order. For the picked variable `x`, the
/// clauses split into those containing `x`, those containing `¬x` and the rest, and the
/// formula becomes `(x ∨ F⁺) ∧ (¬x ∨ F⁻) ∧ F⁰` where `F⁺`/`F⁻` are the first two groups
/// with `x` removed. Each part is factored recursively with the remaining variables.
///
/// Every formula variable becomes a circuit input, in first-occurrence order. Generated
/// gates are named from a counter (`and_1`, `or_2`, `not_3`, ...), skipping names that
/// are already taken.
pub fn cnf_to_circuit(formula: &Formula) -> Result<Circuit> {
    let clauses = formula.clauses().ok_or_else(|| Error::UnsupportedInput {
        heuristic: "cnf-to-circuit",
        input: "non-CNF formulas".to_string(),
    })?;
    let vars = formula.variables();
    let order = occurrence_count(&vars, &clauses);

    let mut builder = Builder {
        circuit: Circuit::new(),
        counter: 0,
        negations: HashMap::new(),
    };
    for v in &vars {
        builder.circuit.add_input(v.clone())?;
    }

    let top = builder.factor(clauses, &order)?;
    let output = match top {
        Signal::Wire(w) => w,
        Signal::Const(value) => {
            // x ∨ ¬x or x ∧ ¬x over the first variable
            let x = vars.first().ok_or(Error::NoOutputs)?.clone();
            let nx = builder.negation(&x)?;
            let kind = if value { GateKind::Or } else { GateKind::And };
            builder.gate("const_", kind, vec![x, nx])?
        }
    };
    builder.circuit.set_output(output.name())?;

    debug!(
        "factored {} variables into a circuit with {} gates",
        vars.len(),
        builder.circuit.len()
    );
    Ok(builder.circuit)
}

/// Tseitin encoding of a circuit: one variable per gate, named like the gate.
///
/// Multi-input XOR/XNOR gates get auxiliary variables named from a counter. Every
/// output is asserted by a unit clause, so the formula is satisfiable exactly when all
/// outputs can be true at once.
pub fn circuit_to_cnf(circuit: &Circuit) -> Result<Formula> {
    circuit.validate()?;

    let mut clauses: Vec<Vec<Literal>> = Vec::new();
    let mut counter = 0;
    let mut fresh = |circuit: &Circuit| loop {
        counter += 1;
        let name = Variable::new(format!("xor_{}", counter));
        if circuit.gate(name.name()).is_none() {
            return name;
        }
    };

    for gate in circuit.gates() {
        let g = &gate.name;
        let args = &gate.fanin;
        match &gate.kind {
            GateKind::Input => {}
            GateKind::And | GateKind::Nand => {
                let out = matches!(gate.kind, GateKind::And);
                // g ↔ ∧args, with g negated for NAND
                for a in args {
                    clauses.push(vec![lit(g, !out), Literal::pos(a)]);
                }
                let mut big = vec![lit(g, out)];
                big.extend(args.iter().map(Literal::neg));
                clauses.push(big);
            }
            GateKind::Or | GateKind::Nor => {
                let out = matches!(gate.kind, GateKind::Or);
                for a in args {
                    clauses.push(vec![lit(g, out), Literal::neg(a)]);
                }
                let mut big = vec![lit(g, !out)];
                big.extend(args.iter().map(Literal::pos));
                clauses.push(big);
            }
            GateKind::Not => {
                clauses.push(vec![Literal::pos(g), Literal::pos(&args[0])]);
                clauses.push(vec![Literal::neg(g), Literal::neg(&args[0])]);
            }
            GateKind::Buf => {
                clauses.push(vec![Literal::neg(g), Literal::pos(&args[0])]);
                clauses.push(vec![Literal::pos(g), Literal::neg(&args[0])]);
            }
            GateKind::Xor | GateKind::Xnor => {
                let out = matches!(gate.kind, GateKind::Xor);
                let mut acc = args[0].clone();
                for (i, b) in args.iter().enumerate().skip(1) {
                    let last = i + 1 == args.len();
                    let t = if last { g.clone() } else { fresh(circuit) };
                    let p = if last { out } else { true };
                    // t ↔ acc ⊕ b, with t negated for XNOR
                    clauses.push(vec![lit(&t, !p), Literal::pos(&acc), Literal::pos(b)]);
                    clauses.push(vec![lit(&t, !p), Literal::neg(&acc), Literal::neg(b)]);
                    clauses.push(vec![lit(&t, p), Literal::neg(&acc), Literal::pos(b)]);
                    clauses.push(vec![lit(&t, p), Literal::pos(&acc), Literal::neg(b)]);
                    acc = t;
                }
                if args.len() == 1 {
                    // single-input XOR is a buffer, XNOR an inverter
                    clauses.push(vec![lit(g, !out), Literal::pos(&acc)]);
                    clauses.push(vec![lit(g, out), Literal::neg(&acc)]);
                }
            }
            GateKind::Other(kind) => {
                return Err(Error::UnsupportedGateKind {
                    gate: g.to_string(),
                    kind: kind.clone(),
                })
            }
        }
    }

    for o in circuit.outputs() {
        clauses.push(vec![Literal::pos(o)]);
    }

    debug!(
        "encoded {} gates into {} clauses",
        circuit.len(),
        clauses.len()
    );
    Ok(Formula::from_clauses(&clauses))
}

fn lit(v: &Variable, positive: bool) -> Literal {
    if positive {
        Literal::pos(v)
    } else {
        Literal::neg(v)
    }
}
