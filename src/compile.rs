//! Circuit to BDD compilation under a fixed variable order.
//!
//! The order is declared as-is, so the size of the result measures the order. Gates are
//! built level by level (non-decreasing fan-in depth, declaration order within a level)
//! and every gate is built exactly once; a gate used by several consumers is looked up,
//! not rebuilt.
//!
//! Operand folding:
//! - `and`/`or` split the operand list in half, fold both halves and combine them;
//!   `nand`/`nor` negate that result once,
//! - `xor`/`xnor` fold left to right; `xnor` negates the result,
//! - `not` negates its operand and `buf` passes it through without a new node.
//!
//! Every `buf` operand is a root, whether or not the `buf` is flagged as an output.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info};
use num_bigint::BigUint;

use crate::bdd::{Bdd, BddConfig, BinaryOp};
use crate::circuit::{Circuit, GateKind};
use crate::error::{Error, Result};
use crate::formula::Variable;
use crate::order::VarOrder;
use crate::reference::Ref;

#[derive(Debug, Clone, Default)]
pub struct CompileConfig {
    /// Wall-clock budget for building the diagram.
    pub timeout: Option<Duration>,
    pub bdd: BddConfig,
}

impl CompileConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_bdd(mut self, bdd: BddConfig) -> Self {
        self.bdd = bdd;
        self
    }
}

/// A compiled circuit: the manager and its roots.
///
/// Roots are the outputs in declaration order, followed by the non-output `buf` gates in
/// compilation order. `outputs[i]` names the gate of `roots[i]`.
#[derive(Debug)]
pub struct Compiled {
    pub bdd: Bdd,
    pub outputs: Vec<Variable>,
    pub roots: Vec<Ref>,
}

impl Compiled {
    /// Number of nodes reachable from all roots, including the terminal.
    pub fn size(&self) -> usize {
        self.bdd.size(&self.roots)
    }

    pub fn root(&self, output: &str) -> Option<Ref> {
        self.outputs
            .iter()
            .position(|o| o.name() == output)
            .map(|i| self.roots[i])
    }

    /// Satisfying assignments of `root` over all declared variables.
    pub fn sat_count(&self, root: Ref) -> BigUint {
        self.bdd.sat_count(root, self.bdd.num_vars())
    }
}

/// Check that every gate kind can be compiled.
fn check_kinds(circuit: &Circuit) -> Result<()> {
    for gate in circuit.gates() {
        if let GateKind::Other(kind) = &gate.kind {
            return Err(Error::UnsupportedGateKind {
                gate: gate.name.to_string(),
                kind: kind.clone(),
            });
        }
    }
    Ok(())
}

/// Combine `operands` with `op` as a balanced binary tree.
fn fold_balanced(bdd: &Bdd, op: BinaryOp, operands: &[Ref]) -> Result<Ref> {
    match operands {
        [] => unreachable!("gate arity is checked before compilation"),
        [single] => Ok(*single),
        _ => {
            let (left, right) = operands.split_at(operands.len() / 2);
            let l = fold_balanced(bdd, op, left)?;
            let r = fold_balanced(bdd, op, right)?;
            bdd.apply(op, l, r)
        }
    }
}

fn fold_left(bdd: &Bdd, op: BinaryOp, operands: &[Ref]) -> Result<Ref> {
    let Some((&first, rest)) = operands.split_first() else {
        unreachable!("gate arity is checked before compilation");
    };
    rest.iter().try_fold(first, |acc, &x| bdd.apply(op, acc, x))
}

/// Compile `circuit` into a fresh manager whose variable order is `order`.
///
/// Everything that can be checked up front is checked before the first node is built:
/// `order` must be a permutation of the circuit inputs, the circuit must be well formed
/// (see [`Circuit::validate`]) and every gate kind must be known.
pub fn compile(circuit: &Circuit, order: &VarOrder, config: &CompileConfig) -> Result<Compiled> {
    order.validate(&circuit.inputs())?;
    circuit.validate()?;
    check_kinds(circuit)?;
    let levels = circuit.levels()?;

    let deadline = config.timeout.map(|t| Instant::now() + t);
    let bdd = Bdd::with_config(config.bdd.clone());
    bdd.declare(order.iter())?;
    bdd.set_deadline(deadline);

    let mut cache: HashMap<Variable, Ref> = HashMap::with_capacity(circuit.len());
    let mut buffers = Vec::new();
    for v in order {
        cache.insert(v.clone(), bdd.var(v.name())?);
    }

    for (depth, level) in levels.iter().enumerate().skip(1) {
        debug!("compiling level {} with {} gates", depth, level.len());
        for name in level {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(Error::Timeout);
            }

            let gate = circuit
                .gate(name.name())
                .ok_or_else(|| Error::DanglingReference {
                    gate: name.to_string(),
                    missing: name.to_string(),
                })?;
            let operands = gate
                .fanin
                .iter()
                .map(|f| {
                    cache.get(f).copied().ok_or_else(|| Error::DanglingReference {
                        gate: gate.name.to_string(),
                        missing: f.to_string(),
                    })
                })
                .collect::<Result<Vec<Ref>>>()?;

            let node = match &gate.kind {
                GateKind::And => fold_balanced(&bdd, BinaryOp::And, &operands)?,
                GateKind::Or => fold_balanced(&bdd, BinaryOp::Or, &operands)?,
                GateKind::Nand => -fold_balanced(&bdd, BinaryOp::And, &operands)?,
                GateKind::Nor => -fold_balanced(&bdd, BinaryOp::Or, &operands)?,
                GateKind::Xor => fold_left(&bdd, BinaryOp::Xor, &operands)?,
                GateKind::Xnor => -fold_left(&bdd, BinaryOp::Xor, &operands)?,
                GateKind::Not => bdd.apply_not(operands[0]),
                GateKind::Buf => {
                    if !gate.is_output {
                        buffers.push(gate.name.clone());
                    }
                    operands[0]
                }
                GateKind::Input => continue,
                GateKind::Other(kind) => {
                    return Err(Error::UnsupportedGateKind {
                        gate: gate.name.to_string(),
                        kind: kind.clone(),
                    })
                }
            };
            cache.insert(gate.name.clone(), node);
        }
    }

    let mut outputs = circuit.outputs();
    outputs.extend(buffers);
    let roots = outputs
        .iter()
        .map(|o| {
            cache.get(o).copied().ok_or_else(|| Error::DanglingReference {
                gate: "<output>".to_string(),
                missing: o.to_string(),
            })
        })
        .collect::<Result<Vec<Ref>>>()?;

    bdd.set_deadline(None);
    info!(
        "compiled {} gates into {} nodes ({} reachable from {} roots)",
        circuit.len(),
        bdd.num_nodes(),
        bdd.size(&roots),
        roots.len()
    );
    Ok(Compiled {
        bdd,
        outputs,
        roots,
    })
}
