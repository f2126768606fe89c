//! Combinational circuits as named gate graphs.
//!
//! A [`Circuit`] keeps its gates in declaration order. Fan-in lists are ordered and may
//! reference gates declared later; references are resolved by [`Circuit::validate`],
//! not at construction time, so circuits can be read in any gate order.

use std::collections::{HashMap, HashSet, VecDeque};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::formula::Variable;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GateKind {
    Input,
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    Not,
    Buf,
    /// A kind this crate cannot compile, kept verbatim.
    Other(String),
}

impl GateKind {
    /// Allowed fan-in count as `(min, max)`, or `None` for unknown kinds.
    pub fn arity(&self) -> Option<(usize, Option<usize>)> {
        match self {
            GateKind::Input => Some((0, Some(0))),
            GateKind::Not | GateKind::Buf => Some((1, Some(1))),
            GateKind::And
            | GateKind::Or
            | GateKind::Nand
            | GateKind::Nor
            | GateKind::Xor
            | GateKind::Xnor => Some((1, None)),
            GateKind::Other(_) => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, GateKind::Input)
    }
}

impl FromStr for GateKind {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "input" => GateKind::Input,
            "and" => GateKind::And,
            "or" => GateKind::Or,
            "nand" => GateKind::Nand,
            "nor" => GateKind::Nor,
            "xor" => GateKind::Xor,
            "xnor" => GateKind::Xnor,
            "not" | "inv" => GateKind::Not,
            "buf" | "buff" => GateKind::Buf,
            _ => GateKind::Other(s.to_string()),
        };
        Ok(kind)
    }
}

impl Display for GateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateKind::Input => "input",
            GateKind::And => "and",
            GateKind::Or => "or",
            GateKind::Nand => "nand",
            GateKind::Nor => "nor",
            GateKind::Xor => "xor",
            GateKind::Xnor => "xnor",
            GateKind::Not => "not",
            GateKind::Buf => "buf",
            GateKind::Other(s) => s,
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub name: Variable,
    pub kind: GateKind,
    pub fanin: Vec<Variable>,
    pub is_output: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Circuit {
    gates: Vec<Gate>,
    index: HashMap<Variable, usize>,
}

// Construction
impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, name: impl Into<Variable>) -> Result<()> {
        self.add_gate(name, GateKind::Input, Vec::<Variable>::new(), false)
    }

    pub fn add_gate<I>(
        &mut self,
        name: impl Into<Variable>,
        kind: GateKind,
        fanin: I,
        is_output: bool,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Variable>,
    {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateGate(name.to_string()));
        }
        self.index.insert(name.clone(), self.gates.len());
        self.gates.push(Gate {
            name,
            kind,
            fanin: fanin.into_iter().map(Into::into).collect(),
            is_output,
        });
        Ok(())
    }

    /// Mark an existing gate (or input) as an output.
    pub fn set_output(&mut self, name: &str) -> Result<()> {
        let &i = self.index.get(name).ok_or_else(|| Error::DanglingReference {
            gate: "<output>".to_string(),
            missing: name.to_string(),
        })?;
        self.gates[i].is_output = true;
        Ok(())
    }
}

// Queries
impl Circuit {
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate(&self, name: &str) -> Option<&Gate> {
        self.index.get(name).map(|&i| &self.gates[i])
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Primary inputs in declaration order.
    pub fn inputs(&self) -> Vec<Variable> {
        self.gates
            .iter()
            .filter(|g| g.kind.is_input())
            .map(|g| g.name.clone())
            .collect()
    }

    /// Output gates in declaration order.
    pub fn outputs(&self) -> Vec<Variable> {
        self.gates
            .iter()
            .filter(|g| g.is_output)
            .map(|g| g.name.clone())
            .collect()
    }

    /// Consumers of every gate, one entry per fan-in occurrence, in declaration order.
    /// Dangling fan-in names are skipped.
    pub(crate) fn consumers(&self) -> Vec<Vec<usize>> {
        let mut consumers = vec![Vec::new(); self.gates.len()];
        for (i, gate) in self.gates.iter().enumerate() {
            for name in &gate.fanin {
                if let Some(&j) = self.index.get(name) {
                    consumers[j].push(i);
                }
            }
        }
        consumers
    }

    /// Gates whose fan-in includes `name`, in declaration order.
    pub fn fanout(&self, name: &str) -> Vec<Variable> {
        self.gates
            .iter()
            .filter(|g| g.fanin.iter().any(|f| f.name() == name))
            .map(|g| g.name.clone())
            .collect()
    }

    /// Every gate reachable from `name` through fan-out edges, in breadth-first order.
    /// The gate itself is not included.
    pub fn transitive_fanout(&self, name: &str) -> Vec<Variable> {
        let Some(&start) = self.index.get(name) else {
            return Vec::new();
        };
        let consumers = self.consumers();
        self.reach(start, &consumers)
            .into_iter()
            .map(|i| self.gates[i].name.clone())
            .collect()
    }

    /// Indices reachable from `start` via `consumers`, excluding `start`.
    pub(crate) fn reach(&self, start: usize, consumers: &[Vec<usize>]) -> Vec<usize> {
        let mut visited = HashSet::from([start]);
        let mut result = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for &j in &consumers[i] {
                if visited.insert(j) {
                    result.push(j);
                    queue.push_back(j);
                }
            }
        }
        result
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn check_references(&self) -> Result<()> {
        for gate in &self.gates {
            if let Some(missing) = gate.fanin.iter().find(|f| !self.index.contains_key(*f)) {
                return Err(Error::DanglingReference {
                    gate: gate.name.to_string(),
                    missing: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_arity(&self) -> Result<()> {
        for gate in &self.gates {
            let Some((min, max)) = gate.kind.arity() else {
                continue;
            };
            let n = gate.fanin.len();
            if n < min || max.is_some_and(|max| n > max) {
                return Err(Error::InvalidArity {
                    gate: gate.name.to_string(),
                    kind: gate.kind.to_string(),
                    expected: if n < min { min } else { max.unwrap_or(min) },
                    actual: n,
                });
            }
        }
        Ok(())
    }

    /// Gate indices in topological order (fan-in before fan-out), computed with Kahn's
    /// algorithm. Ties are resolved by declaration order.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        self.check_references()?;

        let consumers = self.consumers();
        let mut pending: Vec<usize> = self.gates.iter().map(|g| g.fanin.len()).collect();
        let mut queue: VecDeque<usize> = (0..self.gates.len()).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(self.gates.len());

        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &j in &consumers[i] {
                pending[j] -= 1;
                if pending[j] == 0 {
                    queue.push_back(j);
                }
            }
        }

        if order.len() < self.gates.len() {
            let stuck = (0..self.gates.len())
                .find(|&i| pending[i] > 0)
                .map(|i| self.gates[i].name.to_string())
                .unwrap_or_default();
            return Err(Error::CyclicCircuit(stuck));
        }
        Ok(order)
    }

    /// Check that the circuit is well formed: references resolve, arities fit the gate
    /// kinds, at least one gate is an output, and the graph is acyclic.
    pub fn validate(&self) -> Result<()> {
        self.check_references()?;
        self.check_arity()?;
        if !self.gates.iter().any(|g| g.is_output) {
            return Err(Error::NoOutputs);
        }
        self.topological_order()?;
        Ok(())
    }

    /// Longest path from any primary input to each gate; inputs have depth 0.
    pub fn fanin_depths(&self) -> Result<HashMap<Variable, usize>> {
        let order = self.topological_order()?;
        let mut depth = vec![0usize; self.gates.len()];
        for &i in &order {
            let gate = &self.gates[i];
            if gate.kind.is_input() {
                continue;
            }
            depth[i] = gate
                .fanin
                .iter()
                .filter_map(|f| self.index.get(f))
                .map(|&j| depth[j] + 1)
                .max()
                .unwrap_or(0);
        }
        Ok(self
            .gates
            .iter()
            .zip(depth)
            .map(|(g, d)| (g.name.clone(), d))
            .collect())
    }

    /// Gates grouped by fan-in depth, each level in declaration order.
    pub fn levels(&self) -> Result<Vec<Vec<Variable>>> {
        let depths = self.fanin_depths()?;
        let max_depth = depths.values().copied().max().unwrap_or(0);
        let mut levels = vec![Vec::new(); max_depth + 1];
        for gate in &self.gates {
            levels[depths[&gate.name]].push(gate.name.clone());
        }
        Ok(levels)
    }

    /// Evaluate every gate under an input assignment; missing inputs are `false`.
    pub fn eval(&self, assignment: &HashMap<Variable, bool>) -> Result<HashMap<Variable, bool>> {
        let order = self.topological_order()?;
        let mut values = vec![false; self.gates.len()];
        for i in order {
            let gate = &self.gates[i];
            let mut args = gate.fanin.iter().filter_map(|f| self.index.get(f)).map(|&j| values[j]);
            let value = match &gate.kind {
                GateKind::Input => assignment.get(&gate.name).copied().unwrap_or(false),
                GateKind::And => args.all(|x| x),
                GateKind::Or => args.any(|x| x),
                GateKind::Nand => !args.all(|x| x),
                GateKind::Nor => !args.any(|x| x),
                GateKind::Xor => args.fold(false, |acc, x| acc ^ x),
                GateKind::Xnor => !args.fold(false, |acc, x| acc ^ x),
                GateKind::Not => !args.next().unwrap_or(false),
                GateKind::Buf => args.next().unwrap_or(false),
                GateKind::Other(kind) => {
                    return Err(Error::UnsupportedGateKind {
                        gate: gate.name.to_string(),
                        kind: kind.clone(),
                    })
                }
            };
            values[i] = value;
        }
        Ok(self
            .gates
            .iter()
            .zip(values)
            .map(|(g, v)| (g.name.clone(), v))
            .collect())
    }
}

impl Display for Circuit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for gate in &self.gates {
            if gate.kind.is_input() {
                writeln!(f, "{} := input", gate.name)?;
                continue;
            }
            let fanin: Vec<&str> = gate.fanin.iter().map(Variable::name).collect();
            write!(f, "{} := {}({})", gate.name, gate.kind, fanin.join(", "))?;
            if gate.is_output {
                write!(f, " [output]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
