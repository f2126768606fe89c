//! Variable ordering heuristics.
//!
//! Every heuristic is a variant of [`Heuristic`] carrying its own configuration, and
//! [`Heuristic::order`] dispatches on it. Results are deterministic for a fixed input;
//! [`Heuristic::Random`] is deterministic for a fixed seed.
//!
//! | Heuristic                | Formula (CNF) | Circuit | Hypergraph |
//! |--------------------------|:-------------:|:-------:|:----------:|
//! | `InputOrder`, `Random`   | yes           | yes     | yes        |
//! | `OccurrenceCount`        | yes           |         |            |
//! | `DependencyCount`        | yes           |         |            |
//! | `FaninDepth`, `FaninDfs` |               | yes     |            |
//! | `WeightedFanout`         |               | yes     |            |
//! | `DependentCount`         |               | yes     |            |
//! | `Force`, `Mince`         | yes           |         | yes        |
//!
//! Any other combination is rejected with [`Error::UnsupportedInput`].

mod circuit;
mod cnf;
mod force;

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use self::circuit::{fanin_depth, fanin_dfs, weighted_fanout, FanoutWeight};
pub use self::cnf::{dependency_count, occurrence_count, occurrence_counts};
pub use self::force::{
    default_iteration_bound, force, force_with_stats, total_span, ForceConfig, ForceResult,
};

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::formula::{Formula, Literal, Variable};
use crate::hypergraph::Hypergraph;
use crate::order::VarOrder;
use crate::partition::{mince, PartitionConfig};

/// What a heuristic orders.
#[derive(Debug, Copy, Clone)]
pub enum OrderInput<'a> {
    Formula(&'a Formula),
    Circuit(&'a Circuit),
    Hypergraph(&'a Hypergraph),
}

impl<'a> From<&'a Formula> for OrderInput<'a> {
    fn from(formula: &'a Formula) -> Self {
        OrderInput::Formula(formula)
    }
}

impl<'a> From<&'a Circuit> for OrderInput<'a> {
    fn from(circuit: &'a Circuit) -> Self {
        OrderInput::Circuit(circuit)
    }
}

impl<'a> From<&'a Hypergraph> for OrderInput<'a> {
    fn from(hypergraph: &'a Hypergraph) -> Self {
        OrderInput::Hypergraph(hypergraph)
    }
}

impl OrderInput<'_> {
    /// Variables in declaration order: formula variables by first occurrence, circuit
    /// inputs, or hypergraph nodes.
    pub fn variables(&self) -> Vec<Variable> {
        match self {
            OrderInput::Formula(f) => f.variables(),
            OrderInput::Circuit(c) => c.inputs(),
            OrderInput::Hypergraph(h) => h.nodes().to_vec(),
        }
    }

    fn describe(&self) -> String {
        match self {
            OrderInput::Formula(f) if f.is_cnf() => "CNF formulas".to_string(),
            OrderInput::Formula(_) => "non-CNF formulas".to_string(),
            OrderInput::Circuit(_) => "circuits".to_string(),
            OrderInput::Hypergraph(_) => "hypergraphs".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Heuristic {
    /// Declaration order, as a baseline.
    InputOrder,
    /// Uniformly random permutation drawn from a seeded generator.
    Random { seed: u64 },
    OccurrenceCount,
    DependencyCount,
    FaninDepth,
    FaninDfs,
    WeightedFanout(FanoutWeight),
    /// Inputs feeding the most outputs first.
    DependentCount,
    Force(ForceConfig),
    Mince(PartitionConfig),
}

/// Shuffle `vars` with the given random source.
pub fn random_order<R: Rng + ?Sized>(vars: &[Variable], rng: &mut R) -> VarOrder {
    let mut order = vars.to_vec();
    order.shuffle(rng);
    order.into()
}

impl Heuristic {
    /// Every heuristic with its default configuration.
    pub fn all() -> Vec<Heuristic> {
        vec![
            Heuristic::InputOrder,
            Heuristic::Random { seed: 0 },
            Heuristic::OccurrenceCount,
            Heuristic::DependencyCount,
            Heuristic::FaninDepth,
            Heuristic::FaninDfs,
            Heuristic::WeightedFanout(FanoutWeight::AllGates),
            Heuristic::WeightedFanout(FanoutWeight::Interior),
            Heuristic::WeightedFanout(FanoutWeight::Outputs),
            Heuristic::DependentCount,
            Heuristic::Force(ForceConfig::default()),
            Heuristic::Mince(PartitionConfig::default()),
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::InputOrder => "input-order",
            Heuristic::Random { .. } => "random",
            Heuristic::OccurrenceCount => "occurrence-count",
            Heuristic::DependencyCount => "dependency-count",
            Heuristic::FaninDepth => "fanin-depth",
            Heuristic::FaninDfs => "fanin-dfs",
            Heuristic::WeightedFanout(FanoutWeight::AllGates) => "weighted-fanout",
            Heuristic::WeightedFanout(FanoutWeight::Interior) => "weighted-fanout-interior",
            Heuristic::WeightedFanout(FanoutWeight::Outputs) => "weighted-fanout-outputs",
            Heuristic::DependentCount => "dependent-count",
            Heuristic::Force(_) => "force",
            Heuristic::Mince(_) => "mince",
        }
    }

    /// Whether the heuristic reads CNF clauses or hypergraphs rather than gate graphs.
    pub fn needs_clauses(&self) -> bool {
        matches!(
            self,
            Heuristic::OccurrenceCount
                | Heuristic::DependencyCount
                | Heuristic::Force(_)
                | Heuristic::Mince(_)
        )
    }

    fn unsupported(&self, input: &OrderInput) -> Error {
        Error::UnsupportedInput {
            heuristic: self.name(),
            input: input.describe(),
        }
    }

    fn clauses_of(&self, input: &OrderInput) -> Result<(Vec<Variable>, Vec<Vec<Literal>>)> {
        match input {
            OrderInput::Formula(f) => match f.clauses() {
                Some(clauses) => Ok((f.variables(), clauses)),
                None => Err(self.unsupported(input)),
            },
            _ => Err(self.unsupported(input)),
        }
    }

    fn hypergraph_of<'a>(&self, input: &OrderInput<'a>) -> Result<Cow<'a, Hypergraph>> {
        match *input {
            OrderInput::Formula(f) => Hypergraph::from_cnf(f)
                .map(Cow::Owned)
                .ok_or_else(|| self.unsupported(input)),
            OrderInput::Hypergraph(h) => Ok(Cow::Borrowed(h)),
            OrderInput::Circuit(_) => Err(self.unsupported(input)),
        }
    }

    fn circuit_of<'a>(&self, input: &OrderInput<'a>) -> Result<&'a Circuit> {
        match *input {
            OrderInput::Circuit(c) => Ok(c),
            _ => Err(self.unsupported(input)),
        }
    }

    /// Compute a total order over the variables of `input`.
    pub fn order<'a>(&self, input: impl Into<OrderInput<'a>>) -> Result<VarOrder> {
        let input = input.into();
        debug!("running {} on {}", self.name(), input.describe());

        let order = match self {
            Heuristic::InputOrder => VarOrder::new(input.variables()),
            Heuristic::Random { seed } => {
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                random_order(&input.variables(), &mut rng)
            }
            Heuristic::OccurrenceCount => {
                let (vars, clauses) = self.clauses_of(&input)?;
                occurrence_count(&vars, &clauses)
            }
            Heuristic::DependencyCount => {
                let (vars, clauses) = self.clauses_of(&input)?;
                dependency_count(&vars, &clauses)
            }
            Heuristic::FaninDepth => fanin_depth(self.circuit_of(&input)?)?,
            Heuristic::FaninDfs => fanin_dfs(self.circuit_of(&input)?)?,
            Heuristic::WeightedFanout(weight) => {
                weighted_fanout(self.circuit_of(&input)?, *weight)?
            }
            Heuristic::DependentCount => {
                weighted_fanout(self.circuit_of(&input)?, FanoutWeight::Outputs)?
            }
            Heuristic::Force(config) => {
                let hypergraph = self.hypergraph_of(&input)?;
                force(&hypergraph, config)
            }
            Heuristic::Mince(config) => {
                let hypergraph = self.hypergraph_of(&input)?;
                mince(&hypergraph, config)?
            }
        };

        info!("{}: ordered {} variables", self.name(), order.len());
        Ok(order)
    }
}

impl Display for Heuristic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Heuristic::all()
            .into_iter()
            .find(|h| h.name() == s)
            .ok_or_else(|| Error::UnknownHeuristic(s.to_string()))
    }
}
