//! Error taxonomy shared by the ordering heuristics, the partition engine and the compiler.
//!
//! Every error is fatal to the current `order`/`compile` call: no partial orders and no
//! partially built diagrams are ever returned. Callers that run many (input, heuristic)
//! pairs catch errors per pair.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The heuristic cannot handle the kind of input it was given.
    #[error("heuristic `{heuristic}` does not support {input}")]
    UnsupportedInput {
        heuristic: &'static str,
        input: String,
    },

    /// A gate kind that the compiler does not know how to build.
    #[error("gate `{gate}` has unsupported kind `{kind}`")]
    UnsupportedGateKind { gate: String, kind: String },

    /// A gate's fan-in names a gate that does not exist.
    #[error("gate `{gate}` references undeclared gate `{missing}`")]
    DanglingReference { gate: String, missing: String },

    /// The node table hit its ceiling.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A caller-imposed deadline has passed.
    #[error("operation timed out")]
    Timeout,

    /// An ordering that is not a permutation of the expected variables.
    #[error("malformed ordering: {0}")]
    MalformedOrdering(String),

    #[error("gate `{0}` is defined more than once")]
    DuplicateGate(String),

    #[error("gate `{gate}` of kind `{kind}` expects {expected} fan-in(s), got {actual}")]
    InvalidArity {
        gate: String,
        kind: String,
        expected: usize,
        actual: usize,
    },

    #[error("circuit contains a cycle through gate `{0}`")]
    CyclicCircuit(String),

    #[error("circuit has no outputs")]
    NoOutputs,

    #[error("node `{0}` already in hypergraph")]
    DuplicateNode(String),

    #[error("hyperedge `{0}` already in hypergraph")]
    DuplicateHyperedge(String),

    #[error("link ({node}, {edge}) already in hypergraph")]
    DuplicateLink { node: String, edge: String },

    #[error("link ({node}, {edge}) is not in hypergraph")]
    MissingLink { node: String, edge: String },

    #[error("unknown hypergraph node `{0}`")]
    UnknownNode(String),

    #[error("unknown hyperedge `{0}`")]
    UnknownHyperedge(String),

    #[error("variable `{0}` is declared more than once")]
    DuplicateVariable(String),

    #[error("variable `{0}` is not declared")]
    UndeclaredVariable(String),

    #[error("unknown heuristic `{0}`")]
    UnknownHeuristic(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::DanglingReference {
            gate: "g1".to_string(),
            missing: "x9".to_string(),
        };
        assert_eq!(e.to_string(), "gate `g1` references undeclared gate `x9`");

        let e = Error::DuplicateNode("x1".to_string());
        assert_eq!(e.to_string(), "node `x1` already in hypergraph");
    }
}
