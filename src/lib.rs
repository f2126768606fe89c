//! # bdd-order: static variable ordering for Binary Decision Diagrams
//!
//! The size of a BDD depends on the order of its variables, sometimes exponentially.
//! **`bdd-order`** computes variable orders *before* a diagram is built, from the
//! structure of the problem alone, and compiles circuits into BDDs under a chosen order
//! so that orders can be compared by the size of what they produce.
//!
//! ## Key Features
//!
//! - **Ordering heuristics** over CNF formulas, circuits and hypergraphs, all behind one
//!   [`Heuristic`][crate::heuristic::Heuristic] enum: occurrence and dependency counts,
//!   fan-in depth and fan-in DFS, weighted fan-out, FORCE and MINCE.
//! - **Partition engine**: recursive balanced min-cut bisection of hypergraphs, with a
//!   [`Partitioner`][crate::partition::Partitioner] seam for other backends.
//! - **Circuit compiler**: builds every gate exactly once, level by level, into a
//!   manager whose variable order is fixed (no dynamic reordering).
//! - **Deterministic**: for a fixed input every heuristic returns the same order, and the
//!   random baseline is seeded.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_order::circuit::{Circuit, GateKind};
//! use bdd_order::compile::{compile, CompileConfig};
//! use bdd_order::heuristic::Heuristic;
//!
//! // out = (a AND b) OR c
//! let mut circuit = Circuit::new();
//! for x in ["a", "b", "c"] {
//!     circuit.add_input(x).unwrap();
//! }
//! circuit.add_gate("g", GateKind::And, ["a", "b"], false).unwrap();
//! circuit.add_gate("out", GateKind::Or, ["g", "c"], true).unwrap();
//!
//! let order = Heuristic::FaninDepth.order(&circuit).unwrap();
//! let compiled = compile(&circuit, &order, &CompileConfig::default()).unwrap();
//!
//! // a, b, c and the terminal
//! assert_eq!(compiled.size(), 4);
//! ```
//!
//! ## Core Components
//!
//! - **[`heuristic`]**: the ordering heuristics.
//! - **[`partition`]**: hypergraph bisection and MINCE.
//! - **[`compile`]**: circuit to BDD compilation.
//! - **[`evaluate`]**: order-then-compile measurements.
//! - **[`bdd`]**: the decision diagram manager the compiler builds into.

pub mod bdd;
pub mod cache;
pub mod circuit;
pub mod compile;
pub mod error;
pub mod evaluate;
pub mod formula;
pub mod heuristic;
pub mod hypergraph;
pub mod node;
pub mod order;
pub mod partition;
pub mod reference;
pub mod sat;
pub mod table;
pub mod transform;
pub mod utils;
