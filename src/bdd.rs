//! The diagram manager: a reduced ordered BDD with complement edges.
//!
//! All operations go through a [`Bdd`] instance, which owns the unique table and the
//! computed table. Variables are declared by name, and the declaration sequence is the
//! variable order: the `i`-th declared name (0-based) gets variable id `i + 1`, and
//! smaller ids sit closer to the root. The manager never reorders on its own, so the
//! size it reports is exactly the size under the order the caller supplied.
//!
//! The manager uses interior mutability and is therefore `!Sync`: one manager is
//! driven by one caller at a time. Comparing several orders concurrently means using
//! several managers.
//!
//! ```
//! use bdd_order::bdd::{Bdd, BinaryOp};
//!
//! let bdd = Bdd::default();
//! bdd.declare(["a", "b"]).unwrap();
//! let a = bdd.var("a").unwrap();
//! let b = bdd.var("b").unwrap();
//! let f = bdd.apply(BinaryOp::And, a, b).unwrap();
//! assert_eq!(bdd.size(&[f]), 3);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::{Debug, Display, Formatter};
use std::time::Instant;

use log::{debug, trace};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::formula::Variable;
use crate::node::Node;
use crate::reference::Ref;
use crate::table::Table;
use crate::utils::{pairing3, MyHash};

/// Number of ITE steps between two deadline checks.
const DEADLINE_POLL_INTERVAL: u64 = 1 << 10;

#[derive(Debug, Clone)]
pub struct BddConfig {
    /// Initial capacity of the unique table is `2^storage_bits`.
    pub storage_bits: usize,
    /// The computed table has `2^cache_bits` slots.
    pub cache_bits: usize,
    /// Ceiling on the number of nodes; `None` means unbounded.
    pub max_nodes: Option<usize>,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 16,
            cache_bits: 16,
            max_nodes: None,
        }
    }
}

impl BddConfig {
    pub fn with_storage_bits(mut self, storage_bits: usize) -> Self {
        self.storage_bits = storage_bits;
        self
    }

    pub fn with_cache_bits(mut self, cache_bits: usize) -> Self {
        self.cache_bits = cache_bits;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Xnor,
    Nand,
    Nor,
    Imply,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Xnor => "xnor",
            BinaryOp::Nand => "nand",
            BinaryOp::Nor => "nor",
            BinaryOp::Imply => "imply",
        };
        f.write_str(s)
    }
}

/// Counters for instrumentation.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BddStats {
    /// Number of [`Bdd::apply`] calls.
    pub apply_calls: usize,
    /// Number of non-trivial ITE steps (those that reach the computed table).
    pub ite_steps: u64,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct IteKey(Ref, Ref, Ref);

impl MyHash for IteKey {
    fn hash(&self) -> u64 {
        pairing3(
            self.0.unsigned() as u64,
            self.1.unsigned() as u64,
            self.2.unsigned() as u64,
        )
    }
}

pub struct Bdd {
    storage: RefCell<Table<Node>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    names: RefCell<Vec<Variable>>,
    ids: RefCell<HashMap<Variable, u32>>,
    deadline: Cell<Option<Instant>>,
    apply_calls: Cell<usize>,
    ite_steps: Cell<u64>,
    one: Ref,
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        let limit = config.max_nodes.map(|m| m.max(1));
        let mut storage = Table::new(config.storage_bits, limit);

        // The terminal node must be (1).
        let one = storage
            .put(Node::terminal())
            .expect("an empty table has room for the terminal");
        assert_eq!(one, 1);

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            names: RefCell::new(Vec::new()),
            ids: RefCell::new(HashMap::new()),
            deadline: Cell::new(None),
            apply_calls: Cell::new(0),
            ite_steps: Cell::new(0),
            one: Ref::positive(one as u32),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("vars", &self.num_vars())
            .field("nodes", &storage.len())
            .field("capacity", &storage.capacity())
            .finish()
    }
}

// Variables
impl Bdd {
    /// Declare variables; the declaration sequence fixes their order.
    pub fn declare<I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Variable>,
    {
        let mut vars = self.names.borrow_mut();
        let mut ids = self.ids.borrow_mut();
        for name in names {
            let name = name.into();
            if ids.contains_key(&name) {
                return Err(Error::DuplicateVariable(name.to_string()));
            }
            vars.push(name.clone());
            ids.insert(name, vars.len() as u32);
        }
        debug!("declared {} variables", vars.len());
        Ok(())
    }

    pub fn num_vars(&self) -> usize {
        self.names.borrow().len()
    }

    /// Declared names in order.
    pub fn order(&self) -> Vec<Variable> {
        self.names.borrow().clone()
    }

    /// Id of a declared variable (1-based, equal to its level + 1).
    pub fn var_id(&self, name: &str) -> Result<u32> {
        self.ids
            .borrow()
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredVariable(name.to_string()))
    }

    pub fn var_name(&self, id: u32) -> Option<Variable> {
        assert_ne!(id, 0, "Variable index should not be zero");
        self.names.borrow().get(id as usize - 1).cloned()
    }

    /// Diagram for the declared variable `name`.
    pub fn var(&self, name: &str) -> Result<Ref> {
        let id = self.var_id(name)?;
        self.mk_var(id)
    }
}

// Nodes
impl Bdd {
    pub fn one(&self) -> Ref {
        self.one
    }
    pub fn zero(&self) -> Ref {
        -self.one
    }

    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_zero(&self, node: Ref) -> bool {
        node == -self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.storage.borrow().value(index).variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Result<Ref> {
        trace!("mk(v = {}, low = {}, high = {})", v, low, high);
        assert_ne!(v, 0, "Variable index should not be zero");

        // Keep the high edge regular
        if high.is_negated() {
            return Ok(-self.mk_node(v, -low, -high)?);
        }

        if low == high {
            return Ok(low);
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        })?;
        Ok(Ref::positive(i as u32))
    }

    pub fn mk_var(&self, v: u32) -> Result<Ref> {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero(), self.one())
    }

    fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node.index()) {
            return (node, node);
        }
        assert_eq!(v, self.variable(node.index()));
        (self.low_node(node), self.high_node(node))
    }
}

// Operations
impl Bdd {
    /// Set or clear the wall-clock deadline polled by every operation.
    pub fn set_deadline(&self, deadline: Option<Instant>) {
        self.deadline.set(deadline);
    }

    fn poll_deadline(&self) -> Result<()> {
        let steps = self.ite_steps.get() + 1;
        self.ite_steps.set(steps);
        if steps % DEADLINE_POLL_INTERVAL == 0 {
            if let Some(deadline) = self.deadline.get() {
                if Instant::now() >= deadline {
                    debug!("deadline passed after {} ITE steps", steps);
                    return Err(Error::Timeout);
                }
            }
        }
        Ok(())
    }

    /// Apply a binary Boolean operator.
    pub fn apply(&self, op: BinaryOp, u: Ref, v: Ref) -> Result<Ref> {
        debug!("apply({}, u = {}, v = {})", op, u, v);
        self.apply_calls.set(self.apply_calls.get() + 1);
        match op {
            BinaryOp::And => self.apply_ite(u, v, self.zero()),
            BinaryOp::Or => self.apply_ite(u, self.one(), v),
            BinaryOp::Xor => self.apply_ite(u, -v, v),
            BinaryOp::Xnor => self.apply_ite(u, v, -v),
            BinaryOp::Nand => Ok(-self.apply_ite(u, v, self.zero())?),
            BinaryOp::Nor => Ok(-self.apply_ite(u, self.one(), v)?),
            BinaryOp::Imply => self.apply_ite(u, v, self.one()),
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Result<Ref> {
        self.apply(BinaryOp::And, u, v)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Result<Ref> {
        self.apply(BinaryOp::Or, u, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Result<Ref> {
        self.apply(BinaryOp::Xor, u, v)
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        trace!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return Ok(g);
        }
        if self.is_zero(f) {
            return Ok(h);
        }

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => F
        if g == h {
            return Ok(g);
        }
        if self.is_one(g) && self.is_zero(h) {
            return Ok(f);
        }
        if self.is_zero(g) && self.is_one(h) {
            return Ok(-f);
        }
        if self.is_one(g) && h == -f {
            return Ok(self.one());
        }
        if g == f && self.is_one(h) {
            return Ok(self.one());
        }
        if g == -f && self.is_zero(h) {
            return Ok(self.zero());
        }
        if self.is_zero(g) && h == f {
            return Ok(f);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one(), h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero());
        }
        if g == -f {
            return self.apply_ite(f, self.zero(), h);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one());
        }

        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        assert_ne!(i, 0);

        // Equivalent pairs (choose the one with the lowest variable):
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        //   ite(F,G,1) == ite(~G,~F,1) == F -> G
        //   ite(F,0,H) == ite(~H,0,~F) == ~F ∧ H
        //   ite(F,G,~G) == ite(G,F,~F)
        if self.is_one(g) && k != 0 && k < i {
            return self.apply_ite(h, self.one(), f);
        }
        if self.is_zero(h) && j != 0 && j < i {
            return self.apply_ite(g, f, self.zero());
        }
        if self.is_one(h) && j != 0 && j < i {
            return self.apply_ite(-g, -f, self.one());
        }
        if self.is_zero(g) && k != 0 && k < i {
            return self.apply_ite(-h, self.zero(), -f);
        }
        if g == -h && j != 0 && j < i {
            return self.apply_ite(g, f, -f);
        }

        // Make sure the first two pointers (f and g) are regular (not negated)
        let (mut f, mut g, mut h) = (f, g, h);

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        self.poll_deadline()?;

        let key = IteKey(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return Ok(if n { -res } else { res });
        }

        // Top variable; the terminal has variable 0 and never wins.
        let mut m = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        if j != 0 {
            m = m.min(j);
        }
        if k != 0 {
            m = m.min(k);
        }
        assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0)?;
        let t = self.apply_ite(f1, g1, h1)?;

        let res = self.mk_node(m, e, t)?;
        self.cache.borrow_mut().insert(key, res);

        Ok(if n { -res } else { res })
    }
}

// Measurement
impl Bdd {
    /// Indices of all nodes reachable from `roots`, including the terminal.
    pub fn descendants(&self, roots: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(roots);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes reachable from `roots`, including the terminal.
    pub fn size(&self, roots: &[Ref]) -> usize {
        self.descendants(roots.iter().copied()).len()
    }

    /// Number of nodes in the unique table, including the terminal.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().len()
    }

    pub fn stats(&self) -> BddStats {
        let cache = self.cache.borrow();
        BddStats {
            apply_calls: self.apply_calls.get(),
            ite_steps: self.ite_steps.get(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
        }
    }

    pub fn to_bracket_string(&self, node: Ref) -> String {
        if self.is_zero(node) {
            return "(0)".to_string();
        } else if self.is_one(node) {
            return "(1)".to_string();
        }

        let v = self.variable(node.index());
        let name = self
            .var_name(v)
            .map_or_else(|| format!("x{}", v), |n| n.to_string());
        format!(
            "{}:({}, {}, {})",
            node,
            name,
            self.to_bracket_string(self.high_node(node)),
            self.to_bracket_string(self.low_node(node))
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_log::test;

    use super::*;

    fn manager(names: &[&str]) -> Bdd {
        let bdd = Bdd::default();
        bdd.declare(names.iter().copied()).unwrap();
        bdd
    }

    #[test]
    fn test_var() {
        let bdd = manager(&["x"]);
        let x = bdd.var("x").unwrap();

        assert_eq!(bdd.variable(x.index()), 1);
        assert_eq!(bdd.high_node(x), bdd.one());
        assert_eq!(bdd.low_node(x), bdd.zero());

        let not_x = -x;
        assert_eq!(bdd.high_node(not_x), bdd.zero());
        assert_eq!(bdd.low_node(not_x), bdd.one());
    }

    #[test]
    fn test_declare_order_is_level_order() {
        let bdd = manager(&["c", "a", "b"]);
        assert_eq!(bdd.var_id("c").unwrap(), 1);
        assert_eq!(bdd.var_id("a").unwrap(), 2);
        assert_eq!(bdd.var_id("b").unwrap(), 3);
        assert_eq!(bdd.var_name(2), Some(Variable::from("a")));
    }

    #[test]
    fn test_declare_duplicate() {
        let bdd = Bdd::default();
        assert_eq!(
            bdd.declare(["a", "a"]),
            Err(Error::DuplicateVariable("a".to_string()))
        );
    }

    #[test]
    fn test_undeclared() {
        let bdd = manager(&["a"]);
        assert_eq!(bdd.var("b"), Err(Error::UndeclaredVariable("b".to_string())));
    }

    #[test]
    fn test_de_morgan() {
        let bdd = manager(&["x", "y"]);
        let x = bdd.var("x").unwrap();
        let y = bdd.var("y").unwrap();

        let f = -bdd.apply_and(x, y).unwrap();
        let g = bdd.apply_or(-x, -y).unwrap();
        assert_eq!(f, g);

        let f = bdd.apply(BinaryOp::Nor, x, y).unwrap();
        let g = bdd.apply_and(-x, -y).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn test_xor_itself() {
        let bdd = manager(&["x", "y"]);
        let x = bdd.var("x").unwrap();
        let y = bdd.var("y").unwrap();
        let f = bdd.apply_and(x, y).unwrap();

        assert_eq!(bdd.apply_xor(f, f).unwrap(), bdd.zero());
        assert_eq!(bdd.apply_xor(f, -f).unwrap(), bdd.one());
        assert_eq!(bdd.apply(BinaryOp::Xnor, f, f).unwrap(), bdd.one());
    }

    #[test]
    fn test_imply() {
        let bdd = manager(&["x", "y"]);
        let x = bdd.var("x").unwrap();
        let y = bdd.var("y").unwrap();
        let f = bdd.apply(BinaryOp::Imply, x, y).unwrap();
        let g = bdd.apply_or(-x, y).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn test_size_depends_on_order() {
        // (a1 ∧ b1) ∨ (a2 ∧ b2) ∨ (a3 ∧ b3)
        fn build(bdd: &Bdd) -> Ref {
            let mut f = bdd.zero();
            for i in 1..=3 {
                let a = bdd.var(&format!("a{}", i)).unwrap();
                let b = bdd.var(&format!("b{}", i)).unwrap();
                let ab = bdd.apply_and(a, b).unwrap();
                f = bdd.apply_or(f, ab).unwrap();
            }
            f
        }

        let good = manager(&["a1", "b1", "a2", "b2", "a3", "b3"]);
        let bad = manager(&["a1", "a2", "a3", "b1", "b2", "b3"]);
        let f_good = build(&good);
        let f_bad = build(&bad);
        assert_eq!(good.size(&[f_good]), 7);
        assert!(bad.size(&[f_bad]) > good.size(&[f_good]));
    }

    #[test]
    fn test_size_shares_nodes() {
        let bdd = manager(&["x", "y"]);
        let x = bdd.var("x").unwrap();
        let y = bdd.var("y").unwrap();
        let f = bdd.apply_and(x, y).unwrap();
        // Complemented roots share their nodes.
        assert_eq!(bdd.size(&[f, -f]), 3);
        assert_eq!(bdd.size(&[bdd.one()]), 1);
    }

    #[test]
    fn test_max_nodes() {
        let bdd = Bdd::with_config(BddConfig::default().with_max_nodes(3));
        bdd.declare(["a", "b", "c"]).unwrap();
        let a = bdd.var("a").unwrap();
        let b = bdd.var("b").unwrap();
        // terminal + a + b fill the table
        let c = bdd.var("c");
        assert!(matches!(c, Err(Error::ResourceExhausted(_))));
        assert!(matches!(
            bdd.apply_and(a, b),
            Err(Error::ResourceExhausted(_))
        ));
    }

    #[test]
    fn test_deadline_in_the_past() {
        let bdd = Bdd::default();
        let names: Vec<String> = (0..40).map(|i| format!("x{}", i)).collect();
        bdd.declare(names.iter().map(String::as_str)).unwrap();
        bdd.set_deadline(Some(Instant::now() - Duration::from_secs(1)));

        let mut result = Ok(bdd.zero());
        // Nested pairs blow up under the declared order, so the deadline is hit.
        for i in 0..20 {
            let a = bdd.var(&names[i]).unwrap();
            let b = bdd.var(&names[39 - i]).unwrap();
            let ab = match bdd.apply_and(a, b) {
                Ok(ab) => ab,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            result = result.and_then(|f| bdd.apply_xor(f, ab));
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result, Err(Error::Timeout));
    }

    #[test]
    fn test_stats_count_apply_calls() {
        let bdd = manager(&["x", "y"]);
        let x = bdd.var("x").unwrap();
        let y = bdd.var("y").unwrap();
        bdd.apply_and(x, y).unwrap();
        bdd.apply_or(x, y).unwrap();
        let _ = bdd.apply_not(x);
        assert_eq!(bdd.stats().apply_calls, 2);
    }

    #[test]
    fn test_bracket_string() {
        let bdd = manager(&["x"]);
        let x = bdd.var("x").unwrap();
        assert_eq!(bdd.to_bracket_string(x), "@2:(x, (1), (0))");
    }
}
