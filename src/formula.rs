//! Boolean formulas as ordered trees.
//!
//! Child order is significant: it fixes the declaration order of variables, which in turn
//! breaks ties in every ordering heuristic. Children are therefore kept in a `Vec` and
//! never treated as a set.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Name of a Boolean input. Cheap to clone; equality and hashing by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Variable> for Variable {
    fn from(var: &Variable) -> Self {
        var.clone()
    }
}

impl Borrow<str> for Variable {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A variable together with its polarity inside a clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub variable: Variable,
    pub positive: bool,
}

impl Literal {
    pub fn pos(variable: impl Into<Variable>) -> Self {
        Self {
            variable: variable.into(),
            positive: true,
        }
    }

    pub fn neg(variable: impl Into<Variable>) -> Self {
        Self {
            variable: variable.into(),
            positive: false,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.positive {
            write!(f, "¬")?;
        }
        write!(f, "{}", self.variable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Var(Variable),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

// Constructors
impl Formula {
    pub fn var(name: impl Into<Variable>) -> Self {
        Formula::Var(name.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Formula) -> Self {
        Formula::Not(Box::new(child))
    }

    pub fn and(children: impl IntoIterator<Item = Formula>) -> Self {
        Formula::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Formula>) -> Self {
        Formula::Or(children.into_iter().collect())
    }

    pub fn literal(literal: &Literal) -> Self {
        let var = Formula::Var(literal.variable.clone());
        if literal.positive {
            var
        } else {
            Formula::not(var)
        }
    }

    /// Build a CNF from DIMACS-style signed literals; variable `i` is named `"i"`.
    ///
    /// ```
    /// use bdd_order::formula::Formula;
    ///
    /// let f = Formula::from_dimacs(&[&[1, -2], &[2, 3]]);
    /// assert!(f.is_cnf());
    /// assert_eq!(f.to_string(), "(1 ∨ ¬2) ∧ (2 ∨ 3)");
    /// ```
    pub fn from_dimacs(clauses: &[&[i32]]) -> Self {
        Formula::and(clauses.iter().map(|clause| {
            Formula::or(clause.iter().map(|&lit| {
                assert_ne!(lit, 0, "DIMACS literal must be non-zero");
                let var = Formula::var(lit.unsigned_abs().to_string());
                if lit < 0 {
                    Formula::not(var)
                } else {
                    var
                }
            }))
        }))
    }

    pub fn from_clauses(clauses: &[Vec<Literal>]) -> Self {
        Formula::and(
            clauses
                .iter()
                .map(|clause| Formula::or(clause.iter().map(Formula::literal))),
        )
    }
}

// Queries
impl Formula {
    /// Variables in first-occurrence order of a left-to-right depth-first walk.
    pub fn variables(&self) -> Vec<Variable> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Formula::Var(v) => {
                    if seen.insert(v) {
                        result.push(v.clone());
                    }
                }
                Formula::Not(child) => stack.push(child),
                Formula::And(children) | Formula::Or(children) => {
                    stack.extend(children.iter().rev());
                }
            }
        }
        result
    }

    /// Variables that occur directly under a negation, in first-occurrence order.
    pub fn negated_variables(&self) -> Vec<Variable> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Formula::Var(_) => {}
                Formula::Not(child) => {
                    if let Formula::Var(v) = child.as_ref() {
                        if seen.insert(v) {
                            result.push(v.clone());
                        }
                    } else {
                        stack.push(child);
                    }
                }
                Formula::And(children) | Formula::Or(children) => {
                    stack.extend(children.iter().rev());
                }
            }
        }
        result
    }

    fn as_literal(&self) -> Option<Literal> {
        match self {
            Formula::Var(v) => Some(Literal::pos(v)),
            Formula::Not(child) => match child.as_ref() {
                Formula::Var(v) => Some(Literal::neg(v)),
                _ => None,
            },
            _ => None,
        }
    }

    /// `And` of `Or`s of (possibly negated) variables.
    pub fn is_cnf(&self) -> bool {
        self.clauses().is_some()
    }

    /// Clauses of a CNF formula, or `None` if the formula is not in CNF.
    pub fn clauses(&self) -> Option<Vec<Vec<Literal>>> {
        let Formula::And(children) = self else {
            return None;
        };
        children
            .iter()
            .map(|clause| match clause {
                Formula::Or(literals) => literals.iter().map(Formula::as_literal).collect(),
                _ => None,
            })
            .collect()
    }

    pub fn eval(&self, assignment: &HashMap<Variable, bool>) -> bool {
        match self {
            Formula::Var(v) => assignment.get(v).copied().unwrap_or(false),
            Formula::Not(child) => !child.eval(assignment),
            Formula::And(children) => children.iter().all(|c| c.eval(assignment)),
            Formula::Or(children) => children.iter().any(|c| c.eval(assignment)),
        }
    }
}

/// Distinct variables of a clause, in literal order.
pub fn clause_variables(clause: &[Literal]) -> Vec<Variable> {
    let mut seen = HashSet::new();
    clause
        .iter()
        .filter(|lit| seen.insert(&lit.variable))
        .map(|lit| lit.variable.clone())
        .collect()
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut Formatter<'_>, children: &[Formula], op: &str) -> std::fmt::Result {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                match child {
                    Formula::And(_) | Formula::Or(_) => write!(f, "({})", child)?,
                    _ => write!(f, "{}", child)?,
                }
            }
            Ok(())
        }

        match self {
            Formula::Var(v) => write!(f, "{}", v),
            Formula::Not(child) => match child.as_ref() {
                Formula::Var(_) | Formula::Not(_) => write!(f, "¬{}", child),
                _ => write!(f, "¬({})", child),
            },
            Formula::And(children) => join(f, children, "∧"),
            Formula::Or(children) => join(f, children, "∨"),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn x(name: &str) -> Formula {
        Formula::var(name)
    }

    #[test]
    fn test_variables_first_occurrence() {
        let f = Formula::and([
            Formula::or([x("c"), Formula::not(x("a"))]),
            Formula::or([x("a"), x("b"), x("c")]),
        ]);
        let names: Vec<_> = f.variables().iter().map(|v| v.to_string()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_negated_variables() {
        let f = Formula::and([
            Formula::or([x("a"), Formula::not(x("b"))]),
            Formula::or([Formula::not(x("c")), Formula::not(x("b"))]),
        ]);
        let names: Vec<_> = f.negated_variables().iter().map(|v| v.to_string()).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn test_is_cnf() {
        assert!(Formula::from_dimacs(&[&[1, 2], &[-1]]).is_cnf());
        assert!(Formula::and([]).is_cnf());
        assert!(!x("a").is_cnf());
        assert!(!Formula::and([x("a")]).is_cnf());
        assert!(!Formula::and([Formula::or([Formula::and([x("a")])])]).is_cnf());
        assert!(!Formula::or([Formula::or([x("a")])]).is_cnf());
    }

    #[test]
    fn test_clauses() {
        let f = Formula::from_dimacs(&[&[1, -2], &[3]]);
        let clauses = f.clauses().unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0], vec![Literal::pos("1"), Literal::neg("2")]);
        assert_eq!(clauses[1], vec![Literal::pos("3")]);
    }

    #[test]
    fn test_clause_variables_dedup() {
        let clause = vec![Literal::pos("a"), Literal::neg("a"), Literal::pos("b")];
        let vars = clause_variables(&clause);
        assert_eq!(vars, vec![Variable::from("a"), Variable::from("b")]);
    }

    #[test]
    fn test_eval() {
        let f = Formula::from_dimacs(&[&[1, -2], &[2, 3]]);
        let assignment = HashMap::from([(Variable::from("1"), true), (Variable::from("3"), true)]);
        assert!(f.eval(&assignment));
        let assignment = HashMap::from([(Variable::from("2"), true)]);
        assert!(!f.eval(&assignment));
    }

    #[test]
    fn test_display() {
        let f = Formula::not(Formula::and([x("a"), x("b")]));
        assert_eq!(f.to_string(), "¬(a ∧ b)");
    }
}
