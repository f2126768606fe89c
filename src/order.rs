use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use crate::error::{Error, Result};
use crate::formula::Variable;

/// A total order over variables: every variable exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarOrder(Vec<Variable>);

impl VarOrder {
    pub fn new(vars: Vec<Variable>) -> Self {
        Self(vars)
    }

    pub fn into_inner(self) -> Vec<Variable> {
        self.0
    }

    /// Check that this order is a permutation of `expected`.
    pub fn validate(&self, expected: &[Variable]) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for v in &self.0 {
            if !seen.insert(v) {
                return Err(Error::MalformedOrdering(format!("`{}` appears twice", v)));
            }
        }
        let expected_set: HashSet<&Variable> = expected.iter().collect();
        if let Some(extra) = self.0.iter().find(|v| !expected_set.contains(v)) {
            return Err(Error::MalformedOrdering(format!("unexpected variable `{}`", extra)));
        }
        if let Some(missing) = expected.iter().find(|v| !seen.contains(v)) {
            return Err(Error::MalformedOrdering(format!("missing variable `{}`", missing)));
        }
        Ok(())
    }

    /// Keep only the variables of `vars`, then append those of `vars` this order lacks.
    ///
    /// Used to turn an order over a derived problem (e.g. the Tseitin encoding of a
    /// circuit, which adds one variable per gate) into an order over the circuit inputs.
    pub fn restrict_to(&self, vars: &[Variable]) -> VarOrder {
        let wanted: HashSet<&Variable> = vars.iter().collect();
        let mut seen = HashSet::with_capacity(vars.len());
        let mut result: Vec<Variable> = self
            .0
            .iter()
            .filter(|v| wanted.contains(v) && seen.insert(*v))
            .cloned()
            .collect();
        result.extend(vars.iter().filter(|v| !seen.contains(v)).cloned());
        Self(result)
    }
}

impl Deref for VarOrder {
    type Target = [Variable];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Variable>> for VarOrder {
    fn from(vars: Vec<Variable>) -> Self {
        Self(vars)
    }
}

impl FromIterator<Variable> for VarOrder {
    fn from_iter<T: IntoIterator<Item = Variable>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VarOrder {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for VarOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(names: &[&str]) -> Vec<Variable> {
        names.iter().map(|&s| Variable::from(s)).collect()
    }

    #[test]
    fn test_validate() {
        let expected = vars(&["a", "b", "c"]);
        assert!(VarOrder::new(vars(&["c", "a", "b"])).validate(&expected).is_ok());

        let dup = VarOrder::new(vars(&["a", "a", "b"])).validate(&expected);
        assert_eq!(dup, Err(Error::MalformedOrdering("`a` appears twice".to_string())));

        let missing = VarOrder::new(vars(&["a", "b"])).validate(&expected);
        assert_eq!(
            missing,
            Err(Error::MalformedOrdering("missing variable `c`".to_string()))
        );

        let extra = VarOrder::new(vars(&["a", "b", "c", "d"])).validate(&expected);
        assert_eq!(
            extra,
            Err(Error::MalformedOrdering("unexpected variable `d`".to_string()))
        );
    }

    #[test]
    fn test_restrict_to() {
        let order = VarOrder::new(vars(&["g1", "b", "g2", "a"]));
        let restricted = order.restrict_to(&vars(&["a", "b", "c"]));
        assert_eq!(restricted, VarOrder::new(vars(&["b", "a", "c"])));
        assert!(restricted.validate(&vars(&["a", "b", "c"])).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(VarOrder::new(vars(&["x", "y"])).to_string(), "[x, y]");
    }
}
