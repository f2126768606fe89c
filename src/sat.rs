use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::formula::{Literal, Variable};
use crate::reference::Ref;

impl Bdd {
    /// Returns one satisfying assignment for the BDD, if any exists.
    ///
    /// Only the variables on the chosen path are assigned; the rest are don't-cares.
    /// Returns `None` if the BDD represents the constant false function.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<Literal>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;

        // Walk down the BDD, always picking a satisfying branch
        while !self.is_one(current) {
            let v = self.variable(current.index());
            let name = self.var_name(v).unwrap_or_else(|| Variable::new(format!("x{}", v)));
            let high = self.high_node(current);
            let low = self.low_node(current);

            // Prefer high branch if satisfiable, otherwise take low
            if !self.is_zero(high) {
                path.push(Literal::pos(name));
                current = high;
            } else {
                path.push(Literal::neg(name));
                current = low;
            }
        }

        Some(path)
    }

    /// Number of assignments to `num_vars` variables that satisfy `node`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(2u32).pow(num_vars as u32);
        self._sat_count(node, &max, &mut cache)
    }

    fn _sat_count(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let low = self.low(node.index());
        let high = self.high(node.index());

        let count_low = self._sat_count(low, max, cache);
        let count_high = self._sat_count(high, max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn cube(bdd: &Bdd, lits: &[(&str, bool)]) -> Ref {
        let mut f = bdd.one();
        for &(name, positive) in lits {
            let x = bdd.var(name).unwrap();
            f = bdd.apply_and(f, if positive { x } else { -x }).unwrap();
        }
        f
    }

    #[test]
    fn test_one_sat() {
        let bdd = Bdd::default();
        bdd.declare(["1", "2", "3"]).unwrap();

        let f = cube(&bdd, &[("1", true), ("2", false), ("3", false)]);
        let model = bdd.one_sat(f);
        let expected = vec![Literal::pos("1"), Literal::neg("2"), Literal::neg("3")];
        assert_eq!(model, Some(expected));

        let g = bdd.apply_and(f, -f).unwrap();
        assert_eq!(bdd.one_sat(g), None);
    }

    #[test]
    fn test_one_sat_satisfies() {
        let bdd = Bdd::default();
        bdd.declare(["a", "b", "c"]).unwrap();
        let a = bdd.var("a").unwrap();
        let b = bdd.var("b").unwrap();
        let c = bdd.var("c").unwrap();
        // ¬a ∧ (b ⊕ c)
        let bc = bdd.apply_xor(b, c).unwrap();
        let f = bdd.apply_and(-a, bc).unwrap();

        let model = bdd.one_sat(f).unwrap();
        let mut g = f;
        for lit in &model {
            let x = bdd.var(lit.variable.name()).unwrap();
            g = bdd.apply_and(g, if lit.positive { x } else { -x }).unwrap();
        }
        assert!(!bdd.is_zero(g));
    }

    #[test]
    fn test_sat_count_terminal() {
        let bdd = Bdd::default();

        assert_eq!(bdd.sat_count(bdd.zero(), 3), BigUint::ZERO);
        assert_eq!(bdd.sat_count(bdd.one(), 0), BigUint::from(1u32));
        assert_eq!(bdd.sat_count(bdd.one(), 1), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(bdd.one(), 3), BigUint::from(8u32));
    }

    #[test]
    fn test_sat_count() {
        let bdd = Bdd::default();
        bdd.declare(["x", "y", "z"]).unwrap();
        let x = bdd.var("x").unwrap();
        let y = bdd.var("y").unwrap();
        let z = bdd.var("z").unwrap();

        assert_eq!(bdd.sat_count(x, 3), BigUint::from(4u32));
        assert_eq!(bdd.sat_count(-x, 3), BigUint::from(4u32));

        let f = bdd.apply_or(x, y).unwrap();
        assert_eq!(bdd.sat_count(f, 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(-f, 2), BigUint::from(1u32));

        let g = bdd.apply_xor(f, z).unwrap();
        assert_eq!(bdd.sat_count(g, 3), BigUint::from(4u32));
    }
}
