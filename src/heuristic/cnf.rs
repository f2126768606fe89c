//! Clause-counting heuristics over CNF formulas.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::formula::{clause_variables, Literal, Variable};
use crate::order::VarOrder;

/// Sort `vars` by descending `score`; the sort is stable, so ties keep `vars` order.
fn by_descending_score(vars: &[Variable], score: &HashMap<&Variable, usize>) -> VarOrder {
    let mut order = vars.to_vec();
    order.sort_by_key(|v| Reverse(score.get(v).copied().unwrap_or(0)));
    order.into()
}

/// For each variable, the number of distinct other variables sharing a clause with it.
pub fn occurrence_counts<'a>(
    vars: &'a [Variable],
    clauses: &[Vec<Literal>],
) -> HashMap<&'a Variable, usize> {
    let mut neighbours: HashMap<Variable, HashSet<Variable>> = HashMap::new();
    for clause in clauses {
        let cv = clause_variables(clause);
        for v in &cv {
            let entry = neighbours.entry(v.clone()).or_default();
            entry.extend(cv.iter().filter(|&u| u != v).cloned());
        }
    }
    vars.iter()
        .map(|v| (v, neighbours.get(v).map_or(0, HashSet::len)))
        .collect()
}

/// Most-connected variables first; ties by position in `vars`.
pub fn occurrence_count(vars: &[Variable], clauses: &[Vec<Literal>]) -> VarOrder {
    by_descending_score(vars, &occurrence_counts(vars, clauses))
}

/// Variables first to connect to many new variables come first.
///
/// For each variable, clauses containing it are visited left to right; each adds the
/// number of its variables not seen so far for this variable (the variable itself counts
/// as seen). Ties keep `vars` order.
pub fn dependency_count(vars: &[Variable], clauses: &[Vec<Literal>]) -> VarOrder {
    let clause_vars: Vec<Vec<Variable>> = clauses.iter().map(|c| clause_variables(c)).collect();

    let mut score = HashMap::with_capacity(vars.len());
    for v in vars {
        let mut seen: HashSet<&Variable> = HashSet::from([v]);
        let mut count = 0;
        for cv in clause_vars.iter().filter(|cv| cv.contains(v)) {
            for u in cv {
                if seen.insert(u) {
                    count += 1;
                }
            }
        }
        score.insert(v, count);
    }

    by_descending_score(vars, &score)
}
