//! Hypergraph model: variables as nodes, clauses as hyperedges.
//!
//! Nodes and hyperedges are kept in insertion order and addressed internally by index.
//! Adjacency is stored in both directions (node to incident edges, edge to members) and
//! every mutation updates both sides.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::formula::{clause_variables, Formula, Variable};

#[derive(Debug, Clone)]
struct Hyperedge {
    label: String,
    members: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Hypergraph {
    nodes: Vec<Variable>,
    node_index: HashMap<Variable, usize>,
    edges: Vec<Hyperedge>,
    edge_index: HashMap<String, usize>,
    incident: Vec<Vec<usize>>,
}

impl Hypergraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the clause hypergraph of a CNF formula, or `None` if `formula` is not CNF.
    ///
    /// Nodes are the formula's variables in first-occurrence order. Clause `i` with at
    /// least two distinct variables becomes hyperedge `c{i}`; unit clauses add no edge.
    pub fn from_cnf(formula: &Formula) -> Option<Self> {
        let clauses = formula.clauses()?;
        let mut hg = Hypergraph::new();
        for v in formula.variables() {
            hg.node_index.insert(v.clone(), hg.nodes.len());
            hg.nodes.push(v);
            hg.incident.push(Vec::new());
        }
        for (i, clause) in clauses.iter().enumerate() {
            let vars = clause_variables(clause);
            if vars.len() < 2 {
                continue;
            }
            let members = vars.iter().map(|v| hg.node_index[v]).collect();
            hg.push_edge(format!("c{}", i), members);
        }
        Some(hg)
    }

    pub fn add_node(&mut self, node: impl Into<Variable>) -> Result<()> {
        let node = node.into();
        if self.node_index.contains_key(&node) {
            return Err(Error::DuplicateNode(node.to_string()));
        }
        self.node_index.insert(node.clone(), self.nodes.len());
        self.nodes.push(node);
        self.incident.push(Vec::new());
        Ok(())
    }

    /// Add a hyperedge over existing nodes; member order is kept.
    pub fn add_hyperedge<I>(&mut self, label: impl Into<String>, members: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let label = label.into();
        if self.edge_index.contains_key(&label) {
            return Err(Error::DuplicateHyperedge(label));
        }
        let mut indices: Vec<usize> = Vec::new();
        for m in members {
            let i = self.node(m.as_ref())?;
            if indices.contains(&i) {
                return Err(Error::DuplicateLink {
                    node: m.as_ref().to_string(),
                    edge: label,
                });
            }
            indices.push(i);
        }
        self.push_edge(label, indices);
        Ok(())
    }

    fn push_edge(&mut self, label: String, members: Vec<usize>) {
        let e = self.edges.len();
        for &m in &members {
            self.incident[m].push(e);
        }
        self.edge_index.insert(label.clone(), e);
        self.edges.push(Hyperedge { label, members });
    }

    fn node(&self, name: &str) -> Result<usize> {
        self.node_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    fn edge(&self, label: &str) -> Result<usize> {
        self.edge_index
            .get(label)
            .copied()
            .ok_or_else(|| Error::UnknownHyperedge(label.to_string()))
    }

    /// Add `node` to the members of hyperedge `edge`.
    pub fn link(&mut self, node: &str, edge: &str) -> Result<()> {
        let n = self.node(node)?;
        let e = self.edge(edge)?;
        if self.edges[e].members.contains(&n) {
            return Err(Error::DuplicateLink {
                node: node.to_string(),
                edge: edge.to_string(),
            });
        }
        self.edges[e].members.push(n);
        self.incident[n].push(e);
        Ok(())
    }

    /// Remove `node` from hyperedge `edge`, on both sides of the adjacency.
    pub fn unlink(&mut self, node: &str, edge: &str) -> Result<()> {
        let n = self.node(node)?;
        let e = self.edge(edge)?;
        let Some(pos) = self.edges[e].members.iter().position(|&m| m == n) else {
            return Err(Error::MissingLink {
                node: node.to_string(),
                edge: edge.to_string(),
            });
        };
        self.edges[e].members.remove(pos);
        self.incident[n].retain(|&x| x != e);
        Ok(())
    }

    pub fn nodes(&self) -> &[Variable] {
        &self.nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_hyperedges(&self) -> usize {
        self.edges.len()
    }

    /// Hyperedges as `(label, members)` in insertion order.
    pub fn hyperedges(&self) -> impl Iterator<Item = (&str, Vec<&Variable>)> + '_ {
        self.edges.iter().map(|e| {
            let members = e.members.iter().map(|&m| &self.nodes[m]).collect();
            (e.label.as_str(), members)
        })
    }

    pub fn members(&self, edge: &str) -> Option<Vec<&Variable>> {
        let &e = self.edge_index.get(edge)?;
        Some(self.edges[e].members.iter().map(|&m| &self.nodes[m]).collect())
    }

    /// Labels of the hyperedges containing `node`.
    pub fn incident(&self, node: &str) -> Option<Vec<&str>> {
        let &n = self.node_index.get(node)?;
        Some(
            self.incident[n]
                .iter()
                .map(|&e| self.edges[e].label.as_str())
                .collect(),
        )
    }

    pub(crate) fn edge_members(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.edges.iter().map(|e| e.members.as_slice())
    }

    pub(crate) fn incident_edges(&self, node: usize) -> &[usize] {
        &self.incident[node]
    }

    pub(crate) fn edge_members_at(&self, edge: usize) -> &[usize] {
        &self.edges[edge].members
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_from_cnf_skips_unit_clauses() {
        let f = Formula::from_dimacs(&[&[1, -2], &[3], &[2, 3, -2]]);
        let hg = Hypergraph::from_cnf(&f).unwrap();
        assert_eq!(hg.num_nodes(), 3);
        assert_eq!(hg.num_hyperedges(), 2);
        let labels: Vec<&str> = hg.hyperedges().map(|(label, _)| label).collect();
        assert_eq!(labels, ["c0", "c2"]);
        let members: Vec<&str> = hg.members("c2").unwrap().iter().map(|v| v.name()).collect();
        assert_eq!(members, ["2", "3"]);
    }

    #[test]
    fn test_from_non_cnf() {
        let f = Formula::not(Formula::var("a"));
        assert!(Hypergraph::from_cnf(&f).is_none());
    }

    #[test]
    fn test_duplicates() {
        let mut hg = Hypergraph::new();
        hg.add_node("a").unwrap();
        hg.add_node("b").unwrap();
        assert_eq!(hg.add_node("a"), Err(Error::DuplicateNode("a".to_string())));

        hg.add_hyperedge("e", ["a", "b"]).unwrap();
        assert_eq!(
            hg.add_hyperedge("e", ["a"]),
            Err(Error::DuplicateHyperedge("e".to_string()))
        );
        assert_eq!(
            hg.add_hyperedge("f", ["c"]),
            Err(Error::UnknownNode("c".to_string()))
        );
        assert_eq!(
            hg.link("a", "e"),
            Err(Error::DuplicateLink {
                node: "a".to_string(),
                edge: "e".to_string()
            })
        );
        assert_eq!(hg.link("a", "g"), Err(Error::UnknownHyperedge("g".to_string())));
        assert_eq!(hg.unlink("c", "e"), Err(Error::UnknownNode("c".to_string())));
    }

    #[test]
    fn test_unlink_is_symmetric() {
        let mut hg = Hypergraph::new();
        for x in ["a", "b", "c"] {
            hg.add_node(x).unwrap();
        }
        hg.add_hyperedge("e1", ["a", "b"]).unwrap();
        hg.add_hyperedge("e2", ["a", "c"]).unwrap();
        assert_eq!(hg.incident("a").unwrap(), ["e1", "e2"]);

        hg.unlink("a", "e1").unwrap();
        assert_eq!(hg.incident("a").unwrap(), ["e2"]);
        let members: Vec<&str> = hg.members("e1").unwrap().iter().map(|v| v.name()).collect();
        assert_eq!(members, ["b"]);

        assert_eq!(
            hg.unlink("a", "e1"),
            Err(Error::MissingLink {
                node: "a".to_string(),
                edge: "e1".to_string()
            })
        );

        hg.link("c", "e1").unwrap();
        assert_eq!(hg.incident("c").unwrap(), ["e2", "e1"]);
    }
}
