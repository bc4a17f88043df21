use crate::error::{GraphError, Result};
use crate::types::DependencyGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::BTreeMap;

impl DependencyGraph {
    /// Outgoing weights of `name`, keyed by target name
    pub fn dependencies_of(&self, name: &str) -> Result<BTreeMap<String, u64>> {
        let node = self
            .find_node(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;

        Ok(self
            .graph
            .edges(node)
            .map(|e| (self.graph[e.target()].name.clone(), e.weight().weight))
            .collect())
    }

    /// Incoming weights of `name`, keyed by source name
    pub fn dependents_of(&self, name: &str) -> Result<BTreeMap<String, u64>> {
        let node = self
            .find_node(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?;

        Ok(self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (self.graph[e.source()].name.clone(), e.weight().weight))
            .collect())
    }

    /// Weight of the edge `from -> to`, zero when absent
    pub fn weight_between(&self, from: &str, to: &str) -> u64 {
        match (self.find_node(from), self.find_node(to)) {
            (Some(a), Some(b)) => self
                .graph
                .find_edge(a, b)
                .map(|edge| self.graph[edge].weight)
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Sum of every edge weight
    pub fn total_weight(&self) -> u64 {
        self.graph.edge_weights().map(|edge| edge.weight).sum()
    }

    /// Largest node LOC and largest edge weight, for scaling
    pub fn maxima(&self) -> (usize, u64) {
        let max_loc = self.graph.node_weights().map(|n| n.loc).max().unwrap_or(0);
        let max_weight = self.graph.edge_weights().map(|e| e.weight).max().unwrap_or(0);
        (max_loc, max_weight)
    }
}
