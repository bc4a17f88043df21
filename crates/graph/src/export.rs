use crate::types::DependencyGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the module view document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    #[serde(rename = "LOC")]
    pub loc: usize,

    /// Target name -> call weight
    pub dependencies: BTreeMap<String, u64>,
}

/// Module view document, ordered by name
pub type ModuleDocument = BTreeMap<String, ModuleSummary>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNode {
    pub name: String,
    pub size_metric: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub from: String,
    pub to: String,
    pub weight: u64,
}

/// Flat node and edge lists handed to renderers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

impl DependencyGraph {
    pub fn to_document(&self) -> ModuleDocument {
        let mut document: ModuleDocument = self
            .graph
            .node_weights()
            .map(|node| {
                (
                    node.name.clone(),
                    ModuleSummary {
                        loc: node.loc,
                        dependencies: BTreeMap::new(),
                    },
                )
            })
            .collect();

        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()].name;
            let to = &self.graph[edge.target()].name;
            if let Some(summary) = document.get_mut(from) {
                summary.dependencies.insert(to.clone(), edge.weight().weight);
            }
        }

        document
    }

    /// Rebuild a graph from a document. Dependency targets missing from the
    /// document become nodes with zero LOC.
    pub fn from_document(document: &ModuleDocument) -> Self {
        let mut graph = Self::new();

        for (name, summary) in document {
            graph.add_node(name, summary.loc);
        }
        for (name, summary) in document {
            let from = graph.add_node(name, 0);
            for (target, &weight) in &summary.dependencies {
                let to = graph.add_node(target, 0);
                graph.add_weight(from, to, weight);
            }
        }

        graph
    }

    /// Nodes sorted by name, edges sorted by endpoints
    pub fn export(&self) -> GraphExport {
        let mut nodes: Vec<ExportNode> = self
            .graph
            .node_weights()
            .map(|node| ExportNode {
                name: node.name.clone(),
                size_metric: node.loc,
            })
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut edges: Vec<ExportEdge> = self
            .graph
            .edge_references()
            .map(|edge| ExportEdge {
                from: self.graph[edge.source()].name.clone(),
                to: self.graph[edge.target()].name.clone(),
                weight: edge.weight().weight,
            })
            .collect();
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

        GraphExport { nodes, edges }
    }
}
