use modview_extractor::ImportRecord;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Module whose internal imports point at other modules of the same graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundModule {
    pub name: String,
    pub path: PathBuf,
    pub is_package: bool,
    pub loc: usize,
    pub method_defs: BTreeSet<String>,

    /// Closed export set
    pub exports: BTreeSet<String>,

    /// Internal imports in declaration order
    pub internal_imports: Vec<ImportRecord<NodeIndex>>,

    pub method_calls: BTreeMap<String, u64>,
}

/// Declared import between two modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportEdge {
    /// Number of import records from source to target
    pub records: usize,
}

/// Arena of bound modules; edges are declared internal imports
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    pub graph: DiGraph<BoundModule, ImportEdge>,

    /// Module name -> NodeIndex mapping for fast lookup
    pub module_index: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: BoundModule) -> NodeIndex {
        let name = module.name.clone();
        let idx = self.graph.add_node(module);
        self.module_index.insert(name, idx);
        idx
    }

    /// Record one import declaration from `from` to `to`
    pub fn add_import(&mut self, from: NodeIndex, to: NodeIndex) {
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge].records += 1,
            None => {
                self.graph.add_edge(from, to, ImportEdge { records: 1 });
            }
        }
    }

    pub fn find_module(&self, name: &str) -> Option<NodeIndex> {
        self.module_index.get(name).copied()
    }

    pub fn module(&self, idx: NodeIndex) -> Option<&BoundModule> {
        self.graph.node_weight(idx)
    }

    pub fn modules(&self) -> impl Iterator<Item = (NodeIndex, &BoundModule)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|module| (idx, module)))
    }

    /// Modules `idx` declares an internal import of
    pub fn imported_modules(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Node of a dependency graph: a module or an aggregated group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub name: String,
    pub loc: usize,
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Call weight from one node to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub weight: u64,
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.weight)
    }
}

/// Weighted dependency graph, at most one edge per ordered pair
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub graph: DiGraph<DependencyNode, DependencyEdge>,

    /// Node name -> NodeIndex mapping for fast lookup
    pub node_index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node `name`, adding `loc` to its LOC
    pub fn add_node(&mut self, name: &str, loc: usize) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(name) {
            self.graph[idx].loc += loc;
            return idx;
        }

        let idx = self.graph.add_node(DependencyNode {
            name: name.to_string(),
            loc,
        });
        self.node_index.insert(name.to_string(), idx);
        idx
    }

    /// Add `weight` to the edge `from -> to`, creating it (possibly at zero)
    pub fn add_weight(&mut self, from: NodeIndex, to: NodeIndex, weight: u64) {
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge].weight += weight,
            None => {
                self.graph.add_edge(from, to, DependencyEdge { weight });
            }
        }
    }

    pub fn find_node(&self, name: &str) -> Option<NodeIndex> {
        self.node_index.get(name).copied()
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&DependencyNode> {
        self.graph.node_weight(idx)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &DependencyNode)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
