//! # Modview Graph
//!
//! Module-level dependency recovery from extracted facts.
//!
//! ## Architecture
//!
//! ```text
//! ModuleFacts (by name)
//!     │
//!     ├──> Export Closure (wildcard imports, cycle-safe)
//!     │
//!     ├──> Import Binding → ModuleGraph (petgraph arena)
//!     │      └─ ImportRecord<NodeIndex>, declaration order kept
//!     │
//!     ├──> Call Attribution → DependencyGraph
//!     │      ├─ reverse scan of imports (later shadows earlier)
//!     │      └─ zero-weight edges for declared but uncalled imports
//!     │
//!     ├──> Aggregation (uniform depth or prefix levels)
//!     │
//!     └──> Export / Render (JSON document, DOT, vis-network HTML)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use modview_extractor::{FactExtractor, ModuleInfo};
//! use modview_graph::{analyze, AggregationPolicy};
//! use std::collections::{BTreeMap, BTreeSet};
//!
//! let known: BTreeSet<String> = ["pkg.a", "pkg.b"].iter().map(|s| s.to_string()).collect();
//! let mut extractor = FactExtractor::new().unwrap();
//! let mut modules = BTreeMap::new();
//! for (name, source) in [("pkg.a", "import pkg.b as b\nb.bar()\n"), ("pkg.b", "def bar(): pass\n")] {
//!     let info = ModuleInfo::new(name, format!("{name}.py"), false);
//!     modules.insert(name.to_string(), extractor.extract(&info, source, &known).unwrap());
//! }
//!
//! let graph = analyze(&modules, &AggregationPolicy::Identity);
//! assert_eq!(graph.weight_between("pkg.a", "pkg.b"), 1);
//! ```

mod aggregation;
mod attribution;
mod binding;
mod closure;
mod error;
mod export;
mod graph;
mod render;
mod types;

pub use aggregation::{aggregate, AggregationPolicy};
pub use attribution::{attribute_calls, resolve_call};
pub use binding::bind_imports;
pub use closure::{close_exports, closed_exports};
pub use error::{GraphError, Result};
pub use export::{ExportEdge, ExportNode, GraphExport, ModuleDocument, ModuleSummary};
pub use render::{render, render_dot, render_html, vis_data, LayoutConfig, OutputFormat};
pub use types::{BoundModule, DependencyEdge, DependencyGraph, DependencyNode, ImportEdge, ModuleGraph};

use modview_extractor::ModuleFacts;
use std::collections::BTreeMap;

/// Run closure, binding, attribution and aggregation over extracted facts
pub fn analyze(modules: &BTreeMap<String, ModuleFacts>, policy: &AggregationPolicy) -> DependencyGraph {
    let closed = close_exports(modules);
    let bound = bind_imports(closed);
    let deps = attribute_calls(&bound);
    aggregate(&deps, policy)
}
