//! Call attribution.
//!
//! Each callee name recorded for a module is resolved to at most one
//! imported module by scanning its internal imports from last to first, so a
//! later import shadows an earlier one bound to the same name.

use crate::types::{BoundModule, DependencyGraph, ModuleGraph};
use modview_extractor::ImportRecord;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Build the module-level dependency graph.
///
/// Every declared internal import contributes an edge of weight zero, then
/// every resolved call adds its count to the edge towards its module.
pub fn attribute_calls(modules: &ModuleGraph) -> DependencyGraph {
    let mut deps = DependencyGraph::new();

    let nodes: HashMap<NodeIndex, NodeIndex> = modules
        .modules()
        .map(|(idx, module)| (idx, deps.add_node(&module.name, module.loc)))
        .collect();
    let node_of = |idx: NodeIndex| nodes.get(&idx).copied();

    let mut unresolved = 0u64;
    for (idx, module) in modules.modules() {
        let Some(from) = node_of(idx) else { continue };

        for target in modules.imported_modules(idx) {
            if let Some(to) = node_of(target) {
                deps.add_weight(from, to, 0);
            }
        }

        for (callee, &count) in &module.method_calls {
            match resolve_call(modules, module, callee) {
                Some(target) => {
                    if let Some(to) = node_of(target) {
                        deps.add_weight(from, to, count);
                    }
                }
                None => {
                    log::debug!("{}: call {callee} is unresolved", module.name);
                    unresolved += count;
                }
            }
        }
    }

    log::info!(
        "Attributed calls: {} modules, {} edges, total weight {} ({} unresolved calls)",
        deps.node_count(),
        deps.edge_count(),
        deps.total_weight(),
        unresolved
    );

    deps
}

/// Resolve one callee name of `module` to the module it depends on.
///
/// Returns `None` for local calls and for calls no import explains.
pub fn resolve_call(modules: &ModuleGraph, module: &BoundModule, callee: &str) -> Option<NodeIndex> {
    match callee.rsplit_once('.') {
        Some((receiver, _member)) => resolve_qualified(modules, module, receiver),
        None => resolve_unqualified(modules, module, callee),
    }
}

fn resolve_qualified(modules: &ModuleGraph, module: &BoundModule, receiver: &str) -> Option<NodeIndex> {
    module
        .internal_imports
        .iter()
        .rev()
        .find_map(|record| {
            let target = modules.module(record.target)?;

            if record.alias.as_deref() == Some(receiver) {
                return Some(prefer_submodule(modules, record, target));
            }
            if record.alias.is_none() && record.submodule.as_deref() == Some(receiver) {
                return Some(prefer_submodule(modules, record, target));
            }
            if target.name == receiver {
                return Some(record.target);
            }
            if record.is_wildcard() && target.exports.contains(receiver) {
                return Some(record.target);
            }
            None
        })
}

fn resolve_unqualified(modules: &ModuleGraph, module: &BoundModule, name: &str) -> Option<NodeIndex> {
    if module.method_defs.contains(name) {
        return None;
    }

    module
        .internal_imports
        .iter()
        .rev()
        .find(|record| {
            record.alias.as_deref() == Some(name)
                || record.submodule.as_deref() == Some(name)
                || (record.is_wildcard()
                    && modules
                        .module(record.target)
                        .is_some_and(|target| target.exports.contains(name)))
        })
        .map(|record| record.target)
}

/// `from m import s` where `m.s` is itself a module binds that module
fn prefer_submodule(
    modules: &ModuleGraph,
    record: &ImportRecord<NodeIndex>,
    target: &BoundModule,
) -> NodeIndex {
    record
        .submodule
        .as_deref()
        .filter(|_| !record.is_wildcard())
        .and_then(|sub| modules.find_module(&format!("{}.{}", target.name, sub)))
        .unwrap_or(record.target)
}
