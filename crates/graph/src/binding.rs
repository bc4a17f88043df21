use crate::types::{BoundModule, ModuleGraph};
use modview_extractor::{ImportRecord, ModuleFacts};
use std::collections::BTreeMap;

/// Rewrite every internal import target into a reference to the module
/// itself. Records whose target has no facts are dropped.
pub fn bind_imports(modules: BTreeMap<String, ModuleFacts>) -> ModuleGraph {
    let mut graph = ModuleGraph::new();

    // Phase 1: one node per module, imports still unbound
    let mut pending = Vec::with_capacity(modules.len());
    for (name, facts) in modules {
        let ModuleFacts {
            info,
            method_defs,
            exports,
            internal_imports,
            method_calls,
            loc,
            ..
        } = facts;

        let idx = graph.add_module(BoundModule {
            name,
            path: info.path,
            is_package: info.is_package,
            loc,
            method_defs,
            exports,
            internal_imports: Vec::new(),
            method_calls,
        });
        pending.push((idx, internal_imports));
    }

    // Phase 2: bind targets in declaration order
    let mut dropped = 0usize;
    for (idx, records) in pending {
        let mut bound: Vec<ImportRecord<_>> = Vec::with_capacity(records.len());

        for record in records {
            let Some(target) = graph.find_module(&record.target) else {
                log::debug!(
                    "{}: import of {} has no module; dropping record",
                    graph.graph[idx].name,
                    record.target
                );
                dropped += 1;
                continue;
            };

            graph.add_import(idx, target);
            bound.push(record.map_target(|_| target));
        }

        graph.graph[idx].internal_imports = bound;
    }

    log::info!(
        "Bound imports of {} modules ({} import edges, {} records dropped)",
        graph.module_count(),
        graph.graph.edge_count(),
        dropped
    );

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use modview_extractor::ModuleInfo;
    use pretty_assertions::assert_eq;

    fn facts(name: &str, imports: Vec<ImportRecord>) -> (String, ModuleFacts) {
        let mut facts = ModuleFacts::new(ModuleInfo::new(name, format!("{name}.py"), false));
        facts.internal_imports = imports;
        facts.loc = 3;
        (name.to_string(), facts)
    }

    #[test]
    fn binds_targets_preserving_order() {
        let modules = BTreeMap::from([
            facts(
                "pkg.a",
                vec![
                    ImportRecord::module("pkg.b".to_string(), Some("b".to_string())),
                    ImportRecord::wildcard("pkg.c".to_string()),
                    ImportRecord::symbol("pkg.b".to_string(), "bar", None),
                ],
            ),
            facts("pkg.b", vec![]),
            facts("pkg.c", vec![]),
        ]);

        let graph = bind_imports(modules);
        let a = graph.find_module("pkg.a").unwrap();
        let b = graph.find_module("pkg.b").unwrap();
        let c = graph.find_module("pkg.c").unwrap();

        let targets: Vec<_> = graph.graph[a]
            .internal_imports
            .iter()
            .map(|record| record.target)
            .collect();
        assert_eq!(targets, vec![b, c, b]);
        assert_eq!(graph.graph[a].internal_imports[0].alias.as_deref(), Some("b"));

        // two records to pkg.b collapse into one edge
        assert_eq!(graph.graph.edge_count(), 2);
        let edge = graph.graph.find_edge(a, b).unwrap();
        assert_eq!(graph.graph[edge].records, 2);
    }

    #[test]
    fn drops_records_without_a_module() {
        let modules = BTreeMap::from([
            facts(
                "pkg.a",
                vec![
                    ImportRecord::module("pkg.skipped".to_string(), None),
                    ImportRecord::module("pkg.b".to_string(), None),
                ],
            ),
            facts("pkg.b", vec![]),
        ]);

        let graph = bind_imports(modules);
        let a = graph.find_module("pkg.a").unwrap();

        assert_eq!(graph.graph[a].internal_imports.len(), 1);
        assert_eq!(graph.module_count(), 2);
        assert_eq!(graph.module(a).map(|m| m.loc), Some(3));
    }
}
