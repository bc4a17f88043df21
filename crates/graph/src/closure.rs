//! Export closure over wildcard imports.
//!
//! The closed export set of a module is the union of the pre-closure
//! exports of every module reachable from it through wildcard imports,
//! itself included. Each computation keeps its own visited set, so cyclic
//! wildcard imports terminate and every module is expanded at most once.

use modview_extractor::ModuleFacts;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Return a copy of `modules` with every export set closed
pub fn close_exports(modules: &BTreeMap<String, ModuleFacts>) -> BTreeMap<String, ModuleFacts> {
    let closed: BTreeMap<String, ModuleFacts> = modules
        .iter()
        .map(|(name, facts)| {
            let mut closed = facts.clone();
            closed.exports = closed_exports(name, modules);
            (name.clone(), closed)
        })
        .collect();

    let added: usize = closed
        .iter()
        .map(|(name, facts)| facts.exports.len() - modules[name].exports.len())
        .sum();
    log::info!("Closed exports of {} modules ({} names propagated)", closed.len(), added);

    closed
}

/// Closed export set of a single module
pub fn closed_exports(start: &str, modules: &BTreeMap<String, ModuleFacts>) -> BTreeSet<String> {
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    let mut exports = BTreeSet::new();

    while let Some(name) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }

        let Some(module) = modules.get(name) else {
            log::debug!("Wildcard target {name} has no facts; ignoring");
            continue;
        };

        exports.extend(module.exports.iter().cloned());
        stack.extend(
            module
                .wildcard_queue
                .iter()
                .map(String::as_str)
                .filter(|target| !visited.contains(target)),
        );
    }

    exports
}
