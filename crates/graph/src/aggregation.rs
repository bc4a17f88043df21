//! Hierarchical aggregation.
//!
//! Modules sharing a dotted-name prefix fold into one group node. Group LOC
//! is the sum of member LOC; a group's weight towards another group is the
//! sum of its members' weights towards that group's members. Weights between
//! members of the same group are dropped.

use crate::error::{GraphError, Result};
use crate::types::DependencyGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How module names map to group names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Every module is its own group
    #[default]
    Identity,

    /// Truncate every name to the first `n` segments
    Uniform(usize),

    /// Under a configured prefix, keep `extra` more segments below it
    Prefixes {
        levels: BTreeMap<String, usize>,
        only_aggregates: bool,
    },
}

impl AggregationPolicy {
    pub fn prefixes(levels: BTreeMap<String, usize>, only_aggregates: bool) -> Self {
        Self::Prefixes {
            levels,
            only_aggregates,
        }
    }

    /// Reject policies that cannot produce a meaningful key
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Identity => Ok(()),
            Self::Uniform(0) => Err(GraphError::InvalidPolicy(
                "uniform depth must be at least 1".to_string(),
            )),
            Self::Uniform(_) => Ok(()),
            Self::Prefixes { levels, .. } => {
                match levels
                    .keys()
                    .find(|prefix| prefix.split('.').any(str::is_empty))
                {
                    Some(prefix) => Err(GraphError::InvalidPolicy(format!(
                        "prefix {prefix:?} is not a dotted module name"
                    ))),
                    None => Ok(()),
                }
            }
        }
    }

    /// Group key of `name`, or `None` when the module is excluded
    pub fn group_key(&self, name: &str) -> Option<String> {
        let parts: Vec<&str> = name.split('.').collect();

        match self {
            Self::Identity => Some(name.to_string()),
            Self::Uniform(depth) => Some(parts[..parts.len().min(*depth)].join(".")),
            Self::Prefixes {
                levels,
                only_aggregates,
            } => {
                for i in 1..=parts.len() {
                    let prefix = parts[..i].join(".");
                    if let Some(extra) = levels.get(&prefix) {
                        let depth = parts.len().min(i + extra);
                        return Some(parts[..depth].join("."));
                    }
                }

                if *only_aggregates {
                    None
                } else {
                    Some(name.to_string())
                }
            }
        }
    }
}

/// Fold `graph` into groups according to `policy`
pub fn aggregate(graph: &DependencyGraph, policy: &AggregationPolicy) -> DependencyGraph {
    let mut grouped = DependencyGraph::new();

    let keys: Vec<Option<String>> = graph
        .graph
        .node_weights()
        .map(|node| policy.group_key(&node.name))
        .collect();

    for (node, key) in graph.graph.node_weights().zip(&keys) {
        match key {
            Some(key) => {
                grouped.add_node(key, node.loc);
            }
            None => log::debug!("{} matches no aggregation prefix; dropping", node.name),
        }
    }

    let mut intra = 0u64;
    for edge in graph.graph.edge_references() {
        let (Some(from), Some(to)) = (&keys[edge.source().index()], &keys[edge.target().index()])
        else {
            continue;
        };

        if from == to {
            intra += edge.weight().weight;
            continue;
        }

        if let (Some(a), Some(b)) = (grouped.find_node(from), grouped.find_node(to)) {
            grouped.add_weight(a, b, edge.weight().weight);
        }
    }

    log::info!(
        "Aggregated {} modules into {} groups ({} edges, {} intra-group weight dropped)",
        graph.node_count(),
        grouped.node_count(),
        grouped.edge_count(),
        intra
    );

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn levels(entries: &[(&str, usize)]) -> BTreeMap<String, usize> {
        entries.iter().map(|(p, n)| (p.to_string(), *n)).collect()
    }

    #[test]
    fn uniform_depth_truncates_names() {
        let policy = AggregationPolicy::Uniform(2);

        assert_eq!(policy.group_key("a.b.c.d").as_deref(), Some("a.b"));
        assert_eq!(policy.group_key("a").as_deref(), Some("a"));
    }

    #[test]
    fn first_matching_prefix_wins() {
        let policy = AggregationPolicy::prefixes(levels(&[("app", 1), ("app.core", 2)]), false);

        assert_eq!(policy.group_key("app.core.db.models").as_deref(), Some("app.core"));
        assert_eq!(policy.group_key("app").as_deref(), Some("app"));
        assert_eq!(policy.group_key("lib.x.y").as_deref(), Some("lib.x.y"));
    }

    #[test]
    fn only_aggregates_drops_unmatched_names() {
        let policy = AggregationPolicy::prefixes(levels(&[("app", 0)]), true);

        assert_eq!(policy.group_key("app.x.y").as_deref(), Some("app"));
        assert_eq!(policy.group_key("lib.x"), None);
    }

    #[test]
    fn rejects_unusable_policies() {
        assert!(AggregationPolicy::Uniform(0).validate().is_err());
        assert!(AggregationPolicy::prefixes(levels(&[("", 1)]), false)
            .validate()
            .is_err());
        assert!(AggregationPolicy::prefixes(levels(&[("a..b", 1)]), false)
            .validate()
            .is_err());
        assert!(AggregationPolicy::prefixes(levels(&[("app", 1)]), true)
            .validate()
            .is_ok());
    }

    #[test]
    fn sums_loc_and_drops_intra_group_weight() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("app.ui.view", 10);
        let b = graph.add_node("app.ui.widgets", 5);
        let c = graph.add_node("app.core.db", 7);
        let d = graph.add_node("vendor.lib", 3);
        graph.add_weight(a, b, 4);
        graph.add_weight(a, c, 2);
        graph.add_weight(b, c, 1);
        graph.add_weight(c, d, 9);
        graph.add_weight(b, a, 0);

        let policy = AggregationPolicy::prefixes(levels(&[("app", 1)]), true);
        let grouped = aggregate(&graph, &policy);

        assert_eq!(grouped.node_count(), 2);
        assert_eq!(grouped.get_node(grouped.find_node("app.ui").unwrap()).unwrap().loc, 15);
        assert_eq!(grouped.weight_between("app.ui", "app.core"), 3);
        assert_eq!(grouped.edge_count(), 1);
        assert!(grouped.find_node("vendor.lib").is_none());
    }

    #[test]
    fn cross_group_zero_weights_survive() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("x.a", 1);
        let b = graph.add_node("y.b", 1);
        graph.add_weight(a, b, 0);

        let grouped = aggregate(&graph, &AggregationPolicy::Uniform(1));

        assert_eq!(grouped.dependencies_of("x").unwrap(), BTreeMap::from([("y".to_string(), 0)]));
    }

    fn arb_graph() -> impl Strategy<Value = DependencyGraph> {
        let name = prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..4)
            .prop_map(|segments| segments.join("."));
        let names = prop::collection::btree_set(name, 1..10);

        names.prop_flat_map(|names| {
            let names: Vec<String> = names.into_iter().collect();
            let n = names.len();
            let edges = prop::collection::vec((0..n, 0..n, 0u64..20), 0..30);
            let locs = prop::collection::vec(0usize..100, n);
            (Just(names), locs, edges).prop_map(|(names, locs, edges)| {
                let mut graph = DependencyGraph::new();
                let idx: Vec<_> = names
                    .iter()
                    .zip(locs)
                    .map(|(name, loc)| graph.add_node(name, loc))
                    .collect();
                for (from, to, weight) in edges {
                    if from != to {
                        graph.add_weight(idx[from], idx[to], weight);
                    }
                }
                graph
            })
        })
    }

    fn arb_policy() -> impl Strategy<Value = AggregationPolicy> {
        let prefix = prop::sample::select(vec!["a", "b", "a.b", "c.a"]);
        prop_oneof![
            Just(AggregationPolicy::Identity),
            (1usize..4).prop_map(AggregationPolicy::Uniform),
            (prop::collection::btree_map(prefix.prop_map(String::from), 0usize..3, 0..3), any::<bool>())
                .prop_map(|(levels, only)| AggregationPolicy::prefixes(levels, only)),
        ]
    }

    proptest! {
        #[test]
        fn inter_group_weight_is_conserved(graph in arb_graph(), policy in arb_policy()) {
            let expected: u64 = graph
                .graph
                .edge_references()
                .filter_map(|edge| {
                    let from = policy.group_key(&graph.graph[edge.source()].name)?;
                    let to = policy.group_key(&graph.graph[edge.target()].name)?;
                    (from != to).then_some(edge.weight().weight)
                })
                .sum();

            let grouped = aggregate(&graph, &policy);
            prop_assert_eq!(grouped.total_weight(), expected);

            let expected_loc: usize = graph
                .graph
                .node_weights()
                .filter(|node| policy.group_key(&node.name).is_some())
                .map(|node| node.loc)
                .sum();
            let grouped_loc: usize = grouped.graph.node_weights().map(|node| node.loc).sum();
            prop_assert_eq!(grouped_loc, expected_loc);
        }
    }
}
