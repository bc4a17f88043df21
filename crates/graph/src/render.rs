//! Renderers for a dependency graph.
//!
//! Scaling is linear in `value / max(value)`; a zero maximum yields ratio 0.

use crate::error::{GraphError, Result};
use crate::types::{DependencyEdge, DependencyGraph, DependencyNode};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Output artifact kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Module view document
    Json,
    /// Graphviz source
    Dot,
    /// Interactive vis-network page
    #[default]
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "dot" | "gv" => Ok(Self::Dot),
            "html" => Ok(Self::Html),
            other => Err(GraphError::UnknownFormat(other.to_string())),
        }
    }
}

/// forceAtlas2Based physics parameters for the HTML page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub gravity: f64,
    pub central_gravity: f64,
    pub spring_length: f64,
    pub spring_strength: f64,
    pub damping: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gravity: -50.0,
            central_gravity: 0.01,
            spring_length: 150.0,
            spring_strength: 0.08,
            damping: 0.4,
        }
    }
}

/// Render `graph` in `format`
pub fn render(graph: &DependencyGraph, format: OutputFormat, layout: &LayoutConfig) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&graph.to_document())?),
        OutputFormat::Dot => Ok(render_dot(graph)),
        OutputFormat::Html => render_html(graph, layout),
    }
}

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

fn dot_edge_attributes(
    _: &petgraph::graph::DiGraph<DependencyNode, DependencyEdge>,
    edge: EdgeReference<'_, DependencyEdge>,
) -> String {
    match edge.weight().weight {
        0 => "style=dashed, color=grey".to_string(),
        weight => format!("label=\"{weight}\""),
    }
}

fn dot_node_attributes(
    _: &petgraph::graph::DiGraph<DependencyNode, DependencyEdge>,
    (_, node): (NodeIndex, &DependencyNode),
) -> String {
    format!("tooltip=\"LOC: {}\"", node.loc)
}

pub fn render_dot(graph: &DependencyGraph) -> String {
    format!(
        "{}",
        Dot::with_attr_getters(
            &graph.graph,
            &[Config::EdgeNoLabel],
            &dot_edge_attributes,
            &dot_node_attributes,
        )
    )
}

/// vis-network node and edge arrays with the cosmetic scaling applied
pub fn vis_data(graph: &DependencyGraph) -> (Value, Value) {
    let (max_loc, max_weight) = graph.maxima();
    let (max_loc, max_weight) = (max_loc as f64, max_weight as f64);

    let mut sizes = HashMap::new();
    let mut order: Vec<&DependencyNode> = graph.graph.node_weights().collect();
    order.sort_by(|a, b| a.name.cmp(&b.name));

    let nodes: Vec<Value> = order
        .into_iter()
        .map(|node| {
            let r = ratio(node.loc as f64, max_loc);
            let size = r * 50.0 + 10.0;
            sizes.insert(node.name.as_str(), size);
            json!({
                "id": node.name,
                "label": node.name,
                "title": format!("{} ({} LOC)", node.name, node.loc),
                "size": size,
                "font": { "size": r * 20.0 + 10.0 },
            })
        })
        .collect();

    let export = graph.export();
    let edges: Vec<Value> = export
        .edges
        .iter()
        .map(|edge| {
            let r = ratio(edge.weight as f64, max_weight);
            let from_size = sizes.get(edge.from.as_str()).copied().unwrap_or(10.0);
            let to_size = sizes.get(edge.to.as_str()).copied().unwrap_or(10.0);
            let mut value = json!({
                "from": edge.from,
                "to": edge.to,
                "width": r * 5.0 + 1.0,
                "font": { "size": r * 15.0 + 10.0 },
                "arrowStrikethrough": false,
                "smooth": { "enabled": true },
                "length": from_size + to_size + 300.0 - r * 100.0,
            });
            if edge.weight > 0 {
                value["color"] = json!("blue");
                value["label"] = json!(edge.weight.to_string());
                value["arrows"] = json!({ "to": { "enabled": true, "scaleFactor": 0.35 } });
            } else {
                value["color"] = json!("grey");
                value["arrows"] = json!({ "to": { "enabled": false } });
            }
            value
        })
        .collect();

    (Value::Array(nodes), Value::Array(edges))
}

fn vis_options(layout: &LayoutConfig) -> Value {
    json!({
        "physics": {
            "solver": "forceAtlas2Based",
            "forceAtlas2Based": {
                "gravitationalConstant": layout.gravity,
                "centralGravity": layout.central_gravity,
                "springLength": layout.spring_length,
                "springConstant": layout.spring_strength,
                "damping": layout.damping,
            },
        },
        "edges": { "smooth": { "enabled": true } },
    })
}

/// Embed JSON in a script element
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn render_html(graph: &DependencyGraph, layout: &LayoutConfig) -> Result<String> {
    let (nodes, edges) = vis_data(graph);

    Ok(HTML_TEMPLATE
        .replace("{{NODES}}", &script_json(&nodes)?)
        .replace("{{EDGES}}", &script_json(&edges)?)
        .replace("{{OPTIONS}}", &script_json(&vis_options(layout))?))
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Module view</title>
<script src="https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js"></script>
<style>
  html, body { margin: 0; height: 100%; }
  #module-view { width: 100%; height: 100%; border: none; }
</style>
</head>
<body>
<div id="module-view"></div>
<script>
  var nodes = new vis.DataSet({{NODES}});
  var edges = new vis.DataSet({{EDGES}});
  var options = {{OPTIONS}};
  new vis.Network(document.getElementById("module-view"), { nodes: nodes, edges: edges }, options);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("pkg.a", 100);
        let b = graph.add_node("pkg.b", 50);
        let c = graph.add_node("pkg.c", 0);
        graph.add_weight(a, b, 4);
        graph.add_weight(a, c, 2);
        graph.add_weight(b, c, 0);
        graph
    }

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("DOT".parse::<OutputFormat>().unwrap(), OutputFormat::Dot);
        assert_eq!(OutputFormat::default(), OutputFormat::Html);
        assert!(matches!(
            "svg".parse::<OutputFormat>(),
            Err(GraphError::UnknownFormat(_))
        ));
    }

    #[test]
    fn scales_nodes_and_edges_against_maxima() {
        let (nodes, edges) = vis_data(&sample());

        assert_eq!(nodes[0]["id"], "pkg.a");
        assert_eq!(nodes[0]["size"], 60.0);
        assert_eq!(nodes[0]["font"]["size"], 30.0);
        assert_eq!(nodes[1]["size"], 35.0);
        assert_eq!(nodes[2]["size"], 10.0);

        // pkg.a -> pkg.b carries the maximum weight
        let heavy = &edges[0];
        assert_eq!(heavy["to"], "pkg.b");
        assert_eq!(heavy["width"], 6.0);
        assert_eq!(heavy["font"]["size"], 25.0);
        assert_eq!(heavy["length"], 60.0 + 35.0 + 200.0);
        assert_eq!(heavy["label"], "4");
        assert_eq!(heavy["color"], "blue");

        let zero = &edges[2];
        assert_eq!(zero["from"], "pkg.b");
        assert_eq!(zero["color"], "grey");
        assert_eq!(zero["width"], 1.0);
        assert!(zero.get("label").is_none());
        assert_eq!(zero["arrows"]["to"]["enabled"], false);
    }

    #[test]
    fn zero_maxima_do_not_divide_by_zero() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("a", 0);
        let b = graph.add_node("b", 0);
        graph.add_weight(a, b, 0);

        let (nodes, edges) = vis_data(&graph);

        assert_eq!(nodes[0]["size"], 10.0);
        assert_eq!(edges[0]["length"], 320.0);
    }

    #[test]
    fn html_embeds_data_and_layout() {
        let layout = LayoutConfig {
            spring_length: 220.0,
            ..LayoutConfig::default()
        };
        let html = render(&sample(), OutputFormat::Html, &layout).unwrap();

        assert!(html.contains("vis.Network"));
        assert!(html.contains("\"springLength\":220.0"));
        assert!(html.contains("\"gravitationalConstant\":-50.0"));
        assert!(html.contains("\"id\":\"pkg.c\""));
        assert!(!html.contains("{{NODES}}"));
    }

    #[test]
    fn dot_labels_weights_and_dashes_zero_edges() {
        let dot = render(&sample(), OutputFormat::Dot, &LayoutConfig::default()).unwrap();

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("pkg.a"));
        assert!(dot.contains("label=\"4\""));
        assert!(dot.contains("style=dashed, color=grey"));
        assert!(dot.contains("tooltip=\"LOC: 100\""));
    }

    #[test]
    fn json_is_the_module_document() {
        let json = render(&sample(), OutputFormat::Json, &LayoutConfig::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["pkg.a"]["LOC"], 100);
        assert_eq!(value["pkg.a"]["dependencies"]["pkg.b"], 4);
        assert_eq!(value["pkg.b"]["dependencies"]["pkg.c"], 0);
    }
}
