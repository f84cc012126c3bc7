//! Interactive HTML page of a topology
//!
//! The page loads vis-network and lets its physics simulation place the nodes,
//! the grid layout is not used here.

use crate::escape_xml;
use serde_json::{json, Value};
use tracing::debug;
use vpcmap_topology::{NodeCategory, TopologyEdge, TopologyGraph, TopologyNode};

pub const VIS_NETWORK_URL: &str =
    "https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js";

const PAGE_TITLE: &str = "GCP VPC Topology";
const PEERING_COLOR: &str = "gray";

fn shape(category: NodeCategory) -> &'static str {
    match category {
        NodeCategory::Network | NodeCategory::ExternalPeer => "box",
        NodeCategory::Subnetwork => "ellipse",
        NodeCategory::Instance => "dot",
    }
}

/// Tooltip of a node, one attribute per line
fn tooltip(node: &TopologyNode) -> String {
    let mut lines = vec![format!("{} {}", node.category, node.id)];
    if let Some(project) = &node.project {
        lines.push(format!("project: {project}"));
    }
    if let Some(zone) = &node.zone {
        lines.push(format!("zone: {zone}"));
    } else if let Some(region) = &node.region {
        lines.push(format!("region: {region}"));
    }
    lines.join("\n")
}

fn edge_data(from: &TopologyNode, to: &TopologyNode, edge: &TopologyEdge) -> Value {
    match edge {
        TopologyEdge::Peering { name, state } => {
            let mut title = format!("Peering {name}");
            if let Some(state) = state {
                title.push_str(&format!(" ({state})"));
            }
            json!({
                "from": from.id.qualified(),
                "to": to.id.qualified(),
                "color": PEERING_COLOR,
                "title": title,
            })
        }
        _ => json!({
            "from": from.id.qualified(),
            "to": to.id.qualified(),
        }),
    }
}

/// Node and edge data sets in the shape vis-network expects
pub(crate) fn vis_data(graph: &TopologyGraph) -> (Value, Value) {
    let nodes = graph
        .nodes()
        .map(|node| {
            json!({
                "id": node.id.qualified(),
                "label": node.label,
                "color": node.category.color(),
                "shape": shape(node.category),
                "title": tooltip(node),
            })
        })
        .collect();

    let edges = graph
        .edges()
        .map(|(from, to, edge)| edge_data(from, to, edge))
        .collect();

    (Value::Array(nodes), Value::Array(edges))
}

/// JSON made safe for inlining in a `<script>` element
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Self-contained page showing the graph with vis-network
pub fn render_html(graph: &TopologyGraph) -> String {
    let (nodes, edges) = vis_data(graph);

    debug!(
        "Rendering interactive page with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{VIS_NETWORK_URL}"></script>
<style>
  body {{ margin: 0; background: #ffffff; }}
  #topology {{ width: 100%; height: 800px; }}
</style>
</head>
<body>
<div id="topology"></div>
<script>
  const nodes = new vis.DataSet({nodes});
  const edges = new vis.DataSet({edges});
  const container = document.getElementById("topology");
  const options = {{ physics: {{ enabled: true }}, edges: {{ smooth: false }} }};
  new vis.Network(container, {{ nodes, edges }}, options);
</script>
</body>
</html>
"##,
        title = escape_xml(PAGE_TITLE),
        nodes = script_json(&nodes),
        edges = script_json(&edges),
    )
}
