use crate::graph::{NodeId, TopologyGraph, TopologyNode};
use graph_layout::{GridLayout, LayoutEngine, Point};
use petgraph::graph::NodeIndex;
use std::collections::BTreeMap;
use std::fmt;

/// Group of the nodes without a project, external peers
pub const DEFAULT_PROJECT: &str = "default";

/// Group of the nodes without a region, networks and placeholders
pub const GLOBAL_REGION: &str = "global";

/// Band of the layout a node belongs to
///
/// Keys order by project, then region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub project: String,
    pub region: String,
}

impl GroupKey {
    pub fn of(node: &TopologyNode) -> Self {
        Self {
            project: node
                .project
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            region: node
                .region
                .clone()
                .unwrap_or_else(|| GLOBAL_REGION.to_string()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.region.to_uppercase(), self.project)
    }
}

/// Positions of the nodes of a graph and the caption anchor of each group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyLayout {
    pub positions: BTreeMap<NodeId, Point>,
    pub anchors: BTreeMap<GroupKey, Point>,
}

/// Lay a graph out with the default grid
pub fn layout(graph: &TopologyGraph) -> TopologyLayout {
    layout_with(graph, &GridLayout::default())
}

/// Lay a graph out on the given grid
///
/// Nodes are banded by [`GroupKey`] and ordered by [`NodeId`] inside a band,
/// so the result only depends on node attributes.
pub fn layout_with(graph: &TopologyGraph, grid: &GridLayout) -> TopologyLayout {
    let inner = graph.graph();
    let groups = |ix: NodeIndex| (GroupKey::of(&inner[ix]), inner[ix].id.clone());

    let layout = grid.layout(inner, &groups);

    TopologyLayout {
        positions: layout
            .positions
            .into_iter()
            .map(|(ix, point)| (inner[ix].id.clone(), point))
            .collect(),
        anchors: layout.anchors,
    }
}
