use crate::ResolutionMiss;
use derive_more::Display;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Namespace of an identifier. Networks and external peers share one so a
/// peering to a collected network lands on that network's node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Scope {
    Network,
    Subnetwork,
    Instance,
}

/// Identifier of a node, `vpc-a` for networks and `vpc-a:sub-1` for the
/// subnetworks and instances of `vpc-a`
///
/// Identifiers order lexically by their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{key}")]
pub struct NodeId {
    key: String,
    scope: Scope,
}

impl NodeId {
    pub fn network(name: &str) -> Self {
        Self {
            key: name.to_string(),
            scope: Scope::Network,
        }
    }

    pub fn subnetwork(network: &str, name: &str) -> Self {
        Self {
            key: format!("{network}:{name}"),
            scope: Scope::Subnetwork,
        }
    }

    pub fn instance(network: &str, name: &str) -> Self {
        Self {
            key: format!("{network}:{name}"),
            scope: Scope::Instance,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Identifier text prefixed with its namespace, unique across the graph
    /// even when a subnetwork and an instance of a network share a name
    pub fn qualified(&self) -> String {
        let scope = match self.scope {
            Scope::Network => "network",
            Scope::Subnetwork => "subnetwork",
            Scope::Instance => "instance",
        };
        format!("{scope}/{}", self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum NodeCategory {
    #[display("network")]
    Network,
    #[display("subnetwork")]
    Subnetwork,
    #[display("instance")]
    Instance,
    #[display("external-peer")]
    ExternalPeer,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 4] = [
        NodeCategory::Network,
        NodeCategory::Subnetwork,
        NodeCategory::Instance,
        NodeCategory::ExternalPeer,
    ];

    /// Display color, shared by every renderer and the legend
    pub fn color(self) -> &'static str {
        match self {
            NodeCategory::Network => "skyblue",
            NodeCategory::Subnetwork => "lightgreen",
            NodeCategory::Instance => "orange",
            NodeCategory::ExternalPeer => "lightgray",
        }
    }

    pub fn legend(self) -> &'static str {
        match self {
            NodeCategory::Network => "VPC",
            NodeCategory::Subnetwork => "Subnet",
            NodeCategory::Instance => "Instance",
            NodeCategory::ExternalPeer => "VPC (external peering)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopologyNode {
    pub id: NodeId,
    pub label: String,
    pub category: NodeCategory,
    /// Owning project, unknown for external peers
    pub project: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    /// Subnetwork created because an instance referenced it
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyEdge {
    /// Network to one of its subnetworks
    Containment,
    /// Subnetwork to an instance with an interface in it
    Attachment,
    /// Network to a peer network
    Peering { name: String, state: Option<String> },
}

impl TopologyEdge {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            TopologyEdge::Peering { .. } => Some("peering"),
            _ => None,
        }
    }

    pub fn is_peering(&self) -> bool {
        matches!(self, TopologyEdge::Peering { .. })
    }
}

/// Undirected graph of the topology, built by [`crate::build`]
///
/// Every edge connects two nodes of the graph and no two nodes share an
/// identifier.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: UnGraph<TopologyNode, TopologyEdge>,
    index: HashMap<NodeId, NodeIndex>,
    misses: Vec<ResolutionMiss>,
}

impl TopologyGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&TopologyNode> {
        self.index.get(id).map(|&ix| &self.graph[ix])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
        self.graph.node_weights()
    }

    /// Edges in insertion order, with both endpoints
    pub fn edges(&self) -> impl Iterator<Item = (&TopologyNode, &TopologyNode, &TopologyEdge)> {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    /// Nodes sharing an edge with `id`, once per edge
    pub fn neighbors<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a TopologyNode> + 'a {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&ix| {
                self.graph.edges(ix).map(move |edge| {
                    if edge.source() == ix {
                        edge.target()
                    } else {
                        edge.source()
                    }
                })
            })
            .map(move |other| &self.graph[other])
    }

    /// References that could not be matched while building
    pub fn misses(&self) -> &[ResolutionMiss] {
        &self.misses
    }

    /// Underlying petgraph graph, for algorithms working on petgraph traits
    pub fn graph(&self) -> &UnGraph<TopologyNode, TopologyEdge> {
        &self.graph
    }

    pub(crate) fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Insert a node unless one with the same identifier exists
    ///
    /// Returns the index of the node with that identifier and whether it was
    /// inserted by this call.
    pub(crate) fn insert_node(&mut self, node: TopologyNode) -> (NodeIndex, bool) {
        if let Some(&ix) = self.index.get(&node.id) {
            return (ix, false);
        }
        let id = node.id.clone();
        let ix = self.graph.add_node(node);
        self.index.insert(id, ix);
        (ix, true)
    }

    pub(crate) fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, edge: TopologyEdge) {
        self.graph.add_edge(a, b, edge);
    }

    pub(crate) fn record_miss(&mut self, miss: ResolutionMiss) {
        self.misses.push(miss);
    }
}
