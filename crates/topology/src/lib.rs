//! Topology graph of a cloud network inventory
//!
//! [`build`] turns an [`InventorySnapshot`] into a [`TopologyGraph`] where
//! networks contain subnetworks, subnetworks attach instances and networks
//! peer with each other. [`layout`] places the nodes of that graph on a grid,
//! one band per project and region.
//!
//! ```
//! use vpcmap_inventory::{InventorySnapshot, Network, Peering};
//!
//! let snapshot = InventorySnapshot {
//!     networks: vec![Network {
//!         name: "vpc-a".into(),
//!         project: "p1".into(),
//!         auto_create_subnetworks: None,
//!         peerings: vec![Peering::new("a-to-b", "projects/p2/global/networks/vpc-b")],
//!     }],
//!     ..Default::default()
//! };
//!
//! let graph = vpcmap_topology::build(&snapshot).unwrap();
//! assert_eq!(graph.node_count(), 2);
//!
//! let layout = vpcmap_topology::layout(&graph);
//! assert_eq!(layout.positions.len(), 2);
//! ```

mod builder;
mod graph;
mod layout;

pub use builder::{build, UNKNOWN_SUBNETWORK};
pub use graph::{NodeCategory, NodeId, TopologyEdge, TopologyGraph, TopologyNode};
pub use layout::{layout, layout_with, GroupKey, TopologyLayout, DEFAULT_PROJECT, GLOBAL_REGION};

pub use graph_layout::{GridLayout, Point, Vec2};
pub use vpcmap_inventory::{InventorySnapshot, MalformedSnapshot};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(#[from] MalformedSnapshot),
}

/// A reference that matched nothing known
///
/// Misses never stop a build, the record or interface concerned is dropped or
/// attached to a placeholder and the miss is kept on the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionMiss {
    #[error("subnetwork `{subnetwork}` refers to unknown network `{reference}`")]
    SubnetworkNetwork { subnetwork: String, reference: String },

    #[error("instance `{instance}` has an interface in unknown network `{reference}`")]
    InterfaceNetwork { instance: String, reference: String },

    #[error("instance `{instance}` refers to unknown subnetwork `{reference}`")]
    InterfaceSubnetwork { instance: String, reference: String },
}
