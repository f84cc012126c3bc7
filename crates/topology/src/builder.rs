use crate::graph::{NodeCategory, NodeId, TopologyEdge, TopologyGraph, TopologyNode};
use crate::{ResolutionMiss, TopologyError};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};
use vpcmap_inventory::reference::{region_from_zone, resolve, short_name};
use vpcmap_inventory::{Instance, InventorySnapshot, Network, NetworkInterface, Subnetwork};

/// Name of the subnetwork used for interfaces without one
pub const UNKNOWN_SUBNETWORK: &str = "unknown";

/// Build the topology graph of a snapshot
///
/// The snapshot is validated first, nothing is built from a malformed one.
/// References that don't resolve are recorded on the graph as misses.
///
/// Records are visited in a canonical order, so when two records map to the
/// same node the one kept does not depend on the order of the snapshot.
///
/// # Errors
/// Returns [`TopologyError::MalformedSnapshot`] when a record lacks a
/// required attribute
pub fn build(snapshot: &InventorySnapshot) -> Result<TopologyGraph, TopologyError> {
    snapshot.validate()?;

    let mut builder = GraphBuilder::default();
    builder.add_networks(&snapshot.networks);
    builder.add_subnetworks(&snapshot.subnetworks);
    builder.add_instances(&snapshot.instances);
    // Peerings go last so that a peer collected in this snapshot is never
    // mistaken for an external one
    builder.add_peerings(&snapshot.networks);

    let graph = builder.graph;
    debug!(
        "Built topology with {} nodes, {} edges, {} misses",
        graph.node_count(),
        graph.edge_count(),
        graph.misses().len()
    );
    Ok(graph)
}

struct NetworkEntry {
    index: NodeIndex,
    project: String,
}

#[derive(Default)]
struct GraphBuilder {
    graph: TopologyGraph,
    networks: BTreeMap<String, NetworkEntry>,
    /// (source network, peering name, peer reference) of the edges added
    peerings: HashSet<(String, String, String)>,
}

impl GraphBuilder {
    fn miss(&mut self, miss: ResolutionMiss) {
        warn!("{miss}");
        self.graph.record_miss(miss);
    }

    fn add_networks(&mut self, networks: &[Network]) {
        let mut networks: Vec<&Network> = networks.iter().collect();
        networks.sort_by_key(|&network| (&network.name, &network.project));

        for network in networks {
            let (index, inserted) = self.graph.insert_node(TopologyNode {
                id: NodeId::network(&network.name),
                label: network.name.clone(),
                category: NodeCategory::Network,
                project: Some(network.project.clone()),
                region: None,
                zone: None,
                placeholder: false,
            });

            if !inserted {
                warn!(
                    "Network `{}` of project {} is already known, ignoring",
                    network.name, network.project
                );
                continue;
            }

            self.networks.insert(
                network.name.clone(),
                NetworkEntry {
                    index,
                    project: network.project.clone(),
                },
            );
        }
    }

    fn add_subnetworks(&mut self, subnetworks: &[Subnetwork]) {
        let mut subnetworks: Vec<&Subnetwork> = subnetworks.iter().collect();
        subnetworks.sort_by_key(|&subnetwork| {
            (
                &subnetwork.name,
                &subnetwork.network,
                &subnetwork.region,
                &subnetwork.ip_cidr_range,
            )
        });

        for subnetwork in subnetworks {
            let Some((network, entry)) = resolve(&subnetwork.network, &self.networks).resolved()
            else {
                self.miss(ResolutionMiss::SubnetworkNetwork {
                    subnetwork: subnetwork.name.clone(),
                    reference: subnetwork.network.clone(),
                });
                continue;
            };

            let node = TopologyNode {
                id: NodeId::subnetwork(network, &subnetwork.name),
                label: format!("{} ({})", subnetwork.name, subnetwork.ip_cidr_range),
                category: NodeCategory::Subnetwork,
                project: Some(entry.project.clone()),
                region: Some(subnetwork.region.clone()),
                zone: None,
                placeholder: false,
            };
            let network_index = entry.index;

            let (index, inserted) = self.graph.insert_node(node);
            if !inserted {
                warn!(
                    "Subnetwork `{}` appears twice in network `{network}`, ignoring the one in {}",
                    subnetwork.name, subnetwork.region
                );
                continue;
            }
            self.graph
                .add_edge(network_index, index, TopologyEdge::Containment);
        }
    }

    fn add_instances(&mut self, instances: &[Instance]) {
        let mut interfaces: Vec<(&Instance, &NetworkInterface)> = instances
            .iter()
            .flat_map(|instance| instance.interfaces.iter().map(move |nic| (instance, nic)))
            .collect();
        interfaces.sort_by_key(|&(instance, nic)| {
            (
                &instance.name,
                &instance.zone,
                &nic.network,
                &nic.subnetwork,
                &nic.ip,
            )
        });

        for (instance, interface) in interfaces {
            self.add_interface(instance, interface);
        }
    }

    fn add_interface(&mut self, instance: &Instance, interface: &NetworkInterface) {
        let Some((network, entry)) = resolve(&interface.network, &self.networks).resolved() else {
            self.miss(ResolutionMiss::InterfaceNetwork {
                instance: instance.name.clone(),
                reference: interface.network.clone(),
            });
            return;
        };
        let network = network.to_string();
        let network_index = entry.index;
        let project = entry.project.clone();

        let id = NodeId::instance(&network, &instance.name);
        if self.graph.contains(&id) {
            warn!(
                "Instance `{id}` already has an interface in network `{network}`, ignoring the one in {}",
                instance.zone
            );
            return;
        }

        let subnetwork_index = self.subnetwork_for(
            &network,
            network_index,
            &project,
            instance,
            interface.subnetwork.as_deref(),
        );

        let label = match &interface.ip {
            Some(ip) => format!("{} ({ip})", instance.name),
            None => instance.name.clone(),
        };
        let (index, _) = self.graph.insert_node(TopologyNode {
            id,
            label,
            category: NodeCategory::Instance,
            project: Some(project),
            region: Some(region_from_zone(&instance.zone).to_string()),
            zone: Some(instance.zone.clone()),
            placeholder: false,
        });
        self.graph
            .add_edge(subnetwork_index, index, TopologyEdge::Attachment);
    }

    /// Subnetwork node an interface attaches to, created as a placeholder
    /// when the snapshot doesn't describe it
    fn subnetwork_for(
        &mut self,
        network: &str,
        network_index: NodeIndex,
        project: &str,
        instance: &Instance,
        reference: Option<&str>,
    ) -> NodeIndex {
        let name = reference.map_or(UNKNOWN_SUBNETWORK, short_name);
        let id = NodeId::subnetwork(network, name);

        let existing = self.graph.index_of(&id);
        if let Some(index) = existing {
            if !self.graph.graph()[index].placeholder {
                return index;
            }
        }

        if let Some(reference) = reference {
            self.miss(ResolutionMiss::InterfaceSubnetwork {
                instance: instance.name.clone(),
                reference: reference.to_string(),
            });
        }

        if let Some(index) = existing {
            return index;
        }

        debug!("Creating placeholder subnetwork {id}");
        let (index, _) = self.graph.insert_node(TopologyNode {
            id,
            label: name.to_string(),
            category: NodeCategory::Subnetwork,
            project: Some(project.to_string()),
            region: None,
            zone: None,
            placeholder: true,
        });
        self.graph
            .add_edge(network_index, index, TopologyEdge::Containment);
        index
    }

    fn add_peerings(&mut self, networks: &[Network]) {
        for network in networks {
            // Peerings of a network dropped as a duplicate are dropped with it
            let Some(source) = self
                .networks
                .get(&network.name)
                .filter(|entry| entry.project == network.project)
                .map(|entry| entry.index)
            else {
                continue;
            };

            for peering in &network.peerings {
                let key = (
                    network.name.clone(),
                    peering.name.clone(),
                    peering.network.clone(),
                );
                if !self.peerings.insert(key) {
                    debug!(
                        "Peering `{}` of network `{}` listed twice",
                        peering.name, network.name
                    );
                    continue;
                }

                let peer = short_name(&peering.network);
                let (target, inserted) = self.graph.insert_node(TopologyNode {
                    id: NodeId::network(peer),
                    label: peer.to_string(),
                    category: NodeCategory::ExternalPeer,
                    project: None,
                    region: None,
                    zone: None,
                    placeholder: false,
                });
                if inserted {
                    debug!("Network `{peer}` is outside the snapshot, adding it as external peer");
                }

                self.graph.add_edge(
                    source,
                    target,
                    TopologyEdge::Peering {
                        name: peering.name.clone(),
                        state: peering.state.clone(),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;
    use vpcmap_inventory::Peering;

    fn network(name: &str, project: &str, peers: &[&str]) -> Network {
        Network {
            name: name.to_string(),
            project: project.to_string(),
            auto_create_subnetworks: Some(false),
            peerings: peers
                .iter()
                .map(|peer| {
                    Peering::new(
                        format!("{name}-to-{peer}"),
                        format!("https://www.googleapis.com/compute/v1/projects/px/global/networks/{peer}"),
                    )
                })
                .collect(),
        }
    }

    fn subnetwork(network: &str, name: &str, region: &str, cidr: &str) -> Subnetwork {
        Subnetwork {
            name: name.to_string(),
            network: format!("https://www.googleapis.com/compute/v1/projects/p1/global/networks/{network}"),
            region: region.to_string(),
            ip_cidr_range: cidr.to_string(),
            gateway_address: None,
            secondary_ip_ranges: vec![],
        }
    }

    fn instance(name: &str, zone: &str, interfaces: &[(&str, Option<&str>)]) -> Instance {
        Instance {
            name: name.to_string(),
            zone: zone.to_string(),
            interfaces: interfaces
                .iter()
                .map(|(network, subnetwork)| {
                    NetworkInterface::new(
                        format!("projects/p1/global/networks/{network}"),
                        subnetwork.map(|s| format!("projects/p1/regions/us-central1/subnetworks/{s}")),
                        Some("10.0.0.2".to_string()),
                    )
                })
                .collect(),
        }
    }

    fn scenario_a() -> InventorySnapshot {
        InventorySnapshot {
            networks: vec![network("vpc-a", "p1", &[])],
            subnetworks: vec![subnetwork("vpc-a", "sub-1", "us-central1", "10.0.0.0/24")],
            instances: vec![instance("vm-1", "us-central1-a", &[("vpc-a", Some("sub-1"))])],
            ..Default::default()
        }
    }

    fn rich_snapshot() -> InventorySnapshot {
        InventorySnapshot {
            networks: vec![
                network("vpc-a", "p1", &["vpc-b", "vpc-x"]),
                network("vpc-b", "p2", &["vpc-a", "vpc-x"]),
            ],
            subnetworks: vec![
                subnetwork("vpc-a", "sub-1", "us-central1", "10.0.0.0/24"),
                subnetwork("vpc-a", "sub-2", "europe-west1", "10.0.1.0/24"),
                subnetwork("vpc-b", "sub-1", "us-central1", "10.1.0.0/24"),
                subnetwork("gone", "sub-9", "us-east1", "10.9.0.0/24"),
            ],
            instances: vec![
                instance("vm-1", "us-central1-a", &[("vpc-a", Some("sub-1"))]),
                instance("vm-2", "europe-west1-b", &[("vpc-a", Some("sub-2")), ("vpc-b", Some("sub-1"))]),
                instance("vm-3", "us-central1-c", &[("vpc-b", None)]),
                instance("vm-4", "us-central1-c", &[("vpc-b", Some("missing"))]),
                instance("vm-5", "us-central1-c", &[("gone", Some("sub-9"))]),
            ],
            ..Default::default()
        }
    }

    fn node_ids(graph: &TopologyGraph) -> Vec<String> {
        let mut ids: Vec<String> = graph.nodes().map(|n| n.id.to_string()).collect();
        ids.sort();
        ids
    }

    fn edge_set(graph: &TopologyGraph) -> Vec<(String, String, String)> {
        let mut edges: Vec<(String, String, String)> = graph
            .edges()
            .map(|(a, b, edge)| {
                let (a, b) = if a.id <= b.id { (a, b) } else { (b, a) };
                (a.id.to_string(), b.id.to_string(), format!("{edge:?}"))
            })
            .collect();
        edges.sort();
        edges
    }

    fn category_neighbors(graph: &TopologyGraph, node: &TopologyNode, category: NodeCategory) -> usize {
        graph
            .neighbors(&node.id)
            .filter(|n| n.category == category)
            .count()
    }

    #[test]
    fn test_scenario_a() {
        let graph = build(&scenario_a()).unwrap();

        assert_eq!(node_ids(&graph), ["vpc-a", "vpc-a:sub-1", "vpc-a:vm-1"]);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.misses().is_empty());

        let network = graph.node(&NodeId::network("vpc-a")).unwrap();
        assert_eq!(network.category, NodeCategory::Network);
        assert_eq!(network.project.as_deref(), Some("p1"));
        assert_eq!(network.region, None);

        let subnet = graph.node(&NodeId::subnetwork("vpc-a", "sub-1")).unwrap();
        assert_eq!(subnet.label, "sub-1 (10.0.0.0/24)");
        assert_eq!(subnet.region.as_deref(), Some("us-central1"));

        let vm = graph.node(&NodeId::instance("vpc-a", "vm-1")).unwrap();
        assert_eq!(vm.label, "vm-1 (10.0.0.2)");
        assert_eq!(vm.region.as_deref(), Some("us-central1"));
        assert_eq!(vm.zone.as_deref(), Some("us-central1-a"));
        assert_eq!(
            graph.neighbors(&vm.id).map(|n| n.id.clone()).collect::<Vec<_>>(),
            [subnet.id.clone()]
        );
    }

    #[test]
    fn test_scenario_b_external_peer() {
        let snapshot = InventorySnapshot {
            networks: vec![network("vpc-a", "p1", &["vpc-b"])],
            ..Default::default()
        };

        let graph = build(&snapshot).unwrap();

        let peer = graph.node(&NodeId::network("vpc-b")).unwrap();
        assert_eq!(peer.category, NodeCategory::ExternalPeer);
        assert_eq!(peer.project, None);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let (_, _, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.label(), Some("peering"));
        assert!(graph.misses().is_empty());
    }

    #[test]
    fn test_scenario_c_interface_without_subnetwork() {
        let snapshot = InventorySnapshot {
            networks: vec![network("vpc-a", "p1", &[])],
            instances: vec![instance("vm-1", "us-central1-a", &[("vpc-a", None)])],
            ..Default::default()
        };

        let graph = build(&snapshot).unwrap();

        let placeholder = graph.node(&NodeId::subnetwork("vpc-a", UNKNOWN_SUBNETWORK)).unwrap();
        assert!(placeholder.placeholder);
        assert_eq!(placeholder.id.as_str(), "vpc-a:unknown");
        assert_eq!(placeholder.label, "unknown");
        assert_eq!(category_neighbors(&graph, placeholder, NodeCategory::Network), 1);
        assert!(graph.contains(&NodeId::instance("vpc-a", "vm-1")));
        assert_eq!(graph.edge_count(), 2);
        // An absent reference is not a miss
        assert!(graph.misses().is_empty());
    }

    #[test]
    fn test_scenario_d_empty_snapshot() {
        let graph = build(&InventorySnapshot::default()).unwrap();

        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_peering_between_collected_networks() {
        let graph = build(&rich_snapshot()).unwrap();

        let b = graph.node(&NodeId::network("vpc-b")).unwrap();
        assert_eq!(b.category, NodeCategory::Network);

        // a->b and b->a are distinct records, and both reach vpc-x
        let peerings: Vec<_> = graph.edges().filter(|(_, _, e)| e.is_peering()).collect();
        assert_eq!(peerings.len(), 4);
        let external: Vec<_> = graph
            .nodes()
            .filter(|n| n.category == NodeCategory::ExternalPeer)
            .map(|n| n.id.to_string())
            .collect();
        assert_eq!(external, ["vpc-x"]);
    }

    #[test]
    fn test_peering_idempotence() {
        let snapshot = InventorySnapshot {
            networks: vec![
                network("vpc-a", "p1", &["ext"]),
                network("vpc-c", "p1", &["ext"]),
            ],
            ..Default::default()
        };

        let graph = build(&snapshot).unwrap();

        let ext = graph.node(&NodeId::network("ext")).unwrap();
        assert_eq!(ext.category, NodeCategory::ExternalPeer);
        assert_eq!(category_neighbors(&graph, ext, NodeCategory::Network), 2);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_repeated_peering_record_adds_one_edge() {
        let mut vpc = network("vpc-a", "p1", &["ext"]);
        vpc.peerings.push(vpc.peerings[0].clone());
        let mut renamed = vpc.peerings[0].clone();
        renamed.name = "second".to_string();
        vpc.peerings.push(renamed);

        let snapshot = InventorySnapshot {
            networks: vec![vpc],
            ..Default::default()
        };
        let graph = build(&snapshot).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_resolution_misses() {
        let graph = build(&rich_snapshot()).unwrap();

        assert!(!graph.contains(&NodeId::subnetwork("gone", "sub-9")));
        assert!(!graph.contains(&NodeId::instance("gone", "vm-5")));
        assert_eq!(
            graph.misses(),
            [
                ResolutionMiss::SubnetworkNetwork {
                    subnetwork: "sub-9".into(),
                    reference: "https://www.googleapis.com/compute/v1/projects/p1/global/networks/gone"
                        .into(),
                },
                ResolutionMiss::InterfaceSubnetwork {
                    instance: "vm-4".into(),
                    reference: "projects/p1/regions/us-central1/subnetworks/missing".into(),
                },
                ResolutionMiss::InterfaceNetwork {
                    instance: "vm-5".into(),
                    reference: "projects/p1/global/networks/gone".into(),
                },
            ]
        );

        let placeholder = graph.node(&NodeId::subnetwork("vpc-b", "missing")).unwrap();
        assert!(placeholder.placeholder);
        assert_eq!(placeholder.project.as_deref(), Some("p2"));
    }

    #[test]
    fn test_multi_interface_instance() {
        let graph = build(&rich_snapshot()).unwrap();

        let in_a = graph.node(&NodeId::instance("vpc-a", "vm-2")).unwrap();
        let in_b = graph.node(&NodeId::instance("vpc-b", "vm-2")).unwrap();
        assert_eq!(in_a.project.as_deref(), Some("p1"));
        assert_eq!(in_b.project.as_deref(), Some("p2"));
        assert_eq!(
            graph.neighbors(&in_b.id).map(|n| n.id.clone()).collect::<Vec<_>>(),
            [NodeId::subnetwork("vpc-b", "sub-1")]
        );
    }

    #[test]
    fn test_subnetwork_and_instance_with_same_name() {
        let snapshot = InventorySnapshot {
            networks: vec![network("vpc-a", "p1", &[])],
            subnetworks: vec![subnetwork("vpc-a", "db", "us-central1", "10.0.0.0/24")],
            instances: vec![instance("db", "us-central1-a", &[("vpc-a", Some("db"))])],
            ..Default::default()
        };

        let graph = build(&snapshot).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert!(graph.contains(&NodeId::subnetwork("vpc-a", "db")));
        assert!(graph.contains(&NodeId::instance("vpc-a", "db")));
        assert_ne!(
            NodeId::subnetwork("vpc-a", "db").qualified(),
            NodeId::instance("vpc-a", "db").qualified()
        );
    }

    #[test]
    fn test_duplicate_network_name() {
        let snapshot = InventorySnapshot {
            networks: vec![network("default", "p1", &[]), network("default", "p2", &[])],
            ..Default::default()
        };

        let mut reversed = snapshot.clone();
        reversed.networks.reverse();

        for snapshot in [snapshot, reversed] {
            let graph = build(&snapshot).unwrap();

            assert_eq!(graph.node_count(), 1);
            let node = graph.node(&NodeId::network("default")).unwrap();
            assert_eq!(node.project.as_deref(), Some("p1"));
        }
    }

    #[test]
    fn test_peerings_of_dropped_network_are_ignored() {
        let snapshot = InventorySnapshot {
            networks: vec![network("default", "p2", &["ext"]), network("default", "p1", &[])],
            ..Default::default()
        };

        let graph = build(&snapshot).unwrap();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    /// Same names in one network: GCP only makes instance names unique per
    /// zone and subnetwork names unique per region
    fn with_duplicate_names(mut snapshot: InventorySnapshot) -> InventorySnapshot {
        snapshot
            .subnetworks
            .push(subnetwork("vpc-a", "sub-1", "asia-east1", "10.5.0.0/24"));
        snapshot.instances.push(instance(
            "vm-1",
            "europe-west1-b",
            &[("vpc-a", Some("sub-2"))],
        ));
        snapshot
    }

    #[test]
    fn test_duplicate_names_keep_the_smallest_record() {
        let snapshot = with_duplicate_names(rich_snapshot());
        let mut reversed = snapshot.clone();
        reversed.subnetworks.reverse();
        reversed.instances.reverse();

        for snapshot in [snapshot, reversed] {
            let graph = build(&snapshot).unwrap();

            let subnet = graph.node(&NodeId::subnetwork("vpc-a", "sub-1")).unwrap();
            assert_eq!(subnet.region.as_deref(), Some("asia-east1"));
            assert_eq!(subnet.label, "sub-1 (10.5.0.0/24)");

            let vm = graph.node(&NodeId::instance("vpc-a", "vm-1")).unwrap();
            assert_eq!(vm.zone.as_deref(), Some("europe-west1-b"));
            assert_eq!(
                graph.neighbors(&vm.id).map(|n| n.id.clone()).collect::<Vec<_>>(),
                [NodeId::subnetwork("vpc-a", "sub-2")]
            );
        }
    }

    #[test]
    fn test_node_uniqueness_and_containment() {
        let graph = build(&rich_snapshot()).unwrap();

        let mut ids: Vec<&NodeId> = graph.nodes().map(|n| &n.id).collect();
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);

        for node in graph.nodes() {
            match node.category {
                NodeCategory::Subnetwork => {
                    assert_eq!(category_neighbors(&graph, node, NodeCategory::Network), 1, "{}", node.id)
                }
                NodeCategory::Instance => {
                    assert_eq!(category_neighbors(&graph, node, NodeCategory::Subnetwork), 1, "{}", node.id);
                    assert_eq!(graph.neighbors(&node.id).count(), 1, "{}", node.id);
                }
                _ => {}
            }
        }

        for (a, b, _) in graph.edges() {
            assert!(graph.contains(&a.id));
            assert!(graph.contains(&b.id));
        }
    }

    #[test]
    fn test_ordering_independence() {
        let snapshot = with_duplicate_names(rich_snapshot());
        let mut permuted = snapshot.clone();
        permuted.subnetworks.reverse();
        permuted.instances.reverse();
        for network in &mut permuted.networks {
            network.peerings.reverse();
        }
        permuted.subnetworks.rotate_left(1);
        permuted.instances.rotate_left(2);
        permuted.networks.reverse();

        let graph = build(&snapshot).unwrap();
        let permuted = build(&permuted).unwrap();

        assert_eq!(node_ids(&graph), node_ids(&permuted));
        assert_eq!(edge_set(&graph), edge_set(&permuted));
    }

    #[test]
    fn test_malformed_snapshot_is_rejected() {
        let mut snapshot = scenario_a();
        snapshot.instances[0].zone.clear();

        let err = build(&snapshot).unwrap_err();
        let TopologyError::MalformedSnapshot(malformed) = err;
        assert_eq!(malformed.record, "instance #0 `vm-1`");
        assert_eq!(malformed.reason, "missing zone");
    }
}
