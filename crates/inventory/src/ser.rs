//! On-disk snapshot document
//!
//! The document nests subnetworks, instances and peerings under their
//! network (`vpcs`) and keeps the pass-through lists at the top level
//! (`vpns`, `routes`, `firewalls`). Field names are shared with other tools
//! reading the same files and must not change.

use crate::reference::{matches_suffix, short_name};
use crate::*;
use std::path::Path;
use tracing::{debug, info};

/// Value of an instance entry's `subnet` field when it has no subnetwork
pub const NO_SUBNET: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub vpcs: Vec<VpcEntry>,
    #[serde(default)]
    pub vpns: Vec<Record>,
    #[serde(default)]
    pub routes: Vec<Record>,
    #[serde(default)]
    pub firewalls: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcEntry {
    pub name: String,
    #[serde(default)]
    pub auto_create_subnetworks: Option<bool>,
    #[serde(default)]
    pub subnets: Vec<SubnetEntry>,
    #[serde(default)]
    pub peerings: Vec<Peering>,
    #[serde(default)]
    pub instances: Vec<InstanceEntry>,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetEntry {
    pub name: String,
    pub region: String,
    pub ip_cidr_range: String,
    #[serde(default)]
    pub gateway_address: Option<String>,
    #[serde(default)]
    pub secondary_ip_ranges: Vec<SecondaryRange>,
}

/// One network interface of an instance, listed under the interface's network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub name: String,
    pub zone: String,
    pub subnet: String,
    #[serde(default)]
    pub ip: Option<String>,
}

impl From<&InventorySnapshot> for SnapshotDocument {
    fn from(snapshot: &InventorySnapshot) -> Self {
        let vpcs = snapshot
            .networks
            .iter()
            .map(|network| VpcEntry {
                name: network.name.clone(),
                auto_create_subnetworks: network.auto_create_subnetworks,
                subnets: snapshot
                    .subnetworks
                    .iter()
                    .filter(|subnetwork| matches_suffix(&subnetwork.network, &network.name))
                    .map(|subnetwork| SubnetEntry {
                        name: subnetwork.name.clone(),
                        region: subnetwork.region.clone(),
                        ip_cidr_range: subnetwork.ip_cidr_range.clone(),
                        gateway_address: subnetwork.gateway_address.clone(),
                        secondary_ip_ranges: subnetwork.secondary_ip_ranges.clone(),
                    })
                    .collect(),
                peerings: network.peerings.clone(),
                instances: snapshot
                    .instances
                    .iter()
                    .flat_map(|instance| {
                        instance
                            .interfaces
                            .iter()
                            .filter(|interface| matches_suffix(&interface.network, &network.name))
                            .map(move |interface| InstanceEntry {
                                name: instance.name.clone(),
                                zone: instance.zone.clone(),
                                subnet: interface
                                    .subnetwork
                                    .as_deref()
                                    .map_or(NO_SUBNET, short_name)
                                    .to_string(),
                                ip: interface.ip.clone(),
                            })
                    })
                    .collect(),
                project: network.project.clone(),
            })
            .collect();

        Self {
            vpcs,
            vpns: snapshot.vpn_tunnels.clone(),
            routes: snapshot.routes.clone(),
            firewalls: snapshot.firewall_rules.clone(),
        }
    }
}

impl From<SnapshotDocument> for InventorySnapshot {
    fn from(document: SnapshotDocument) -> Self {
        let mut snapshot = InventorySnapshot {
            vpn_tunnels: document.vpns,
            routes: document.routes,
            firewall_rules: document.firewalls,
            ..Default::default()
        };

        for vpc in document.vpcs {
            for subnet in vpc.subnets {
                snapshot.subnetworks.push(Subnetwork {
                    name: subnet.name,
                    network: vpc.name.clone(),
                    region: subnet.region,
                    ip_cidr_range: subnet.ip_cidr_range,
                    gateway_address: subnet.gateway_address,
                    secondary_ip_ranges: subnet.secondary_ip_ranges,
                });
            }

            for entry in vpc.instances {
                let subnetwork = match entry.subnet.as_str() {
                    "" | NO_SUBNET => None,
                    subnet => Some(subnet.to_string()),
                };
                snapshot.instances.push(Instance {
                    name: entry.name,
                    zone: entry.zone,
                    interfaces: vec![NetworkInterface::new(vpc.name.clone(), subnetwork, entry.ip)],
                });
            }

            snapshot.networks.push(Network {
                name: vpc.name,
                project: vpc.project,
                auto_create_subnetworks: vpc.auto_create_subnetworks,
                peerings: vpc.peerings,
            });
        }

        snapshot
    }
}

/// Parse a snapshot document
///
/// # Errors
/// Missing fields and wrong types are reported as [`MalformedSnapshot`],
/// anything that is not JSON at all as a plain JSON error.
pub fn parse_snapshot(json: &str, origin: &Path) -> Result<InventorySnapshot, InventoryError> {
    let document: SnapshotDocument = serde_json::from_str(json).map_err(|e| {
        if e.is_data() {
            InventoryError::Malformed(MalformedSnapshot::new(
                origin.display().to_string(),
                e.to_string(),
            ))
        } else {
            InventoryError::Json {
                path: origin.to_path_buf(),
                source: e,
            }
        }
    })?;

    debug!("Parsed snapshot with {} vpcs", document.vpcs.len());
    Ok(document.into())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<InventorySnapshot, InventoryError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = parse_snapshot(&json, path)?;
    info!("Loaded snapshot from {}", path.display());
    Ok(snapshot)
}

pub fn save_snapshot(
    snapshot: &InventorySnapshot,
    path: impl AsRef<Path>,
) -> Result<(), InventoryError> {
    let path = path.as_ref();
    let document = SnapshotDocument::from(snapshot);
    let json = serde_json::to_string_pretty(&document).map_err(|source| InventoryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Snapshot saved to {}", path.display());
    Ok(())
}
