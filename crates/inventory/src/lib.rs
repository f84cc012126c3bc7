//! Typed inventory of a cloud project set
//!
//! The inventory is the raw material of the topology: networks with their
//! peerings, subnetworks and instances that point at networks through
//! reference strings, and opaque record lists that are only ever shown in
//! tables. An [`InventorySnapshot`] is produced once per discovery pass by
//! [`collect`] or [`load_snapshot`] and is read-only afterwards.

pub mod gcloud;
pub mod reference;
pub mod ser;
pub mod source;

pub use gcloud::GcloudSource;
pub use reference::Resolution;
pub use ser::{load_snapshot, parse_snapshot, save_snapshot, SnapshotDocument};
pub use source::{collect, InventorySource, ResourceKind, SourceError};

use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Provider record kept as-is, in its original key order
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] MalformedSnapshot),

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A snapshot, or one of its records, lacks a required attribute
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{record}: {reason}")]
pub struct MalformedSnapshot {
    pub record: String,
    pub reason: String,
}

impl MalformedSnapshot {
    pub fn new(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventorySnapshot {
    pub networks: Vec<Network>,
    pub subnetworks: Vec<Subnetwork>,
    pub instances: Vec<Instance>,
    pub vpn_tunnels: Vec<Record>,
    pub routes: Vec<Record>,
    pub firewall_rules: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub name: String,
    pub project: String,
    pub auto_create_subnetworks: Option<bool>,
    pub peerings: Vec<Peering>,
}

/// Peering of the network it is listed under with another network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peering {
    #[serde(default)]
    pub name: String,

    /// Reference to the peer network, possibly outside the collected projects
    pub network: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Remaining provider fields, written back untouched
    #[serde(flatten)]
    pub extra: Record,
}

impl Peering {
    pub fn new(name: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            network: network.into(),
            state: None,
            extra: Record::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subnetwork {
    pub name: String,
    /// Reference to the owning network
    pub network: String,
    pub region: String,
    pub ip_cidr_range: String,
    pub gateway_address: Option<String>,
    pub secondary_ip_ranges: Vec<SecondaryRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Constructor)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryRange {
    pub range_name: String,
    pub ip_cidr_range: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub zone: String,
    pub interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct NetworkInterface {
    /// Reference to the network of the interface
    pub network: String,
    /// Reference to the subnetwork, absent on legacy networks
    pub subnetwork: Option<String>,
    pub ip: Option<String>,
}

fn require(value: &str, record: impl FnOnce() -> String, field: &str) -> Result<(), MalformedSnapshot> {
    if value.trim().is_empty() {
        Err(MalformedSnapshot::new(record(), format!("missing {field}")))
    } else {
        Ok(())
    }
}

impl InventorySnapshot {
    /// Check that every record carries the attributes the topology needs
    ///
    /// # Errors
    /// Returns the first record found with an empty required attribute
    pub fn validate(&self) -> Result<(), MalformedSnapshot> {
        for (i, network) in self.networks.iter().enumerate() {
            let record = || format!("network #{i} `{}`", network.name);
            require(&network.name, record, "name")?;
            require(&network.project, record, "project")?;

            for (j, peering) in network.peerings.iter().enumerate() {
                require(
                    reference::short_name(&peering.network),
                    || format!("peering #{j} of network `{}`", network.name),
                    "peer network",
                )?;
            }
        }

        for (i, subnetwork) in self.subnetworks.iter().enumerate() {
            let record = || format!("subnetwork #{i} `{}`", subnetwork.name);
            require(&subnetwork.name, record, "name")?;
            require(&subnetwork.network, record, "network")?;
            require(&subnetwork.region, record, "region")?;
            require(&subnetwork.ip_cidr_range, record, "ipCidrRange")?;
        }

        for (i, instance) in self.instances.iter().enumerate() {
            let record = || format!("instance #{i} `{}`", instance.name);
            require(&instance.name, record, "name")?;
            require(&instance.zone, record, "zone")?;

            for (j, interface) in instance.interfaces.iter().enumerate() {
                require(
                    &interface.network,
                    || format!("interface #{j} of instance `{}`", instance.name),
                    "network",
                )?;
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
            && self.subnetworks.is_empty()
            && self.instances.is_empty()
            && self.vpn_tunnels.is_empty()
            && self.routes.is_empty()
            && self.firewall_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn snapshot() -> InventorySnapshot {
        InventorySnapshot {
            networks: vec![Network {
                name: "vpc-a".into(),
                project: "p1".into(),
                auto_create_subnetworks: Some(false),
                peerings: vec![Peering::new("a-to-b", "vpc-b")],
            }],
            subnetworks: vec![Subnetwork {
                name: "sub-1".into(),
                network: "vpc-a".into(),
                region: "us-central1".into(),
                ip_cidr_range: "10.0.0.0/24".into(),
                gateway_address: Some("10.0.0.1".into()),
                secondary_ip_ranges: vec![],
            }],
            instances: vec![Instance {
                name: "vm-1".into(),
                zone: "us-central1-a".into(),
                interfaces: vec![NetworkInterface::new(
                    "vpc-a".into(),
                    Some("sub-1".into()),
                    Some("10.0.0.2".into()),
                )],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert_eq!(snapshot().validate(), Ok(()));
        assert_eq!(InventorySnapshot::default().validate(), Ok(()));
        assert!(InventorySnapshot::default().is_empty());
        assert!(!snapshot().is_empty());
    }

    #[test]
    fn test_missing_project() {
        let mut snapshot = snapshot();
        snapshot.networks[0].project.clear();

        let err = snapshot.validate().unwrap_err();
        assert_eq!(err.record, "network #0 `vpc-a`");
        assert_eq!(err.reason, "missing project");
    }

    #[test]
    fn test_missing_peer_network() {
        let mut snapshot = snapshot();
        snapshot.networks[0].peerings[0].network = "  ".into();

        let err = snapshot.validate().unwrap_err();
        assert_eq!(err.to_string(), "peering #0 of network `vpc-a`: missing peer network");
    }

    #[test]
    fn test_missing_subnetwork_region() {
        let mut snapshot = snapshot();
        snapshot.subnetworks[0].region.clear();

        let err = snapshot.validate().unwrap_err();
        assert_eq!(err.reason, "missing region");
    }

    #[test]
    fn test_missing_interface_network() {
        let mut snapshot = snapshot();
        snapshot.instances[0].interfaces[0].network.clear();

        let err = snapshot.validate().unwrap_err();
        assert_eq!(err.record, "interface #0 of instance `vm-1`");
    }
}
