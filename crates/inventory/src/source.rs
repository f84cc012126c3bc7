use crate::reference::{project_from_link, short_name};
use crate::*;
use derive_more::Display;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::process::ExitStatus;
use tracing::*;

/// Kind of resource listed by an inventory source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResourceKind {
    #[display("networks")]
    Networks,
    #[display("subnetworks")]
    Subnetworks,
    #[display("instances")]
    Instances,
    #[display("vpn-tunnels")]
    VpnTunnels,
    #[display("routes")]
    Routes,
    #[display("firewall-rules")]
    FirewallRules,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Networks,
        ResourceKind::Subnetworks,
        ResourceKind::Instances,
        ResourceKind::VpnTunnels,
        ResourceKind::Routes,
        ResourceKind::FirewallRules,
    ];
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{kind} listing is not a JSON array of objects")]
    Decode {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Something that can list the raw provider records of a resource kind
pub trait InventorySource {
    fn list(&self, kind: ResourceKind) -> impl Future<Output = Result<Vec<Record>, SourceError>>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNetwork {
    name: String,
    self_link: String,
    #[serde(default)]
    auto_create_subnetworks: Option<bool>,
    #[serde(default)]
    peerings: Vec<Peering>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubnetwork {
    name: String,
    network: String,
    region: String,
    ip_cidr_range: String,
    #[serde(default)]
    gateway_address: Option<String>,
    #[serde(default)]
    secondary_ip_ranges: Vec<SecondaryRange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstance {
    name: String,
    zone: String,
    #[serde(default)]
    network_interfaces: Vec<RawInterface>,
}

#[derive(Deserialize)]
struct RawInterface {
    network: String,
    #[serde(default)]
    subnetwork: Option<String>,
    #[serde(default, rename = "networkIP")]
    network_ip: Option<String>,
}

fn network_from_raw(raw: RawNetwork) -> Result<Network, String> {
    let project = project_from_link(&raw.self_link)
        .ok_or_else(|| format!("no project in self link `{}`", raw.self_link))?;
    Ok(Network {
        project: project.to_string(),
        name: raw.name,
        auto_create_subnetworks: raw.auto_create_subnetworks,
        peerings: raw.peerings,
    })
}

fn subnetwork_from_raw(raw: RawSubnetwork) -> Result<Subnetwork, String> {
    Ok(Subnetwork {
        region: short_name(&raw.region).to_string(),
        name: raw.name,
        network: raw.network,
        ip_cidr_range: raw.ip_cidr_range,
        gateway_address: raw.gateway_address,
        secondary_ip_ranges: raw.secondary_ip_ranges,
    })
}

fn instance_from_raw(raw: RawInstance) -> Result<Instance, String> {
    Ok(Instance {
        zone: short_name(&raw.zone).to_string(),
        name: raw.name,
        interfaces: raw
            .network_interfaces
            .into_iter()
            .map(|nic| NetworkInterface::new(nic.network, nic.subnetwork, nic.network_ip))
            .collect(),
    })
}

/// Decode the records of one kind, skipping the ones that don't fit
fn decode_all<R, T>(
    kind: ResourceKind,
    records: Vec<Record>,
    convert: fn(R) -> Result<T, String>,
) -> Vec<T>
where
    R: DeserializeOwned,
{
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            serde_json::from_value::<R>(serde_json::Value::Object(record))
                .map_err(|e| e.to_string())
                .and_then(convert)
                .inspect_err(|e| warn!("Skipping {kind} record #{i}: {e}"))
                .ok()
        })
        .collect()
}

async fn list_or_empty<S: InventorySource>(source: &S, kind: ResourceKind) -> Vec<Record> {
    debug!("Listing {kind}");
    match source.list(kind).await {
        Ok(records) => {
            debug!("Listed {} {kind}", records.len());
            records
        }
        Err(e) => {
            error!("Failed to list {kind}: {e}");
            Vec::new()
        }
    }
}

/// Run one discovery pass against `source`
///
/// All resource kinds are listed concurrently. A kind whose listing fails is
/// treated as empty and records that can't be decoded are skipped, both with
/// a log message, so a partially reachable inventory still gives a snapshot.
pub async fn collect<S: InventorySource>(source: &S) -> InventorySnapshot {
    let (networks, subnetworks, instances, vpn_tunnels, routes, firewall_rules) = tokio::join!(
        list_or_empty(source, ResourceKind::Networks),
        list_or_empty(source, ResourceKind::Subnetworks),
        list_or_empty(source, ResourceKind::Instances),
        list_or_empty(source, ResourceKind::VpnTunnels),
        list_or_empty(source, ResourceKind::Routes),
        list_or_empty(source, ResourceKind::FirewallRules),
    );

    let snapshot = InventorySnapshot {
        networks: decode_all(ResourceKind::Networks, networks, network_from_raw),
        subnetworks: decode_all(ResourceKind::Subnetworks, subnetworks, subnetwork_from_raw),
        instances: decode_all(ResourceKind::Instances, instances, instance_from_raw),
        vpn_tunnels,
        routes,
        firewall_rules,
    };

    info!(
        "Collected {} networks, {} subnetworks, {} instances",
        snapshot.networks.len(),
        snapshot.subnetworks.len(),
        snapshot.instances.len()
    );

    snapshot
}
