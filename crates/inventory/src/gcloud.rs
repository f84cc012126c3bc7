use crate::source::{InventorySource, ResourceKind, SourceError};
use crate::Record;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, error};

/// Inventory source backed by the `gcloud` command line tool
///
/// Without projects, gcloud's configured default project is listed.
#[derive(Debug, Clone)]
pub struct GcloudSource {
    pub binary: PathBuf,
    pub projects: Vec<String>,
}

impl Default for GcloudSource {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gcloud"),
            projects: Vec::new(),
        }
    }
}

impl ResourceKind {
    fn gcloud_args(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Networks => &["compute", "networks", "list"],
            ResourceKind::Subnetworks => &["compute", "networks", "subnets", "list"],
            ResourceKind::Instances => &["compute", "instances", "list"],
            ResourceKind::VpnTunnels => &["compute", "vpn-tunnels", "list"],
            ResourceKind::Routes => &["compute", "routes", "list"],
            ResourceKind::FirewallRules => &["compute", "firewall-rules", "list"],
        }
    }
}

impl GcloudSource {
    pub fn new(projects: Vec<String>) -> Self {
        Self {
            projects,
            ..Default::default()
        }
    }

    fn command_args(&self, kind: ResourceKind, project: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = kind.gcloud_args().iter().map(|a| a.to_string()).collect();
        args.push("--format=json".to_string());
        if let Some(project) = project {
            args.push(format!("--project={project}"));
        }
        args
    }

    async fn run(&self, kind: ResourceKind, project: Option<&str>) -> Result<Vec<Record>, SourceError> {
        let args = self.command_args(kind, project);
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        debug!("Running {command}");

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|source| SourceError::Decode { kind, source })
    }
}

impl InventorySource for GcloudSource {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Record>, SourceError> {
        if self.projects.is_empty() {
            return self.run(kind, None).await;
        }

        let mut listings = Vec::with_capacity(self.projects.len());
        for project in &self.projects {
            listings.push((project.as_str(), self.run(kind, Some(project)).await));
        }
        merge_listings(kind, listings)
    }
}

/// Concatenate the listings of several projects
///
/// A failing project is logged and skipped. The listing only fails when no
/// project could be listed.
fn merge_listings<'a>(
    kind: ResourceKind,
    listings: impl IntoIterator<Item = (&'a str, Result<Vec<Record>, SourceError>)>,
) -> Result<Vec<Record>, SourceError> {
    let mut records = Vec::new();
    let mut listed = false;
    let mut last_error = None;

    for (project, listing) in listings {
        match listing {
            Ok(project_records) => {
                listed = true;
                records.extend(project_records);
            }
            Err(e) => {
                error!("Failed to list {kind} of project {project}: {e}");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !listed => Err(e),
        _ => Ok(records),
    }
}
