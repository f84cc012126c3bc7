use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{debug, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use vpcmap_inventory::{collect, load_snapshot, save_snapshot, GcloudSource, InventorySnapshot};
use vpcmap_render::{render_html, render_report, render_svg};
use vpcmap_topology::{build, layout, TopologyGraph};

/// Map the VPC networks of GCP projects
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Collect the inventory with gcloud and save it as JSON
    #[arg(long)]
    collect: bool,

    /// Draw the topology as an SVG image
    #[arg(long)]
    save: bool,

    /// Write the interactive page and the tables of routes, firewall rules
    /// and VPN tunnels
    #[arg(long)]
    html: bool,

    /// Base name of the output files, defaults to vpc_topology_<timestamp>
    #[arg(long, value_name = "BASE")]
    file: Option<String>,

    /// Project to collect, may be repeated. Defaults to the gcloud
    /// configuration
    #[arg(long = "project", value_name = "ID")]
    projects: Vec<String>,

    /// gcloud executable
    #[arg(long, value_name = "PATH", default_value = "gcloud")]
    gcloud: PathBuf,
}

impl Args {
    fn has_action(&self) -> bool {
        self.collect || self.save || self.html
    }
}

/// Paths of the files written by one run
#[derive(Debug, PartialEq)]
struct Outputs {
    snapshot: PathBuf,
    image: PathBuf,
    page: PathBuf,
    tables: PathBuf,
}

impl Outputs {
    fn new(base: Option<&str>, timestamp: &str) -> Self {
        let base = base
            .map(str::to_string)
            .unwrap_or_else(|| format!("vpc_topology_{timestamp}"));
        let dir = Path::new(&base).parent().unwrap_or(Path::new(""));

        Self {
            snapshot: PathBuf::from(format!("{base}.json")),
            image: PathBuf::from(format!("{base}.svg")),
            page: PathBuf::from(format!("{base}.html")),
            tables: dir.join(format!("vpc_tables_{timestamp}.html")),
        }
    }
}

fn write(path: &Path, contents: String, what: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {what} to {}", path.display()))?;
    info!("{what} written to {}", path.display());
    Ok(())
}

fn collect_snapshot(args: &Args) -> Result<InventorySnapshot> {
    let source = GcloudSource {
        binary: args.gcloud.clone(),
        projects: args.projects.clone(),
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    Ok(rt.block_on(collect(&source)))
}

fn build_graph(snapshot: &InventorySnapshot) -> Result<TopologyGraph> {
    let graph = build(snapshot).context("Failed to build the topology")?;
    if !graph.misses().is_empty() {
        warn!(
            "{} references could not be resolved, see the warnings above",
            graph.misses().len()
        );
    }
    Ok(graph)
}

fn run(args: &Args, timestamp: &str) -> Result<()> {
    let outputs = Outputs::new(args.file.as_deref(), timestamp);
    debug!("Output files: {outputs:?}");

    let snapshot = if args.collect {
        let snapshot = collect_snapshot(args)?;
        save_snapshot(&snapshot, &outputs.snapshot).context("Failed to save the snapshot")?;
        Some(snapshot)
    } else {
        None
    };

    if !args.save && !args.html {
        return Ok(());
    }

    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => load_snapshot(&outputs.snapshot).context("Failed to load the snapshot")?,
    };
    let graph = build_graph(&snapshot)?;

    if args.save {
        let layout = layout(&graph);
        write(&outputs.image, render_svg(&graph, &layout), "Image")?;
    }

    if args.html {
        write(&outputs.page, render_html(&graph), "Interactive page")?;
        write(&outputs.tables, render_report(&snapshot), "Tables")?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    if !args.has_action() {
        Args::command().print_help()?;
        return Ok(());
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    run(&args, &timestamp)
}
