//! oroadm-verify entry point.
//!
//! Runs structural, topology or lifecycle checks against one OpenROADM node
//! mounted on a TransportPCE controller.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use oroadm_schema::{SchemaRegistry, StructuralChecker};
use oroadm_topology::{reconstruct_node, ReconstructionDefect};
use oroadm_types::{DeviceCategory, NodePortMapping, SchemaVersion};
use oroadm_verify::{
    LifecycleVerifier, ReadRequest, RestconfClient, SessionFactory, ValidationVerdict, VerifyConfig,
    DEFAULT_CONFIG_PATH,
};

/// OpenROADM device conformance and interface lifecycle verifier
#[derive(Parser, Debug)]
#[command(name = "oroadm-verify")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Node id, overriding the configuration file
    #[arg(short = 'n', long)]
    node: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the device configuration against the model checklists
    Schema {
        /// Model version, overriding configuration and port mapping
        #[arg(long)]
        version: Option<String>,

        /// Device category (xponder or roadm)
        #[arg(long)]
        category: Option<String>,

        /// Extra version descriptors (TOML or JSON)
        #[arg(long)]
        descriptors: Vec<PathBuf>,

        /// Check a saved device document instead of reading the node
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Reconstruct port roles from the node's port mapping
    Topology {
        /// Use a saved port-mapping document instead of the controller
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Run create/delete cycles on every network and degree port
    Lifecycle,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("oroadm-verify: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("oroadm-verify failed: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Initialize tracing, honouring `RUST_LOG` over the command line level.
fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}

/// Runs the selected command; `Ok(false)` means the node failed the checks.
async fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = VerifyConfig::load_or_default(&args.config)?;
    config.apply_env_overrides();
    if let Some(node) = &args.node {
        config.device.node_id = Some(node.clone());
    }
    config.validate()?;

    match &args.command {
        Command::Schema {
            version,
            category,
            descriptors,
            file,
        } => {
            run_schema(
                &config,
                version.as_deref(),
                category.as_deref(),
                descriptors,
                file.as_deref(),
                args.json,
            )
            .await
        }
        Command::Topology { file } => run_topology(&config, file.as_deref(), args.json).await,
        Command::Lifecycle => run_lifecycle(&config, args.json).await,
    }
}

fn node_id(config: &VerifyConfig) -> anyhow::Result<&str> {
    config
        .device
        .node_id
        .as_deref()
        .ok_or_else(|| anyhow!("no node id given (use --node or [device] node_id)"))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Port mapping of the configured node, from a file or the controller.
async fn load_port_mapping(
    config: &VerifyConfig,
    file: Option<&Path>,
) -> anyhow::Result<NodePortMapping> {
    let document = match file {
        Some(path) => read_json(path)?,
        None => {
            let client = RestconfClient::new(&config.controller)?;
            client.port_mapping(node_id(config)?).await?
        }
    };

    let mut nodes = NodePortMapping::from_document(&document)?;
    let wanted = config.device.node_id.as_deref();
    let position = match wanted {
        Some(id) => nodes.iter().position(|n| n.node_id == id),
        None => (!nodes.is_empty()).then_some(0),
    };
    match position {
        Some(index) => Ok(nodes.swap_remove(index)),
        None => bail!("port mapping has no node {}", wanted.unwrap_or("")),
    }
}

async fn run_schema(
    config: &VerifyConfig,
    version: Option<&str>,
    category: Option<&str>,
    descriptors: &[PathBuf],
    file: Option<&Path>,
    json: bool,
) -> anyhow::Result<bool> {
    let mut registry = SchemaRegistry::builtin();
    for path in descriptors {
        registry.load_descriptors(path)?;
    }

    let category = match category {
        Some(c) => Some(c.parse::<DeviceCategory>()?),
        None => config.device_category()?,
    };

    let (document, mapping) = match file {
        Some(path) => (read_json(path)?, None),
        None => {
            let client = RestconfClient::new(&config.controller)?;
            let node = node_id(config)?;
            let mut session = client.open(node).await?;
            let document = session.read(&ReadRequest::DeviceConfig).await;
            if let Err(e) = session.close().await {
                warn!("Failed to close session to {}: {}", node, e);
            }
            // the port mapping only supplies defaults, so a failure is tolerated
            let mapping = match load_port_mapping(config, None).await {
                Ok(mapping) => Some(mapping),
                Err(e) => {
                    warn!("Port mapping unavailable: {:#}", e);
                    None
                }
            };
            (document?, mapping)
        }
    };

    let version = version
        .map(SchemaVersion::new)
        .or_else(|| config.schema_version())
        .or_else(|| mapping.as_ref().and_then(NodePortMapping::version))
        .ok_or_else(|| anyhow!("device model version unknown (use --version)"))?;
    let category = category.or_else(|| mapping.as_ref().and_then(NodePortMapping::category));

    let checker = StructuralChecker::new(&registry, version)?;
    let report = checker.check_device(&document, category);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &report.results {
            println!(
                "{:<20} {:<8} ({} instances)",
                result.tree.to_string(),
                if result.valid { "ok" } else { "FAIL" },
                result.instances
            );
        }
        for defect in &report.defects {
            println!("  {:?}: {}", defect.severity, defect);
        }
    }
    Ok(report.is_valid())
}

async fn run_topology(
    config: &VerifyConfig,
    file: Option<&Path>,
    json: bool,
) -> anyhow::Result<bool> {
    let mapping = load_port_mapping(config, file).await?;
    let reconstruction = reconstruct_node(&mapping);
    let defects = reconstruction.all_defects();

    if json {
        let output = serde_json::json!({
            "node-id": mapping.node_id,
            "ports": reconstruction.config,
            "defects": defects,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}: {} ports", mapping.node_id, reconstruction.config.len());
        for record in reconstruction.config.network_ports() {
            let clients: Vec<&str> = record.client_lcps().collect();
            println!("  {} -> [{}]", record.port.lcp(), clients.join(", "));
        }
        for record in reconstruction.config.degree_ports() {
            let srgs: Vec<&str> = record.linked_srgs.iter().map(|s| s.lcp()).collect();
            println!("  {} -> [{}]", record.port.lcp(), srgs.join(", "));
        }
        for defect in &defects {
            println!("  defect: {}", defect);
        }
    }
    Ok(defects.is_empty())
}

async fn run_lifecycle(config: &VerifyConfig, json: bool) -> anyhow::Result<bool> {
    let mapping = load_port_mapping(config, None).await?;
    let reconstruction = reconstruct_node(&mapping);
    let defects = reconstruction.all_defects();
    for defect in &defects {
        warn!("Topology defect on {}: {}", mapping.node_id, defect);
    }

    let client = RestconfClient::new(&config.controller)?;
    let verifier =
        LifecycleVerifier::new(&client, &client, config.lifecycle_params(&mapping.node_id));
    let verdict = verifier.verify(&reconstruction.config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{}", verdict);
        for finding in verdict.findings() {
            println!("  {} [{:?}] {}: {}", finding.check, finding.category, finding.subject, finding.detail);
        }
    }
    info!("Lifecycle verdict for {}: {}", mapping.node_id, verdict);
    Ok(lifecycle_passed(&verdict, &defects))
}

/// A lifecycle run passes only on a clean topology and an all-true verdict.
fn lifecycle_passed(verdict: &ValidationVerdict, defects: &[ReconstructionDefect]) -> bool {
    verdict.passed() && defects.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_subcommands() {
        let args = Args::try_parse_from([
            "oroadm-verify",
            "--node",
            "XPDR-A1",
            "schema",
            "--version",
            "2.2.1",
            "--category",
            "xponder",
        ])
        .unwrap();
        assert_eq!(args.node.as_deref(), Some("XPDR-A1"));
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(args.command, Command::Schema { version: Some(_), .. }));

        let args = Args::try_parse_from(["oroadm-verify", "lifecycle"]).unwrap();
        assert!(matches!(args.command, Command::Lifecycle));
        assert!(Args::try_parse_from(["oroadm-verify"]).is_err());
    }

    #[test]
    fn test_topology_defects_fail_lifecycle() {
        let verdict = ValidationVerdict::new();
        assert!(lifecycle_passed(&verdict, &[]));

        let defects = vec![ReconstructionDefect::DuplicateMembership {
            lcp: "XPDR1-CLIENT1".to_string(),
            groups: vec![(1, 1), (1, 2)],
        }];
        assert!(!lifecycle_passed(&verdict, &defects));
    }

    #[test]
    fn test_node_id_required() {
        let config = VerifyConfig::default();
        assert!(node_id(&config).is_err());
    }

    #[tokio::test]
    async fn test_topology_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        let document = serde_json::json!({
            "nodes": [{
                "node-id": "XPDR-A1",
                "mapping": [
                    {"logical-connection-point": "XPDR1-NETWORK1", "port-qual": "xpdr-network",
                     "connection-map-lcp": "XPDR1-CLIENT1"},
                    {"logical-connection-point": "XPDR1-CLIENT1", "port-qual": "xpdr-client",
                     "connection-map-lcp": "XPDR1-NETWORK1"}
                ]
            }]
        });
        fs::write(&path, document.to_string()).unwrap();

        let mut config = VerifyConfig::default();
        config.device.node_id = Some("XPDR-A1".to_string());
        assert!(run_topology(&config, Some(&path), true).await.unwrap());

        config.device.node_id = Some("XPDR-B1".to_string());
        assert!(run_topology(&config, Some(&path), false).await.is_err());
    }
}
